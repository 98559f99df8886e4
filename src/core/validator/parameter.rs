use crate::core::error::{ParamFinding, ParamFindings};
use crate::core::resources::{Param, ParamSpec};

/// Compare the params a pipeline task supplies with the ones its task declares.
///
/// Findings for supplied params come first, in supply order, followed by
/// missing required params in declaration order.
pub fn check_params(supplied: &[Param], declared: &[ParamSpec]) -> ParamFindings {
    let mut findings = ParamFindings::new();

    for param in supplied {
        let Some(spec) = declared.iter().find(|spec| spec.name == param.name) else {
            findings.push(ParamFinding::UndeclaredParameter {
                name: param.name.clone(),
            });
            continue;
        };
        let want = spec.declared_type();
        let got = param.value_type();
        if got != want {
            findings.push(ParamFinding::TypeMismatch {
                name: param.name.clone(),
                got: got.to_string(),
                want: want.to_string(),
            });
        }
    }

    for spec in declared.iter().filter(|spec| spec.is_required()) {
        if !supplied.iter().any(|param| param.name == spec.name) {
            findings.push(ParamFinding::MissingRequiredParameter {
                name: spec.name.clone(),
            });
        }
    }

    findings
}

use crate::core::bundle::{BundleFetcher, BundleOptions, PARAM_SERVICE_ACCOUNT};
use crate::core::error::ResolveError;
use crate::core::resources::{Param, PipelineTask, Task, TaskSpec};
use std::sync::Arc;

/// Resolver name Tekton uses for OCI bundles.
pub const BUNDLES_RESOLVER: &str = "bundles";
const BUNDLES_RESOLVER_ALIAS: &str = "bundle";

pub const DEFAULT_SERVICE_ACCOUNT: &str = "none";

/// Finds the task spec behind a pipeline task, fetching bundles when needed.
///
/// Nothing is cached; every pipeline task is resolved on its own.
pub struct TaskSpecResolver {
    fetcher: Arc<dyn BundleFetcher>,
    default_service_account: String,
}

impl TaskSpecResolver {
    pub fn new(fetcher: Arc<dyn BundleFetcher>) -> Self {
        Self {
            fetcher,
            default_service_account: DEFAULT_SERVICE_ACCOUNT.to_string(),
        }
    }

    pub fn with_default_service_account(mut self, service_account: impl Into<String>) -> Self {
        self.default_service_account = service_account.into();
        self
    }

    pub async fn resolve(&self, task: &PipelineTask) -> Result<TaskSpec, ResolveError> {
        if let Some(embedded) = &task.task_spec {
            if embedded.is_custom_task() {
                return Err(ResolveError::UnsupportedTaskKind);
            }
            return Ok(embedded.task_spec.clone());
        }

        let Some(task_ref) = task
            .task_ref
            .as_ref()
            .filter(|task_ref| is_bundles_resolver(task_ref.resolver.as_deref()))
        else {
            return Err(ResolveError::UnresolvableTaskSpec);
        };

        let params = bundle_resolver_params(&task_ref.params, &self.default_service_account);
        let options = BundleOptions::from_params(&params)?;
        tracing::debug!(
            step = %task.name,
            bundle = %options.bundle,
            entry = %options.entry_name,
            "resolving task from bundle"
        );
        let data = self.fetcher.fetch(&options).await?;
        let fetched: Task =
            serde_yaml::from_slice(&data).map_err(ResolveError::MalformedTaskDocument)?;
        Ok(fetched.spec)
    }
}

fn is_bundles_resolver(resolver: Option<&str>) -> bool {
    matches!(resolver, Some(BUNDLES_RESOLVER | BUNDLES_RESOLVER_ALIAS))
}

/// Resolver params with a `serviceAccount` entry added when the reference has none.
pub fn bundle_resolver_params(params: &[Param], default_service_account: &str) -> Vec<Param> {
    let mut params = params.to_vec();
    if !params.iter().any(|param| param.name == PARAM_SERVICE_ACCOUNT) {
        params.push(Param::new(PARAM_SERVICE_ACCOUNT, default_service_account));
    }
    params
}

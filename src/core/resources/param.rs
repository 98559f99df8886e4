use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Parameter value types understood by Tekton.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    #[default]
    String,
    Array,
    Object,
}

impl ParamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Array => "array",
            ParamType::Object => "object",
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parameter value; the variant is the value's own type tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged, from = "RawParamValue")]
pub enum ParamValue {
    String(String),
    Array(Vec<String>),
    Object(IndexMap<String, String>),
}

impl ParamValue {
    pub fn param_type(&self) -> ParamType {
        match self {
            ParamValue::String(_) => ParamType::String,
            ParamValue::Array(_) => ParamType::Array,
            ParamValue::Object(_) => ParamType::Object,
        }
    }

    /// Every string embedded in the value, in document order.
    pub fn strings(&self) -> Vec<&str> {
        match self {
            ParamValue::String(value) => vec![value.as_str()],
            ParamValue::Array(items) => items.iter().map(String::as_str).collect(),
            ParamValue::Object(map) => map.values().map(String::as_str).collect(),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::String(value.to_string())
    }
}

// YAML scalars such as `3` or `true` are read as their string form.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawParamValue {
    Array(Vec<String>),
    Object(IndexMap<String, String>),
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl From<RawParamValue> for ParamValue {
    fn from(raw: RawParamValue) -> Self {
        match raw {
            RawParamValue::Array(items) => ParamValue::Array(items),
            RawParamValue::Object(map) => ParamValue::Object(map),
            RawParamValue::Bool(value) => ParamValue::String(value.to_string()),
            RawParamValue::Integer(value) => ParamValue::String(value.to_string()),
            RawParamValue::Float(value) => ParamValue::String(value.to_string()),
            RawParamValue::String(value) => ParamValue::String(value),
        }
    }
}

/// A parameter supplied by a pipeline task, a run or a task reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<ParamValue>,
}

impl Param {
    pub fn new(name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }

    /// Type of the supplied value; a missing value counts as a string.
    pub fn value_type(&self) -> ParamType {
        self.value
            .as_ref()
            .map(ParamValue::param_type)
            .unwrap_or_default()
    }

    pub fn as_string(&self) -> Option<&str> {
        match &self.value {
            Some(ParamValue::String(value)) => Some(value.as_str()),
            _ => None,
        }
    }
}

/// Property declared on an object parameter or result.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PropertySpec {
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub property_type: Option<ParamType>,
}

/// A parameter declared by a task or pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub param_type: Option<ParamType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<ParamValue>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, PropertySpec>,
}

impl ParamSpec {
    pub fn new(name: impl Into<String>, param_type: Option<ParamType>) -> Self {
        Self {
            name: name.into(),
            param_type,
            description: None,
            default: None,
            properties: IndexMap::new(),
        }
    }

    pub fn with_default(mut self, default: impl Into<ParamValue>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Declared type; specs without an explicit type are strings.
    pub fn declared_type(&self) -> ParamType {
        self.param_type.unwrap_or_default()
    }

    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

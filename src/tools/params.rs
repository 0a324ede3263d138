//! Tool parameter declarations and argument validation.
//!
//! A [`ToolDescriptor`] is checked once when it is built, so a descriptor that
//! exists is always internally consistent. Incoming arguments are then checked
//! against it by [`validate_arguments`], a pure function that either yields
//! [`ValidatedArgs`] or every [`Violation`] it found.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

use crate::analysis::type_name;
use crate::tools::ToolError;

/// Declared type tag of a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Number,
    Integer,
    Boolean,
    Object,
    Array,
}

impl ParamType {
    /// JSON Schema name of this type.
    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
        }
    }

    /// Whether `value` is acceptable for this type.
    #[inline]
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Boolean => value.is_boolean(),
            Self::Object => value.is_object(),
            Self::Array => value.is_array(),
        }
    }
}

impl fmt::Display for ParamType {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single declared parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolParameter {
    name: String,
    param_type: ParamType,
    description: String,
    required: bool,
    default: Option<Value>,
    allowed: Option<Vec<Value>>,
    case_insensitive: bool,
}

impl ToolParameter {
    #[inline]
    pub fn required(name: &str, param_type: ParamType, description: &str) -> Self {
        Self {
            name: name.to_string(),
            param_type,
            description: description.to_string(),
            required: true,
            default: None,
            allowed: None,
            case_insensitive: false,
        }
    }

    #[inline]
    pub fn optional(name: &str, param_type: ParamType, description: &str) -> Self {
        Self {
            required: false,
            ..Self::required(name, param_type, description)
        }
    }

    /// Value substituted when the argument is absent.
    #[must_use]
    #[inline]
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Restrict the parameter to an enumerated set of values.
    #[must_use]
    #[inline]
    pub fn with_allowed<I, V>(mut self, allowed: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.allowed = Some(allowed.into_iter().map(Into::into).collect());
        self
    }

    /// Match string enum values ignoring ASCII case. The validated argument
    /// is replaced by the declared spelling.
    #[must_use]
    #[inline]
    pub fn case_insensitive(mut self) -> Self {
        self.case_insensitive = true;
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn param_type(&self) -> ParamType {
        self.param_type
    }

    #[inline]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[inline]
    pub fn is_required(&self) -> bool {
        self.required
    }

    #[inline]
    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    #[inline]
    pub fn allowed(&self) -> Option<&[Value]> {
        self.allowed.as_deref()
    }

    /// Find the allowed value matching `value`, honouring case-insensitivity.
    fn match_allowed<'a>(&self, allowed: &'a [Value], value: &Value) -> Option<&'a Value> {
        allowed.iter().find(|candidate| {
            if *candidate == value {
                return true;
            }
            match (self.case_insensitive, candidate.as_str(), value.as_str()) {
                (true, Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
                _ => false,
            }
        })
    }

    fn schema(&self) -> Value {
        let mut schema = Map::new();
        schema.insert("type".to_string(), json!(self.param_type.as_str()));
        schema.insert("description".to_string(), json!(self.description));
        if let Some(allowed) = &self.allowed {
            schema.insert("enum".to_string(), Value::Array(allowed.clone()));
        }
        if let Some(default) = &self.default {
            schema.insert("default".to_string(), default.clone());
        }
        Value::Object(schema)
    }
}

/// Inconsistencies rejected when a [`ToolDescriptor`] is built.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("tool name cannot be empty")]
    EmptyToolName,
    #[error("tool '{tool}' declares a parameter with an empty name")]
    EmptyParameterName { tool: String },
    #[error("tool '{tool}' declares parameter '{name}' more than once")]
    DuplicateParameter { tool: String, name: String },
    #[error("parameter '{name}' of tool '{tool}' is required but declares a default")]
    RequiredWithDefault { tool: String, name: String },
    #[error("default for parameter '{name}' of tool '{tool}' is not a {expected}")]
    DefaultTypeMismatch {
        tool: String,
        name: String,
        expected: ParamType,
    },
    #[error("default for parameter '{name}' of tool '{tool}' is not among its allowed values")]
    DefaultNotAllowed { tool: String, name: String },
    #[error("allowed value for parameter '{name}' of tool '{tool}' is not a {expected}")]
    AllowedTypeMismatch {
        tool: String,
        name: String,
        expected: ParamType,
    },
}

/// Name, description and ordered parameter list of a tool.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDescriptor {
    name: String,
    description: String,
    parameters: Vec<ToolParameter>,
}

impl ToolDescriptor {
    /// Build a descriptor, rejecting inconsistent parameter declarations.
    #[inline]
    pub fn new(
        name: &str,
        description: &str,
        parameters: Vec<ToolParameter>,
    ) -> Result<Self, SchemaError> {
        if name.trim().is_empty() {
            return Err(SchemaError::EmptyToolName);
        }

        let tool = name.to_string();
        let mut seen = HashSet::new();
        for param in &parameters {
            if param.name.trim().is_empty() {
                return Err(SchemaError::EmptyParameterName { tool });
            }
            if !seen.insert(param.name.as_str()) {
                return Err(SchemaError::DuplicateParameter {
                    tool,
                    name: param.name.clone(),
                });
            }
            if let Some(allowed) = &param.allowed {
                if !allowed.iter().all(|v| param.param_type.accepts(v)) {
                    return Err(SchemaError::AllowedTypeMismatch {
                        tool,
                        name: param.name.clone(),
                        expected: param.param_type,
                    });
                }
            }
            if let Some(default) = &param.default {
                if param.required {
                    return Err(SchemaError::RequiredWithDefault {
                        tool,
                        name: param.name.clone(),
                    });
                }
                if !param.param_type.accepts(default) {
                    return Err(SchemaError::DefaultTypeMismatch {
                        tool,
                        name: param.name.clone(),
                        expected: param.param_type,
                    });
                }
                if let Some(allowed) = &param.allowed {
                    if !allowed.contains(default) {
                        return Err(SchemaError::DefaultNotAllowed {
                            tool,
                            name: param.name.clone(),
                        });
                    }
                }
            }
        }

        Ok(Self {
            name: tool,
            description: description.to_string(),
            parameters,
        })
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[inline]
    pub fn parameters(&self) -> &[ToolParameter] {
        &self.parameters
    }

    /// JSON Schema describing the tool's arguments.
    #[inline]
    pub fn input_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .parameters
            .iter()
            .map(|p| (p.name.clone(), p.schema()))
            .collect();
        let required: Vec<&str> = self
            .parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

/// A single problem found while validating arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum Violation {
    MissingRequired {
        name: String,
    },
    WrongType {
        name: String,
        expected: ParamType,
        actual: &'static str,
    },
    NotAllowed {
        name: String,
        value: Value,
        allowed: Vec<Value>,
    },
}

impl fmt::Display for Violation {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRequired { name } => write!(f, "missing required parameter: {}", name),
            Self::WrongType {
                name,
                expected,
                actual,
            } => write!(
                f,
                "parameter '{}' expected {}, got {}",
                name, expected, actual
            ),
            Self::NotAllowed {
                name,
                value,
                allowed,
            } => {
                let allowed: Vec<String> = allowed.iter().map(display_value).collect();
                write!(
                    f,
                    "parameter '{}' has disallowed value {}; allowed values: {}",
                    name,
                    display_value(value),
                    allowed.join(", ")
                )
            }
        }
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Check `args` against `parameters`.
///
/// A JSON `null` counts as absent. Defaults are filled in for absent optional
/// parameters, and arguments that are not declared are dropped.
#[inline]
pub fn validate_arguments(
    parameters: &[ToolParameter],
    args: &Map<String, Value>,
) -> Result<ValidatedArgs, Vec<Violation>> {
    let mut values = Map::new();
    let mut violations = Vec::new();

    for param in parameters {
        let provided = args.get(&param.name).filter(|v| !v.is_null());

        let Some(value) = provided else {
            if param.required {
                violations.push(Violation::MissingRequired {
                    name: param.name.clone(),
                });
            } else if let Some(default) = &param.default {
                values.insert(param.name.clone(), default.clone());
            }
            continue;
        };

        if !param.param_type.accepts(value) {
            violations.push(Violation::WrongType {
                name: param.name.clone(),
                expected: param.param_type,
                actual: type_name(value),
            });
            continue;
        }

        let value = match &param.allowed {
            Some(allowed) => match param.match_allowed(allowed, value) {
                Some(canonical) => canonical.clone(),
                None => {
                    violations.push(Violation::NotAllowed {
                        name: param.name.clone(),
                        value: value.clone(),
                        allowed: allowed.clone(),
                    });
                    continue;
                }
            },
            None => value.clone(),
        };

        values.insert(param.name.clone(), value);
    }

    if violations.is_empty() {
        Ok(ValidatedArgs { values })
    } else {
        Err(violations)
    }
}

/// Arguments that passed [`validate_arguments`], with defaults applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedArgs {
    values: Map<String, Value>,
}

impl ValidatedArgs {
    #[inline]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Required string argument.
    #[inline]
    pub fn str(&self, name: &str) -> Result<&str, ToolError> {
        self.opt_str(name)
            .ok_or_else(|| ToolError::InvalidInput(format!("missing string argument: {}", name)))
    }

    #[inline]
    pub fn opt_str(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(Value::as_str)
    }

    /// Required numeric argument.
    #[inline]
    pub fn f64(&self, name: &str) -> Result<f64, ToolError> {
        self.values
            .get(name)
            .and_then(Value::as_f64)
            .ok_or_else(|| ToolError::InvalidInput(format!("missing numeric argument: {}", name)))
    }

    #[inline]
    pub fn opt_i64(&self, name: &str) -> Option<i64> {
        self.values.get(name).and_then(Value::as_i64)
    }

    #[inline]
    pub fn opt_bool(&self, name: &str) -> Option<bool> {
        self.values.get(name).and_then(Value::as_bool)
    }

    #[inline]
    pub fn opt_object(&self, name: &str) -> Option<&Map<String, Value>> {
        self.values.get(name).and_then(Value::as_object)
    }

    #[inline]
    pub fn into_inner(self) -> Map<String, Value> {
        self.values
    }
}

impl From<Map<String, Value>> for ValidatedArgs {
    #[inline]
    fn from(values: Map<String, Value>) -> Self {
        Self { values }
    }
}

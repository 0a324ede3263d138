//! JSON inspection tool backed by [`crate::analysis`].

#[cfg(test)]
mod tests;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::str::FromStr;

use crate::analysis::{self, DEFAULT_MAX_DEPTH, TransformKind};
use crate::tools::{
    McpTool, ParamType, ToolDescriptor, ToolError, ToolParameter, ToolResult, ValidatedArgs,
};

/// Data processor settings, also the `[data_processor]` section of the
/// config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataProcessorConfig {
    /// Depth at which `analyze` stops expanding objects.
    pub max_depth: usize,
}

impl Default for DataProcessorConfig {
    #[inline]
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataOperation {
    Analyze,
    Transform,
    Validate,
    Summarize,
}

impl DataOperation {
    pub const NAMES: [&'static str; 4] = ["analyze", "transform", "validate", "summarize"];

    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Analyze => "analyze",
            Self::Transform => "transform",
            Self::Validate => "validate",
            Self::Summarize => "summarize",
        }
    }
}

impl FromStr for DataOperation {
    type Err = ToolError;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "analyze" => Ok(Self::Analyze),
            "transform" => Ok(Self::Transform),
            "validate" => Ok(Self::Validate),
            "summarize" => Ok(Self::Summarize),
            other => Err(ToolError::InvalidInput(format!(
                "operation '{}' is not supported",
                other
            ))),
        }
    }
}

#[derive(Debug)]
pub struct DataProcessorTool {
    descriptor: ToolDescriptor,
    config: DataProcessorConfig,
}

impl DataProcessorTool {
    #[inline]
    pub fn new(config: DataProcessorConfig) -> Result<Self, ToolError> {
        let descriptor = ToolDescriptor::new(
            "data_processor",
            "Analyze, transform, validate or summarize JSON data",
            vec![
                ToolParameter::required("operation", ParamType::String, "Processing operation")
                    .with_allowed(DataOperation::NAMES),
                ToolParameter::required("data", ParamType::String, "Data as JSON text"),
                ToolParameter::optional("options", ParamType::Object, "Operation options"),
            ],
        )?;
        Ok(Self { descriptor, config })
    }

    /// Run `operation` over already parsed data.
    #[inline]
    pub fn process(
        &self,
        operation: DataOperation,
        data: &Value,
        options: &Map<String, Value>,
    ) -> Result<Value, ToolError> {
        let result = match operation {
            DataOperation::Analyze => {
                let max_depth = match options.get("max_depth") {
                    None | Some(Value::Null) => self.config.max_depth,
                    Some(v) => v
                        .as_u64()
                        .and_then(|d| usize::try_from(d).ok())
                        .ok_or_else(|| {
                            ToolError::InvalidInput(
                                "options.max_depth must be a non-negative integer".to_string(),
                            )
                        })?,
                };
                analysis::analyze_structure(data, max_depth)
            }
            DataOperation::Transform => {
                let kind = match options.get("type") {
                    None | Some(Value::Null) => TransformKind::UppercaseKeys,
                    Some(Value::String(name)) => TransformKind::parse(name),
                    Some(_) => {
                        return Err(ToolError::InvalidInput(
                            "options.type must be a string".to_string(),
                        ));
                    }
                };
                analysis::transform(data, kind)
            }
            DataOperation::Validate => {
                let required = required_fields(options)?;
                serde_json::to_value(analysis::validate(data, &required))?
            }
            DataOperation::Summarize => serde_json::to_value(analysis::summarize(data))?,
        };
        Ok(result)
    }
}

fn required_fields(options: &Map<String, Value>) -> Result<Vec<String>, ToolError> {
    let invalid =
        || ToolError::InvalidInput("options.required_fields must be an array of strings".to_string());

    match options.get("required_fields") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| item.as_str().map(String::from).ok_or_else(invalid))
            .collect(),
        Some(_) => Err(invalid()),
    }
}

#[async_trait]
impl McpTool for DataProcessorTool {
    #[inline]
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn execute(&self, args: ValidatedArgs) -> Result<ToolResult, ToolError> {
        let operation: DataOperation = args.str("operation")?.parse()?;
        let raw = args.str("data")?;
        let data: Value = serde_json::from_str(raw)
            .map_err(|e| ToolError::InvalidInput(format!("invalid JSON data: {}", e)))?;
        let options = args.opt_object("options").cloned().unwrap_or_default();

        let result = self.process(operation, &data, &options)?;

        Ok(ToolResult::success(serde_json::to_string_pretty(&result)?)
            .with_metadata("operation", operation.as_str())
            .with_metadata("data_size", json!(raw.chars().count())))
    }
}

//! Basic example tools: echo, calculator and text analyzer.

use async_trait::async_trait;
use serde_json::{Value, json};
use std::fmt::Write as _;
use std::str::FromStr;

use crate::tools::{
    McpTool, ParamType, SchemaError, ToolDescriptor, ToolError, ToolParameter, ToolResult,
    ValidatedArgs,
};

/// Echoes the supplied message back.
#[derive(Debug)]
pub struct EchoTool {
    descriptor: ToolDescriptor,
}

impl EchoTool {
    #[inline]
    pub fn new() -> Result<Self, SchemaError> {
        let descriptor = ToolDescriptor::new(
            "echo",
            "Echo the message provided by the user",
            vec![ToolParameter::required(
                "message",
                ParamType::String,
                "Message to echo",
            )],
        )?;
        Ok(Self { descriptor })
    }
}

#[async_trait]
impl McpTool for EchoTool {
    #[inline]
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    #[inline]
    async fn execute(&self, args: ValidatedArgs) -> Result<ToolResult, ToolError> {
        let message = args.str("message")?;
        if message.is_empty() {
            return Err(ToolError::InvalidInput("message cannot be empty".to_string()));
        }
        Ok(ToolResult::success(format!("Echo: {}", message)))
    }
}

/// Arithmetic operation supported by [`CalculatorTool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operation {
    pub const NAMES: [&'static str; 4] = ["add", "subtract", "multiply", "divide"];

    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Subtract => "subtract",
            Self::Multiply => "multiply",
            Self::Divide => "divide",
        }
    }
}

impl FromStr for Operation {
    type Err = ToolError;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add" => Ok(Self::Add),
            "subtract" => Ok(Self::Subtract),
            "multiply" => Ok(Self::Multiply),
            "divide" => Ok(Self::Divide),
            other => Err(ToolError::InvalidInput(format!(
                "operation '{}' is not supported",
                other
            ))),
        }
    }
}

/// Basic arithmetic on two numbers.
#[derive(Debug)]
pub struct CalculatorTool {
    descriptor: ToolDescriptor,
}

impl CalculatorTool {
    #[inline]
    pub fn new() -> Result<Self, SchemaError> {
        let descriptor = ToolDescriptor::new(
            "calculator",
            "Perform basic arithmetic operations",
            vec![
                ToolParameter::required("operation", ParamType::String, "Operation to perform")
                    .with_allowed(Operation::NAMES),
                ToolParameter::required("a", ParamType::Number, "First number"),
                ToolParameter::required("b", ParamType::Number, "Second number"),
            ],
        )?;
        Ok(Self { descriptor })
    }
}

/// Integer result when both operands are integers and the operation stays in
/// the integers without overflowing.
fn integer_result(op: Operation, a: &Value, b: &Value) -> Option<i64> {
    let (a, b) = (a.as_i64()?, b.as_i64()?);
    match op {
        Operation::Add => a.checked_add(b),
        Operation::Subtract => a.checked_sub(b),
        Operation::Multiply => a.checked_mul(b),
        Operation::Divide => None,
    }
}

#[async_trait]
impl McpTool for CalculatorTool {
    #[inline]
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn execute(&self, args: ValidatedArgs) -> Result<ToolResult, ToolError> {
        let op: Operation = args.str("operation")?.parse()?;
        let a = args.f64("a")?;
        let b = args.f64("b")?;

        if op == Operation::Divide && b == 0.0 {
            return Err(ToolError::InvalidInput(
                "division by zero is not allowed".to_string(),
            ));
        }

        let raw_a = args.get("a").cloned().unwrap_or(Value::Null);
        let raw_b = args.get("b").cloned().unwrap_or(Value::Null);

        let result = match integer_result(op, &raw_a, &raw_b) {
            Some(n) => json!(n),
            None => {
                let value = match op {
                    Operation::Add => a + b,
                    Operation::Subtract => a - b,
                    Operation::Multiply => a * b,
                    Operation::Divide => a / b,
                };
                json!(value)
            }
        };

        let rendered = match result.as_f64() {
            Some(f) if !result.is_i64() => format!("{:?}", f),
            _ => result.to_string(),
        };

        Ok(
            ToolResult::success(format!("{} {} {} = {}", raw_a, op.as_str(), raw_b, rendered))
                .with_metadata("result", result),
        )
    }
}

/// Basic statistics over a piece of text.
#[derive(Debug)]
pub struct TextAnalyzerTool {
    descriptor: ToolDescriptor,
}

impl TextAnalyzerTool {
    #[inline]
    pub fn new() -> Result<Self, SchemaError> {
        let descriptor = ToolDescriptor::new(
            "text_analyzer",
            "Analyze text and report basic statistics",
            vec![
                ToolParameter::required("text", ParamType::String, "Text to analyze"),
                ToolParameter::optional(
                    "include_words",
                    ParamType::Boolean,
                    "Include word statistics",
                )
                .with_default(json!(true)),
            ],
        )?;
        Ok(Self { descriptor })
    }
}

fn title_case(key: &str) -> String {
    key.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[async_trait]
impl McpTool for TextAnalyzerTool {
    #[inline]
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn execute(&self, args: ValidatedArgs) -> Result<ToolResult, ToolError> {
        let text = args.str("text")?;
        if text.is_empty() {
            return Err(ToolError::InvalidInput("text cannot be empty".to_string()));
        }
        let include_words = args.opt_bool("include_words").unwrap_or(true);

        let mut stats: Vec<(&str, Value)> = vec![
            ("characters", json!(text.chars().count())),
            ("lines", json!(text.matches('\n').count() + 1)),
            (
                "characters_no_spaces",
                json!(text.chars().filter(|c| *c != ' ').count()),
            ),
        ];

        if include_words {
            let words: Vec<&str> = text.split_whitespace().collect();
            stats.push(("words", json!(words.len())));
            let avg = if words.is_empty() {
                json!(0)
            } else {
                let total: usize = words.iter().map(|w| w.chars().count()).sum();
                json!(total as f64 / words.len() as f64)
            };
            stats.push(("avg_word_length", avg));
        }

        let mut report = String::from("=== Text Analysis ===");
        for (key, value) in &stats {
            let rendered = match value {
                Value::Number(n) if n.is_f64() => format!("{:.2}", n.as_f64().unwrap_or_default()),
                other => other.to_string(),
            };
            let _ = write!(report, "\n{}: {}", title_case(key), rendered);
        }

        let mut result = ToolResult::success(report);
        for (key, value) in stats {
            result = result.with_metadata(key, value);
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn args(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("test arguments must be an object"),
        }
    }

    #[tokio::test]
    async fn echo_returns_message() {
        let tool = EchoTool::new().expect("valid descriptor");
        let result = tool.safe_execute(args(json!({"message": "hello"}))).await;
        assert_eq!(result.content(), Some(&json!("Echo: hello")));
    }

    #[tokio::test]
    async fn echo_rejects_empty_message() {
        let tool = EchoTool::new().expect("valid descriptor");
        let result = tool.safe_execute(args(json!({"message": ""}))).await;
        assert!(!result.is_success());
        assert!(result.error().is_some_and(|e| e.contains("cannot be empty")));
    }

    #[tokio::test]
    async fn calculator_integer_arithmetic() {
        let tool = CalculatorTool::new().expect("valid descriptor");
        let result = tool
            .safe_execute(args(json!({"operation": "add", "a": 5, "b": 3})))
            .await;
        assert_eq!(result.content(), Some(&json!("5 add 3 = 8")));
    }

    #[tokio::test]
    async fn calculator_division_is_float() {
        let tool = CalculatorTool::new().expect("valid descriptor");
        let result = tool
            .safe_execute(args(json!({"operation": "divide", "a": 6, "b": 3})))
            .await;
        assert_eq!(result.content(), Some(&json!("6 divide 3 = 2.0")));
    }

    #[tokio::test]
    async fn calculator_rejects_division_by_zero() {
        let tool = CalculatorTool::new().expect("valid descriptor");
        let result = tool
            .safe_execute(args(json!({"operation": "divide", "a": 1, "b": 0})))
            .await;
        assert!(result.error().is_some_and(|e| e.contains("division by zero")));
    }

    #[tokio::test]
    async fn calculator_rejects_unknown_operation() {
        let tool = CalculatorTool::new().expect("valid descriptor");
        let result = tool
            .safe_execute(args(json!({"operation": "modulo", "a": 1, "b": 2})))
            .await;
        assert!(result.error().is_some_and(|e| e.contains("disallowed value modulo")));
    }

    #[tokio::test]
    async fn text_analyzer_report() {
        let tool = TextAnalyzerTool::new().expect("valid descriptor");
        let result = tool
            .safe_execute(args(json!({"text": "hello big\nworld"})))
            .await;
        let text = result.text();
        assert!(text.starts_with("=== Text Analysis ==="));
        assert!(text.contains("Characters: 15"));
        assert!(text.contains("Lines: 2"));
        assert!(text.contains("Characters No Spaces: 14"));
        assert!(text.contains("Words: 3"));
        assert!(text.contains("Avg Word Length: 4.33"));
    }

    #[tokio::test]
    async fn text_analyzer_without_words() {
        let tool = TextAnalyzerTool::new().expect("valid descriptor");
        let result = tool
            .safe_execute(args(json!({"text": "abc", "include_words": false})))
            .await;
        assert!(!result.text().contains("Words"));
        assert_eq!(
            result.metadata().and_then(|m| m.get("characters")),
            Some(&json!(3))
        );
    }

    #[test]
    fn title_case_keys() {
        assert_eq!(title_case("characters_no_spaces"), "Characters No Spaces");
        assert_eq!(title_case("lines"), "Lines");
    }
}

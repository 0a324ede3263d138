use super::*;
use crate::config::Config;
use serde_json::json;

fn args(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => panic!("test arguments must be an object"),
    }
}

/// Echoes its validated arguments back as content.
struct Reflect {
    descriptor: ToolDescriptor,
}

impl Reflect {
    fn new() -> Self {
        let descriptor = ToolDescriptor::new(
            "reflect",
            "Return validated arguments",
            vec![
                ToolParameter::required("name", ParamType::String, "A name"),
                ToolParameter::required("count", ParamType::Integer, "A count"),
                ToolParameter::optional("mode", ParamType::String, "A mode")
                    .with_default(json!("fast"))
                    .with_allowed(["fast", "slow"])
                    .case_insensitive(),
            ],
        )
        .expect("valid descriptor");
        Self { descriptor }
    }
}

#[async_trait]
impl McpTool for Reflect {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn execute(&self, args: ValidatedArgs) -> Result<ToolResult, ToolError> {
        Ok(ToolResult::success(Value::Object(args.into_inner())))
    }
}

struct Panicky {
    descriptor: ToolDescriptor,
}

#[async_trait]
impl McpTool for Panicky {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn execute(&self, _args: ValidatedArgs) -> Result<ToolResult, ToolError> {
        panic!("kaboom");
    }
}

struct Failing {
    descriptor: ToolDescriptor,
}

#[async_trait]
impl McpTool for Failing {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn execute(&self, _args: ValidatedArgs) -> Result<ToolResult, ToolError> {
        Err(ToolError::NotFound("record 7".to_string()))
    }
}

fn bare(name: &str) -> ToolDescriptor {
    ToolDescriptor::new(name, "test tool", Vec::new()).expect("valid descriptor")
}

#[tokio::test]
async fn defaults_are_applied() {
    let result = Reflect::new()
        .safe_execute(args(json!({"name": "a", "count": 2})))
        .await;
    assert_eq!(
        result.content(),
        Some(&json!({"name": "a", "count": 2, "mode": "fast"}))
    );
}

#[tokio::test]
async fn null_counts_as_absent() {
    let result = Reflect::new()
        .safe_execute(args(json!({"name": "a", "count": 2, "mode": null})))
        .await;
    assert_eq!(result.content().map(|c| &c["mode"]), Some(&json!("fast")));

    let missing = Reflect::new()
        .safe_execute(args(json!({"name": null, "count": 2})))
        .await;
    assert!(
        missing
            .error()
            .is_some_and(|e| e.contains("missing required parameter: name"))
    );
}

#[tokio::test]
async fn violations_are_joined() {
    let result = Reflect::new().safe_execute(args(json!({"count": "two"}))).await;
    assert_eq!(
        result.error(),
        Some(
            "tool 'reflect' failed: validation failed: missing required parameter: name; \
             parameter 'count' expected integer, got string"
        )
    );
}

#[tokio::test]
async fn enum_values_are_canonicalized() {
    let result = Reflect::new()
        .safe_execute(args(json!({"name": "a", "count": 1, "mode": "SLOW"})))
        .await;
    assert_eq!(result.content().map(|c| &c["mode"]), Some(&json!("slow")));

    let rejected = Reflect::new()
        .safe_execute(args(json!({"name": "a", "count": 1, "mode": "warp"})))
        .await;
    assert!(
        rejected
            .error()
            .is_some_and(|e| e.contains("parameter 'mode' has disallowed value warp"))
    );
}

#[tokio::test]
async fn unknown_arguments_are_dropped() {
    let result = Reflect::new()
        .safe_execute(args(json!({"name": "a", "count": 1, "extra": true})))
        .await;
    assert!(result.content().is_some_and(|c| c.get("extra").is_none()));
}

#[tokio::test]
async fn panics_become_failures() {
    let tool = Panicky {
        descriptor: bare("panicky"),
    };
    let result = tool.safe_execute(Map::new()).await;
    assert_eq!(
        result.error(),
        Some("tool 'panicky' failed: unexpected error: kaboom")
    );
}

#[tokio::test]
async fn errors_become_failures() {
    let tool = Failing {
        descriptor: bare("failing"),
    };
    let result = tool.safe_execute(Map::new()).await;
    assert_eq!(result.error(), Some("tool 'failing' failed: record 7"));
}

#[test]
fn descriptor_rejects_inconsistent_parameters() {
    let duplicate = ToolDescriptor::new(
        "dup",
        "",
        vec![
            ToolParameter::required("x", ParamType::String, ""),
            ToolParameter::optional("x", ParamType::String, ""),
        ],
    );
    assert!(matches!(
        duplicate,
        Err(SchemaError::DuplicateParameter { .. })
    ));

    let bad_default = ToolDescriptor::new(
        "t",
        "",
        vec![ToolParameter::optional("n", ParamType::Integer, "").with_default(json!("ten"))],
    );
    assert!(matches!(
        bad_default,
        Err(SchemaError::DefaultTypeMismatch { .. })
    ));

    let required_default = ToolDescriptor::new(
        "t",
        "",
        vec![ToolParameter::required("n", ParamType::Integer, "").with_default(json!(1))],
    );
    assert!(matches!(
        required_default,
        Err(SchemaError::RequiredWithDefault { .. })
    ));

    let outside_enum = ToolDescriptor::new(
        "t",
        "",
        vec![
            ToolParameter::optional("m", ParamType::String, "")
                .with_default(json!("c"))
                .with_allowed(["a", "b"]),
        ],
    );
    assert!(matches!(
        outside_enum,
        Err(SchemaError::DefaultNotAllowed { .. })
    ));

    assert_eq!(
        ToolDescriptor::new(" ", "", Vec::new()),
        Err(SchemaError::EmptyToolName)
    );
}

#[test]
fn input_schema_lists_required_parameters() {
    let schema = Reflect::new().descriptor().input_schema();
    assert_eq!(schema["type"], "object");
    assert_eq!(schema["required"], json!(["name", "count"]));
    assert_eq!(schema["properties"]["count"]["type"], "integer");
    assert_eq!(schema["properties"]["mode"]["enum"], json!(["fast", "slow"]));
    assert_eq!(schema["properties"]["mode"]["default"], "fast");
    assert!(schema["properties"]["name"].get("default").is_none());
}

#[tokio::test]
async fn registry_dispatches_by_name() {
    let registry = ToolRegistry::basic().expect("basic registry");
    assert_eq!(registry.names(), vec!["calculator", "echo", "text_analyzer"]);

    let result = registry
        .call("echo", args(json!({"message": "ping"})))
        .await;
    assert_eq!(result.content(), Some(&json!("Echo: ping")));

    let missing = registry.call("nope", Map::new()).await;
    assert_eq!(missing.error(), Some("tool 'nope' not found"));
}

#[test]
fn registry_rejects_duplicates() {
    let mut registry = ToolRegistry::basic().expect("basic registry");
    let again = basic::EchoTool::new().expect("valid descriptor");
    assert!(registry.register(again).is_err());
    assert_eq!(registry.len(), 3);
}

#[test]
fn default_registry_has_all_tools() {
    let registry = ToolRegistry::with_default_tools(&Config::default()).expect("default registry");
    assert_eq!(
        registry.names(),
        vec![
            "calculator",
            "data_processor",
            "echo",
            "file_manager",
            "text_analyzer",
            "web_api"
        ]
    );
    assert_eq!(registry.descriptors().len(), 6);
}

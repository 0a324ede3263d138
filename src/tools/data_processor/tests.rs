use super::*;

fn tool() -> DataProcessorTool {
    DataProcessorTool::new(DataProcessorConfig::default()).expect("tool builds")
}

fn args(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => panic!("test arguments must be an object"),
    }
}

fn parsed_content(result: &ToolResult) -> Value {
    assert!(result.is_success(), "{:?}", result);
    serde_json::from_str(&result.text()).expect("content is JSON")
}

#[tokio::test]
async fn analyze_reports_structure_and_metadata() {
    let data = r#"{"users": [{"id": 1}], "total": 1}"#;
    let result = tool()
        .safe_execute(args(json!({"operation": "analyze", "data": data})))
        .await;

    let analysis = parsed_content(&result);
    assert_eq!(analysis["type"], "object");
    assert_eq!(analysis["keys"], json!(["users", "total"]));
    assert_eq!(analysis["children"]["users"]["type"], "array");

    let meta = result.metadata().expect("metadata");
    assert_eq!(meta["operation"], "analyze");
    assert_eq!(meta["data_size"], json!(data.chars().count()));
}

#[tokio::test]
async fn analyze_honours_max_depth_option() {
    let result = tool()
        .safe_execute(args(json!({
            "operation": "analyze",
            "data": r#"{"a": {"b": 1}}"#,
            "options": {"max_depth": 0}
        })))
        .await;
    let analysis = parsed_content(&result);
    assert_eq!(analysis["children"], json!({}));
}

#[tokio::test]
async fn transform_defaults_to_uppercase_keys() {
    let result = tool()
        .safe_execute(args(json!({"operation": "transform", "data": r#"{"name": "x"}"#})))
        .await;
    assert_eq!(parsed_content(&result), json!({"NAME": "x"}));
}

#[tokio::test]
async fn transform_flatten() {
    let result = tool()
        .safe_execute(args(json!({
            "operation": "transform",
            "data": r#"{"a": {"b": {"c": 1}}}"#,
            "options": {"type": "flatten"}
        })))
        .await;
    assert_eq!(parsed_content(&result), json!({"a.b.c": 1}));
}

#[tokio::test]
async fn validate_with_required_fields() {
    let result = tool()
        .safe_execute(args(json!({
            "operation": "validate",
            "data": r#"{"name": "Alice"}"#,
            "options": {"required_fields": ["name", "age"]}
        })))
        .await;
    let report = parsed_content(&result);
    assert_eq!(report["valid"], false);
    assert_eq!(report["errors"], json!(["required field missing: age"]));
    assert_eq!(report["warnings"], json!([]));
    assert_eq!(report["data_type"], "object");
}

#[tokio::test]
async fn validate_rejects_malformed_required_fields() {
    let result = tool()
        .safe_execute(args(json!({
            "operation": "validate",
            "data": "{}",
            "options": {"required_fields": "name"}
        })))
        .await;
    assert!(result.error().is_some_and(|e| e.contains("required_fields")));
}

#[tokio::test]
async fn summarize_array() {
    let result = tool()
        .safe_execute(args(json!({"operation": "summarize", "data": "[1, \"a\", 2]"})))
        .await;
    let summary = parsed_content(&result);
    assert_eq!(summary["data_type"], "array");
    assert_eq!(summary["length"], 3);
    assert_eq!(summary["item_types"], json!(["integer", "string"]));
}

#[tokio::test]
async fn malformed_json_is_reported() {
    let result = tool()
        .safe_execute(args(json!({"operation": "analyze", "data": "{not json"})))
        .await;
    assert!(
        result
            .error()
            .is_some_and(|e| e.starts_with("tool 'data_processor' failed: invalid JSON data: "))
    );
}

#[tokio::test]
async fn unsupported_operation_is_rejected() {
    let result = tool()
        .safe_execute(args(json!({"operation": "explode", "data": "{}"})))
        .await;
    assert!(!result.is_success());
}

#[test]
fn operation_parsing() {
    assert_eq!("summarize".parse::<DataOperation>().ok(), Some(DataOperation::Summarize));
    let err = "explode".parse::<DataOperation>().expect_err("unknown operation");
    assert_eq!(err.to_string(), "operation 'explode' is not supported");
}

use super::*;
use serde_json::json;

fn sample_data() -> Value {
    json!({
        "users": [
            {"id": 1, "name": "Alice", "email": "alice@example.com", "age": 30},
            {"id": 2, "name": "Bob", "email": "bob@example.com", "age": 25}
        ],
        "metadata": {
            "total": 2,
            "created_at": "2023-01-01T00:00:00Z"
        }
    })
}

#[test]
fn analyze_object_lists_keys_in_order() {
    let analysis = analyze_structure(&sample_data(), DEFAULT_MAX_DEPTH);

    assert_eq!(analysis["type"], "object");
    assert_eq!(analysis["keys"], json!(["users", "metadata"]));
    assert_eq!(analysis["key_count"], 2);
    assert_eq!(analysis["depth"], 0);
    assert_eq!(
        analysis["total_size"],
        json!(serialized_size(&sample_data()))
    );
}

#[test]
fn analyze_children_keys_match_object_keys() {
    let data = json!({"a": 1, "b": {"c": true}, "d": [1, 2]});
    let analysis = analyze_structure(&data, DEFAULT_MAX_DEPTH);

    let children = analysis["children"].as_object().expect("children is a map");
    let keys: Vec<&String> = children.keys().collect();
    assert_eq!(keys, vec!["a", "b", "d"]);
    assert_eq!(children["a"]["type"], "integer");
    assert_eq!(children["a"]["depth"], 1);
    assert_eq!(children["b"]["children"]["c"]["type"], "boolean");
}

#[test]
fn analyze_stops_expanding_objects_at_max_depth() {
    let data = json!({"l1": {"l2": {"l3": {"l4": 1}}}});
    let analysis = analyze_structure(&data, DEFAULT_MAX_DEPTH);

    let level3 = &analysis["children"]["l1"]["children"]["l2"]["children"]["l3"];
    assert_eq!(level3["type"], "object");
    assert_eq!(level3["depth"], 3);
    assert_eq!(level3["keys"], json!(["l4"]));
    assert_eq!(level3["children"], json!({}));
}

#[test]
fn analyze_array_samples_ignore_depth_bound() {
    // Arrays keep sampling below the object cutoff.
    let data = json!([[[["deep"]]]]);
    let analysis = analyze_structure(&data, 1);

    let innermost = &analysis["sample_items"][0]["sample_items"][0]["sample_items"][0];
    assert_eq!(innermost["type"], "array");
    assert_eq!(innermost["depth"], 3);
    assert_eq!(innermost["sample_items"][0]["type"], "string");
    assert_eq!(innermost["sample_items"][0]["depth"], 4);
}

#[test]
fn analyze_array_samples_first_three() {
    let analysis = analyze_structure(&json!([1, 2, 3, 4, 5]), DEFAULT_MAX_DEPTH);
    assert_eq!(analysis["type"], "array");
    assert_eq!(analysis["length"], 5);
    assert_eq!(analysis["sample_items"].as_array().map(Vec::len), Some(3));
}

#[test]
fn analyze_empty_containers() {
    let empty_object = analyze_structure(&json!({}), DEFAULT_MAX_DEPTH);
    assert_eq!(empty_object["keys"], json!([]));
    assert_eq!(empty_object["key_count"], 0);

    let empty_array = analyze_structure(&json!([]), DEFAULT_MAX_DEPTH);
    assert_eq!(empty_array["length"], 0);
    assert_eq!(empty_array["sample_items"], json!([]));
}

#[test]
fn analyze_truncates_long_scalars() {
    let long = "x".repeat(250);
    let analysis = analyze_structure(&json!(long), DEFAULT_MAX_DEPTH);
    assert_eq!(analysis["type"], "string");
    assert_eq!(analysis["value"].as_str().map(str::len), Some(100));
}

#[test]
fn scalar_type_names() {
    assert_eq!(type_name(&json!(null)), "null");
    assert_eq!(type_name(&json!(true)), "boolean");
    assert_eq!(type_name(&json!(3)), "integer");
    assert_eq!(type_name(&json!(3.5)), "float");
    assert_eq!(type_name(&json!("s")), "string");
}

#[test]
fn uppercase_keys_is_top_level_only() {
    let data = json!({"name": "test", "nested": {"inner": 1}});
    let result = transform(&data, TransformKind::UppercaseKeys);
    assert_eq!(result, json!({"NAME": "test", "NESTED": {"inner": 1}}));
}

#[test]
fn uppercase_keys_idempotent_on_uppercase_object() {
    let data = json!({"NAME": "x", "VALUE": 1});
    let once = transform(&data, TransformKind::UppercaseKeys);
    let twice = transform(&once, TransformKind::UppercaseKeys);
    assert_eq!(once, data);
    assert_eq!(twice, data);
}

#[test]
fn transforms_leave_non_objects_unchanged() {
    let data = json!([{"a": 1}, "b"]);
    assert_eq!(transform(&data, TransformKind::UppercaseKeys), data);
    assert_eq!(transform(&data, TransformKind::Flatten), data);
    assert_eq!(transform(&json!(42), TransformKind::Flatten), json!(42));
}

#[test]
fn flatten_nested_objects() {
    let data = json!({"a": {"b": {"c": 1}}});
    assert_eq!(transform(&data, TransformKind::Flatten), json!({"a.b.c": 1}));
}

#[test]
fn flatten_keeps_arrays_as_leaves() {
    let data = json!({
        "user": {
            "profile": {"name": "Alice", "age": 30},
            "tags": ["x", {"y": 1}]
        },
        "empty": {},
        "top": null
    });
    let flat = transform(&data, TransformKind::Flatten);
    assert_eq!(
        flat,
        json!({
            "user.profile.name": "Alice",
            "user.profile.age": 30,
            "user.tags": ["x", {"y": 1}],
            "top": null
        })
    );
}

#[test]
fn unknown_transform_is_identity() {
    assert_eq!(TransformKind::parse("reverse"), TransformKind::Identity);
    let data = json!({"k": "v"});
    assert_eq!(transform(&data, TransformKind::parse("reverse")), data);
}

#[test]
fn validate_required_fields_present() {
    let data = json!({"name": "Alice", "age": 30});
    let report = validate(&data, &["name".to_string(), "age".to_string()]);
    assert!(report.valid);
    assert!(report.errors.is_empty());
    assert!(report.warnings.is_empty());
    assert_eq!(report.data_type, "object");
}

#[test]
fn validate_reports_each_missing_field() {
    let data = json!({"name": "Alice"});
    let report = validate(&data, &["name".to_string(), "age".to_string()]);
    assert!(!report.valid);
    assert_eq!(report.errors, vec!["required field missing: age".to_string()]);
}

#[test]
fn validate_skips_non_objects() {
    let report = validate(&json!([1, 2]), &["id".to_string()]);
    assert!(report.valid);
    assert!(report.errors.is_empty());
    assert_eq!(report.data_type, "array");
}

#[test]
fn summarize_object() {
    let summary = summarize(&sample_data());
    assert_eq!(summary.data_type, "object");
    assert_eq!(summary.size, serialized_size(&sample_data()));
    match summary.shape {
        SummaryShape::Object {
            key_count,
            keys,
            has_nested_objects,
        } => {
            assert_eq!(key_count, 2);
            assert_eq!(keys, vec!["users".to_string(), "metadata".to_string()]);
            assert!(has_nested_objects);
        }
        other => panic!("expected object summary, got {:?}", other),
    }
}

#[test]
fn summarize_object_caps_keys_at_ten() {
    let mut map = Map::new();
    for i in 0..15 {
        map.insert(format!("k{}", i), json!(i));
    }
    let summary = summarize(&Value::Object(map));
    let json = serde_json::to_value(&summary).expect("summary serializes");
    assert_eq!(json["key_count"], 15);
    assert_eq!(json["keys"].as_array().map(Vec::len), Some(10));
    assert_eq!(json["keys"][0], "k0");
    assert_eq!(json["has_nested_objects"], false);
}

#[test]
fn summarize_mixed_array() {
    let data = json!([1, 2, "three", {"four": 4}, [5, 6]]);
    let json = serde_json::to_value(summarize(&data)).expect("summary serializes");

    assert_eq!(json["data_type"], "array");
    assert_eq!(json["length"], 5);
    assert_eq!(
        json["item_types"],
        json!(["integer", "string", "object", "array"])
    );
    assert_eq!(json["sample_items"], json!([1, 2, "three"]));
}

#[test]
fn summarize_scalar_has_only_type_and_size() {
    let json = serde_json::to_value(summarize(&json!("hello"))).expect("summary serializes");
    assert_eq!(json, json!({"data_type": "string", "size": 7}));
}

#[test]
fn serialized_size_counts_spaced_separators() {
    assert_eq!(serialized_size(&json!({"a": 1, "b": [1, 2]})), 22);
}

#[test]
fn serialized_size_escapes_non_ascii() {
    let data = json!({"name": "café", "tags": ["ü"], "n": {"x": null}});
    assert_eq!(serialized_size(&data), 59);
    assert_eq!(analyze_structure(&data, DEFAULT_MAX_DEPTH)["total_size"], 59);

    // Outside the BMP the escape is a surrogate pair.
    assert_eq!(summarize(&json!("😀")).size, 14);
    assert_eq!(summarize(&json!("a\"b\n")).size, 8);
}

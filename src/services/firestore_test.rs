use super::*;
use serde_json::json;

#[test]
fn decode_string_field() {
    let fields = json!({"role": {"stringValue": "admin"}}).as_object().cloned().unwrap();
    let record = decode_fields(fields);
    assert_eq!(record["role"], "admin");
}

#[test]
fn decode_integer_from_string() {
    assert_eq!(decode_value(json!({"integerValue": "42"})), json!(42));
}

#[test]
fn decode_boolean_and_null() {
    assert_eq!(decode_value(json!({"booleanValue": true})), json!(true));
    assert_eq!(decode_value(json!({"nullValue": null})), Value::Null);
}

#[test]
fn decode_nested_map_and_array() {
    let typed = json!({
        "mapValue": {"fields": {
            "tags": {"arrayValue": {"values": [{"stringValue": "a"}, {"integerValue": "2"}]}}
        }}
    });
    assert_eq!(decode_value(typed), json!({"tags": ["a", 2]}));
}

#[test]
fn decode_empty_array_and_map() {
    assert_eq!(decode_value(json!({"arrayValue": {}})), json!([]));
    assert_eq!(decode_value(json!({"mapValue": {}})), json!({}));
}

#[test]
fn decode_non_object_is_null() {
    assert_eq!(decode_value(json!("raw")), Value::Null);
}

#[test]
fn document_without_fields_decodes_empty() {
    let doc: Document = serde_json::from_str(r#"{"name":"projects/p/databases/(default)/documents/users/u1"}"#).unwrap();
    assert!(decode_fields(doc.fields).is_empty());
}

#[test]
fn document_url_encodes_key() {
    let store = FirestoreStore::new("https://fs.test/v1".into(), "lms".into(), None).unwrap();
    assert_eq!(
        store.document_url("users", "a/b c"),
        "https://fs.test/v1/projects/lms/databases/(default)/documents/users/a%2Fb%20c"
    );
}

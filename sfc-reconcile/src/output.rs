//! Rendering of apply results for the command line.

use serde_json::{Map, Value};
use tabled::{Table, Tabled};

use crate::resource::ResourceKind;
use crate::state::ApplyResult;

/// `{"changed": .., "id": .., "<kind>": ..}`, the shape configuration
/// management tooling expects from a module run.
pub fn result_json(kind: ResourceKind, result: &ApplyResult) -> Value {
    let mut body = Map::new();
    body.insert("changed".to_string(), Value::Bool(result.changed));
    body.insert(
        "id".to_string(),
        result.id.clone().map(Value::String).unwrap_or(Value::Null),
    );
    body.insert(
        kind.key().to_string(),
        result.object.clone().map(Value::Object).unwrap_or(Value::Null),
    );
    Value::Object(body)
}

/// `{"failed": true, "msg": ..}`.
pub fn failure_json(message: &str) -> Value {
    serde_json::json!({ "failed": true, "msg": message })
}

#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "FIELD")]
    field: String,
    #[tabled(rename = "VALUE")]
    value: String,
}

fn display_value(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::String(s) if s.is_empty() => "-".to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) if items.is_empty() => "-".to_string(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(map) if map.is_empty() => "-".to_string(),
        other => other.to_string(),
    }
}

/// Two-column table: `changed` and `id` first, then the object's fields.
pub fn result_table(result: &ApplyResult) -> String {
    let mut rows = vec![
        FieldRow {
            field: "changed".to_string(),
            value: result.changed.to_string(),
        },
        FieldRow {
            field: "id".to_string(),
            value: result.id.clone().unwrap_or_else(|| "-".to_string()),
        },
    ];
    if let Some(object) = &result.object {
        let mut fields: Vec<_> = object.iter().filter(|(k, _)| k.as_str() != "id").collect();
        fields.sort_by(|a, b| a.0.cmp(b.0));
        rows.extend(fields.into_iter().map(|(field, value)| FieldRow {
            field: field.clone(),
            value: display_value(value),
        }));
    }
    Table::new(rows).to_string()
}

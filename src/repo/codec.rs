//! JSON document stored under the `toDos` key:
//! `{ "<id>": { "id": "<id>", "text": "...", "isCompleted": false, "createdAt": 1700000000000 } }`

use std::collections::HashMap;

use anyhow::{Context, Result};

use crate::domain::store::TodoMap;
use crate::domain::todo::Todo;

pub fn encode(todos: &TodoMap) -> Result<String> {
    serde_json::to_string(todos).context("failed to encode todos")
}

/// A top-level `null` decodes as empty. Records are keyed by their own `id`
/// field, so a stale outer key cannot produce two records with one id.
pub fn decode(raw: &str) -> Result<TodoMap> {
    let parsed: Option<HashMap<String, Todo>> =
        serde_json::from_str(raw).context("failed to decode todos")?;
    Ok(parsed
        .unwrap_or_default()
        .into_values()
        .map(|todo| (todo.id, todo))
        .collect())
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    #[test]
    fn round_trip_preserves_mapping() {
        let mut done = Todo::with_created_at("done", 1_000);
        done.is_completed = true;
        let open = Todo::with_created_at("open", 2_000);
        let todos = TodoMap::from([(done.id, done), (open.id, open)]);

        let decoded = decode(&encode(&todos).unwrap()).unwrap();
        assert_eq!(decoded, todos);
    }

    #[test]
    fn encodes_object_keyed_by_id() {
        let todo = Todo::with_created_at("Buy milk", 42);
        let raw = encode(&TodoMap::from([(todo.id, todo.clone())])).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();

        let entry = &value[todo.id.to_string()];
        assert_eq!(entry["text"], "Buy milk");
        assert_eq!(entry["isCompleted"], false);
        assert_eq!(entry["createdAt"], 42);
    }

    #[test]
    fn null_and_empty_object_decode_empty() {
        assert!(decode("null").unwrap().is_empty());
        assert!(decode("{}").unwrap().is_empty());
    }

    #[test]
    fn rejects_malformed_documents() {
        assert!(decode("").is_err());
        assert!(decode("[1, 2]").is_err());
        assert!(decode(r#"{"x": {"text": "no id"}}"#).is_err());
    }

    #[test]
    fn rekeys_by_record_id() {
        let id = Uuid::new_v4();
        let raw = format!(
            r#"{{"stale-key": {{"id": "{id}", "text": "t", "isCompleted": true, "createdAt": 5}}}}"#
        );
        let decoded = decode(&raw).unwrap();
        let todo = decoded.get(&id).unwrap();
        assert!(todo.is_completed);
        assert_eq!(todo.created_at, 5);
    }
}

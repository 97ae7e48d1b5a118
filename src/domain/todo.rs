use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

pub type TodoId = Uuid;

/// One task as stored under the `toDos` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: TodoId,
    pub text: String,
    pub is_completed: bool,
    /// Milliseconds since the Unix epoch. Never changes after creation.
    pub created_at: i64,
}

impl Todo {
    pub fn new(text: impl Into<String>) -> Self {
        Self::with_created_at(text, now_millis())
    }

    pub fn with_created_at(text: impl Into<String>, created_at: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            is_completed: false,
            created_at,
        }
    }
}

pub fn now_millis() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_todo_starts_open() {
        let todo = Todo::new("Buy milk");
        assert_eq!(todo.text, "Buy milk");
        assert!(!todo.is_completed);
        assert!(todo.created_at > 0);
    }

    #[test]
    fn serializes_with_storage_field_names() {
        let todo = Todo::with_created_at("Walk dog", 1_700_000_000_123);
        let value = serde_json::to_value(&todo).unwrap();
        assert_eq!(value["id"], todo.id.to_string());
        assert_eq!(value["text"], "Walk dog");
        assert_eq!(value["isCompleted"], false);
        assert_eq!(value["createdAt"], 1_700_000_000_123_i64);
    }
}

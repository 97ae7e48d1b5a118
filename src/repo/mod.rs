use anyhow::Result;
use log::{info, warn};

use crate::domain::store::TodoMap;

pub mod codec;
pub mod file;
pub mod memory;
pub mod sqlite;

/// Storage key holding the whole todo mapping.
pub const TODOS_KEY: &str = "toDos";

/// A durable string-to-string store. Only [`TODOS_KEY`] is used today.
pub trait KeyValueStorage {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// Read the saved mapping. Missing, unreadable, or corrupt data all load as
/// an empty mapping.
pub fn load_todos<S: KeyValueStorage + ?Sized>(storage: &S) -> TodoMap {
    let raw = match storage.get(TODOS_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            info!("event=load module=repo status=empty reason=missing_key");
            return TodoMap::new();
        }
        Err(err) => {
            warn!("event=load module=repo status=error error={err:#}");
            return TodoMap::new();
        }
    };
    match codec::decode(&raw) {
        Ok(todos) => {
            info!("event=load module=repo status=ok count={}", todos.len());
            todos
        }
        Err(err) => {
            warn!("event=load module=repo status=corrupt error={err:#}");
            TodoMap::new()
        }
    }
}

pub fn save_todos<S: KeyValueStorage + ?Sized>(storage: &mut S, todos: &TodoMap) -> Result<()> {
    let raw = codec::encode(todos)?;
    storage.set(TODOS_KEY, &raw)
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;

    use super::*;
    use crate::domain::todo::Todo;
    use crate::repo::memory::InMemoryStorage;

    struct Unreadable;

    impl KeyValueStorage for Unreadable {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(anyhow!("device locked"))
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<()> {
            Err(anyhow!("device locked"))
        }
    }

    #[test]
    fn missing_key_loads_empty() {
        let storage = InMemoryStorage::default();
        assert!(load_todos(&storage).is_empty());
    }

    #[test]
    fn corrupt_blob_loads_empty() {
        let mut storage = InMemoryStorage::default();
        storage.set(TODOS_KEY, "{not json").unwrap();
        assert!(load_todos(&storage).is_empty());
    }

    #[test]
    fn read_error_loads_empty() {
        assert!(load_todos(&Unreadable).is_empty());
    }

    #[test]
    fn save_then_load() {
        let mut storage = InMemoryStorage::default();
        let todo = Todo::new("persist me");
        let todos = TodoMap::from([(todo.id, todo)]);

        save_todos(&mut storage, &todos).unwrap();
        assert_eq!(load_todos(&storage), todos);
    }
}

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};

use super::{KeyValueStorage, TODOS_KEY, codec};
use crate::domain::store::TodoMap;
use crate::domain::todo::Todo;

/// Process-local storage. Clones share the same entries.
#[derive(Clone, Default)]
pub struct InMemoryStorage {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl InMemoryStorage {
    pub fn with_seed(seed: impl IntoIterator<Item = Todo>) -> Result<Self> {
        let todos: TodoMap = seed.into_iter().map(|t| (t.id, t)).collect();
        let mut storage = Self::default();
        storage.set(TODOS_KEY, &codec::encode(&todos)?)?;
        Ok(storage)
    }
}

impl KeyValueStorage for InMemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| anyhow!("memory storage lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow!("memory storage lock poisoned"))?;
        entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::load_todos;

    #[test]
    fn clones_share_entries() {
        let storage = InMemoryStorage::default();
        let mut writer = storage.clone();
        writer.set("k", "v").unwrap();
        assert_eq!(storage.get("k").unwrap().as_deref(), Some("v"));
        assert_eq!(storage.get("missing").unwrap(), None);
    }

    #[test]
    fn seed_is_loadable() {
        let seed = vec![Todo::new("a"), Todo::new("b")];
        let storage = InMemoryStorage::with_seed(seed.clone()).unwrap();
        let loaded = load_todos(&storage);
        assert_eq!(loaded.len(), 2);
        for todo in seed {
            assert_eq!(loaded.get(&todo.id), Some(&todo));
        }
    }
}

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};

use super::KeyValueStorage;

pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    pub fn open_default() -> Result<Self> {
        let path = default_db_path()?;
        Self::open(path)
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create db dir {}", parent.display()))?;
        }
        let conn =
            Connection::open(path).with_context(|| format!("failed to open db {}", path.display()))?;
        init_schema(&conn)?;
        Ok(Self { conn })
    }
}

impl KeyValueStorage for SqliteStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()
            .with_context(|| format!("failed to read key {key}"))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO kv (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )
            .with_context(|| format!("failed to write key {key}"))?;
        Ok(())
    }
}

fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
PRAGMA journal_mode=WAL;
CREATE TABLE IF NOT EXISTS kv (
  key TEXT PRIMARY KEY,
  value TEXT NOT NULL
);
"#,
    )
    .context("failed to initialize schema")?;
    Ok(())
}

fn default_db_path() -> Result<PathBuf> {
    let base = dirs::data_dir().context("failed to resolve data dir")?;
    Ok(base.join("tsumiki").join("storage.sqlite"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::store::TodoMap;
    use crate::domain::todo::Todo;
    use crate::repo::{TODOS_KEY, load_todos, save_todos};

    #[test]
    fn sqlite_storage_round_trip() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let mut storage = SqliteStorage::open(tmp.path()).unwrap();

        assert_eq!(storage.get(TODOS_KEY).unwrap(), None);
        storage.set(TODOS_KEY, "first").unwrap();
        storage.set(TODOS_KEY, "second").unwrap();
        assert_eq!(storage.get(TODOS_KEY).unwrap().as_deref(), Some("second"));
    }

    #[test]
    fn survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.sqlite");
        let todo = Todo::new("remember");
        let todos = TodoMap::from([(todo.id, todo)]);

        {
            let mut storage = SqliteStorage::open(&path).unwrap();
            save_todos(&mut storage, &todos).unwrap();
        }

        let storage = SqliteStorage::open(&path).unwrap();
        assert_eq!(load_todos(&storage), todos);
    }
}

use super::{SelectionState, SelectionStore};
use crate::error::{AppError, AppResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;

/// Selection store backed by the `selection_state` table. Each key holds one
/// JSON document, replaced wholesale on save.
pub struct SqliteSelectionStore {
    conn: Mutex<Connection>,
}

impl SqliteSelectionStore {
    pub fn open(path: &Path) -> AppResult<Self> {
        let conn = Connection::open(path)?;
        crate::storage::sqlite::apply_pragmas(&conn)?;
        crate::storage::migrations::run_migrations(&conn)?;
        Ok(Self::from_connection(conn))
    }

    /// Wrap a connection whose schema is already migrated.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> AppResult<T>) -> AppResult<T> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| AppError::Internal("selection store lock poisoned".to_string()))?;
        f(&conn)
    }
}

impl SelectionStore for SqliteSelectionStore {
    fn get(&self, key: &str) -> AppResult<SelectionState> {
        let raw: Option<String> = self.with_conn(|conn| {
            Ok(conn
                .query_row(
                    "SELECT state FROM selection_state WHERE session_key = ?1",
                    [key],
                    |row| row.get(0),
                )
                .optional()?)
        })?;

        let Some(raw) = raw else {
            return Ok(SelectionState::new());
        };
        match serde_json::from_str::<SelectionState>(&raw) {
            Ok(state) => Ok(state),
            Err(e) => {
                tracing::warn!(session = %key, error = %e, "discarding unreadable selection state");
                Ok(SelectionState::new())
            }
        }
    }

    fn save(&self, key: &str, state: &SelectionState) -> AppResult<()> {
        let json = serde_json::to_string(state)
            .map_err(|e| AppError::Internal(format!("failed to encode selection state: {e}")))?;
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO selection_state (session_key, state, updated_at)
                 VALUES (?1, ?2, unixepoch())
                 ON CONFLICT(session_key) DO UPDATE SET
                     state = excluded.state,
                     updated_at = excluded.updated_at",
                params![key, json],
            )?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> SqliteSelectionStore {
        let conn = Connection::open_in_memory().unwrap();
        crate::storage::migrations::run_migrations(&conn).unwrap();
        SqliteSelectionStore::from_connection(conn)
    }

    #[test]
    fn test_missing_key_is_empty() {
        assert!(store().get("request_filters:nobody").unwrap().is_empty());
    }

    #[test]
    fn test_save_then_get() {
        let store = store();
        let mut s = SelectionState::new();
        s.insert("show", json!(50));
        s.insert("p", json!({"typ": "PathFilter", "value": "/x"}));
        store.save("k", &s).unwrap();
        assert_eq!(store.get("k").unwrap(), s);

        let mut replaced = SelectionState::new();
        replaced.insert("view_style", json!("card"));
        store.save("k", &replaced).unwrap();
        assert_eq!(store.get("k").unwrap(), replaced);
    }

    #[test]
    fn test_unreadable_state_falls_back_to_empty() {
        let store = store();
        store
            .with_conn(|conn| {
                conn.execute(
                    "INSERT INTO selection_state (session_key, state, updated_at) VALUES ('bad', '{not json', 0)",
                    [],
                )?;
                Ok(())
            })
            .unwrap();
        assert!(store.get("bad").unwrap().is_empty());
    }

    #[test]
    fn test_open_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.db");
        {
            let store = SqliteSelectionStore::open(&path).unwrap();
            let mut s = SelectionState::new();
            s.insert("show", json!(10));
            store.save("k", &s).unwrap();
        }
        let reopened = SqliteSelectionStore::open(&path).unwrap();
        assert_eq!(reopened.get("k").unwrap().get("show"), Some(&json!(10)));
    }
}

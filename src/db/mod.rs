//! SQLite-backed document store for the CRM collections.
//!
//! The database lives at `~/.kascrm/kascrm.db` unless a path is configured.
//! Every collection is one table; records are stored as JSON documents next to
//! the few columns queries filter or sort on. Collection-specific operations
//! live in the submodules as `impl CrmDb` blocks.

use std::path::PathBuf;

use rusqlite::{Connection, OptionalExtension, Params};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

pub mod amc;
pub mod blogs;
pub mod leads;
pub mod notifications;
pub mod projects;
pub mod quotations;
pub mod submissions;
pub mod types;
pub mod users;

pub use types::*;

pub struct CrmDb {
    conn: Connection,
}

impl CrmDb {
    /// Borrow the underlying connection for ad-hoc queries.
    pub fn conn_ref(&self) -> &Connection {
        &self.conn
    }

    /// Execute a closure within a SQLite transaction.
    /// Commits on Ok, rolls back on Err.
    pub fn with_transaction<F, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Self) -> Result<T, E>,
        E: From<DbError>,
    {
        self.conn
            .execute_batch("BEGIN IMMEDIATE")
            .map_err(DbError::from)?;
        match f(self) {
            Ok(val) => {
                self.conn.execute_batch("COMMIT").map_err(DbError::from)?;
                Ok(val)
            }
            Err(e) => {
                let _ = self.conn.execute_batch("ROLLBACK");
                Err(e)
            }
        }
    }

    /// Open (or create) the database at `~/.kascrm/kascrm.db` and apply the schema.
    pub fn open() -> Result<Self, DbError> {
        let path = Self::default_path()?;
        Self::open_at(path)
    }

    /// Open a database at an explicit path.
    pub fn open_at(path: PathBuf) -> Result<Self, DbError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(DbError::CreateDir)?;
            }
        }

        let conn = Connection::open(&path)?;

        // WAL keeps readers unblocked while a request writes
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        Self::prepare(conn)
    }

    /// Fresh in-memory database. Used by tests and `--db-path :memory:`.
    pub fn open_in_memory() -> Result<Self, DbError> {
        Self::prepare(Connection::open_in_memory()?)
    }

    fn prepare(conn: Connection) -> Result<Self, DbError> {
        crate::migrations::run_migrations(&conn).map_err(DbError::Migration)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self { conn })
    }

    /// Resolve the default database path: `~/.kascrm/kascrm.db`.
    pub fn default_path() -> Result<PathBuf, DbError> {
        let home = dirs::home_dir().ok_or(DbError::HomeDirNotFound)?;
        Ok(home.join(".kascrm").join("kascrm.db"))
    }

    // -----------------------------------------------------------------------
    // Document helpers shared by the collection modules
    // -----------------------------------------------------------------------

    fn query_docs<T: DeserializeOwned, P: Params>(
        &self,
        sql: &str,
        params: P,
    ) -> Result<Vec<T>, DbError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, |row| row.get::<_, String>(0))?;
        let mut items = Vec::new();
        for row in rows {
            items.push(decode(&row?)?);
        }
        Ok(items)
    }

    fn query_doc<T: DeserializeOwned, P: Params>(
        &self,
        sql: &str,
        params: P,
    ) -> Result<Option<T>, DbError> {
        let doc: Option<String> = self
            .conn
            .query_row(sql, params, |row| row.get(0))
            .optional()?;
        doc.map(|d| decode(&d)).transpose()
    }

    fn count<P: Params>(&self, sql: &str, params: P) -> Result<i64, DbError> {
        Ok(self.conn.query_row(sql, params, |row| row.get(0))?)
    }

    fn status_counts(&self, table: &str) -> Result<StatusCounts, DbError> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT status, COUNT(*) FROM {table} GROUP BY status"))?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get(1)?)))?;
        let mut counts = Vec::new();
        for row in rows {
            counts.push(row?);
        }
        Ok(StatusCounts(counts))
    }
}

fn encode<T: Serialize>(record: &T) -> Result<String, DbError> {
    Ok(serde_json::to_string(record)?)
}

fn decode<T: DeserializeOwned>(doc: &str) -> Result<T, DbError> {
    Ok(serde_json::from_str(doc)?)
}

/// Keys a client may never overwrite through a partial update.
const PROTECTED_KEYS: [&str; 4] = ["id", "_id", "createdAt", "updatedAt"];

/// Apply a partial update to a stored record.
///
/// The record is serialised, each top-level key of `patch` replaces the
/// stored one, and the result is deserialised again so the typed record
/// re-validates every field.
pub fn merge_document<T>(record: &T, patch: &Value) -> Result<T, serde_json::Error>
where
    T: Serialize + DeserializeOwned,
{
    let mut doc = serde_json::to_value(record)?;
    if let (Some(target), Some(changes)) = (doc.as_object_mut(), patch.as_object()) {
        for (key, value) in changes {
            if PROTECTED_KEYS.contains(&key.as_str()) {
                continue;
            }
            target.insert(key.clone(), value.clone());
        }
    } else if !patch.is_object() {
        return Err(serde::de::Error::custom("update body must be a JSON object"));
    }
    serde_json::from_value(doc)
}

#[cfg(test)]
pub(crate) fn test_db() -> CrmDb {
    CrmDb::open_in_memory().expect("Failed to open in-memory test database")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    #[serde(rename_all = "camelCase")]
    struct Doc {
        id: String,
        name: String,
        count: u32,
        created_at: String,
    }

    #[test]
    fn test_open_at_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("kascrm.db");
        let db = CrmDb::open_at(path.clone()).expect("open should succeed");
        assert!(path.exists());
        assert_eq!(db.count_leads().unwrap(), 0);
    }

    #[test]
    fn test_reopen_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kascrm.db");
        {
            let db = CrmDb::open_at(path.clone()).unwrap();
            db.conn_ref()
                .execute(
                    "INSERT INTO contacts (id, status, doc, created_at, updated_at)
                     VALUES ('c1', 'New', '{}', '2025-01-01', '2025-01-01')",
                    [],
                )
                .unwrap();
        }
        let db = CrmDb::open_at(path).unwrap();
        let n: i64 = db
            .conn_ref()
            .query_row("SELECT COUNT(*) FROM contacts", [], |r| r.get(0))
            .unwrap();
        assert_eq!(n, 1);
    }

    #[test]
    fn test_transaction_rolls_back_on_error() {
        let db = test_db();
        let result: Result<(), DbError> = db.with_transaction(|tx| {
            tx.conn_ref().execute(
                "INSERT INTO contacts (id, status, doc, created_at, updated_at)
                 VALUES ('c1', 'New', '{}', '2025-01-01', '2025-01-01')",
                [],
            )?;
            Err(DbError::Migration("boom".into()))
        });
        assert!(result.is_err());
        let n: i64 = db
            .conn_ref()
            .query_row("SELECT COUNT(*) FROM contacts", [], |r| r.get(0))
            .unwrap();
        assert_eq!(n, 0);
    }

    #[test]
    fn test_merge_document_replaces_top_level_keys() {
        let stored = Doc {
            id: "d1".into(),
            name: "before".into(),
            count: 1,
            created_at: "2025-01-01".into(),
        };
        let merged = merge_document(
            &stored,
            &json!({ "name": "after", "id": "hijack", "createdAt": "1999-01-01" }),
        )
        .unwrap();
        assert_eq!(merged.name, "after");
        assert_eq!(merged.id, "d1");
        assert_eq!(merged.created_at, "2025-01-01");
        assert_eq!(merged.count, 1);
    }

    #[test]
    fn test_merge_document_revalidates() {
        let stored = Doc {
            id: "d1".into(),
            name: "n".into(),
            count: 1,
            created_at: "2025-01-01".into(),
        };
        assert!(merge_document(&stored, &json!({ "count": "many" })).is_err());
        assert!(merge_document(&stored, &json!(["not", "an", "object"])).is_err());
    }
}

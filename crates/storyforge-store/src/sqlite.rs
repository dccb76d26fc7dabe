//! SQLite-backed record store

use crate::codec;
use crate::StoreError;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};
use storyforge_domain::{FieldMap, RecordId, RecordStore};
use tracing::debug;

/// SQLite-based implementation of RecordStore
///
/// # Thread Safety
///
/// SQLite connections are not thread-safe, so the connection sits behind a
/// mutex and writes are serialized. Each `create` is a single INSERT and is
/// therefore atomic.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Create a new SqliteStore with the given database path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use storyforge_store::SqliteStore;
    ///
    /// let store = SqliteStore::new("storyforge.db").unwrap();
    /// ```
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(include_str!("schema.sql"))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Number of records in a collection
    pub fn count(&self, collection: &str) -> Result<usize, StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM records WHERE collection = ?1",
            params![collection],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Every record in a collection, oldest first
    pub fn list(&self, collection: &str) -> Result<Vec<(RecordId, FieldMap)>, StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        let mut stmt = conn.prepare(
            "SELECT id, fields FROM records WHERE collection = ?1 ORDER BY rowid",
        )?;
        let rows = stmt
            .query_map(params![collection], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, raw)| Ok((RecordId::new(id), codec::decode(&raw)?)))
            .collect()
    }
}

impl RecordStore for SqliteStore {
    type Error = StoreError;

    fn create(&self, collection: &str, fields: &FieldMap) -> Result<RecordId, Self::Error> {
        if collection.is_empty() {
            return Err(StoreError::InvalidData("collection name is empty".to_string()));
        }
        if fields.is_empty() {
            return Err(StoreError::InvalidData("record has no fields".to_string()));
        }

        let id = RecordId::generate();
        let created_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);

        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        conn.execute(
            "INSERT INTO records (id, collection, fields, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![id.as_str(), collection, codec::encode(fields), created_at],
        )?;

        debug!("Created {} record {}", collection, id);
        Ok(id)
    }

    fn get_by_id(&self, collection: &str, id: &RecordId) -> Result<Option<FieldMap>, Self::Error> {
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        let raw: Option<String> = conn
            .query_row(
                "SELECT fields FROM records WHERE collection = ?1 AND id = ?2",
                params![collection, id.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        raw.map(|r| codec::decode(&r)).transpose()
    }
}

//! In-memory record store

use crate::StoreError;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use storyforge_domain::{FieldMap, FieldValue, RecordId, RecordStore};

#[derive(Default)]
struct Inner {
    collections: HashMap<String, BTreeMap<RecordId, FieldMap>>,
    failures: Vec<(String, FieldValue)>,
}

/// Thread-safe in-memory implementation of RecordStore
///
/// Ids are UUIDv7 strings, so iteration order follows insertion time.
/// `fail_when` makes matching writes fail, which lets tests exercise
/// per-record persistence failures.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every create whose `field` equals `value`
    pub fn fail_when(&self, field: impl Into<String>, value: impl Into<FieldValue>) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.failures.push((field.into(), value.into()));
        }
    }

    /// Number of records in a collection
    pub fn len(&self, collection: &str) -> usize {
        self.inner
            .lock()
            .map(|inner| inner.collections.get(collection).map_or(0, BTreeMap::len))
            .unwrap_or(0)
    }

    /// Whether a collection holds no records
    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    /// Snapshot of every record in a collection
    pub fn records(&self, collection: &str) -> Vec<(RecordId, FieldMap)> {
        self.inner
            .lock()
            .map(|inner| {
                inner
                    .collections
                    .get(collection)
                    .map(|records| records.iter().map(|(id, f)| (id.clone(), f.clone())).collect())
                    .unwrap_or_default()
            })
            .unwrap_or_default()
    }

    /// Insert a record under a caller-chosen id
    pub fn insert(&self, collection: &str, id: RecordId, fields: FieldMap) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().map_err(|_| StoreError::Poisoned)?;
        inner
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(id, fields);
        Ok(())
    }
}

impl RecordStore for MemoryStore {
    type Error = StoreError;

    fn create(&self, collection: &str, fields: &FieldMap) -> Result<RecordId, Self::Error> {
        if collection.is_empty() {
            return Err(StoreError::InvalidData("collection name is empty".to_string()));
        }
        if fields.is_empty() {
            return Err(StoreError::InvalidData("record has no fields".to_string()));
        }

        let mut inner = self.inner.lock().map_err(|_| StoreError::Poisoned)?;
        if let Some((field, value)) = inner
            .failures
            .iter()
            .find(|(field, value)| fields.get(field) == Some(value))
        {
            return Err(StoreError::Rejected(format!("{} = {}", field, value)));
        }

        let id = RecordId::generate();
        inner
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), fields.clone());
        Ok(id)
    }

    fn get_by_id(&self, collection: &str, id: &RecordId) -> Result<Option<FieldMap>, Self::Error> {
        let inner = self.inner.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(inner
            .collections
            .get(collection)
            .and_then(|records| records.get(id))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(title: &str) -> FieldMap {
        let mut f = FieldMap::new();
        f.insert("title".into(), title.into());
        f
    }

    #[test]
    fn test_create_and_get() {
        let store = MemoryStore::new();
        let id = store.create("user_story", &fields("A")).unwrap();
        assert_eq!(store.get_by_id("user_story", &id).unwrap(), Some(fields("A")));
        assert_eq!(store.len("user_story"), 1);
        assert!(store.is_empty("test_case"));
    }

    #[test]
    fn test_failure_injection_is_per_record() {
        let store = MemoryStore::new();
        store.fail_when("title", "B");

        assert!(store.create("user_story", &fields("A")).is_ok());
        assert!(matches!(
            store.create("user_story", &fields("B")),
            Err(StoreError::Rejected(_))
        ));
        assert!(store.create("user_story", &fields("C")).is_ok());
        assert_eq!(store.len("user_story"), 2);
    }

    #[test]
    fn test_insert_with_known_id() {
        let store = MemoryStore::new();
        store.insert("user_story", RecordId::new("story-1"), fields("A")).unwrap();
        assert!(store.get_by_id("user_story", &"story-1".into()).unwrap().is_some());
        assert_eq!(store.records("user_story").len(), 1);
    }
}

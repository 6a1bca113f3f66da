use super::{Attributes, TableLocation, TableStore};
use crate::error::StorageError;
use parking_lot::Mutex;
use std::collections::HashMap;

/// An object held by a [`MemoryStore`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub attributes: Attributes,
}

/// In-memory [`TableStore`].
///
/// Safe to share between threads; each call locks the whole map.
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: Mutex<HashMap<TableLocation, StoredObject>>,
}

static_assertions::assert_impl_all!(MemoryStore: Send, Sync);

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put raw bytes at a location with no attributes.
    pub fn insert(&self, location: TableLocation, bytes: impl Into<Vec<u8>>) {
        self.objects.lock().insert(
            location,
            StoredObject {
                bytes: bytes.into(),
                attributes: Attributes::new(),
            },
        );
    }

    /// Copy of the object stored at a location.
    pub fn get(&self, location: &TableLocation) -> Option<StoredObject> {
        self.objects.lock().get(location).cloned()
    }

    pub fn len(&self) -> usize {
        self.objects.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.lock().is_empty()
    }
}

impl TableStore for MemoryStore {
    fn fetch_table(&self, location: &TableLocation) -> Result<Vec<u8>, StorageError> {
        self.objects
            .lock()
            .get(location)
            .map(|object| object.bytes.clone())
            .ok_or_else(|| StorageError::NotFound(location.to_string()))
    }

    fn store_table(
        &self,
        location: &TableLocation,
        bytes: Vec<u8>,
        attributes: &Attributes,
    ) -> Result<(), StorageError> {
        self.objects.lock().insert(
            location.clone(),
            StoredObject {
                bytes,
                attributes: attributes.clone(),
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_then_fetch() {
        let store = MemoryStore::new();
        let location = TableLocation::new("bucket", "data.csv");
        let mut attributes = Attributes::new();
        attributes.insert("totalRows".to_string(), "3".to_string());

        store
            .store_table(&location, b"a\n1\n".to_vec(), &attributes)
            .unwrap();

        assert_eq!(store.fetch_table(&location).unwrap(), b"a\n1\n".to_vec());
        assert_eq!(store.get(&location).unwrap().attributes, attributes);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_missing_object() {
        let store = MemoryStore::new();
        let err = store
            .fetch_table(&TableLocation::new("bucket", "nope.csv"))
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound(ref loc) if loc == "bucket/nope.csv"));
    }
}

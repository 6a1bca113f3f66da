//! Table storage.
//!
//! The pipeline never touches storage itself; jobs go through a
//! [`TableStore`], which fetches raw table bytes and stores results together
//! with string attributes (the run's report and counters).
//!
//! Two stores are provided:
//! - [`LocalStore`]: one directory per bucket under a root directory
//! - [`MemoryStore`]: everything in memory, for tests and embedding

mod local;
mod memory;

pub use local::LocalStore;
pub use memory::{MemoryStore, StoredObject};

use crate::error::StorageError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// String metadata stored alongside a table.
pub type Attributes = BTreeMap<String, String>;

/// Where a table lives: a bucket and a key inside it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TableLocation {
    pub bucket: String,
    pub key: String,
}

impl TableLocation {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for TableLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}

/// Source and sink of raw table bytes.
pub trait TableStore {
    /// Read the bytes stored at `location`.
    fn fetch_table(&self, location: &TableLocation) -> Result<Vec<u8>, StorageError>;

    /// Write `bytes` to `location`, replacing anything stored there.
    fn store_table(
        &self,
        location: &TableLocation,
        bytes: Vec<u8>,
        attributes: &Attributes,
    ) -> Result<(), StorageError>;
}

impl<S: TableStore + ?Sized> TableStore for &S {
    fn fetch_table(&self, location: &TableLocation) -> Result<Vec<u8>, StorageError> {
        (**self).fetch_table(location)
    }

    fn store_table(
        &self,
        location: &TableLocation,
        bytes: Vec<u8>,
        attributes: &Attributes,
    ) -> Result<(), StorageError> {
        (**self).store_table(location, bytes, attributes)
    }
}

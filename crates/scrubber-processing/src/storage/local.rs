use super::{Attributes, TableLocation, TableStore};
use crate::error::StorageError;
use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Suffix of the JSON file holding a table's attributes.
pub const ATTRIBUTES_SUFFIX: &str = ".attributes.json";

/// Filesystem-backed [`TableStore`].
///
/// A bucket is a directory under the root and a key is a relative path
/// inside it. Attributes are written next to the table as
/// `<key>.attributes.json`.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filesystem path of a location.
    pub fn path_for(&self, location: &TableLocation) -> Result<PathBuf, StorageError> {
        if !is_valid_segment(&location.bucket, false) || !is_valid_segment(&location.key, true) {
            return Err(StorageError::InvalidKey(location.to_string()));
        }
        Ok(self.root.join(&location.bucket).join(&location.key))
    }

    /// Path of the attribute file for a location.
    pub fn attributes_path_for(&self, location: &TableLocation) -> Result<PathBuf, StorageError> {
        let mut name = self.path_for(location)?.into_os_string();
        name.push(ATTRIBUTES_SUFFIX);
        Ok(PathBuf::from(name))
    }

    /// Read the attributes stored with a location.
    pub fn read_attributes(&self, location: &TableLocation) -> Result<Attributes, StorageError> {
        let path = self.attributes_path_for(location)?;
        let content = fs::read(&path).map_err(|e| io_error(location, e))?;
        serde_json::from_slice(&content).map_err(|source| StorageError::Attributes {
            location: location.to_string(),
            source,
        })
    }
}

impl TableStore for LocalStore {
    fn fetch_table(&self, location: &TableLocation) -> Result<Vec<u8>, StorageError> {
        let path = self.path_for(location)?;
        debug!("Reading {}", path.display());
        fs::read(&path).map_err(|e| io_error(location, e))
    }

    fn store_table(
        &self,
        location: &TableLocation,
        bytes: Vec<u8>,
        attributes: &Attributes,
    ) -> Result<(), StorageError> {
        let path = self.path_for(location)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| io_error(location, e))?;
        }

        let attributes_json =
            serde_json::to_vec_pretty(attributes).map_err(|source| StorageError::Attributes {
                location: location.to_string(),
                source,
            })?;

        fs::write(&path, bytes).map_err(|e| io_error(location, e))?;
        fs::write(self.attributes_path_for(location)?, attributes_json)
            .map_err(|e| io_error(location, e))?;

        debug!("Stored {}", path.display());
        Ok(())
    }
}

/// A bucket must be a single plain name; a key may span directories.
fn is_valid_segment(segment: &str, allow_nested: bool) -> bool {
    let components: Vec<Component<'_>> = Path::new(segment).components().collect();
    !components.is_empty()
        && components.iter().all(|c| matches!(c, Component::Normal(_)))
        && (allow_nested || components.len() == 1)
}

fn io_error(location: &TableLocation, source: std::io::Error) -> StorageError {
    if source.kind() == ErrorKind::NotFound {
        StorageError::NotFound(location.to_string())
    } else {
        StorageError::Io {
            location: location.to_string(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_store_and_fetch() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let store = LocalStore::new(root);
        let location = TableLocation::new("processed", "nested/processed_data.csv");
        let mut attributes = Attributes::new();
        attributes.insert("processing_report".to_string(), "Removed 1 duplicate rows".to_string());

        store
            .store_table(&location, b"a,b\n1,2\n".to_vec(), &attributes)
            .unwrap();

        assert_eq!(store.fetch_table(&location).unwrap(), b"a,b\n1,2\n".to_vec());
        assert_eq!(store.read_attributes(&location).unwrap(), attributes);
        assert!(root.join("processed/nested/processed_data.csv.attributes.json").exists());
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        let err = store
            .fetch_table(&TableLocation::new("uploads", "nothing.csv"))
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[test]
    fn test_rejects_escaping_keys() {
        let dir = tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        for location in [
            TableLocation::new("uploads", "../secrets.csv"),
            TableLocation::new("uploads", "/etc/passwd"),
            TableLocation::new("", "data.csv"),
            TableLocation::new("a/b", "data.csv"),
            TableLocation::new("uploads", ""),
        ] {
            assert!(
                matches!(store.path_for(&location), Err(StorageError::InvalidKey(_))),
                "{} should be rejected",
                location
            );
        }
    }
}

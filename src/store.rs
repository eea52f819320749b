//! Bundle persistence
//!
//! The trained bundle is owned by a store object injected into the server
//! state, so tests can swap the on-disk file for an in-memory slot.

use crate::bundle::TrainedBundle;
use crate::error::{MpgError, Result};
use parking_lot::RwLock;
use std::fs;
use std::path::{Path, PathBuf};

/// Load/replace access to the single persisted bundle.
pub trait ModelStore: Send + Sync {
    /// Current bundle, or `None` when nothing has been trained.
    fn load(&self) -> Result<Option<TrainedBundle>>;

    /// Replace the bundle wholesale. The previous bundle is superseded only
    /// once the new one is fully written.
    fn replace(&self, bundle: &TrainedBundle) -> Result<()>;

    fn is_trained(&self) -> bool;
}

/// File-backed store serializing the bundle with bincode. Replacement writes
/// to a sibling temp file and renames over the target.
pub struct FileModelStore {
    path: PathBuf,
}

impl FileModelStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ModelStore for FileModelStore {
    fn load(&self) -> Result<Option<TrainedBundle>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&self.path)?;
        let bundle = bincode::deserialize(&bytes)
            .map_err(|e| MpgError::SerializationError(e.to_string()))?;
        Ok(Some(bundle))
    }

    fn replace(&self, bundle: &TrainedBundle) -> Result<()> {
        let bytes = bincode::serialize(bundle)
            .map_err(|e| MpgError::SerializationError(e.to_string()))?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, &bytes)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn is_trained(&self) -> bool {
        self.path.exists()
    }
}

/// In-memory store for tests and embedding.
pub struct InMemoryModelStore {
    slot: RwLock<Option<TrainedBundle>>,
}

impl InMemoryModelStore {
    pub fn new() -> Self {
        Self {
            slot: RwLock::new(None),
        }
    }
}

impl Default for InMemoryModelStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelStore for InMemoryModelStore {
    fn load(&self) -> Result<Option<TrainedBundle>> {
        Ok(self.slot.read().clone())
    }

    fn replace(&self, bundle: &TrainedBundle) -> Result<()> {
        *self.slot.write() = Some(bundle.clone());
        Ok(())
    }

    fn is_trained(&self) -> bool {
        self.slot.read().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::read_csv_bytes;
    use crate::training::{train_bundle, TrainingOptions};

    fn trained_bundle() -> TrainedBundle {
        let csv = b"cylinders,displacement,year,make,combination_mpg\n\
                    4,2.0,2018,toyota,28\n\
                    6,3.5,2019,honda,21\n\
                    8,5.0,2017,ford,15\n\
                    4,1.8,2020,toyota,32\n\
                    6,3.0,2016,ford,22\n";
        let df = read_csv_bytes(csv).unwrap();
        train_bundle(&df, &TrainingOptions::default().with_n_estimators(10)).unwrap()
    }

    #[test]
    fn test_in_memory_replace_and_load() {
        let store = InMemoryModelStore::new();
        assert!(!store.is_trained());
        assert!(store.load().unwrap().is_none());

        let bundle = trained_bundle();
        store.replace(&bundle).unwrap();

        assert!(store.is_trained());
        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.features, bundle.features);
        assert_eq!(loaded.metrics, bundle.metrics);
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileModelStore::new(dir.path().join("mpg_model.bin"));
        assert!(store.load().unwrap().is_none());

        let bundle = trained_bundle();
        store.replace(&bundle).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.features, bundle.features);
        assert_eq!(loaded.metrics, bundle.metrics);
        assert_eq!(
            loaded.encoders.get("make").unwrap().classes(),
            bundle.encoders.get("make").unwrap().classes()
        );
    }

    #[test]
    fn test_file_store_replace_supersedes() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileModelStore::new(dir.path().join("mpg_model.bin"));

        let first = trained_bundle();
        store.replace(&first).unwrap();

        let mut second = trained_bundle();
        second.features.truncate(3);
        second.encoders.clear();
        store.replace(&second).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.features.len(), 3);
        assert!(loaded.encoders.is_empty());
    }
}

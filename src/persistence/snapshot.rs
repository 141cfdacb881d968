//! Snapshot: save/load full collection state to/from disk.

use crate::error::Result;
use crate::persistence::serialization::{self, CollectionManifest, CollectionSnapshot};
use std::fs;
use std::path::{Path, PathBuf};

/// Manages the snapshot and manifest files of one collection directory.
pub struct SnapshotManager {
    dir: PathBuf,
}

impl SnapshotManager {
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn snapshot_path(&self) -> PathBuf {
        self.dir.join("snapshot.bin")
    }

    fn manifest_path(&self) -> PathBuf {
        self.dir.join("manifest.json")
    }

    /// Write the snapshot (bincode) via a temp file + rename, then the manifest.
    pub fn save(&self, snapshot: &CollectionSnapshot, manifest: &CollectionManifest) -> Result<()> {
        let data = serialization::to_bincode(snapshot)?;
        let tmp = self.dir.join("snapshot.bin.tmp");
        fs::write(&tmp, &data)?;
        fs::rename(&tmp, self.snapshot_path())?;

        self.save_manifest(manifest)
    }

    pub fn save_manifest(&self, manifest: &CollectionManifest) -> Result<()> {
        fs::write(self.manifest_path(), serialization::to_json(manifest)?)?;
        Ok(())
    }

    /// Load the snapshot, or `None` if the collection has never checkpointed.
    pub fn load(&self) -> Result<Option<CollectionSnapshot>> {
        let path = self.snapshot_path();
        if !path.exists() {
            return Ok(None);
        }

        let data = fs::read(&path)?;
        Ok(Some(serialization::from_bincode(&data)?))
    }

    pub fn load_manifest(&self) -> Result<Option<CollectionManifest>> {
        let path = self.manifest_path();
        if !path.exists() {
            return Ok(None);
        }

        let data = fs::read(&path)?;
        Ok(Some(serialization::from_json(&data)?))
    }
}

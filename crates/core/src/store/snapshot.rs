use super::{DefinitionStore, MemoryStore};
use crate::error::{DefscopeError, Result};
use crate::model::{Definition, UsageEdge};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const SNAPSHOT_VERSION: u32 = 1;

/// Persisted form of a store: the `Defs` and `Uses` collections plus the
/// module they were computed for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    pub module_path: Option<String>,
    pub defs: Vec<Definition>,
    pub uses: Vec<UsageEdge>,
}

impl Snapshot {
    pub fn capture(store: &dyn DefinitionStore, module_path: Option<String>) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            module_path,
            defs: store.all_defs(),
            uses: store.all_uses(),
        }
    }

    pub fn into_store(self) -> MemoryStore {
        MemoryStore::from_parts(self.defs, self.uses)
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        let bytes = rmp_serde::to_vec(self)
            .map_err(|e| DefscopeError::Storage(format!("MSGPACK error: {}", e)))?;
        zstd::encode_all(&bytes[..], 0)
            .map_err(|e| DefscopeError::Storage(format!("Zstd compression failed: {}", e)))
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        let decompressed = zstd::decode_all(bytes)
            .map_err(|e| DefscopeError::Storage(format!("Zstd decompression failed: {}", e)))?;
        rmp_serde::from_slice(&decompressed)
            .map_err(|e| DefscopeError::Storage(format!("MSGPACK error: {}", e)))
    }

    /// Writes atomically: a temp file next to `path`, then a rename.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let bytes = self.serialize()?;
        let temp_path = path.with_extension("tmp");
        std::fs::write(&temp_path, bytes)?;
        std::fs::rename(&temp_path, path)?;
        tracing::info!(
            "Saved index ({} defs, {} uses) to {}",
            self.defs.len(),
            self.uses.len(),
            path.display()
        );
        Ok(())
    }

    /// Loads a snapshot, or `None` when there is nothing usable on disk.
    ///
    /// An unreadable or outdated snapshot is removed so the caller rebuilds.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let bytes = std::fs::read(path)?;
        match Self::deserialize(&bytes) {
            Ok(snapshot) if snapshot.version == SNAPSHOT_VERSION => {
                tracing::info!("Loaded index from {}", path.display());
                Ok(Some(snapshot))
            }
            Ok(snapshot) => {
                tracing::warn!(
                    "Index version mismatch at {} (found {}, expected {}). Will rebuild.",
                    path.display(),
                    snapshot.version,
                    SNAPSHOT_VERSION
                );
                let _ = std::fs::remove_file(path);
                Ok(None)
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to parse index at {}: {:?}. Will rebuild.",
                    path.display(),
                    e
                );
                let _ = std::fs::remove_file(path);
                Ok(None)
            }
        }
    }

    /// Pretty JSON dump for debugging.
    pub fn save_to_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}

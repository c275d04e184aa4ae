use crate::position::{CursorCoordinate, FileIdentity};
use crate::store::document::{JsonDocument, ReadOutcome};
use crate::store::error::StoreError;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const POSITIONS_FILE_NAME: &str = "lastEditPosition.json";

pub type PositionMap = BTreeMap<FileIdentity, CursorCoordinate>;

/// Durable map from file to the caret position of its last edit.
///
/// Clones share the same backing document and writer lock.
#[derive(Debug, Clone)]
pub struct PositionStore {
    document: JsonDocument,
}

impl PositionStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            document: JsonDocument::new(path),
        }
    }

    /// Store living in `dir` under the standard file name.
    pub fn in_dir(dir: &Path) -> Self {
        Self::open(dir.join(POSITIONS_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        self.document.path()
    }

    /// Record `pos` for `file`, replacing any earlier value, and flush the
    /// whole mapping.
    pub async fn save(&self, file: &FileIdentity, pos: CursorCoordinate) -> Result<(), StoreError> {
        self.document
            .update(|positions: &mut PositionMap| {
                positions.insert(file.clone(), pos);
            })
            .await?;
        log::debug!("[POSITION_STORE] saved {file}, {pos}");
        Ok(())
    }

    /// Last saved position for `file`. Missing or unreadable storage reads as
    /// no position.
    pub async fn load(&self, file: &FileIdentity) -> Option<CursorCoordinate> {
        self.all().await.get(file).copied()
    }

    /// Snapshot of every stored position.
    pub async fn all(&self) -> PositionMap {
        match self.document.read::<PositionMap>().await {
            ReadOutcome::Parsed(positions) => positions,
            ReadOutcome::Missing => {
                log::debug!("[POSITION_STORE] no storage file at {}", self.path().display());
                PositionMap::new()
            }
            ReadOutcome::Corrupt(e) => {
                log::warn!(
                    "[POSITION_STORE] ignoring malformed storage file {}: {e}",
                    self.path().display()
                );
                PositionMap::new()
            }
            ReadOutcome::Unreadable(e) => {
                log::warn!(
                    "[POSITION_STORE] could not read {}: {e}",
                    self.path().display()
                );
                PositionMap::new()
            }
        }
    }

    /// Drop the entry for `file`. Returns whether an entry existed.
    pub async fn forget(&self, file: &FileIdentity) -> Result<bool, StoreError> {
        let removed = self
            .document
            .update(|positions: &mut PositionMap| positions.remove(file).is_some())
            .await?;
        if removed {
            log::info!("[POSITION_STORE] forgot {file}");
        }
        Ok(removed)
    }
}

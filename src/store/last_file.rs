use crate::host::{Notice, Notifier};
use crate::position::FileIdentity;
use crate::store::document::{JsonDocument, ReadOutcome};
use crate::store::error::StoreError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const LAST_FILE_NAME: &str = "lastOpenedFile.json";

pub const DEFAULT_ANNOUNCE_DURATION: Duration = Duration::from_secs(10);

#[derive(Debug, Default, Serialize, Deserialize)]
struct LastFileRecord {
    #[serde(
        rename = "lastOpenedFile",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    last_opened_file: Option<FileIdentity>,
}

/// Durable record of the most recently edited file.
#[derive(Debug, Clone)]
pub struct LastFilePointer {
    document: JsonDocument,
    announce_duration: Duration,
}

impl LastFilePointer {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            document: JsonDocument::new(path),
            announce_duration: DEFAULT_ANNOUNCE_DURATION,
        }
    }

    pub fn in_dir(dir: &Path) -> Self {
        Self::open(dir.join(LAST_FILE_NAME))
    }

    pub fn with_announce_duration(mut self, duration: Duration) -> Self {
        self.announce_duration = duration;
        self
    }

    pub fn path(&self) -> &Path {
        self.document.path()
    }

    pub async fn set(&self, file: &FileIdentity) -> Result<(), StoreError> {
        let record = LastFileRecord {
            last_opened_file: Some(file.clone()),
        };
        self.document.replace(&record).await?;
        log::debug!("[LAST_FILE] saved {file}");
        Ok(())
    }

    pub async fn get(&self) -> Option<FileIdentity> {
        let record = match self.document.read::<LastFileRecord>().await {
            ReadOutcome::Parsed(record) => record,
            ReadOutcome::Missing => return None,
            ReadOutcome::Corrupt(e) => {
                log::warn!(
                    "[LAST_FILE] ignoring malformed record {}: {e}",
                    self.path().display()
                );
                return None;
            }
            ReadOutcome::Unreadable(e) => {
                log::warn!("[LAST_FILE] could not read {}: {e}", self.path().display());
                return None;
            }
        };
        // An empty path is treated the same as no record
        record.last_opened_file.filter(|file| !file.as_str().is_empty())
    }

    /// Startup notice for the last edited file. Creates an empty record if
    /// none exists yet; never changes editor state.
    pub async fn announce<N: Notifier + ?Sized>(&self, notifier: &mut N) -> Option<FileIdentity> {
        match self.document.ensure_exists::<LastFileRecord>().await {
            Ok(true) => log::info!("[LAST_FILE] created empty record at {}", self.path().display()),
            Ok(false) => {}
            Err(e) => log::warn!("[LAST_FILE] could not create record: {e}"),
        }

        let last = self.get().await?;
        log::info!("[LAST_FILE] last opened file: {last}");
        notifier.notify(Notice::status(
            format!("Last opened file: {last}"),
            self.announce_duration,
        ));
        Some(last)
    }
}

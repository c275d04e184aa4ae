//! Whole-document JSON files shared by the position store and the last-file
//! pointer.
//!
//! Every access reads or writes the complete document. Writers for the same
//! path are serialized behind one async lock for the whole read-modify-write,
//! and writes land through a temporary sibling file plus rename so readers
//! never observe a half-written document.

use crate::store::error::StoreError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Result of reading a backing document without a lock.
#[derive(Debug)]
pub enum ReadOutcome<T> {
    Missing,
    Parsed(T),
    Corrupt(serde_json::Error),
    Unreadable(std::io::Error),
}

#[derive(Debug, Clone)]
pub struct JsonDocument {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

type LockRegistry = std::sync::Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>;

/// One writer lock per path for the whole process, so two handles opened on the
/// same file still queue behind each other. Keys are absolute with `.`
/// components removed; symlinks and `..` are not resolved.
fn lock_for(path: &Path) -> Arc<Mutex<()>> {
    static LOCKS: OnceLock<LockRegistry> = OnceLock::new();
    let registry = LOCKS.get_or_init(Default::default);
    let key = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut locks = registry.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    locks
        .entry(key)
        .or_insert_with(|| Arc::new(Mutex::new(())))
        .clone()
}

impl JsonDocument {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let lock = lock_for(&path);
        Self { path, lock }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn read<T: DeserializeOwned>(&self) -> ReadOutcome<T> {
        // Raw bytes, so invalid UTF-8 counts as a malformed document
        match fs::read(&self.path).await {
            Ok(content) => match serde_json::from_slice(&content) {
                Ok(value) => ReadOutcome::Parsed(value),
                Err(e) => ReadOutcome::Corrupt(e),
            },
            Err(e) if e.kind() == ErrorKind::NotFound => ReadOutcome::Missing,
            Err(e) => ReadOutcome::Unreadable(e),
        }
    }

    /// Read the document, apply `mutate`, and write the result back while
    /// holding the writer lock. A missing or malformed document is replaced by
    /// `T::default()` before `mutate` runs, so the caller's change is never
    /// dropped.
    pub async fn update<T, R, F>(&self, mutate: F) -> Result<R, StoreError>
    where
        T: Serialize + DeserializeOwned + Default,
        F: FnOnce(&mut T) -> R,
    {
        let _guard = self.lock.lock().await;

        let mut value = match self.read::<T>().await {
            ReadOutcome::Parsed(value) => value,
            ReadOutcome::Missing => {
                log::debug!("[STORE] {} not found, starting empty", self.path.display());
                T::default()
            }
            ReadOutcome::Corrupt(e) => {
                log::warn!(
                    "[STORE] {} is malformed ({e}), overwriting with a fresh document",
                    self.path.display()
                );
                T::default()
            }
            ReadOutcome::Unreadable(e) => {
                return Err(StoreError::io("reading store document", &self.path, e));
            }
        };

        let result = mutate(&mut value);
        self.write_locked(&value).await?;
        Ok(result)
    }

    /// Replace the document wholesale.
    pub async fn replace<T: Serialize>(&self, value: &T) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        self.write_locked(value).await
    }

    /// Write `T::default()` if no document exists yet. Returns true when a new
    /// document was created.
    pub async fn ensure_exists<T: Serialize + Default>(&self) -> Result<bool, StoreError> {
        let _guard = self.lock.lock().await;
        match fs::try_exists(&self.path).await {
            Ok(true) => Ok(false),
            Ok(false) => {
                self.write_locked(&T::default()).await?;
                Ok(true)
            }
            Err(e) => Err(StoreError::io("checking store document", &self.path, e)),
        }
    }

    async fn write_locked<T: Serialize>(&self, value: &T) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(value)
            .map_err(|source| StoreError::serialize(&self.path, source))?;
        write_atomically(&self.path, content.as_bytes()).await
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

async fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| StoreError::io("creating store directory", parent, source))?;
        }
    }

    let tmp = temp_path(path);
    let mut file = fs::File::create(&tmp)
        .await
        .map_err(|source| StoreError::io("creating temporary store file", &tmp, source))?;
    file.write_all(bytes)
        .await
        .map_err(|source| StoreError::io("writing temporary store file", &tmp, source))?;
    file.sync_all()
        .await
        .map_err(|source| StoreError::io("syncing temporary store file", &tmp, source))?;
    drop(file);

    fs::rename(&tmp, path)
        .await
        .map_err(|source| StoreError::io("replacing store document", path, source))
}

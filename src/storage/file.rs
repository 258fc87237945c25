//! File-backed durable store.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use super::{check_quota, DurableStore, StoreError};

/// A [`DurableStore`] keeping each storage key in `<dir>/<key>.json`.
///
/// Writes go to a uniquely named temporary sibling first and are renamed
/// into place, so a crash mid-write leaves the previous payload intact and
/// concurrent writers never share a temp file.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    quota_bytes: Option<usize>,
}

impl FileStore {
    /// Opens (creating if needed) the directory at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            quota_bytes: None,
        })
    }

    /// Rejects payloads larger than `quota_bytes`.
    pub fn with_quota(mut self, quota_bytes: Option<usize>) -> Self {
        self.quota_bytes = quota_bytes;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, storage_key: &str) -> PathBuf {
        self.dir.join(format!("{storage_key}.json"))
    }
}

impl DurableStore for FileStore {
    fn read_raw(&self, storage_key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        match fs::read(self.path_for(storage_key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn write_raw(&self, storage_key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        check_quota(self.quota_bytes, bytes.len())?;

        let path = self.path_for(storage_key);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(bytes)?;
        tmp.persist(&path).map_err(|err| err.error)?;

        debug!("Wrote {} bytes to {}", bytes.len(), path.display());
        Ok(())
    }
}

//! Local cache adapters holding a single namespaced JSON entry.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, warn};

use crate::error::CacheError;

/// Synchronous key/value slot storing the encoded task list.
pub trait LocalCache: Send + Sync {
    /// Read the stored payload. `Ok(None)` means nothing has been written yet.
    ///
    /// # Errors
    /// Returns an error when the backing storage cannot be read.
    fn read(&self) -> Result<Option<String>, CacheError>;

    /// Replace the stored payload.
    ///
    /// # Errors
    /// Returns an error when the backing storage cannot be written.
    fn write(&self, payload: &str) -> Result<(), CacheError>;
}

impl<C: LocalCache + ?Sized> LocalCache for Arc<C> {
    fn read(&self) -> Result<Option<String>, CacheError> {
        (**self).read()
    }

    fn write(&self, payload: &str) -> Result<(), CacheError> {
        (**self).write(payload)
    }
}

/// Cache entry stored as `<dir>/<namespace>.json`.
#[derive(Debug, Clone)]
pub struct FileCache {
    path: PathBuf,
}

impl FileCache {
    /// Cache entry `namespace` inside `dir`. The directory is created lazily.
    pub fn new(dir: impl AsRef<Path>, namespace: &str) -> Self {
        Self {
            path: dir.as_ref().join(format!("{namespace}.json")),
        }
    }

    /// Location of the cache file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

impl LocalCache for FileCache {
    fn read(&self) -> Result<Option<String>, CacheError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(decode_lossy(bytes, &self.path))),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "cache file does not exist yet");
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    fn write(&self, payload: &str) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        // Write-then-rename so readers never observe a half-written file.
        let staging = self.staging_path();
        fs::write(&staging, payload)?;
        fs::rename(&staging, &self.path)?;
        debug!(path = %self.path.display(), bytes = payload.len(), "cache written");
        Ok(())
    }
}

// Invalid UTF-8 is malformed content, not a storage failure. The replacement
// characters make the payload fail JSON decoding downstream.
fn decode_lossy(bytes: Vec<u8>, path: &Path) -> String {
    String::from_utf8(bytes).unwrap_or_else(|err| {
        warn!(path = %path.display(), error = %err, "cache file is not valid UTF-8");
        String::from_utf8_lossy(err.as_bytes()).into_owned()
    })
}

/// In-process cache slot.
#[derive(Debug, Default)]
pub struct MemoryCache {
    slot: Mutex<Option<String>>,
}

impl MemoryCache {
    /// Empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache pre-populated with `payload`.
    pub fn with_payload(payload: impl Into<String>) -> Self {
        Self {
            slot: Mutex::new(Some(payload.into())),
        }
    }

    /// Current contents.
    #[must_use]
    pub fn contents(&self) -> Option<String> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl LocalCache for MemoryCache {
    fn read(&self) -> Result<Option<String>, CacheError> {
        Ok(self.contents())
    }

    fn write(&self, payload: &str) -> Result<(), CacheError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(payload.to_owned());
        Ok(())
    }
}

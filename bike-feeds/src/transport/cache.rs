//! Raw feed cache, one entry per provider.

use std::path::{Path, PathBuf};

use bytes::Bytes;

use super::error::CacheError;

/// Storage for the last raw feed received from each provider.
///
/// Entries are keyed by provider name and overwritten on every successful
/// fetch. There is no versioning or expiry.
pub trait CacheStore: Send + Sync {
    /// Read the saved feed for `name`.
    fn read(&self, name: &str) -> Result<Bytes, CacheError>;

    /// Save the feed for `name`, replacing any previous entry.
    fn write(&self, name: &str, feed: &[u8]) -> Result<(), CacheError>;
}

/// Directory-backed cache: one file per provider, named after it.
#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Get the cache directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the entry for `name`.
    ///
    /// Path separators in provider names are replaced so every entry stays
    /// directly inside the cache directory.
    pub fn entry_path(&self, name: &str) -> PathBuf {
        let file_name: String = name
            .chars()
            .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
            .collect();
        self.dir.join(file_name)
    }
}

impl CacheStore for FileCache {
    fn read(&self, name: &str) -> Result<Bytes, CacheError> {
        match std::fs::read(self.entry_path(name)) {
            Ok(feed) => Ok(Bytes::from(feed)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(CacheError::NotFound(name.to_string()))
            }
            Err(source) => Err(CacheError::Io {
                name: name.to_string(),
                source,
            }),
        }
    }

    fn write(&self, name: &str, feed: &[u8]) -> Result<(), CacheError> {
        let io_error = |source: std::io::Error| CacheError::Io {
            name: name.to_string(),
            source,
        };

        // Create the cache directory on first use
        if !self.dir.as_os_str().is_empty() && !self.dir.exists() {
            std::fs::create_dir_all(&self.dir).map_err(io_error)?;
        }

        std::fs::write(self.entry_path(name), feed).map_err(io_error)
    }
}

//! Dev-mode response cache keyed by capture content.
//!
//! Stores the raw provider body so that repeated runs against the same
//! fixture frame don't spend API quota. Entries are parsed like live
//! responses.

use crate::error::OcrError;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub(crate) struct OcrCache {
    dir: PathBuf,
}

impl OcrCache {
    pub(crate) fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Cache under the platform cache directory
    pub(crate) fn open_default() -> Option<Self> {
        dirs::cache_dir().map(|d| Self::new(d.join("PauseScan").join("ocr-cache")))
    }

    pub(crate) fn dir(&self) -> &Path {
        &self.dir
    }

    /// Hex SHA-256 of the capture bytes
    pub(crate) fn key(capture: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(capture);
        format!("{:x}", hasher.finalize())
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// Cached body for `key`, if any. Unreadable entries count as misses.
    pub(crate) fn get(&self, key: &str) -> Option<String> {
        let path = self.entry_path(key);
        match fs::read_to_string(&path) {
            Ok(body) => {
                debug!("OCR cache hit: {}", key);
                Some(body)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!("Failed to read OCR cache entry {:?}: {}", path, e);
                None
            }
        }
    }

    pub(crate) fn put(&self, key: &str, body: &str) -> Result<(), OcrError> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| OcrError::Cache(format!("{:?}: {}", self.dir, e)))?;
        let path = self.entry_path(key);
        fs::write(&path, body).map_err(|e| OcrError::Cache(format!("{:?}: {}", path, e)))?;
        debug!("OCR cache stored: {}", key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_content_hash() {
        assert_eq!(
            OcrCache::key(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_ne!(OcrCache::key(b"abc"), OcrCache::key(b"abd"));
    }

    #[test]
    fn test_put_then_get() {
        let dir = std::env::temp_dir().join(format!("pausescan-ocr-cache-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        let cache = OcrCache::new(&dir);

        let key = OcrCache::key(b"frame");
        assert!(cache.get(&key).is_none());
        cache.put(&key, r#"{"responses":[]}"#).expect("Failed to store");
        assert_eq!(cache.get(&key).as_deref(), Some(r#"{"responses":[]}"#));
        assert!(cache.dir().join(format!("{}.json", key)).exists());
    }
}

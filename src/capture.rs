//! Frozen frame capture
//!
//! A [`Capture`] pairs the PNG bytes of the paused window with a
//! [`DisplayHandle`]: a file the overlay can show. The handle owns that
//! file and removes it when released, so a superseded or cleared capture
//! never leaks frames into the cache directory.

use crate::error::{FrameError, GatewayError};
use crate::process::WindowHandle;
use async_trait::async_trait;
use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Turns a window into PNG-encoded pixels
#[async_trait]
pub trait CaptureGateway: Send + Sync {
    async fn capture_window(&self, window: WindowHandle) -> Result<Vec<u8>, GatewayError>;
}

/// The frozen frame of the current session
#[derive(Debug)]
pub struct Capture {
    bytes: Arc<[u8]>,
    display: DisplayHandle,
    captured_at: DateTime<Local>,
}

impl Capture {
    pub fn new(bytes: Arc<[u8]>, display: DisplayHandle) -> Self {
        Self {
            bytes,
            display,
            captured_at: Local::now(),
        }
    }

    pub fn bytes(&self) -> &Arc<[u8]> {
        &self.bytes
    }

    pub fn display(&self) -> &DisplayHandle {
        &self.display
    }

    pub fn captured_at(&self) -> DateTime<Local> {
        self.captured_at
    }

    /// Drop the capture, deleting its display file
    pub fn release(self) {
        self.display.release();
    }
}

/// Display-ready location of a frozen frame
#[derive(Debug)]
pub struct DisplayHandle {
    path: Option<PathBuf>,
}

impl DisplayHandle {
    pub fn path(&self) -> &Path {
        self.path.as_deref().unwrap_or_else(|| Path::new(""))
    }

    /// Delete the backing file
    pub fn release(mut self) {
        self.remove_file();
    }

    fn remove_file(&mut self) {
        if let Some(path) = self.path.take() {
            match fs::remove_file(&path) {
                Ok(()) => debug!("Released frame {:?}", path),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to release frame {:?}: {}", path, e),
            }
        }
    }
}

impl Drop for DisplayHandle {
    fn drop(&mut self) {
        self.remove_file();
    }
}

/// Writes frames to a cache directory and hands out display handles
#[derive(Debug)]
pub struct FrameStore {
    dir: PathBuf,
    seq: AtomicU64,
}

impl FrameStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            seq: AtomicU64::new(0),
        }
    }

    /// Frames under the platform cache directory
    pub fn open_default() -> Result<Self, FrameError> {
        dirs::cache_dir()
            .map(|d| Self::new(d.join("PauseScan").join("frames")))
            .ok_or(FrameError::NoCacheDir)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `bytes` to a fresh file and return its handle
    pub fn publish(&self, bytes: &[u8]) -> Result<DisplayHandle, FrameError> {
        fs::create_dir_all(&self.dir).map_err(|e| FrameError::Write {
            path: self.dir.clone(),
            source: e,
        })?;

        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        let timestamp = Local::now().format("%Y-%m-%d-%H-%M-%S");
        let path = self.dir.join(format!("frame-{}-{}.png", timestamp, seq));

        fs::write(&path, bytes).map_err(|e| FrameError::Write {
            path: path.clone(),
            source: e,
        })?;

        debug!("Published frame {:?} ({} bytes)", path, bytes.len());
        Ok(DisplayHandle { path: Some(path) })
    }
}

//! File-backed gateways for dev mode
//!
//! Never touches real processes: suspension is only logged, and captures
//! come from the newest PNG in the fixtures directory.

use crate::capture::CaptureGateway;
use crate::error::GatewayError;
use crate::process::{ProcessGateway, ProcessHandle, WindowHandle};
use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Window handle reported for the fixture process
pub(crate) const FIXTURE_WINDOW: WindowHandle = WindowHandle(1);

#[derive(Debug)]
pub(crate) struct FixtureProcessGateway {
    pid: u32,
}

impl FixtureProcessGateway {
    pub(crate) fn new(pid: u32) -> Self {
        Self { pid }
    }
}

#[async_trait]
impl ProcessGateway for FixtureProcessGateway {
    async fn find_foreground_process(&self) -> Result<ProcessHandle, GatewayError> {
        Ok(ProcessHandle::new(self.pid, FIXTURE_WINDOW, 1.0))
    }

    async fn suspend(&self, pid: u32) -> Result<(), GatewayError> {
        info!(pid, "[fixture] suspend");
        Ok(())
    }

    async fn resume(&self, pid: u32) -> Result<(), GatewayError> {
        info!(pid, "[fixture] resume");
        Ok(())
    }

    async fn bring_to_foreground(&self, window: WindowHandle) -> Result<(), GatewayError> {
        info!(window = window.0, "[fixture] bring to foreground");
        Ok(())
    }
}

#[derive(Debug)]
pub(crate) struct FixtureCaptureGateway {
    dir: PathBuf,
}

impl FixtureCaptureGateway {
    pub(crate) fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

/// Most recently modified `*.png` in `dir`
fn newest_png(dir: &Path) -> Result<PathBuf, GatewayError> {
    let entries = fs::read_dir(dir).map_err(|e| {
        GatewayError::CaptureFailed(format!("Cannot read fixtures directory {:?}: {}", dir, e))
    })?;

    entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("png"))
        })
        .filter_map(|path| {
            let modified = fs::metadata(&path).and_then(|m| m.modified()).ok()?;
            Some((modified, path))
        })
        .max()
        .map(|(_, path)| path)
        .ok_or_else(|| GatewayError::CaptureFailed(format!("No PNG fixtures in {:?}", dir)))
}

#[async_trait]
impl CaptureGateway for FixtureCaptureGateway {
    async fn capture_window(&self, window: WindowHandle) -> Result<Vec<u8>, GatewayError> {
        let path = newest_png(&self.dir)?;
        info!(window = window.0, "[fixture] capture from {:?}", path);
        tokio::fs::read(&path)
            .await
            .map_err(|e| GatewayError::CaptureFailed(format!("{:?}: {}", path, e)))
    }
}

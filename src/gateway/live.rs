//! OS-backed gateways
//!
//! Window discovery and capture go through `xcap`. Suspension uses
//! `SIGSTOP`/`SIGCONT` on Unix. Focus restore uses `NSRunningApplication`
//! on macOS. All blocking OS work runs on the blocking thread pool.

use crate::capture::CaptureGateway;
use crate::error::GatewayError;
use crate::process::{ProcessGateway, ProcessHandle, WindowHandle};
use async_trait::async_trait;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use tracing::{debug, info};
use xcap::Window;

/// Live process/window gateway
#[derive(Debug, Default)]
pub(crate) struct OsProcessGateway;

/// Live window capture gateway
#[derive(Debug, Default)]
pub(crate) struct OsCaptureGateway;

/// Run blocking OS work off the async runtime
async fn blocking<T, F>(work: F) -> Result<T, GatewayError>
where
    F: FnOnce() -> Result<T, GatewayError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| GatewayError::Os(format!("gateway task failed: {}", e)))?
}

fn xcap_error(context: &str, e: impl std::fmt::Display) -> GatewayError {
    GatewayError::Os(format!("{}: {}", context, e))
}

/// Focused, visible window of some other process
fn focused_window() -> Result<ProcessHandle, GatewayError> {
    let own_pid = std::process::id();
    let windows = Window::all().map_err(|e| xcap_error("Failed to list windows", e))?;

    for window in windows {
        if !window.is_focused().unwrap_or(false) || window.is_minimized().unwrap_or(false) {
            continue;
        }
        let pid = window
            .pid()
            .map_err(|e| xcap_error("Failed to read window process id", e))?;
        if pid == own_pid {
            continue;
        }
        let id = window
            .id()
            .map_err(|e| xcap_error("Failed to read window id", e))?;
        let scale_factor = window
            .current_monitor()
            .and_then(|monitor| monitor.scale_factor())
            .unwrap_or(1.0);

        debug!(pid, window = id, scale_factor, "Found foreground window");
        return Ok(ProcessHandle::new(pid, WindowHandle(u64::from(id)), scale_factor));
    }

    Err(GatewayError::NoForegroundWindow)
}

fn find_window(handle: WindowHandle) -> Result<Window, GatewayError> {
    let windows = Window::all().map_err(|e| xcap_error("Failed to list windows", e))?;
    windows
        .into_iter()
        .find(|w| w.id().map(u64::from).ok() == Some(handle.0))
        .ok_or(GatewayError::WindowClosed { window: handle.0 })
}

fn capture_png(handle: WindowHandle) -> Result<Vec<u8>, GatewayError> {
    let window = find_window(handle)?;
    let pixels = window
        .capture_image()
        .map_err(|e| GatewayError::CaptureFailed(e.to_string()))?;

    let mut bytes_png: Vec<u8> = Vec::new();
    DynamicImage::ImageRgba8(pixels)
        .write_to(&mut Cursor::new(&mut bytes_png), ImageFormat::Png)
        .map_err(|e| GatewayError::CaptureFailed(format!("Error saving as PNG: {}", e)))?;

    debug!(window = handle.0, bytes = bytes_png.len(), "Captured window");
    Ok(bytes_png)
}

#[cfg(unix)]
fn signal_process(pid: u32, signal: libc::c_int) -> Result<(), GatewayError> {
    if pid == std::process::id() {
        return Err(GatewayError::AccessDenied { pid });
    }
    let target = match libc::pid_t::try_from(pid) {
        Ok(target) if target > 0 => target,
        _ => return Err(GatewayError::ProcessGone { pid }),
    };

    // SAFETY: kill(2) only takes plain integers.
    let rc = unsafe { libc::kill(target, signal) };
    if rc == 0 {
        return Ok(());
    }

    let err = std::io::Error::last_os_error();
    match err.raw_os_error() {
        Some(libc::ESRCH) => Err(GatewayError::ProcessGone { pid }),
        Some(libc::EPERM) => Err(GatewayError::AccessDenied { pid }),
        _ => Err(GatewayError::Os(err.to_string())),
    }
}

#[cfg(unix)]
fn suspend_process(pid: u32) -> Result<(), GatewayError> {
    signal_process(pid, libc::SIGSTOP)
}

#[cfg(unix)]
fn resume_process(pid: u32) -> Result<(), GatewayError> {
    signal_process(pid, libc::SIGCONT)
}

#[cfg(not(unix))]
fn suspend_process(_pid: u32) -> Result<(), GatewayError> {
    Err(GatewayError::Unsupported("process suspension"))
}

#[cfg(not(unix))]
fn resume_process(_pid: u32) -> Result<(), GatewayError> {
    Err(GatewayError::Unsupported("process resumption"))
}

#[cfg(target_os = "macos")]
fn activate_window(handle: WindowHandle) -> Result<(), GatewayError> {
    use objc2::rc::Retained;
    use objc2_app_kit::{NSApplicationActivationOptions, NSRunningApplication};

    let window = find_window(handle)?;
    let pid = window
        .pid()
        .map_err(|e| xcap_error("Failed to read window process id", e))?;
    let pid_t = libc::pid_t::try_from(pid).map_err(|_| GatewayError::ProcessGone { pid })?;

    let app: Retained<NSRunningApplication> =
        unsafe { NSRunningApplication::runningApplicationWithProcessIdentifier(pid_t) }
        .ok_or(GatewayError::ProcessGone { pid })?;
    let activated = unsafe {
        app.activateWithOptions(NSApplicationActivationOptions::NSApplicationActivateIgnoringOtherApps)
    };

    if activated {
        Ok(())
    } else {
        Err(GatewayError::Os(format!(
            "Failed to activate application {}",
            pid
        )))
    }
}

#[cfg(not(target_os = "macos"))]
fn activate_window(_handle: WindowHandle) -> Result<(), GatewayError> {
    Err(GatewayError::Unsupported("bringing a window to the foreground"))
}

#[async_trait]
impl ProcessGateway for OsProcessGateway {
    async fn find_foreground_process(&self) -> Result<ProcessHandle, GatewayError> {
        blocking(focused_window).await
    }

    async fn suspend(&self, pid: u32) -> Result<(), GatewayError> {
        blocking(move || suspend_process(pid)).await?;
        info!(pid, "Process suspended");
        Ok(())
    }

    async fn resume(&self, pid: u32) -> Result<(), GatewayError> {
        blocking(move || resume_process(pid)).await?;
        info!(pid, "Process resumed");
        Ok(())
    }

    async fn bring_to_foreground(&self, window: WindowHandle) -> Result<(), GatewayError> {
        blocking(move || activate_window(window)).await
    }
}

#[async_trait]
impl CaptureGateway for OsCaptureGateway {
    async fn capture_window(&self, window: WindowHandle) -> Result<Vec<u8>, GatewayError> {
        blocking(move || capture_png(window)).await
    }
}

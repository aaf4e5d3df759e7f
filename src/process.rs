//! Process and window identity, and the gateway that suspends them
//!
//! The gateway is consumed through [`ProcessGateway`]; the OS-backed and
//! fixture-backed implementations live in [`crate::gateway`].

use crate::error::GatewayError;
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;

/// Opaque top-level window identifier as reported by the OS
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct WindowHandle(pub u64);

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The process (and one of its windows) that a session paused
///
/// Immutable once created; owned by the active session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessHandle {
    pid: u32,
    window: WindowHandle,
    scale_factor: f32,
}

impl ProcessHandle {
    /// Non-positive or non-finite scale factors are clamped to 1.0
    pub fn new(pid: u32, window: WindowHandle, scale_factor: f32) -> Self {
        let scale_factor = if scale_factor.is_finite() && scale_factor > 0.0 {
            scale_factor
        } else {
            1.0
        };
        Self {
            pid,
            window,
            scale_factor,
        }
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn window(&self) -> WindowHandle {
        self.window
    }

    pub fn scale_factor(&self) -> f32 {
        self.scale_factor
    }
}

/// OS process/window operations used by the session controller
#[async_trait]
pub trait ProcessGateway: Send + Sync {
    /// Process owning the currently focused top-level window
    async fn find_foreground_process(&self) -> Result<ProcessHandle, GatewayError>;

    /// Freeze every thread of the process. Suspending an already
    /// suspended process must be harmless.
    async fn suspend(&self, pid: u32) -> Result<(), GatewayError>;

    /// Unfreeze the process. Fails with [`GatewayError::ProcessGone`] if it exited.
    async fn resume(&self, pid: u32) -> Result<(), GatewayError>;

    /// Best-effort focus restore
    async fn bring_to_foreground(&self, window: WindowHandle) -> Result<(), GatewayError>;
}

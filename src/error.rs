use thiserror::Error;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Hotkey error: {0}")]
    Hotkey(String),

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),
}

/// Failures reported by the OS process/window and capture gateways
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("No application window has focus")]
    NoForegroundWindow,

    #[error("Process {pid} no longer exists")]
    ProcessGone { pid: u32 },

    #[error("Access denied to process {pid}")]
    AccessDenied { pid: u32 },

    #[error("Window {window} is no longer available")]
    WindowClosed { window: u64 },

    #[error("Window capture failed: {0}")]
    CaptureFailed(String),

    #[error("OS call failed: {0}")]
    Os(String),

    #[error("Not supported on this platform: {0}")]
    Unsupported(&'static str),
}

impl GatewayError {
    /// The target process has exited, so there is nothing left to resume.
    pub fn is_process_gone(&self) -> bool {
        matches!(self, GatewayError::ProcessGone { .. })
    }
}

/// OCR pipeline errors
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("No Google Cloud API key configured - set one with `pausescan set-api-key`")]
    CredentialMissing,

    #[error("OCR provider error ({status}): {body}")]
    Provider { status: u16, body: String },

    #[error("Unexpected OCR response: {0}")]
    Format(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Failed to prepare image for OCR: {0}")]
    Image(String),

    #[error("OCR cache error: {0}")]
    Cache(String),
}

/// Settings file errors
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Could not find config directory")]
    NoConfigDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Setting `{0}` was written but did not read back")]
    NotPersisted(&'static str),
}

/// Errors publishing a frozen frame for display
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("Could not determine frame cache directory")]
    NoCacheDir,

    #[error("Failed to write frame {path}: {source}")]
    Write {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A failed step of the capture session, as shown to the user
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Ocr(#[from] OcrError),

    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error("{step} did not finish within {limit:?}")]
    Timeout {
        step: &'static str,
        limit: std::time::Duration,
    },
}

//! Session state management

use crate::capture::Capture;
use crate::ocr::OcrResult;
use crate::process::ProcessHandle;
use std::path::PathBuf;
use std::sync::Arc;

/// Sub-phases of the activation sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationStep {
    AcquireProcess,
    Suspend,
    Capture,
    Recognize,
}

impl ActivationStep {
    pub fn name(self) -> &'static str {
        match self {
            ActivationStep::AcquireProcess => "AcquireProcess",
            ActivationStep::Suspend => "Suspend",
            ActivationStep::Capture => "Capture",
            ActivationStep::Recognize => "Recognize",
        }
    }
}

/// Sub-phases of the deactivation sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeactivationStep {
    Resume,
    Restore,
}

impl DeactivationStep {
    pub fn name(self) -> &'static str {
        match self {
            DeactivationStep::Resume => "Resume",
            DeactivationStep::Restore => "Restore",
        }
    }
}

/// Where the controller is in its cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Activating(ActivationStep),
    Active,
    Deactivating(DeactivationStep),
}

impl Phase {
    /// A sequence is running and hotkey presses must not start another
    pub fn is_busy(self) -> bool {
        matches!(self, Phase::Activating(_) | Phase::Deactivating(_))
    }
}

/// The current capture session
///
/// Only the controller mutates it. Leaving a session goes through
/// [`SessionState::clear`], so an inactive session never holds a process,
/// capture, result or error.
#[derive(Debug, Default)]
pub struct SessionState {
    active: bool,
    process: Option<ProcessHandle>,
    /// The held process is (as far as we know) still suspended
    suspended: bool,
    capture: Option<Capture>,
    ocr_result: Option<Arc<OcrResult>>,
    loading_error: Option<String>,
}

impl SessionState {
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn process(&self) -> Option<&ProcessHandle> {
        self.process.as_ref()
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    pub fn capture(&self) -> Option<&Capture> {
        self.capture.as_ref()
    }

    pub fn ocr_result(&self) -> Option<&Arc<OcrResult>> {
        self.ocr_result.as_ref()
    }

    pub fn loading_error(&self) -> Option<&str> {
        self.loading_error.as_deref()
    }

    pub(crate) fn begin(&mut self) {
        self.active = true;
    }

    pub(crate) fn set_process(&mut self, process: ProcessHandle) {
        debug_assert!(self.active, "process set on an inactive session");
        self.process = Some(process);
    }

    pub(crate) fn mark_suspended(&mut self, suspended: bool) {
        debug_assert!(!suspended || self.process.is_some());
        self.suspended = suspended;
    }

    /// Store a new capture, releasing the display handle of the previous one
    pub(crate) fn replace_capture(&mut self, capture: Capture) {
        debug_assert!(self.active, "capture set on an inactive session");
        if let Some(previous) = self.capture.replace(capture) {
            previous.release();
        }
    }

    pub(crate) fn set_ocr_result(&mut self, result: OcrResult) {
        debug_assert!(self.active, "OCR result set on an inactive session");
        self.ocr_result = Some(Arc::new(result));
    }

    pub(crate) fn fail(&mut self, message: impl Into<String>) {
        debug_assert!(self.active, "error set on an inactive session");
        self.loading_error = Some(message.into());
    }

    pub(crate) fn clear_error(&mut self) {
        self.loading_error = None;
    }

    /// Reset to the empty, inactive shape
    pub(crate) fn clear(&mut self) {
        if let Some(capture) = self.capture.take() {
            capture.release();
        }
        *self = Self::default();
    }

    /// Read-only snapshot for observers
    pub fn view(&self, phase: Phase) -> SessionView {
        SessionView {
            phase,
            active: self.active,
            process: self.process.clone(),
            suspended: self.suspended,
            frame: self
                .capture
                .as_ref()
                .map(|c| c.display().path().to_path_buf()),
            ocr_result: self.ocr_result.clone(),
            loading_error: self.loading_error.clone(),
        }
    }
}

/// Snapshot of the session published after every transition
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionView {
    pub phase: Phase,
    pub active: bool,
    pub process: Option<ProcessHandle>,
    pub suspended: bool,
    /// Display path of the frozen frame
    pub frame: Option<PathBuf>,
    pub ocr_result: Option<Arc<OcrResult>>,
    pub loading_error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::FrameStore;
    use crate::process::WindowHandle;

    fn frames(name: &str) -> FrameStore {
        let dir = std::env::temp_dir().join(format!(
            "pausescan-state-{}-{}",
            name,
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        FrameStore::new(dir)
    }

    fn capture(frames: &FrameStore, bytes: &[u8]) -> Capture {
        Capture::new(Arc::from(bytes), frames.publish(bytes).unwrap())
    }

    #[test]
    fn test_new_state_is_empty() {
        let state = SessionState::default();
        assert!(!state.is_active());
        assert!(state.process().is_none());
        assert!(!state.is_suspended());
        assert!(state.capture().is_none());
        assert!(state.ocr_result().is_none());
        assert!(state.loading_error().is_none());
    }

    #[test]
    fn test_clear_resets_everything_and_releases_frame() {
        let frames = frames("clear");
        let mut state = SessionState::default();
        state.begin();
        state.set_process(ProcessHandle::new(100, WindowHandle(200), 1.0));
        state.mark_suspended(true);
        state.replace_capture(capture(&frames, b"one"));
        state.fail("boom");
        let frame = state.capture().unwrap().display().path().to_path_buf();

        state.clear();

        assert!(!state.is_active());
        assert!(state.process().is_none());
        assert!(!state.is_suspended());
        assert!(state.capture().is_none());
        assert!(state.loading_error().is_none());
        assert!(!frame.exists());
    }

    #[test]
    fn test_replacing_capture_releases_previous_frame() {
        let frames = frames("replace");
        let mut state = SessionState::default();
        state.begin();
        state.replace_capture(capture(&frames, b"one"));
        let first = state.capture().unwrap().display().path().to_path_buf();

        state.replace_capture(capture(&frames, b"two"));
        let second = state.capture().unwrap().display().path().to_path_buf();

        assert!(!first.exists());
        assert!(second.exists());
        assert_eq!(&state.capture().unwrap().bytes()[..], b"two");
    }

    #[test]
    fn test_view_reflects_state() {
        let mut state = SessionState::default();
        state.begin();
        state.set_process(ProcessHandle::new(1, WindowHandle(2), 1.0));
        state.fail("no capture");

        let view = state.view(Phase::Active);
        assert!(view.active);
        assert_eq!(view.phase, Phase::Active);
        assert_eq!(view.process.unwrap().pid(), 1);
        assert!(view.frame.is_none());
        assert_eq!(view.loading_error.as_deref(), Some("no capture"));
    }

    #[test]
    fn test_busy_phases() {
        assert!(!Phase::Idle.is_busy());
        assert!(!Phase::Active.is_busy());
        assert!(Phase::Activating(ActivationStep::Capture).is_busy());
        assert!(Phase::Deactivating(DeactivationStep::Resume).is_busy());
    }
}

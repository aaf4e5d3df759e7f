//! Capture session controller
//!
//! Each hotkey press runs one of two sequences to completion:
//!
//! - activation: find the foreground process → suspend it → capture its
//!   window → OCR the capture
//! - deactivation: hide the overlay → resume the process → restore its
//!   focus → reset the session
//!
//! A process suspended by this controller is never left suspended
//! silently: a failed capture or any step timeout after the suspend
//! unwinds the suspension immediately, and a failed resume on deactivation
//! is raised to the user.

use super::state::{ActivationStep, DeactivationStep, Phase, SessionState, SessionView};
use crate::capture::{Capture, FrameStore};
use crate::error::{GatewayError, SessionError};
use crate::gateway::Gateways;
use crate::hotkeys::HotkeyPressed;
use crate::ocr::TextRecognizer;
use crate::presentation::Overlay;
use crate::process::ProcessGateway;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

/// Resume a process whose activation is being abandoned.
///
/// A process that has already exited counts as unwound.
pub async fn unwind_suspension(
    process: &dyn ProcessGateway,
    pid: u32,
) -> Result<(), GatewayError> {
    match process.resume(pid).await {
        Ok(()) => {
            info!(pid, "Suspension unwound");
            Ok(())
        }
        Err(e) if e.is_process_gone() => {
            warn!(pid, "Process exited while suspended, nothing to unwind");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// Await `fut`, failing with [`SessionError::Timeout`] after `limit`
async fn bounded<T, E, F>(limit: Option<Duration>, step: &'static str, fut: F) -> Result<T, SessionError>
where
    F: Future<Output = Result<T, E>>,
    E: Into<SessionError>,
{
    match limit {
        Some(limit) => match tokio::time::timeout(limit, fut).await {
            Ok(result) => result.map_err(Into::into),
            Err(_) => Err(SessionError::Timeout { step, limit }),
        },
        None => fut.await.map_err(Into::into),
    }
}

pub struct SessionController {
    gateways: Gateways,
    recognizer: Arc<dyn TextRecognizer>,
    frames: FrameStore,
    overlay: Arc<dyn Overlay>,
    step_timeout: Option<Duration>,
    state: SessionState,
    phase: Phase,
    updates: watch::Sender<SessionView>,
}

impl SessionController {
    pub fn new(
        gateways: Gateways,
        recognizer: Arc<dyn TextRecognizer>,
        frames: FrameStore,
        overlay: Arc<dyn Overlay>,
        step_timeout: Option<Duration>,
    ) -> Self {
        let (updates, _) = watch::channel(SessionView::default());
        Self {
            gateways,
            recognizer,
            frames,
            overlay,
            step_timeout,
            state: SessionState::default(),
            phase: Phase::Idle,
            updates,
        }
    }

    /// Receive a snapshot after every transition
    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.updates.subscribe()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Process hotkey presses one at a time until the sender is dropped or
    /// `shutdown` resolves, then close any open session.
    ///
    /// Presses that arrive while a sequence is running are discarded.
    pub async fn run<S>(&mut self, mut presses: mpsc::UnboundedReceiver<HotkeyPressed>, shutdown: S)
    where
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                biased;
                press = presses.recv() => {
                    if press.is_none() {
                        info!("Hotkey channel closed, controller stopping");
                        break;
                    }
                    self.handle_hotkey().await;

                    let mut ignored = 0usize;
                    while presses.try_recv().is_ok() {
                        ignored += 1;
                    }
                    if ignored > 0 {
                        debug!(ignored, "Ignored hotkey presses received mid-sequence");
                    }
                }
                _ = &mut shutdown => {
                    info!("Shutdown requested, controller stopping");
                    break;
                }
            }
        }

        // Never exit with a process left paused
        self.deactivate().await;
    }

    /// Toggle between activation and deactivation
    pub async fn handle_hotkey(&mut self) {
        if self.phase.is_busy() {
            debug!(phase = ?self.phase, "Hotkey ignored while a sequence is running");
            return;
        }
        if self.state.is_active() {
            self.deactivate().await;
        } else {
            self.activate().await;
        }
    }

    fn enter(&mut self, phase: Phase) {
        self.phase = phase;
        self.updates.send_replace(self.state.view(phase));
    }

    /// Run the activation sequence. Stops at the first failing step with the
    /// error recorded and the session left active for the user to dismiss.
    pub async fn activate(&mut self) {
        if self.state.is_active() {
            debug!("Session already active");
            return;
        }

        self.state.begin();
        self.overlay.show();

        // AcquireProcess
        self.enter(Phase::Activating(ActivationStep::AcquireProcess));
        let process_gateway = self.gateways.process.clone();
        let process = match bounded(
            self.step_timeout,
            ActivationStep::AcquireProcess.name(),
            process_gateway.find_foreground_process(),
        )
        .await
        {
            Ok(process) => process,
            Err(e) => return self.stop_activation(ActivationStep::AcquireProcess, e),
        };
        info!(
            pid = process.pid(),
            window = process.window().0,
            scale_factor = process.scale_factor(),
            "Foreground process acquired"
        );
        let pid = process.pid();
        let window = process.window();
        self.state.set_process(process);
        self.state.clear_error();

        // Suspend
        self.enter(Phase::Activating(ActivationStep::Suspend));
        match bounded(
            self.step_timeout,
            ActivationStep::Suspend.name(),
            process_gateway.suspend(pid),
        )
        .await
        {
            Ok(()) => self.state.mark_suspended(true),
            Err(e @ SessionError::Timeout { .. }) => {
                // The suspend may still land after we stop waiting
                self.state.mark_suspended(true);
                return self.abort_activation(ActivationStep::Suspend, e).await;
            }
            Err(e) => return self.stop_activation(ActivationStep::Suspend, e),
        }
        self.state.clear_error();

        // Capture
        self.enter(Phase::Activating(ActivationStep::Capture));
        let capture_gateway = self.gateways.capture.clone();
        let bytes = match bounded(
            self.step_timeout,
            ActivationStep::Capture.name(),
            capture_gateway.capture_window(window),
        )
        .await
        {
            Ok(bytes) => bytes,
            Err(e) => return self.abort_activation(ActivationStep::Capture, e).await,
        };
        let display = match self.frames.publish(&bytes) {
            Ok(display) => display,
            Err(e) => {
                return self
                    .abort_activation(ActivationStep::Capture, e.into())
                    .await
            }
        };
        let bytes: Arc<[u8]> = Arc::from(bytes);
        self.state
            .replace_capture(Capture::new(bytes.clone(), display));
        self.state.clear_error();

        // Recognize
        self.enter(Phase::Activating(ActivationStep::Recognize));
        let recognizer = self.recognizer.clone();
        match bounded(
            self.step_timeout,
            ActivationStep::Recognize.name(),
            recognizer.run_ocr(bytes),
        )
        .await
        {
            Ok(result) => {
                self.state.set_ocr_result(result);
                self.state.clear_error();
            }
            // A hung request must not keep the process frozen; the frame stays up
            Err(e @ SessionError::Timeout { .. }) => {
                return self.abort_activation(ActivationStep::Recognize, e).await
            }
            // The frame stays up and the process stays paused
            Err(e) => return self.stop_activation(ActivationStep::Recognize, e),
        }

        info!(pid, "Session active");
        self.enter(Phase::Active);
    }

    /// Record a failed step and end activation without touching the process
    fn stop_activation(&mut self, step: ActivationStep, e: SessionError) {
        error!(step = step.name(), "Activation failed: {}", e);
        self.state.fail(e.to_string());
        self.enter(Phase::Active);
    }

    /// Record a failed step after suspension and resume the process before stopping
    async fn abort_activation(&mut self, step: ActivationStep, e: SessionError) {
        error!(step = step.name(), "Activation failed after suspend: {}", e);
        self.state.fail(e.to_string());

        if let Some(pid) = self.state.process().map(|p| p.pid()) {
            let process_gateway = self.gateways.process.clone();
            let unwind = bounded(
                self.step_timeout,
                DeactivationStep::Resume.name(),
                unwind_suspension(process_gateway.as_ref(), pid),
            )
            .await;
            match unwind {
                Ok(()) => self.state.mark_suspended(false),
                Err(resume_error) => {
                    // Left marked suspended so dismissing the session retries the resume
                    error!(
                        pid,
                        "Failed to resume after {} failure: {} (original error: {})",
                        step.name(),
                        resume_error,
                        e
                    );
                }
            }
        }

        self.enter(Phase::Active);
    }

    /// Run the deactivation sequence. A no-op when no session is active.
    pub async fn deactivate(&mut self) {
        if !self.state.is_active() {
            debug!("No active session to deactivate");
            return;
        }

        self.overlay.hide();

        let suspended = self
            .state
            .process()
            .filter(|_| self.state.is_suspended())
            .cloned();

        if let Some(process) = suspended {
            let pid = process.pid();
            let process_gateway = self.gateways.process.clone();

            self.enter(Phase::Deactivating(DeactivationStep::Resume));
            match bounded(
                self.step_timeout,
                DeactivationStep::Resume.name(),
                process_gateway.resume(pid),
            )
            .await
            {
                Ok(()) => {
                    self.state.mark_suspended(false);
                    self.enter(Phase::Deactivating(DeactivationStep::Restore));
                    if let Err(e) = bounded(
                        self.step_timeout,
                        DeactivationStep::Restore.name(),
                        process_gateway.bring_to_foreground(process.window()),
                    )
                    .await
                    {
                        warn!(pid, "Failed to restore focus: {}", e);
                    }
                }
                Err(SessionError::Gateway(e)) if e.is_process_gone() => {
                    warn!(pid, "Process exited while suspended, nothing to resume");
                }
                Err(e) => {
                    error!(pid, "Failed to resume process: {}", e);
                    self.overlay.alert(&format!(
                        "Could not resume the paused application (pid {}): {}",
                        pid, e
                    ));
                }
            }
        } else {
            debug!("No suspended process, resetting session");
        }

        self.state.clear();
        self.enter(Phase::Idle);
        info!("Session closed");
    }
}

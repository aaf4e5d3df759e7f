//! Presentation of the session
//!
//! The controller only talks to the screen through [`Overlay`] (show, hide,
//! blocking alert). Everything else is derived from the published
//! [`SessionView`] snapshots by the progress renderer.

use crate::session::{ActivationStep, DeactivationStep, Phase, SessionView};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Main window surface driven by the controller
pub trait Overlay: Send + Sync {
    /// Make the overlay visible and focused
    fn show(&self);
    /// Hide the overlay
    fn hide(&self);
    /// Tell the user something went wrong that needs their attention
    fn alert(&self, message: &str);
}

/// Overlay that reports through the log; alerts also use a native dialog on macOS
#[derive(Debug, Default)]
pub(crate) struct DesktopOverlay;

impl Overlay for DesktopOverlay {
    fn show(&self) {
        info!("Overlay shown");
    }

    fn hide(&self) {
        info!("Overlay hidden");
    }

    fn alert(&self, message: &str) {
        error!("{}", message);
        show_native_alert(message.to_string());
    }
}

#[cfg(target_os = "macos")]
fn show_native_alert(message: String) {
    use objc2_app_kit::{NSAlert, NSAlertStyle};
    use objc2_foundation::{MainThreadMarker, NSString};

    dispatch::Queue::main().exec_async(move || {
        if let Some(mtm) = MainThreadMarker::new() {
            unsafe {
                let alert = NSAlert::new(mtm);
                alert.setAlertStyle(NSAlertStyle::Critical);
                alert.setMessageText(&NSString::from_str("PauseScan"));
                alert.setInformativeText(&NSString::from_str(&message));
                alert.runModal();
            }
        }
    });
}

#[cfg(not(target_os = "macos"))]
fn show_native_alert(_message: String) {}

fn activation_message(step: ActivationStep) -> &'static str {
    match step {
        ActivationStep::AcquireProcess => "Finding the foreground application",
        ActivationStep::Suspend => "Pausing application",
        ActivationStep::Capture => "Capturing frame",
        ActivationStep::Recognize => "Recognizing text",
    }
}

fn deactivation_message(step: DeactivationStep) -> &'static str {
    match step {
        DeactivationStep::Resume => "Resuming application",
        DeactivationStep::Restore => "Restoring focus",
    }
}

/// Message for the persistent progress indicator, `None` when idle
pub(crate) fn progress_message(view: &SessionView, hotkey: &str) -> Option<String> {
    if let Some(error) = &view.loading_error {
        return Some(format!("{}. Press {} to close and resume", error, hotkey));
    }
    match view.phase {
        Phase::Idle => None,
        Phase::Activating(step) => Some(activation_message(step).to_string()),
        Phase::Active => Some("Ready".to_string()),
        Phase::Deactivating(step) => Some(deactivation_message(step).to_string()),
    }
}

/// Render every published snapshot until the controller goes away
pub(crate) fn spawn_progress_renderer(
    mut updates: watch::Receiver<SessionView>,
    hotkey: String,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut last: Option<String> = None;
        while updates.changed().await.is_ok() {
            let view = updates.borrow_and_update().clone();
            let message = progress_message(&view, &hotkey);
            if message == last {
                continue;
            }

            match (&message, &view.loading_error) {
                (Some(text), Some(_)) => warn!("{}", text),
                (Some(text), None) => info!("{}", text),
                (None, _) => info!("Session closed"),
            }

            if view.phase == Phase::Active && view.loading_error.is_none() {
                if let Some(result) = &view.ocr_result {
                    info!(
                        language = %result.detected_language,
                        words = result.words.len(),
                        frame = ?view.frame,
                        "Recognized: {}",
                        result.text()
                    );
                }
            }
            last = message;
        }
    })
}

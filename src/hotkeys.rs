//! Global hotkey management
//!
//! One global shortcut toggles the capture session. It works even when the
//! paused application has focus.

use crate::error::AppError;
use global_hotkey::{
    hotkey::{Code, HotKey, Modifiers},
    GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState,
};
use std::str::FromStr;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// One press of the session hotkey
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HotkeyPressed;

/// Alt + P
fn default_hotkey() -> HotKey {
    HotKey::new(Some(Modifiers::ALT), Code::KeyP)
}

/// Parse an accelerator such as `alt+KeyP`, falling back to Alt + P
pub(crate) fn parse_hotkey(accelerator: &str) -> HotKey {
    match HotKey::from_str(accelerator) {
        Ok(hotkey) => hotkey,
        Err(e) => {
            warn!(
                "Invalid hotkey {:?} ({}), falling back to Alt + P",
                accelerator, e
            );
            default_hotkey()
        }
    }
}

/// Human-readable form of an accelerator, e.g. `alt+KeyP` → `Alt+P`
pub(crate) fn hotkey_label(accelerator: &str) -> String {
    if HotKey::from_str(accelerator).is_err() {
        return "Alt+P".to_string();
    }
    accelerator
        .split('+')
        .map(|token| {
            let token = token.trim();
            match token.to_ascii_lowercase().as_str() {
                "alt" | "option" => "Alt".to_string(),
                "ctrl" | "control" => "Ctrl".to_string(),
                "shift" => "Shift".to_string(),
                "super" | "cmd" | "command" | "meta" => "Cmd".to_string(),
                _ => token
                    .strip_prefix("Key")
                    .or_else(|| token.strip_prefix("Digit"))
                    .unwrap_or(token)
                    .to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join("+")
}

/// Register the session hotkey
///
/// Returns the manager, which must stay alive for the hotkey to keep
/// working, and the id of the registered hotkey.
pub(crate) fn init_hotkey(accelerator: &str) -> Result<(GlobalHotKeyManager, u32), AppError> {
    let manager = GlobalHotKeyManager::new()
        .map_err(|e| AppError::Hotkey(format!("Failed to create hotkey manager: {}", e)))?;

    let hotkey = parse_hotkey(accelerator);
    let id = hotkey.id();
    manager
        .register(hotkey)
        .map_err(|e| AppError::Hotkey(format!("Failed to register session hotkey: {}", e)))?;

    info!("Registered global hotkey: {}", hotkey_label(accelerator));
    Ok((manager, id))
}

/// Start listening for hotkey events
///
/// This spawns a background thread (not tokio task) that polls for hotkey
/// events and forwards presses of `hotkey_id` to the controller. The thread
/// exits once the controller drops its receiver.
pub(crate) fn start_hotkey_listener(hotkey_id: u32, presses: mpsc::UnboundedSender<HotkeyPressed>) {
    std::thread::spawn(move || {
        let receiver = GlobalHotKeyEvent::receiver();

        info!("Hotkey listener started on dedicated thread");

        loop {
            // Use try_recv with sleep to avoid blocking issues
            match receiver.try_recv() {
                Ok(event) => {
                    debug!("Hotkey event received: {:?}", event);

                    // Only handle key press, ignore key release
                    if event.state != HotKeyState::Pressed || event.id != hotkey_id {
                        continue;
                    }

                    if presses.send(HotkeyPressed).is_err() {
                        info!("Controller gone, stopping hotkey listener");
                        break;
                    }
                }
                Err(_) => {
                    if presses.is_closed() {
                        break;
                    }
                    std::thread::sleep(Duration::from_millis(50));
                }
            }
        }
    });
}

//! Capture session
//!
//! [`SessionState`] holds what the current session has acquired, and
//! [`SessionController`] is its only writer.

mod controller;
mod state;

pub use controller::{unwind_suspension, SessionController};
pub use state::{ActivationStep, DeactivationStep, Phase, SessionState, SessionView};

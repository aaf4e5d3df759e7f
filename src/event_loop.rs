//! Main-thread event loop
//!
//! On macOS global hotkeys and alerts need a running `NSApplication`, so
//! the main thread hands itself over to AppKit. Elsewhere it waits for the
//! controller while tokio workers drive the session.
//!
//! Either way the process only exits after the controller has stopped,
//! which closes any open session first.

use crate::error::AppError;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Resolves on Ctrl+C, or SIGTERM on Unix
pub(crate) async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate = match signal(SignalKind::terminate()) {
            Ok(terminate) => terminate,
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                wait_for_ctrl_c().await;
                return;
            }
        };
        tokio::select! {
            _ = wait_for_ctrl_c() => {}
            _ = terminate.recv() => info!("SIGTERM received"),
        }
    }

    #[cfg(not(unix))]
    wait_for_ctrl_c().await;
}

async fn wait_for_ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Ctrl+C received"),
        Err(e) => {
            // Without a handler the only way out is the controller stopping on its own
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

async fn join_controller(controller: JoinHandle<()>) -> Result<(), AppError> {
    controller
        .await
        .map_err(|e| AppError::Config(format!("Controller task failed during shutdown: {}", e)))
}

#[cfg(target_os = "macos")]
pub(crate) async fn run(controller: JoinHandle<()>) -> Result<(), AppError> {
    use objc2_app_kit::{NSApplication, NSApplicationActivationPolicy};
    use objc2_foundation::MainThreadMarker;

    let mtm = MainThreadMarker::new()
        .ok_or_else(|| AppError::Config("event loop must run on the main thread".into()))?;

    // Background utility: no dock icon, no menu bar
    let app = NSApplication::sharedApplication(mtm);
    app.setActivationPolicy(NSApplicationActivationPolicy::Accessory);

    // AppKit owns the main thread until terminated, so quitting is driven from here
    tokio::spawn(async move {
        if let Err(e) = join_controller(controller).await {
            warn!("{}", e);
        }
        info!("Controller stopped, terminating application");
        dispatch::Queue::main().exec_async(|| {
            if let Some(mtm) = MainThreadMarker::new() {
                let app = NSApplication::sharedApplication(mtm);
                unsafe { app.terminate(None) };
            }
        });
    });

    info!("Entering AppKit run loop");
    unsafe { app.run() };
    Ok(())
}

#[cfg(not(target_os = "macos"))]
pub(crate) async fn run(controller: JoinHandle<()>) -> Result<(), AppError> {
    info!("Running, press Ctrl+C to quit");
    join_controller(controller).await?;
    info!("Shutting down");
    Ok(())
}

//! Gateway capability sets
//!
//! The controller talks to the OS through [`Gateways`], chosen once at
//! startup: live OS access, or file-backed fixtures in dev mode.

mod fixture;
mod live;

use crate::capture::CaptureGateway;
use crate::config::DevConfig;
use crate::process::ProcessGateway;
use std::sync::Arc;
use tracing::info;

/// Process and capture gateways used by one controller
#[derive(Clone)]
pub struct Gateways {
    pub process: Arc<dyn ProcessGateway>,
    pub capture: Arc<dyn CaptureGateway>,
}

impl Gateways {
    pub(crate) fn live() -> Self {
        info!("Using live OS gateways");
        Self {
            process: Arc::new(live::OsProcessGateway),
            capture: Arc::new(live::OsCaptureGateway),
        }
    }

    pub(crate) fn fixture(dev: &DevConfig) -> Self {
        info!(
            "Dev mode: using fixture gateways (pid {}, fixtures {:?})",
            dev.fixture_pid, dev.fixtures_dir
        );
        Self {
            process: Arc::new(fixture::FixtureProcessGateway::new(dev.fixture_pid)),
            capture: Arc::new(fixture::FixtureCaptureGateway::new(&dev.fixtures_dir)),
        }
    }

    /// Capability set for the configured mode
    pub(crate) fn select(dev: &DevConfig) -> Self {
        if dev.enabled {
            Self::fixture(dev)
        } else {
            Self::live()
        }
    }
}

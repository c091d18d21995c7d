//! Seams between the orchestrator and the outside world.
//!
//! Production implementations live in `updraft-fetch` and
//! `updraft-service`; tests substitute recording fakes.

use std::path::Path;

use crate::error::{ExtractError, FetchError, ResolutionError, ServiceControlError};
use crate::types::{Resolved, ServiceState};

/// Finds the latest build for a platform.
///
/// Must be deterministic enough that resolving the same remote state twice
/// yields the same identifier.
pub trait LinkResolver: Send + Sync {
    fn resolve(&self, platform: &str) -> Result<Resolved, ResolutionError>;
}

/// Moves an artifact from a URL onto local disk and unpacks it.
pub trait ArtifactFetcher: Send + Sync {
    /// Transfer `url` to `staging_path`.
    fn fetch(&self, url: &str, staging_path: &Path) -> Result<(), FetchError>;

    /// Unpack the archive at `staging_path` into the fresh directory
    /// `extraction_path`. A partial extraction is a total failure.
    fn extract(&self, staging_path: &Path, extraction_path: &Path) -> Result<(), ExtractError>;
}

/// Stops and starts the managed OS service.
///
/// Calls are fire-and-check: they return once the service manager has
/// acknowledged the transition. No health polling.
pub trait ServiceController: Send + Sync {
    fn stop(&self, service: &str) -> Result<(), ServiceControlError>;

    fn start(&self, service: &str) -> Result<(), ServiceControlError>;

    fn query(&self, _service: &str) -> ServiceState {
        ServiceState::Unknown
    }
}

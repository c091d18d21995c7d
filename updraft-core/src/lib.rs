//! updraft core library: domain types, errors, configuration, and the
//! version store.
//!
//! - [`types`]: identifiers, plans, outcomes, reports
//! - [`error`]: one error enum per concern plus [`UpdateError`]
//! - [`collaborators`]: resolver / fetcher / service controller seams
//! - [`version_store`]: [`VersionStore`] and its file-backed implementation
//! - [`config`]: [`UpdaterConfig`]
//! - [`paths`]: default state directory layout

pub mod collaborators;
pub mod config;
pub mod error;
pub mod paths;
pub mod types;
pub mod version_store;

pub use collaborators::{ArtifactFetcher, LinkResolver, ServiceController};
pub use config::{ServiceManager, UpdaterConfig};
pub use error::{
    ConfigError, ExtractError, FetchError, InstallError, LockError, PersistError,
    ResolutionError, ServiceControlError, UpdateError, ValidationError,
};
pub use types::{
    ArtifactId, CheckReport, Resolved, RunOutcome, RunReport, ServiceState, Step, UpdateFailure,
    UpdatePlan,
};
pub use version_store::{FileVersionStore, VersionStore};

//! Process-level plumbing around the orchestrator: the log sink, its
//! rotation, and the periodic watch runtime.

mod error;
pub mod log_rotation;
pub mod logging;
pub mod runtime;

pub use error::DaemonError;
pub use log_rotation::rotate_sink;
pub use runtime::{watch_blocking, watch_until, WatchSummary};

//! # updraft-engine
//!
//! The update orchestrator and the bookkeeping around it.
//!
//! Call [`Orchestrator::run`] for one full resolve → install pass, or
//! [`Orchestrator::check`] to compare without side effects. [`from_config`]
//! wires the production collaborators.

pub mod error;
pub mod guard;
pub mod install;
pub mod lock;
pub mod orchestrator;
pub mod report;
pub mod wiring;

pub use error::ReportError;
pub use lock::RunLock;
pub use orchestrator::Orchestrator;
pub use wiring::from_config;

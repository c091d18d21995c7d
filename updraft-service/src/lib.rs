//! Service controllers for the managed server process.
//!
//! Both controllers shell out to the platform's service manager and treat a
//! zero exit status as the manager's acknowledgement of the transition.

mod command;
pub mod launchd;
pub mod schedule;
pub mod systemd;

pub use command::ManagerCommand;
pub use launchd::LaunchdController;
pub use systemd::SystemdController;

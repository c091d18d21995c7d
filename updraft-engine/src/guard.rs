//! Stopped-service window.
//!
//! [`StoppedService`] exists only while the managed service is down for the
//! swap. Leaving the window by any path other than [`StoppedService::start`]
//! triggers exactly one best-effort restart: explicitly through
//! [`StoppedService::restore`] when the caller has an error to report, or
//! from `Drop` otherwise.

use std::fmt::Display;

use updraft_core::{ServiceControlError, ServiceController, ServiceState};

pub struct StoppedService<'a> {
    service: &'a dyn ServiceController,
    name: &'a str,
    state: ServiceState,
}

impl<'a> StoppedService<'a> {
    /// Stop `name` and open the window.
    ///
    /// A failed stop leaves the service in an unknown state, so one restart
    /// is attempted before the stop error is returned.
    pub fn stop(
        service: &'a dyn ServiceController,
        name: &'a str,
    ) -> Result<Self, ServiceControlError> {
        tracing::info!(service = name, "Stopping service {name}");
        match service.stop(name) {
            Ok(()) => Ok(Self {
                service,
                name,
                state: ServiceState::Stopped,
            }),
            Err(err) => {
                let mut window = Self {
                    service,
                    name,
                    state: ServiceState::Unknown,
                };
                window.restart_best_effort(&err);
                Err(err)
            }
        }
    }

    pub fn state(&self) -> ServiceState {
        self.state
    }

    /// Start the service and close the window. The window is consumed even
    /// when the start fails: that attempt was the restart.
    pub fn start(mut self) -> Result<(), ServiceControlError> {
        tracing::info!(service = self.name, "Starting service {}", self.name);
        // Disarm before calling so Drop never issues a second start.
        self.state = ServiceState::Unknown;
        self.service.start(self.name)?;
        self.state = ServiceState::Running;
        Ok(())
    }

    /// Restart after `cause` and close the window. A restart failure is
    /// logged next to `cause` and never replaces it.
    pub fn restore(mut self, cause: &dyn Display) {
        self.restart_best_effort(cause);
    }

    fn restart_best_effort(&mut self, cause: &dyn Display) {
        tracing::warn!(
            service = self.name,
            cause = %cause,
            "Restarting service {} after failed update",
            self.name
        );
        match self.service.start(self.name) {
            Ok(()) => {
                self.state = ServiceState::Running;
                tracing::info!(service = self.name, "service restarted on previous executable");
            }
            Err(restart_err) => {
                self.state = ServiceState::Unknown;
                tracing::error!(
                    service = self.name,
                    cause = %cause,
                    error = %restart_err,
                    "best-effort restart failed; service may be down"
                );
            }
        }
    }
}

impl Drop for StoppedService<'_> {
    fn drop(&mut self) {
        if self.state == ServiceState::Stopped {
            self.restart_best_effort(&"update aborted while the service was stopped");
        }
    }
}

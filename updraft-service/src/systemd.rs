//! systemd controller (`systemctl stop|start|is-active <unit>`).

use updraft_core::{ServiceControlError, ServiceController, ServiceState};

use crate::command::ManagerCommand;

#[derive(Debug, Clone)]
pub struct SystemdController {
    command: ManagerCommand,
}

impl Default for SystemdController {
    fn default() -> Self {
        Self::new(ManagerCommand::new("systemctl"))
    }
}

impl SystemdController {
    pub fn new(command: ManagerCommand) -> Self {
        Self { command }
    }
}

impl ServiceController for SystemdController {
    fn stop(&self, service: &str) -> Result<(), ServiceControlError> {
        self.command.run(&["stop", service])?;
        Ok(())
    }

    fn start(&self, service: &str) -> Result<(), ServiceControlError> {
        self.command.run(&["start", service])?;
        Ok(())
    }

    fn query(&self, service: &str) -> ServiceState {
        // `is-active` exits non-zero for anything but "active"; read stdout.
        match self.command.output(&["is-active", service]) {
            Ok(output) => parse_is_active(&String::from_utf8_lossy(&output.stdout)),
            Err(err) => {
                tracing::warn!(service, error = %err, "service state query failed");
                ServiceState::Unknown
            }
        }
    }
}

fn parse_is_active(stdout: &str) -> ServiceState {
    match stdout.trim() {
        "active" | "reloading" | "deactivating" => ServiceState::Running,
        "inactive" | "failed" => ServiceState::Stopped,
        _ => ServiceState::Unknown,
    }
}

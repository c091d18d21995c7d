//! launchd controller.
//!
//! A launchd job with `KeepAlive` is respawned as soon as it is killed, so a
//! stop has to unload the job: `bootout` stops it and `bootstrap` +
//! `kickstart` bring it back from its plist.

use std::path::{Path, PathBuf};
use std::process::Command;

use updraft_core::{ServiceControlError, ServiceController, ServiceState};

use crate::command::ManagerCommand;

#[derive(Debug, Clone)]
pub struct LaunchdController {
    command: ManagerCommand,
    /// `gui/<uid>` for per-user agents, `system` for daemons.
    domain: String,
    /// Directory holding `<label>.plist`.
    plist_dir: PathBuf,
}

impl LaunchdController {
    pub fn new(command: ManagerCommand, domain: impl Into<String>, plist_dir: PathBuf) -> Self {
        Self {
            command,
            domain: domain.into(),
            plist_dir,
        }
    }

    /// Controller for the calling user: `gui/<uid>` with
    /// `~/Library/LaunchAgents`, or `system` with `/Library/LaunchDaemons`
    /// when running as root.
    pub fn for_current_user() -> Result<Self, ServiceControlError> {
        ensure_macos()?;
        let domain = launchctl_domain()?;
        let plist_dir = if domain == "system" {
            PathBuf::from("/Library/LaunchDaemons")
        } else {
            let home = dirs::home_dir().ok_or_else(|| {
                ServiceControlError::Unsupported("cannot determine home directory".into())
            })?;
            launch_agents_dir(&home)
        };
        Ok(Self::new(ManagerCommand::new("launchctl"), domain, plist_dir))
    }

    fn target(&self, label: &str) -> String {
        format!("{}/{label}", self.domain)
    }

    pub fn plist_path(&self, label: &str) -> PathBuf {
        self.plist_dir.join(format!("{label}.plist"))
    }
}

impl ServiceController for LaunchdController {
    fn stop(&self, label: &str) -> Result<(), ServiceControlError> {
        self.command.run(&["bootout", &self.target(label)])?;
        Ok(())
    }

    fn start(&self, label: &str) -> Result<(), ServiceControlError> {
        let plist = self.plist_path(label).display().to_string();
        self.command.run(&["bootstrap", &self.domain, &plist])?;
        self.command.run(&["kickstart", &self.target(label)])?;
        Ok(())
    }

    fn query(&self, label: &str) -> ServiceState {
        match self.command.output(&["print", &self.target(label)]) {
            // Not loaded at all after a bootout.
            Ok(output) if !output.status.success() => ServiceState::Stopped,
            Ok(output) => {
                if String::from_utf8_lossy(&output.stdout).contains("state = running") {
                    ServiceState::Running
                } else {
                    ServiceState::Stopped
                }
            }
            Err(err) => {
                tracing::warn!(label, error = %err, "launchd state query failed");
                ServiceState::Unknown
            }
        }
    }
}

pub fn launch_agents_dir(home: &Path) -> PathBuf {
    home.join("Library").join("LaunchAgents")
}

#[cfg(target_os = "macos")]
fn ensure_macos() -> Result<(), ServiceControlError> {
    Ok(())
}

#[cfg(not(target_os = "macos"))]
fn ensure_macos() -> Result<(), ServiceControlError> {
    Err(ServiceControlError::Unsupported(
        "launchd management is only supported on macOS".to_string(),
    ))
}

fn launchctl_domain() -> Result<String, ServiceControlError> {
    let output = Command::new("id")
        .arg("-u")
        .output()
        .map_err(|source| ServiceControlError::Spawn {
            command: "id -u".into(),
            source,
        })?;
    if !output.status.success() {
        return Err(ServiceControlError::Rejected {
            command: "id -u".into(),
            status: output.status.to_string(),
            output: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    let uid = String::from_utf8_lossy(&output.stdout).trim().to_string();
    match uid.as_str() {
        "" => Err(ServiceControlError::Unsupported(
            "current uid from `id -u` was empty".to_string(),
        )),
        "0" => Ok("system".to_string()),
        _ => Ok(format!("gui/{uid}")),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn fake_launchctl(dir: &Path, print_output: &str) -> (LaunchdController, PathBuf) {
        let log = dir.join("calls.log");
        let script = dir.join("launchctl.sh");
        std::fs::write(
            &script,
            format!(
                r#"echo "$@" >> "{log}"
if [ "$1" = "print" ]; then echo "{print_output}"; fi
exit 0
"#,
                log = log.display()
            ),
        )
        .unwrap();
        let controller = LaunchdController::new(
            ManagerCommand::with_args("/bin/sh", [script.into_os_string()]),
            "gui/501",
            dir.join("LaunchAgents"),
        );
        (controller, log)
    }

    #[test]
    fn stop_boots_out_and_start_bootstraps_then_kickstarts() {
        let tmp = TempDir::new().unwrap();
        let (controller, log) = fake_launchctl(tmp.path(), "");

        controller.stop("com.example.bedrock").unwrap();
        controller.start("com.example.bedrock").unwrap();

        let plist = tmp.path().join("LaunchAgents").join("com.example.bedrock.plist");
        let calls = std::fs::read_to_string(log).unwrap();
        assert_eq!(
            calls.lines().collect::<Vec<_>>(),
            vec![
                "bootout gui/501/com.example.bedrock".to_string(),
                format!("bootstrap gui/501 {}", plist.display()),
                "kickstart gui/501/com.example.bedrock".to_string(),
            ]
        );
    }

    #[test]
    fn query_parses_running_state() {
        let tmp = TempDir::new().unwrap();
        let (controller, _) = fake_launchctl(tmp.path(), "state = running");
        assert_eq!(controller.query("com.example.bedrock"), ServiceState::Running);

        let tmp = TempDir::new().unwrap();
        let (controller, _) = fake_launchctl(tmp.path(), "state = not running");
        assert_eq!(controller.query("com.example.bedrock"), ServiceState::Stopped);
    }

    #[cfg(not(target_os = "macos"))]
    #[test]
    fn current_user_controller_requires_macos() {
        let err = LaunchdController::for_current_user().unwrap_err();
        assert!(matches!(err, ServiceControlError::Unsupported(_)));
    }
}

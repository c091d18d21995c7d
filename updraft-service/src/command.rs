use std::ffi::{OsStr, OsString};
use std::process::{Command, Output};

use updraft_core::ServiceControlError;

/// A service-manager invocation prefix, e.g. `systemctl` or
/// `sudo systemctl --user`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerCommand {
    program: OsString,
    leading_args: Vec<OsString>,
}

impl ManagerCommand {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
        }
    }

    pub fn with_args<I, S>(program: impl Into<OsString>, leading_args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self {
            program: program.into(),
            leading_args: leading_args.into_iter().map(Into::into).collect(),
        }
    }

    fn render(&self, args: &[&str]) -> String {
        std::iter::once(self.program.as_os_str())
            .chain(self.leading_args.iter().map(OsString::as_os_str))
            .chain(args.iter().map(OsStr::new))
            .map(|s| s.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Run and return the raw output regardless of exit status.
    pub(crate) fn output(&self, args: &[&str]) -> Result<Output, ServiceControlError> {
        Command::new(&self.program)
            .args(&self.leading_args)
            .args(args)
            .output()
            .map_err(|source| ServiceControlError::Spawn {
                command: self.render(args),
                source,
            })
    }

    /// Run and require a zero exit status; the manager's stdout/stderr are
    /// carried in the error otherwise.
    pub(crate) fn run(&self, args: &[&str]) -> Result<String, ServiceControlError> {
        let output = self.output(args)?;
        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if output.status.success() {
            return Ok(stdout);
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let diagnostic = match (stdout.is_empty(), stderr.is_empty()) {
            (_, true) => stdout,
            (true, false) => stderr,
            (false, false) => format!("{stdout} {stderr}"),
        };
        Err(ServiceControlError::Rejected {
            command: self.render(args),
            status: output.status.to_string(),
            output: diagnostic,
        })
    }
}

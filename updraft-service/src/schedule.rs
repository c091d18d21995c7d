//! Scheduler definitions that run `updraft run` periodically.
//!
//! The updater itself is a one-shot process; these render the units an
//! external scheduler needs. Nothing here installs them.

use std::path::Path;
use std::time::Duration;

pub const SCHEDULE_LABEL: &str = "dev.updraft.run";

/// launchd agent invoking `<binary> run` every `interval`.
pub fn launchd_plist(binary_path: &Path, interval: Duration, log_dir: &Path) -> String {
    let stdout = log_dir.join("schedule.log").display().to_string();
    let stderr = log_dir.join("schedule-err.log").display().to_string();
    let binary = binary_path.display().to_string();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
  <key>Label</key>
  <string>{label}</string>
  <key>ProgramArguments</key>
  <array>
    <string>{binary}</string>
    <string>run</string>
  </array>
  <key>StartInterval</key>
  <integer>{interval}</integer>
  <key>RunAtLoad</key>
  <false/>
  <key>StandardOutPath</key>
  <string>{stdout}</string>
  <key>StandardErrorPath</key>
  <string>{stderr}</string>
</dict>
</plist>
"#,
        label = SCHEDULE_LABEL,
        binary = binary,
        interval = interval.as_secs().max(1),
        stdout = stdout,
        stderr = stderr
    )
}

/// `(updraft.service, updraft.timer)` for a systemd oneshot + timer pair.
pub fn systemd_units(binary_path: &Path, interval: Duration) -> (String, String) {
    let service = format!(
        "[Unit]\n\
         Description=updraft server update run\n\
         Wants=network-online.target\n\
         After=network-online.target\n\
         \n\
         [Service]\n\
         Type=oneshot\n\
         ExecStart={binary} run\n",
        binary = binary_path.display()
    );
    let timer = format!(
        "[Unit]\n\
         Description=Periodic updraft server update run\n\
         \n\
         [Timer]\n\
         OnBootSec=5min\n\
         OnUnitActiveSec={secs}s\n\
         Persistent=true\n\
         \n\
         [Install]\n\
         WantedBy=timers.target\n",
        secs = interval.as_secs().max(1)
    );
    (service, timer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use plist::Value;

    #[test]
    fn plist_contains_required_launchd_fields() {
        let plist = launchd_plist(
            Path::new("/usr/local/bin/updraft"),
            Duration::from_secs(3600),
            Path::new("/Users/tester/.updraft/logs"),
        );

        let value = Value::from_reader_xml(plist.as_bytes()).expect("parse plist");
        let dict = value.as_dictionary().expect("plist root dict");

        assert_eq!(
            dict.get("Label").and_then(Value::as_string),
            Some(SCHEDULE_LABEL)
        );
        assert_eq!(
            dict.get("StartInterval")
                .and_then(Value::as_unsigned_integer),
            Some(3600)
        );
        assert_eq!(
            dict.get("RunAtLoad").and_then(Value::as_boolean),
            Some(false)
        );

        let args = dict
            .get("ProgramArguments")
            .and_then(Value::as_array)
            .expect("ProgramArguments array");
        let rendered_args: Vec<&str> = args
            .iter()
            .map(|v| v.as_string().expect("program arg as string"))
            .collect();
        assert_eq!(rendered_args, vec!["/usr/local/bin/updraft", "run"]);
    }

    #[test]
    fn systemd_timer_uses_interval_and_oneshot_service() {
        let (service, timer) =
            systemd_units(Path::new("/usr/local/bin/updraft"), Duration::from_secs(900));

        assert!(service.contains("Type=oneshot\n"));
        assert!(service.contains("ExecStart=/usr/local/bin/updraft run\n"));
        assert!(timer.contains("OnUnitActiveSec=900s\n"));
        assert!(timer.contains("WantedBy=timers.target\n"));
    }

    #[test]
    fn zero_interval_is_clamped() {
        let (_, timer) = systemd_units(Path::new("/bin/updraft"), Duration::ZERO);
        assert!(timer.contains("OnUnitActiveSec=1s\n"));
    }
}

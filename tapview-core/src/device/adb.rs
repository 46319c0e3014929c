//! [`DeviceTransport`] implemented by shelling out to `adb`.
//!
//! Every call spawns one `adb` process with piped output, bounded by the
//! matching deadline in [`TransportTimeouts`]. A process that overruns is
//! killed when its future is dropped (`kill_on_drop`).

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use super::{DeviceTransport, TransportTimeouts};
use crate::error::TapError;
use crate::geometry::DevicePoint;

/// Talks to one device through the `adb` executable.
#[derive(Debug, Clone)]
pub struct AdbTransport {
    program: PathBuf,
    serial: Option<String>,
    timeouts: TransportTimeouts,
}

impl AdbTransport {
    /// Use the `adb` binary at `program` (a bare name is looked up on `PATH`).
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            serial: None,
            timeouts: TransportTimeouts::default(),
        }
    }

    /// Target a specific device serial. An empty string means adb's default.
    pub fn with_serial(mut self, serial: impl Into<String>) -> Self {
        let serial = serial.into();
        self.serial = (!serial.trim().is_empty()).then_some(serial);
        self
    }

    /// Override the per-command deadlines.
    pub fn with_timeouts(mut self, timeouts: TransportTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn timeouts(&self) -> &TransportTimeouts {
        &self.timeouts
    }

    /// Full argument list for an adb invocation, including `-s <serial>`.
    pub fn command_args(&self, args: &[&str]) -> Vec<String> {
        let mut full = Vec::with_capacity(args.len() + 2);
        if let Some(serial) = &self.serial {
            full.push("-s".to_string());
            full.push(serial.clone());
        }
        full.extend(args.iter().map(|a| a.to_string()));
        full
    }

    /// Run one adb command, returning its stdout on success.
    async fn run(
        &self,
        command: &'static str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Vec<u8>, TapError> {
        let args = self.command_args(args);
        debug!("adb {}", args.join(" "));

        let child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(result) => result?,
            Err(_) => return Err(TapError::Timeout { command, timeout }),
        };

        if !output.status.success() {
            return Err(TapError::CommandFailed {
                command,
                message: diagnostic(&output),
            });
        }

        Ok(output.stdout)
    }
}

impl Default for AdbTransport {
    fn default() -> Self {
        Self::new("adb")
    }
}

/// Best human-readable failure text from a finished process.
fn diagnostic(output: &std::process::Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.trim().is_empty() {
        return stderr.trim().to_string();
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    if !stdout.trim().is_empty() {
        return stdout.trim().to_string();
    }
    format!("exited with {}", output.status)
}

#[async_trait]
impl DeviceTransport for AdbTransport {
    async fn capture_screen(&self, remote_path: &str) -> Result<(), TapError> {
        self.run(
            "screencap",
            &["shell", "screencap", remote_path],
            self.timeouts.capture,
        )
        .await?;
        Ok(())
    }

    async fn pull_file(&self, remote_path: &str) -> Result<Vec<u8>, TapError> {
        // `exec-out` streams the raw bytes, so nothing lands on host disk.
        let bytes = self
            .run("pull", &["exec-out", "cat", remote_path], self.timeouts.pull)
            .await?;
        if bytes.is_empty() {
            return Err(TapError::CommandFailed {
                command: "pull",
                message: format!("{remote_path} is empty or missing"),
            });
        }
        Ok(bytes)
    }

    async fn remove_file(&self, remote_path: &str) -> Result<(), TapError> {
        self.run("rm", &["shell", "rm", "-f", remote_path], self.timeouts.cleanup)
            .await?;
        Ok(())
    }

    async fn send_tap(&self, at: DevicePoint) -> Result<(), TapError> {
        let (x, y) = (at.x.to_string(), at.y.to_string());
        self.run("tap", &["shell", "input", "tap", &x, &y], self.timeouts.tap)
            .await?;
        info!("sent tap to {at}");
        Ok(())
    }

    async fn send_swipe(
        &self,
        from: DevicePoint,
        to: DevicePoint,
        duration: Duration,
    ) -> Result<(), TapError> {
        let coords = [
            from.x.to_string(),
            from.y.to_string(),
            to.x.to_string(),
            to.y.to_string(),
            duration.as_millis().to_string(),
        ];
        let mut args = vec!["shell", "input", "swipe"];
        args.extend(coords.iter().map(String::as_str));
        self.run("swipe", &args, self.timeouts.swipe).await?;
        info!("sent swipe from {from} to {to}");
        Ok(())
    }

    async fn send_key_event(&self, code: u32) -> Result<(), TapError> {
        let code_arg = code.to_string();
        self.run(
            "keyevent",
            &["shell", "input", "keyevent", &code_arg],
            self.timeouts.key,
        )
        .await?;
        info!("sent key event {code}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serial_is_prefixed() {
        let adb = AdbTransport::default().with_serial("emulator-5554");
        assert_eq!(
            adb.command_args(&["shell", "input", "tap", "1", "2"]),
            vec!["-s", "emulator-5554", "shell", "input", "tap", "1", "2"]
        );
    }

    #[test]
    fn blank_serial_means_default_device() {
        let adb = AdbTransport::default().with_serial("  ");
        assert_eq!(adb.command_args(&["devices"]), vec!["devices"]);
    }

    #[test]
    fn missing_binary_is_an_io_error() {
        let adb = AdbTransport::new("/nonexistent/tapview-test/adb");
        let result = tokio_test::block_on(adb.capture_screen("/sdcard/screen.png"));
        assert!(matches!(result, Err(TapError::Io(_))));
    }
}

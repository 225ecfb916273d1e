//! Running `xcrun` subcommands

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;
use xcdest_core::prelude::*;

/// Default timeout for a single `xcrun` invocation
pub const XCRUN_TIMEOUT: Duration = Duration::from_secs(30);

/// Run `xcrun <args>` and return its stdout
///
/// Fails unless the process exits successfully within `timeout_duration`.
pub(crate) async fn run_xcrun(args: &[&str], timeout_duration: Duration) -> Result<String> {
    let command_line = args.join(" ");
    debug!("Running xcrun {}", command_line);

    let output = timeout(
        timeout_duration,
        Command::new("xcrun")
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output(),
    )
    .await
    .map_err(|_| Error::provider(format!("xcrun {} timed out", command_line)))?
    .map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::tool_not_found("xcrun")
        } else {
            Error::provider(format!("Failed to run xcrun {}: {}", command_line, e))
        }
    })?;

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    if !stderr.is_empty() {
        debug!("xcrun {} stderr: {}", command_line, stderr);
    }

    if !output.status.success() {
        return Err(Error::provider(format!(
            "xcrun {} failed with exit code {:?}: {}",
            command_line,
            output.status.code(),
            stderr.trim()
        )));
    }

    Ok(stdout)
}

//! Tool availability checking for destination discovery
//!
//! Simulators need `xcrun simctl`; physical devices need `xcrun devicectl`,
//! which ships with Xcode 15 and later.

use std::path::PathBuf;

/// Availability of the external tools the providers shell out to
#[derive(Debug, Clone, Default)]
pub struct ToolAvailability {
    /// Resolved path of `xcrun`, if it is on PATH
    pub xcrun_path: Option<PathBuf>,

    /// Whether `xcrun simctl` runs
    pub xcrun_simctl: bool,

    /// Whether `xcrun devicectl` runs
    pub xcrun_devicectl: bool,
}

impl ToolAvailability {
    /// Check tool availability (run once at startup)
    pub async fn check() -> Self {
        let xcrun_path = which::which("xcrun")
            .inspect_err(|e| tracing::debug!("xcrun not found on PATH: {}", e))
            .ok();

        if xcrun_path.is_none() {
            return Self::default();
        }

        Self {
            xcrun_path,
            xcrun_simctl: Self::check_subcommand("simctl").await,
            xcrun_devicectl: Self::check_subcommand("devicectl").await,
        }
    }

    /// Check if `xcrun <subcommand> help` succeeds
    async fn check_subcommand(subcommand: &str) -> bool {
        // Only available on macOS
        #[cfg(not(target_os = "macos"))]
        {
            let _ = subcommand;
            false
        }

        #[cfg(target_os = "macos")]
        {
            use std::process::Stdio;
            use tokio::process::Command;

            Command::new("xcrun")
                .args([subcommand, "help"])
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .await
                .map(|s| s.success())
                .inspect_err(|e| tracing::debug!("xcrun {} check failed: {}", subcommand, e))
                .unwrap_or(false)
        }
    }

    /// Human-readable list of missing tools, empty when everything is present
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.xcrun_path.is_none() {
            missing.push("xcrun");
        }
        if !self.xcrun_simctl {
            missing.push("xcrun simctl");
        }
        if !self.xcrun_devicectl {
            missing.push("xcrun devicectl");
        }
        missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_reports_everything_missing() {
        let tools = ToolAvailability::default();
        assert_eq!(
            tools.missing(),
            vec!["xcrun", "xcrun simctl", "xcrun devicectl"]
        );
    }

    #[test]
    fn test_missing_empty_when_all_present() {
        let tools = ToolAvailability {
            xcrun_path: Some(PathBuf::from("/usr/bin/xcrun")),
            xcrun_simctl: true,
            xcrun_devicectl: true,
        };
        assert!(tools.missing().is_empty());
    }

    #[tokio::test]
    async fn test_check_is_consistent() {
        let tools = ToolAvailability::check().await;
        if tools.xcrun_path.is_none() {
            assert!(!tools.xcrun_simctl);
            assert!(!tools.xcrun_devicectl);
        }
    }
}

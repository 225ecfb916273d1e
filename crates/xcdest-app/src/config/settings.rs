//! Settings parser for .xcdest/config.toml

use std::path::Path;

use super::types::Settings;
use xcdest_core::prelude::*;

pub const CONFIG_FILENAME: &str = "config.toml";
pub const XCDEST_DIR: &str = ".xcdest";

const DEFAULT_CONFIG: &str = r#"# xcdest configuration

[ranking]
# Destination kinds, highest priority first. Kinds left out sort last.
# Values: iOSSimulator, watchOSSimulator, iOSDevice, macOS, visionOSSimulator
type_priority = ["iOSSimulator", "watchOSSimulator", "iOSDevice", "macOS", "visionOSSimulator"]

# Tie-break between iOS simulators of different device families
# Values: iPhone, iPad, iPod, AppleTV, AppleWatch, AppleVision
simulator_type_priority = ["iPhone", "iPad", "iPod", "AppleTV", "AppleWatch", "AppleVision"]

[destinations]
# Platforms listed when no --platform filter is given
# Values: iphonesimulator, watchsimulator, iphoneos, macosx, xrsimulator
platforms = ["iphonesimulator", "watchsimulator", "iphoneos", "macosx", "xrsimulator"]

[simulators]
include_unavailable = false  # Keep simulators whose runtime is missing
"#;

/// Load settings from `.xcdest/config.toml`
///
/// A missing, unreadable, unparsable or invalid file gives the defaults.
pub fn load_settings(workspace_path: &Path) -> Settings {
    let config_path = workspace_path.join(XCDEST_DIR).join(CONFIG_FILENAME);

    if !config_path.exists() {
        debug!("No config file at {:?}, using defaults", config_path);
        return Settings::default();
    }

    let settings: Settings = match std::fs::read_to_string(&config_path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(settings) => {
                debug!("Loaded settings from {:?}", config_path);
                settings
            }
            Err(e) => {
                warn!("Failed to parse {:?}: {}", config_path, e);
                return Settings::default();
            }
        },
        Err(e) => {
            warn!("Failed to read {:?}: {}", config_path, e);
            return Settings::default();
        }
    };

    match settings.validate() {
        Ok(()) => settings,
        Err(e) => {
            warn!("Ignoring {:?}: {}", config_path, e);
            Settings::default()
        }
    }
}

/// Create `.xcdest/` with a commented default config file
///
/// An existing config file is left untouched.
pub fn init_config_dir(workspace_path: &Path) -> Result<()> {
    let xcdest_dir = workspace_path.join(XCDEST_DIR);

    if !xcdest_dir.exists() {
        std::fs::create_dir_all(&xcdest_dir)
            .map_err(|e| Error::config(format!("Failed to create .xcdest dir: {}", e)))?;
    }

    let config_path = xcdest_dir.join(CONFIG_FILENAME);
    if !config_path.exists() {
        std::fs::write(&config_path, DEFAULT_CONFIG)
            .map_err(|e| Error::config(format!("Failed to write config.toml: {}", e)))?;
        info!("Created default config at {:?}", config_path);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use xcdest_core::{DestinationPlatform, DestinationType};

    #[test]
    fn test_load_settings_missing_file() {
        let temp = tempdir().unwrap();
        assert_eq!(load_settings(temp.path()), Settings::default());
    }

    #[test]
    fn test_load_settings_custom() {
        let temp = tempdir().unwrap();
        let dir = temp.path().join(XCDEST_DIR);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join(CONFIG_FILENAME),
            r#"
[ranking]
type_priority = ["macOS"]

[destinations]
platforms = ["macosx"]
"#,
        )
        .unwrap();

        let settings = load_settings(temp.path());
        assert_eq!(settings.ranking.type_priority, vec![DestinationType::MacOs]);
        assert_eq!(
            settings.destinations.platforms,
            vec![DestinationPlatform::MacOsx]
        );
    }

    #[test]
    fn test_load_settings_invalid_toml() {
        let temp = tempdir().unwrap();
        let dir = temp.path().join(XCDEST_DIR);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(CONFIG_FILENAME), "[ranking\n").unwrap();

        assert_eq!(load_settings(temp.path()), Settings::default());
    }

    #[test]
    fn test_load_settings_failing_validation() {
        let temp = tempdir().unwrap();
        let dir = temp.path().join(XCDEST_DIR);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(CONFIG_FILENAME), "[destinations]\nplatforms = []\n").unwrap();

        assert_eq!(load_settings(temp.path()), Settings::default());
    }

    #[test]
    fn test_init_config_dir_writes_parseable_defaults() {
        let temp = tempdir().unwrap();
        init_config_dir(temp.path()).unwrap();

        let config_path = temp.path().join(XCDEST_DIR).join(CONFIG_FILENAME);
        assert!(config_path.exists());
        assert_eq!(load_settings(temp.path()), Settings::default());
    }

    #[test]
    fn test_init_config_dir_keeps_existing_file() {
        let temp = tempdir().unwrap();
        let dir = temp.path().join(XCDEST_DIR);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(CONFIG_FILENAME), "# mine\n").unwrap();

        init_config_dir(temp.path()).unwrap();
        let content = std::fs::read_to_string(dir.join(CONFIG_FILENAME)).unwrap();
        assert_eq!(content, "# mine\n");
    }
}

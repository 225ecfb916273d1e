//! Configuration types for xcdest
//!
//! Defines:
//! - `Settings` - Workspace settings loaded from `.xcdest/config.toml`
//! - Per-section sub-types

use serde::{Deserialize, Serialize};
use xcdest_core::prelude::*;
use xcdest_core::{DestinationPlatform, PriorityTables, SUPPORTED_DESTINATION_PLATFORMS};

/// Workspace settings from `.xcdest/config.toml`
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub ranking: PriorityTables,

    #[serde(default)]
    pub destinations: DestinationSettings,

    #[serde(default)]
    pub simulators: SimulatorSettings,
}

/// Destination aggregation settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DestinationSettings {
    /// Platforms included when no explicit filter is given
    #[serde(default = "default_platforms")]
    pub platforms: Vec<DestinationPlatform>,
}

impl Default for DestinationSettings {
    fn default() -> Self {
        Self {
            platforms: default_platforms(),
        }
    }
}

fn default_platforms() -> Vec<DestinationPlatform> {
    SUPPORTED_DESTINATION_PLATFORMS.to_vec()
}

/// Simulator enumeration settings
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct SimulatorSettings {
    /// Keep simulators whose runtime is unavailable
    #[serde(default)]
    pub include_unavailable: bool,
}

impl Settings {
    /// Reject settings that would hide every destination or rank ambiguously
    pub fn validate(&self) -> Result<()> {
        if self.destinations.platforms.is_empty() {
            return Err(Error::config_invalid(
                "destinations.platforms must name at least one platform",
            ));
        }

        let types = &self.ranking.type_priority;
        if let Some(dup) = first_duplicate(types) {
            return Err(Error::config_invalid(format!(
                "ranking.type_priority lists {} more than once",
                dup
            )));
        }

        let sim_types = &self.ranking.simulator_type_priority;
        if let Some(dup) = first_duplicate(sim_types) {
            return Err(Error::config_invalid(format!(
                "ranking.simulator_type_priority lists {} more than once",
                dup
            )));
        }

        Ok(())
    }
}

fn first_duplicate<T: PartialEq + std::fmt::Display>(items: &[T]) -> Option<&T> {
    items
        .iter()
        .enumerate()
        .find(|(i, item)| items[..*i].contains(item))
        .map(|(_, item)| item)
}

#[cfg(test)]
mod tests {
    use super::*;
    use xcdest_core::{DestinationType, SimulatorType};

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.ranking, PriorityTables::default());
        assert_eq!(settings.destinations.platforms.len(), 5);
        assert!(!settings.simulators.include_unavailable);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_toml() {
        let settings: Settings = toml::from_str(
            r#"
[ranking]
type_priority = ["iOSDevice", "iOSSimulator"]

[simulators]
include_unavailable = true
"#,
        )
        .unwrap();

        assert_eq!(
            settings.ranking.type_priority,
            vec![DestinationType::IosDevice, DestinationType::IosSimulator]
        );
        assert_eq!(
            settings.ranking.simulator_type_priority,
            PriorityTables::default().simulator_type_priority
        );
        assert_eq!(settings.destinations, DestinationSettings::default());
        assert!(settings.simulators.include_unavailable);
    }

    #[test]
    fn test_parse_platforms() {
        let settings: Settings = toml::from_str(
            r#"
[destinations]
platforms = ["iphonesimulator", "iphoneos"]
"#,
        )
        .unwrap();

        assert_eq!(
            settings.destinations.platforms,
            vec![
                DestinationPlatform::IphoneSimulator,
                DestinationPlatform::IphoneOs
            ]
        );
    }

    #[test]
    fn test_validate_rejects_empty_platforms() {
        let mut settings = Settings::default();
        settings.destinations.platforms.clear();
        let err = settings.validate().unwrap_err();
        assert!(matches!(err, Error::ConfigInvalid { .. }));
    }

    #[test]
    fn test_validate_rejects_duplicate_priorities() {
        let mut settings = Settings::default();
        settings.ranking.simulator_type_priority =
            vec![SimulatorType::IPad, SimulatorType::IPhone, SimulatorType::IPad];
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("iPad"));
    }
}

//! Simulator discovery using `xcrun simctl`
//!
//! Runs `xcrun simctl list --json devices` and maps each simulator under an
//! iOS, watchOS or visionOS runtime to a [`SimulatorDestination`]. Runtimes
//! for other platforms (tvOS) are skipped.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;
use tokio::sync::{broadcast, RwLock};
use xcdest_core::prelude::*;
use xcdest_core::{
    IosSimulatorDestination, SimulatorDestination, SimulatorState, SimulatorType,
    VisionOsSimulatorDestination, WatchOsSimulatorDestination,
};

use crate::provider::{SimulatorProvider, UPDATE_CHANNEL_CAPACITY};
use crate::xcrun::{run_xcrun, XCRUN_TIMEOUT};

const RUNTIME_PREFIX: &str = "com.apple.CoreSimulator.SimRuntime.";
const DEVICE_TYPE_PREFIX: &str = "com.apple.CoreSimulator.SimDeviceType.";

/// JSON output from `xcrun simctl list --json devices`
#[derive(Debug, Deserialize)]
struct SimctlOutput {
    // BTreeMap keeps runtime order stable between runs
    devices: BTreeMap<String, Vec<SimctlDevice>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SimctlDevice {
    udid: String,
    name: String,
    state: String,
    #[serde(default)]
    device_type_identifier: Option<String>,
    #[serde(default)]
    is_available: Option<bool>,
}

/// Operating system family of a simulator runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RuntimeOs {
    Ios,
    WatchOs,
    VisionOs,
}

/// Simulator provider backed by `xcrun simctl`
#[derive(Debug)]
pub struct SimctlProvider {
    cache: RwLock<Option<Vec<SimulatorDestination>>>,
    updated_tx: broadcast::Sender<()>,
    include_unavailable: bool,
    timeout: Duration,
}

impl Default for SimctlProvider {
    fn default() -> Self {
        Self::new(false)
    }
}

impl SimctlProvider {
    /// Create a provider; unavailable simulators are dropped unless
    /// `include_unavailable` is set
    pub fn new(include_unavailable: bool) -> Self {
        let (updated_tx, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        Self {
            cache: RwLock::new(None),
            updated_tx,
            include_unavailable,
            timeout: XCRUN_TIMEOUT,
        }
    }

    /// Override the per-invocation timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Replace the cache, notifying subscribers only if the list changed
    async fn store(&self, simulators: Vec<SimulatorDestination>) {
        let mut cache = self.cache.write().await;
        if cache.as_ref() == Some(&simulators) {
            debug!("Simulator list unchanged ({} entries)", simulators.len());
            return;
        }
        info!("Simulator list updated: {} simulators", simulators.len());
        *cache = Some(simulators);
        drop(cache);
        // No receivers is fine
        let _ = self.updated_tx.send(());
    }
}

impl SimulatorProvider for SimctlProvider {
    async fn refresh(&self) -> Result<()> {
        let stdout = run_xcrun(&["simctl", "list", "--json", "devices"], self.timeout).await?;
        let simulators = parse_simctl_output(&stdout, self.include_unavailable)?;
        self.store(simulators).await;
        Ok(())
    }

    async fn simulators(&self) -> Result<Vec<SimulatorDestination>> {
        if let Some(cached) = self.cache.read().await.as_ref() {
            return Ok(cached.clone());
        }
        debug!("Simulator cache empty, populating");
        self.refresh().await?;
        Ok(self.cache.read().await.clone().unwrap_or_default())
    }

    fn subscribe(&self) -> broadcast::Receiver<()> {
        self.updated_tx.subscribe()
    }
}

/// Parse `simctl list --json devices` output into simulator destinations
pub fn parse_simctl_output(
    output: &str,
    include_unavailable: bool,
) -> Result<Vec<SimulatorDestination>> {
    let parsed: SimctlOutput = serde_json::from_str(output)
        .map_err(|e| Error::protocol(format!("Failed to parse simctl output: {}", e)))?;

    let mut simulators = Vec::new();

    for (runtime_key, devices) in parsed.devices {
        let Some((os, os_version)) = parse_runtime(&runtime_key) else {
            trace!("Skipping runtime {}", runtime_key);
            continue;
        };

        for device in devices {
            let is_available = device.is_available.unwrap_or(false);
            if !is_available && !include_unavailable {
                continue;
            }

            let raw_device_type_identifier = device.device_type_identifier.unwrap_or_default();
            let state = SimulatorState::from(device.state.as_str());

            let simulator = match os {
                RuntimeOs::Ios => SimulatorDestination::Ios(IosSimulatorDestination {
                    simulator_type: simulator_type_for(&raw_device_type_identifier, &device.name),
                    udid: device.udid,
                    is_available,
                    state,
                    name: device.name,
                    os_version: os_version.clone(),
                    raw_device_type_identifier,
                    raw_runtime: runtime_key.clone(),
                }),
                RuntimeOs::WatchOs => SimulatorDestination::WatchOs(WatchOsSimulatorDestination {
                    udid: device.udid,
                    is_available,
                    state,
                    name: device.name,
                    os_version: os_version.clone(),
                    raw_device_type_identifier,
                    raw_runtime: runtime_key.clone(),
                }),
                RuntimeOs::VisionOs => {
                    SimulatorDestination::VisionOs(VisionOsSimulatorDestination {
                        udid: device.udid,
                        is_available,
                        state,
                        name: device.name,
                        os_version: os_version.clone(),
                        raw_device_type_identifier,
                        raw_runtime: runtime_key.clone(),
                    })
                }
            };
            simulators.push(simulator);
        }
    }

    Ok(simulators)
}

/// Split a runtime identifier into OS family and dotted version
///
/// `com.apple.CoreSimulator.SimRuntime.iOS-17-2` -> `(Ios, "17.2")`
fn parse_runtime(identifier: &str) -> Option<(RuntimeOs, String)> {
    let suffix = identifier.strip_prefix(RUNTIME_PREFIX)?;
    let (os_name, version) = suffix.split_once('-')?;

    let os = match os_name {
        "iOS" => RuntimeOs::Ios,
        "watchOS" => RuntimeOs::WatchOs,
        "xrOS" | "visionOS" => RuntimeOs::VisionOs,
        _ => return None,
    };

    Some((os, version.replace('-', ".")))
}

/// Device family from the device type identifier, falling back to the name
///
/// Anything unrecognized under an iOS runtime is treated as an iPhone.
fn simulator_type_for(device_type_identifier: &str, name: &str) -> SimulatorType {
    let model = device_type_identifier
        .strip_prefix(DEVICE_TYPE_PREFIX)
        .unwrap_or(name);

    if model.starts_with("iPad") || name.starts_with("iPad") {
        SimulatorType::IPad
    } else if model.starts_with("iPod") || name.starts_with("iPod") {
        SimulatorType::IPod
    } else if model.starts_with("Apple-TV") {
        SimulatorType::AppleTv
    } else if model.starts_with("Apple-Watch") {
        SimulatorType::AppleWatch
    } else if model.starts_with("Apple-Vision") {
        SimulatorType::AppleVision
    } else {
        SimulatorType::IPhone
    }
}

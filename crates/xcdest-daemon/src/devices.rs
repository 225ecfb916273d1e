//! Physical device discovery using `xcrun devicectl`
//!
//! `devicectl` only writes machine-readable output to a file, so each refresh
//! points `--json-output` at a freshly created scratch file in the temp dir,
//! which is removed when the refresh finishes.

use std::time::Duration;

use serde::Deserialize;
use tempfile::TempPath;
use tokio::sync::{broadcast, RwLock};
use xcdest_core::prelude::*;
use xcdest_core::{DeviceState, IosDeviceDestination};

use crate::provider::{DeviceProvider, UPDATE_CHANNEL_CAPACITY};
use crate::xcrun::{run_xcrun, XCRUN_TIMEOUT};

/// JSON written by `xcrun devicectl list devices --json-output <path>`
#[derive(Debug, Deserialize)]
struct DevicectlOutput {
    result: DevicectlResult,
}

#[derive(Debug, Deserialize)]
struct DevicectlResult {
    #[serde(default)]
    devices: Vec<DevicectlDevice>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DevicectlDevice {
    identifier: String,
    device_properties: DeviceProperties,
    hardware_properties: HardwareProperties,
    #[serde(default)]
    connection_properties: ConnectionProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeviceProperties {
    name: String,
    #[serde(default)]
    os_version_number: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HardwareProperties {
    #[serde(default)]
    udid: Option<String>,
    #[serde(default)]
    device_type: Option<String>,
    #[serde(default)]
    product_type: Option<String>,
    #[serde(default)]
    platform: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConnectionProperties {
    #[serde(default)]
    tunnel_state: Option<String>,
    #[serde(default)]
    transport_type: Option<String>,
}

/// Device provider backed by `xcrun devicectl`
#[derive(Debug)]
pub struct DevicectlProvider {
    cache: RwLock<Option<Vec<IosDeviceDestination>>>,
    updated_tx: broadcast::Sender<()>,
    timeout: Duration,
}

impl Default for DevicectlProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl DevicectlProvider {
    pub fn new() -> Self {
        let (updated_tx, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        Self {
            cache: RwLock::new(None),
            updated_tx,
            timeout: XCRUN_TIMEOUT,
        }
    }

    /// Override the per-invocation timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn run_devicectl(&self) -> Result<String> {
        let output_path = scratch_output_file()?;
        let output_arg = output_path.to_string_lossy().to_string();

        let result = run_xcrun(
            &["devicectl", "list", "devices", "--json-output", &output_arg],
            self.timeout,
        )
        .await;

        let content = match result {
            Ok(_) => tokio::fs::read_to_string(&output_path).await.map_err(|e| {
                Error::provider(format!(
                    "Failed to read devicectl output {}: {}",
                    output_path.display(),
                    e
                ))
            }),
            Err(e) => Err(e),
        };

        if let Err(e) = output_path.close() {
            warn!("Failed to remove devicectl scratch file: {}", e);
        }

        content
    }

    /// Replace the cache, notifying subscribers only if the list changed
    async fn store(&self, devices: Vec<IosDeviceDestination>) {
        let mut cache = self.cache.write().await;
        if cache.as_ref() == Some(&devices) {
            debug!("Device list unchanged ({} entries)", devices.len());
            return;
        }
        info!("Device list updated: {} devices", devices.len());
        *cache = Some(devices);
        drop(cache);
        let _ = self.updated_tx.send(());
    }
}

impl DeviceProvider for DevicectlProvider {
    async fn refresh(&self) -> Result<()> {
        let content = self.run_devicectl().await?;
        let devices = parse_devicectl_output(&content)?;
        self.store(devices).await;
        Ok(())
    }

    async fn devices(&self) -> Result<Vec<IosDeviceDestination>> {
        if let Some(cached) = self.cache.read().await.as_ref() {
            return Ok(cached.clone());
        }
        debug!("Device cache empty, populating");
        self.refresh().await?;
        Ok(self.cache.read().await.clone().unwrap_or_default())
    }

    fn subscribe(&self) -> broadcast::Receiver<()> {
        self.updated_tx.subscribe()
    }
}

/// Empty, uniquely named file for `--json-output`, deleted on drop
fn scratch_output_file() -> Result<TempPath> {
    let file = tempfile::Builder::new()
        .prefix("xcdest-devicectl-")
        .suffix(".json")
        .tempfile()
        .map_err(|e| Error::provider(format!("Failed to create devicectl scratch file: {}", e)))?;
    Ok(file.into_temp_path())
}

/// Parse devicectl JSON output, keeping only iOS hardware
pub fn parse_devicectl_output(output: &str) -> Result<Vec<IosDeviceDestination>> {
    let parsed: DevicectlOutput = serde_json::from_str(output)
        .map_err(|e| Error::protocol(format!("Failed to parse devicectl output: {}", e)))?;

    let devices = parsed
        .result
        .devices
        .into_iter()
        .filter(|d| d.hardware_properties.platform.as_deref() == Some("iOS"))
        .map(|d| {
            let state = device_state(d.connection_properties.tunnel_state.as_deref());
            IosDeviceDestination {
                udid: d
                    .hardware_properties
                    .udid
                    .unwrap_or_else(|| d.identifier.clone()),
                identifier: d.identifier,
                name: d.device_properties.name,
                device_type: d
                    .hardware_properties
                    .device_type
                    .unwrap_or_else(|| "iPhone".to_string()),
                product_type: d.hardware_properties.product_type.unwrap_or_default(),
                os_version: d.device_properties.os_version_number.unwrap_or_default(),
                transport_type: d.connection_properties.transport_type,
                state,
            }
        })
        .collect();

    Ok(devices)
}

fn device_state(tunnel_state: Option<&str>) -> DeviceState {
    match tunnel_state {
        Some("connected") => DeviceState::Connected,
        Some("unavailable") => DeviceState::Unavailable,
        _ => DeviceState::Disconnected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xcdest_core::DestinationInfo;

    const DEVICECTL_FIXTURE: &str = r#"{
      "info": {"outcome": "success", "version": "355.28"},
      "result": {
        "devices": [
          {
            "identifier": "5B0C1C8E-0D2A-4E0B-9D8F-6B1E2F3A4C5D",
            "deviceProperties": {"name": "Test iPhone", "osVersionNumber": "17.1.2"},
            "hardwareProperties": {
              "udid": "00008110-001A2B3C4D5E801E",
              "deviceType": "iPhone",
              "productType": "iPhone15,2",
              "platform": "iOS"
            },
            "connectionProperties": {
              "pairingState": "paired",
              "tunnelState": "connected",
              "transportType": "wired"
            }
          },
          {
            "identifier": "7C1D2E3F-1111-2222-3333-444455556666",
            "deviceProperties": {"name": "Test iPad"},
            "hardwareProperties": {
              "deviceType": "iPad",
              "productType": "iPad13,4",
              "platform": "iOS"
            },
            "connectionProperties": {"tunnelState": "unavailable"}
          },
          {
            "identifier": "9E8D7C6B-aaaa-bbbb-cccc-ddddeeeeffff",
            "deviceProperties": {"name": "Test Watch", "osVersionNumber": "10.1"},
            "hardwareProperties": {
              "udid": "00008301-000000000000",
              "deviceType": "appleWatch",
              "platform": "watchOS"
            },
            "connectionProperties": {"tunnelState": "disconnected"}
          }
        ]
      }
    }"#;

    #[test]
    fn test_parse_keeps_ios_hardware_only() {
        let devices = parse_devicectl_output(DEVICECTL_FIXTURE).unwrap();
        let names: Vec<_> = devices.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["Test iPhone", "Test iPad"]);
    }

    #[test]
    fn test_parse_maps_fields() {
        let devices = parse_devicectl_output(DEVICECTL_FIXTURE).unwrap();
        let phone = &devices[0];
        assert_eq!(phone.id(), "iosdevice-00008110-001A2B3C4D5E801E");
        assert_eq!(phone.os_version, "17.1.2");
        assert_eq!(phone.product_type, "iPhone15,2");
        assert_eq!(phone.transport_type.as_deref(), Some("wired"));
        assert!(phone.is_connected());
    }

    #[test]
    fn test_parse_falls_back_to_identifier_without_udid() {
        let devices = parse_devicectl_output(DEVICECTL_FIXTURE).unwrap();
        let pad = &devices[1];
        assert_eq!(pad.udid, "7C1D2E3F-1111-2222-3333-444455556666");
        assert_eq!(pad.state, DeviceState::Unavailable);
        assert_eq!(pad.os_version, "");
    }

    #[test]
    fn test_parse_empty_result() {
        let devices = parse_devicectl_output(r#"{"result": {}}"#).unwrap();
        assert!(devices.is_empty());
    }

    #[test]
    fn test_parse_invalid_json() {
        let err = parse_devicectl_output("{").unwrap_err();
        assert!(matches!(err, Error::Protocol { .. }));
    }

    #[test]
    fn test_device_state_mapping() {
        assert_eq!(device_state(Some("connected")), DeviceState::Connected);
        assert_eq!(device_state(Some("unavailable")), DeviceState::Unavailable);
        assert_eq!(device_state(Some("disconnected")), DeviceState::Disconnected);
        assert_eq!(device_state(None), DeviceState::Disconnected);
    }

    #[test]
    fn test_scratch_files_are_fresh_and_cleaned_up() {
        let first = scratch_output_file().unwrap();
        let second = scratch_output_file().unwrap();
        assert_ne!(first.to_path_buf(), second.to_path_buf());
        assert!(first.exists());

        let name = first.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("xcdest-devicectl-"));
        assert!(name.ends_with(".json"));

        let path = first.to_path_buf();
        drop(first);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_store_notifies_only_on_change() {
        let provider = DevicectlProvider::new();
        let mut rx = provider.subscribe();
        let devices = parse_devicectl_output(DEVICECTL_FIXTURE).unwrap();

        provider.store(devices.clone()).await;
        assert!(rx.try_recv().is_ok());

        provider.store(devices).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(provider.devices().await.unwrap().len(), 2);
    }
}

//! Test utilities for provider consumers
//!
//! In-memory providers with settable contents and injectable refresh
//! failures, plus builders for destination entities.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use tokio::sync::broadcast;
use xcdest_core::prelude::*;
use xcdest_core::{
    DeviceState, IosDeviceDestination, IosSimulatorDestination, SimulatorDestination,
    SimulatorState, SimulatorType, VisionOsSimulatorDestination, WatchOsSimulatorDestination,
};

use crate::provider::{DeviceProvider, SimulatorProvider, UPDATE_CHANNEL_CAPACITY};

/// Creates a shut-down, available iOS simulator.
///
/// # Arguments
/// * `udid` - Native simulator identifier
/// * `name` - Human-readable simulator name
/// * `simulator_type` - Device family used for ranking
/// * `os_version` - Runtime version, e.g. "17.0"
pub fn ios_simulator(
    udid: &str,
    name: &str,
    simulator_type: SimulatorType,
    os_version: &str,
) -> SimulatorDestination {
    SimulatorDestination::Ios(IosSimulatorDestination {
        udid: udid.to_string(),
        is_available: true,
        state: SimulatorState::Shutdown,
        name: name.to_string(),
        simulator_type,
        os_version: os_version.to_string(),
        raw_device_type_identifier: format!(
            "com.apple.CoreSimulator.SimDeviceType.{}",
            name.replace(' ', "-")
        ),
        raw_runtime: format!(
            "com.apple.CoreSimulator.SimRuntime.iOS-{}",
            os_version.replace('.', "-")
        ),
    })
}

/// Creates a shut-down, available watchOS simulator.
pub fn watch_simulator(udid: &str, name: &str, os_version: &str) -> SimulatorDestination {
    SimulatorDestination::WatchOs(WatchOsSimulatorDestination {
        udid: udid.to_string(),
        is_available: true,
        state: SimulatorState::Shutdown,
        name: name.to_string(),
        os_version: os_version.to_string(),
        raw_device_type_identifier: String::new(),
        raw_runtime: format!(
            "com.apple.CoreSimulator.SimRuntime.watchOS-{}",
            os_version.replace('.', "-")
        ),
    })
}

/// Creates a shut-down, available visionOS simulator.
pub fn vision_simulator(udid: &str, name: &str, os_version: &str) -> SimulatorDestination {
    SimulatorDestination::VisionOs(VisionOsSimulatorDestination {
        udid: udid.to_string(),
        is_available: true,
        state: SimulatorState::Shutdown,
        name: name.to_string(),
        os_version: os_version.to_string(),
        raw_device_type_identifier: String::new(),
        raw_runtime: format!(
            "com.apple.CoreSimulator.SimRuntime.xrOS-{}",
            os_version.replace('.', "-")
        ),
    })
}

/// Creates a connected iPhone.
pub fn ios_device(udid: &str, name: &str) -> IosDeviceDestination {
    IosDeviceDestination {
        udid: udid.to_string(),
        identifier: format!("coredevice-{}", udid),
        name: name.to_string(),
        device_type: "iPhone".to_string(),
        product_type: "iPhone15,2".to_string(),
        os_version: "17.1".to_string(),
        transport_type: Some("wired".to_string()),
        state: DeviceState::Connected,
    }
}

/// Shared state behind both fake providers
#[derive(Debug)]
struct FakeState<T> {
    items: Mutex<Vec<T>>,
    refresh_error: Mutex<Option<String>>,
    refresh_count: AtomicUsize,
    updated_tx: broadcast::Sender<()>,
}

impl<T: Clone> FakeState<T> {
    fn new(items: Vec<T>) -> Self {
        let (updated_tx, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        Self {
            items: Mutex::new(items),
            refresh_error: Mutex::new(None),
            refresh_count: AtomicUsize::new(0),
            updated_tx,
        }
    }

    fn set(&self, items: Vec<T>) {
        *self.items.lock().unwrap_or_else(|e| e.into_inner()) = items;
        let _ = self.updated_tx.send(());
    }

    fn get(&self) -> Vec<T> {
        self.items.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn fail_with(&self, message: Option<&str>) {
        *self.refresh_error.lock().unwrap_or_else(|e| e.into_inner()) =
            message.map(str::to_string);
    }

    fn refresh(&self) -> Result<()> {
        self.refresh_count.fetch_add(1, Ordering::SeqCst);
        match self
            .refresh_error
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
        {
            Some(message) => Err(Error::provider(message.clone())),
            None => Ok(()),
        }
    }
}

/// In-memory simulator provider
#[derive(Debug)]
pub struct FakeSimulatorProvider {
    state: FakeState<SimulatorDestination>,
}

impl FakeSimulatorProvider {
    pub fn new(simulators: Vec<SimulatorDestination>) -> Self {
        Self {
            state: FakeState::new(simulators),
        }
    }

    /// Replace the list and fire an `updated` notification
    pub fn set_simulators(&self, simulators: Vec<SimulatorDestination>) {
        self.state.set(simulators);
    }

    /// Make every subsequent `refresh()` fail with `message` (or succeed with `None`)
    pub fn fail_refresh(&self, message: Option<&str>) {
        self.state.fail_with(message);
    }

    pub fn refresh_count(&self) -> usize {
        self.state.refresh_count.load(Ordering::SeqCst)
    }
}

impl SimulatorProvider for FakeSimulatorProvider {
    async fn refresh(&self) -> Result<()> {
        self.state.refresh()
    }

    async fn simulators(&self) -> Result<Vec<SimulatorDestination>> {
        Ok(self.state.get())
    }

    fn subscribe(&self) -> broadcast::Receiver<()> {
        self.state.updated_tx.subscribe()
    }
}

/// In-memory device provider
#[derive(Debug)]
pub struct FakeDeviceProvider {
    state: FakeState<IosDeviceDestination>,
}

impl FakeDeviceProvider {
    pub fn new(devices: Vec<IosDeviceDestination>) -> Self {
        Self {
            state: FakeState::new(devices),
        }
    }

    /// Replace the list and fire an `updated` notification
    pub fn set_devices(&self, devices: Vec<IosDeviceDestination>) {
        self.state.set(devices);
    }

    /// Make every subsequent `refresh()` fail with `message` (or succeed with `None`)
    pub fn fail_refresh(&self, message: Option<&str>) {
        self.state.fail_with(message);
    }

    pub fn refresh_count(&self) -> usize {
        self.state.refresh_count.load(Ordering::SeqCst)
    }
}

impl DeviceProvider for FakeDeviceProvider {
    async fn refresh(&self) -> Result<()> {
        self.state.refresh()
    }

    async fn devices(&self) -> Result<Vec<IosDeviceDestination>> {
        Ok(self.state.get())
    }

    fn subscribe(&self) -> broadcast::Receiver<()> {
        self.state.updated_tx.subscribe()
    }
}

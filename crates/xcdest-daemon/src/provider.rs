//! Enumeration provider interfaces
//!
//! A provider owns a cached list of entities, re-fetches it on `refresh()`,
//! and broadcasts a unit notification whenever the cached list changes.

use tokio::sync::broadcast;
use xcdest_core::prelude::*;
use xcdest_core::{IosDeviceDestination, SimulatorDestination};

/// Capacity of every provider's `updated` channel
pub const UPDATE_CHANNEL_CAPACITY: usize = 16;

/// Source of simulator destinations
#[trait_variant::make(SimulatorProvider: Send)]
pub trait LocalSimulatorProvider {
    /// Re-enumerate simulators and replace the cached list
    async fn refresh(&self) -> Result<()>;

    /// The cached simulator list, in provider order
    async fn simulators(&self) -> Result<Vec<SimulatorDestination>>;

    /// Notification fired each time the cached list changes
    fn subscribe(&self) -> broadcast::Receiver<()>;
}

/// Source of physical device destinations
#[trait_variant::make(DeviceProvider: Send)]
pub trait LocalDeviceProvider {
    /// Re-enumerate devices and replace the cached list
    async fn refresh(&self) -> Result<()>;

    /// The cached device list, in provider order
    async fn devices(&self) -> Result<Vec<IosDeviceDestination>>;

    /// Notification fired each time the cached list changes
    fn subscribe(&self) -> broadcast::Receiver<()>;
}

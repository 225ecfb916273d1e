//! # xcdest-daemon - Simulator and Device Enumeration
//!
//! Talks to the Xcode toolchain to enumerate build destinations. Everything
//! here is a collaborator of the destination manager: it owns its own cache,
//! refresh policy and timeouts, and announces changes through a broadcast
//! channel.
//!
//! Depends on [`xcdest_core`] for the entity model and error handling.
//!
//! ## Public API
//!
//! ### Provider Interfaces
//! - [`SimulatorProvider`] - Cached simulator list with refresh and change notifications
//! - [`DeviceProvider`] - Cached physical device list with refresh and change notifications
//!
//! ### Simulators
//! - [`SimctlProvider`] - `xcrun simctl list --json devices`
//! - [`parse_simctl_output()`] - Map simctl JSON to simulator destinations
//!
//! ### Devices
//! - [`DevicectlProvider`] - `xcrun devicectl list devices`
//! - [`parse_devicectl_output()`] - Map devicectl JSON to device destinations
//!
//! ### Host & Tools
//! - [`host_architecture()`] - Apple arch name of the host
//! - [`ToolAvailability`] - Check for `xcrun simctl` / `xcrun devicectl`

pub mod devices;
pub mod host;
pub mod provider;
pub mod simulators;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_utils;
pub mod tool_availability;
mod xcrun;

// Public API re-exports
pub use devices::{parse_devicectl_output, DevicectlProvider};
pub use host::{apple_arch_name, host_architecture};
pub use provider::{
    DeviceProvider, LocalDeviceProvider, LocalSimulatorProvider, SimulatorProvider,
    UPDATE_CHANNEL_CAPACITY,
};
pub use simulators::{parse_simctl_output, SimctlProvider};
pub use tool_availability::ToolAvailability;
pub use xcrun::XCRUN_TIMEOUT;

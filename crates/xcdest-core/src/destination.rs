//! Destination entity model
//!
//! Every build/run target xcdest knows about is a [`Destination`]: one of three
//! simulator kinds, a physical iOS device, or the host Mac. The variants carry
//! different data but share the accessors in [`DestinationInfo`], which is all
//! the ranking and lookup code ever looks at.
//!
//! Entities are plain values. Ids, labels and booted flags are derived on
//! demand, so two entities built from the same provider data always agree.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Name shown for the host machine destination
pub const HOST_DESTINATION_NAME: &str = "My Mac";

/// Architecture assumed for the host when detection yields nothing
pub const DEFAULT_HOST_ARCH: &str = "arm64";

// ─────────────────────────────────────────────────────────────────
// Type Tags
// ─────────────────────────────────────────────────────────────────

/// Kind of destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DestinationType {
    #[serde(rename = "iOSSimulator")]
    IosSimulator,
    #[serde(rename = "watchOSSimulator")]
    WatchOsSimulator,
    #[serde(rename = "visionOSSimulator")]
    VisionOsSimulator,
    #[serde(rename = "iOSDevice")]
    IosDevice,
    #[serde(rename = "macOS")]
    MacOs,
}

/// Every destination type, in declaration order
pub const ALL_DESTINATION_TYPES: [DestinationType; 5] = [
    DestinationType::IosSimulator,
    DestinationType::WatchOsSimulator,
    DestinationType::VisionOsSimulator,
    DestinationType::IosDevice,
    DestinationType::MacOs,
];

impl DestinationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DestinationType::IosSimulator => "iOSSimulator",
            DestinationType::WatchOsSimulator => "watchOSSimulator",
            DestinationType::VisionOsSimulator => "visionOSSimulator",
            DestinationType::IosDevice => "iOSDevice",
            DestinationType::MacOs => "macOS",
        }
    }

    /// Build-system platform this kind of destination builds for
    pub fn platform(&self) -> DestinationPlatform {
        match self {
            DestinationType::IosSimulator => DestinationPlatform::IphoneSimulator,
            DestinationType::WatchOsSimulator => DestinationPlatform::WatchSimulator,
            DestinationType::VisionOsSimulator => DestinationPlatform::XrSimulator,
            DestinationType::IosDevice => DestinationPlatform::IphoneOs,
            DestinationType::MacOs => DestinationPlatform::MacOsx,
        }
    }

    /// Short human-readable label for pickers
    pub fn type_label(&self) -> &'static str {
        match self {
            DestinationType::IosSimulator => "iOS Simulator",
            DestinationType::WatchOsSimulator => "watchOS",
            DestinationType::VisionOsSimulator => "visionOS",
            DestinationType::IosDevice => "iOS Device",
            DestinationType::MacOs => "macOS",
        }
    }

    /// Prefix used to build destination ids (`<prefix>-<native id>`)
    pub fn id_prefix(&self) -> &'static str {
        match self {
            DestinationType::IosSimulator => "iossimulator",
            DestinationType::WatchOsSimulator => "watchossimulator",
            DestinationType::VisionOsSimulator => "visionossimulator",
            DestinationType::IosDevice => "iosdevice",
            DestinationType::MacOs => "macos",
        }
    }

    pub fn is_simulator(&self) -> bool {
        matches!(
            self,
            DestinationType::IosSimulator
                | DestinationType::WatchOsSimulator
                | DestinationType::VisionOsSimulator
        )
    }
}

impl fmt::Display for DestinationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DestinationType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ALL_DESTINATION_TYPES
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::invalid_argument(format!("unknown destination type: {}", s)))
    }
}

/// Build-system platform tag (the `-sdk` / `platform=` value)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DestinationPlatform {
    #[serde(rename = "iphonesimulator")]
    IphoneSimulator,
    #[serde(rename = "watchsimulator")]
    WatchSimulator,
    #[serde(rename = "xrsimulator")]
    XrSimulator,
    #[serde(rename = "iphoneos")]
    IphoneOs,
    #[serde(rename = "macosx")]
    MacOsx,
}

/// Platforms xcdest can produce destinations for
pub const SUPPORTED_DESTINATION_PLATFORMS: [DestinationPlatform; 5] = [
    DestinationPlatform::IphoneSimulator,
    DestinationPlatform::WatchSimulator,
    DestinationPlatform::IphoneOs,
    DestinationPlatform::MacOsx,
    DestinationPlatform::XrSimulator,
];

impl DestinationPlatform {
    pub fn as_str(&self) -> &'static str {
        match self {
            DestinationPlatform::IphoneSimulator => "iphonesimulator",
            DestinationPlatform::WatchSimulator => "watchsimulator",
            DestinationPlatform::XrSimulator => "xrsimulator",
            DestinationPlatform::IphoneOs => "iphoneos",
            DestinationPlatform::MacOsx => "macosx",
        }
    }
}

impl fmt::Display for DestinationPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DestinationPlatform {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        SUPPORTED_DESTINATION_PLATFORMS
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::invalid_argument(format!("unknown platform: {}", s)))
    }
}

/// Device family of a simulator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SimulatorType {
    #[serde(rename = "iPhone")]
    IPhone,
    #[serde(rename = "iPad")]
    IPad,
    #[serde(rename = "iPod")]
    IPod,
    #[serde(rename = "AppleTV")]
    AppleTv,
    #[serde(rename = "AppleWatch")]
    AppleWatch,
    #[serde(rename = "AppleVision")]
    AppleVision,
}

impl SimulatorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SimulatorType::IPhone => "iPhone",
            SimulatorType::IPad => "iPad",
            SimulatorType::IPod => "iPod",
            SimulatorType::AppleTv => "AppleTV",
            SimulatorType::AppleWatch => "AppleWatch",
            SimulatorType::AppleVision => "AppleVision",
        }
    }
}

impl fmt::Display for SimulatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Power state of a simulator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SimulatorState {
    Booted,
    #[default]
    Shutdown,
}

impl From<&str> for SimulatorState {
    /// Anything simctl reports other than "Booted" (Booting, Shutting Down,
    /// Creating...) counts as shut down.
    fn from(s: &str) -> Self {
        if s.eq_ignore_ascii_case("booted") {
            SimulatorState::Booted
        } else {
            SimulatorState::Shutdown
        }
    }
}

/// Connectivity of a physical device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DeviceState {
    Connected,
    #[default]
    Disconnected,
    Unavailable,
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceState::Connected => write!(f, "Connected"),
            DeviceState::Disconnected => write!(f, "Disconnected"),
            DeviceState::Unavailable => write!(f, "Unavailable"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Shared Accessors
// ─────────────────────────────────────────────────────────────────

/// Accessors every destination variant provides
pub trait DestinationInfo {
    /// Globally unique, stable id: `<kind prefix>-<native identifier>`
    fn id(&self) -> String;

    fn destination_type(&self) -> DestinationType;

    /// Human-readable name; the final ranking tie-break
    fn name(&self) -> &str;

    /// Display label for lists
    fn label(&self) -> String;

    /// One-line description for pickers
    fn details(&self) -> String;

    fn platform(&self) -> DestinationPlatform {
        self.destination_type().platform()
    }

    fn type_label(&self) -> &'static str {
        self.destination_type().type_label()
    }

    /// Device family used as the secondary ranking key; simulators only
    fn simulator_type(&self) -> Option<SimulatorType> {
        None
    }

    /// `Some` for simulators, `None` for kinds that cannot boot
    fn is_booted(&self) -> Option<bool> {
        None
    }

    /// Minimal projection persisted as the current selection
    fn selection(&self) -> SelectedDestination {
        SelectedDestination {
            id: self.id(),
            destination_type: self.destination_type(),
            name: self.name().to_string(),
        }
    }
}

fn destination_id(destination_type: DestinationType, native_id: &str) -> String {
    format!("{}-{}", destination_type.id_prefix(), native_id)
}

fn versioned_label(name: &str, os_version: &str) -> String {
    format!("{} ({})", name, os_version)
}

fn versioned_details(kind: &str, os_version: &str, udid: &str) -> String {
    format!(
        "Type: {}, Version: {}, ID: {}",
        kind,
        os_version,
        udid.to_lowercase()
    )
}

// ─────────────────────────────────────────────────────────────────
// Simulator Variants
// ─────────────────────────────────────────────────────────────────

/// An iOS / iPadOS simulator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IosSimulatorDestination {
    /// e.g. `10D6D4A3-3A3D-4D3D-8D3D-3D3D3D3D3D3D`
    pub udid: String,
    pub is_available: bool,
    pub state: SimulatorState,
    /// e.g. `iPhone 15 Pro`
    pub name: String,
    pub simulator_type: SimulatorType,
    /// e.g. `17.2`
    pub os_version: String,
    /// e.g. `com.apple.CoreSimulator.SimDeviceType.iPhone-15-Pro`
    pub raw_device_type_identifier: String,
    /// e.g. `com.apple.CoreSimulator.SimRuntime.iOS-17-2`
    pub raw_runtime: String,
}

impl DestinationInfo for IosSimulatorDestination {
    fn id(&self) -> String {
        destination_id(DestinationType::IosSimulator, &self.udid)
    }

    fn destination_type(&self) -> DestinationType {
        DestinationType::IosSimulator
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn label(&self) -> String {
        versioned_label(&self.name, &self.os_version)
    }

    fn details(&self) -> String {
        versioned_details(self.type_label(), &self.os_version, &self.udid)
    }

    fn simulator_type(&self) -> Option<SimulatorType> {
        Some(self.simulator_type)
    }

    fn is_booted(&self) -> Option<bool> {
        Some(self.state == SimulatorState::Booted)
    }
}

/// A watchOS simulator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchOsSimulatorDestination {
    pub udid: String,
    pub is_available: bool,
    pub state: SimulatorState,
    /// e.g. `Apple Watch Series 9 (45mm)`
    pub name: String,
    pub os_version: String,
    pub raw_device_type_identifier: String,
    pub raw_runtime: String,
}

impl DestinationInfo for WatchOsSimulatorDestination {
    fn id(&self) -> String {
        destination_id(DestinationType::WatchOsSimulator, &self.udid)
    }

    fn destination_type(&self) -> DestinationType {
        DestinationType::WatchOsSimulator
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn label(&self) -> String {
        versioned_label(&self.name, &self.os_version)
    }

    fn details(&self) -> String {
        versioned_details(self.type_label(), &self.os_version, &self.udid)
    }

    fn simulator_type(&self) -> Option<SimulatorType> {
        Some(SimulatorType::AppleWatch)
    }

    fn is_booted(&self) -> Option<bool> {
        Some(self.state == SimulatorState::Booted)
    }
}

/// A visionOS (xrOS) simulator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisionOsSimulatorDestination {
    pub udid: String,
    pub is_available: bool,
    pub state: SimulatorState,
    /// e.g. `Apple Vision Pro`
    pub name: String,
    pub os_version: String,
    pub raw_device_type_identifier: String,
    pub raw_runtime: String,
}

impl DestinationInfo for VisionOsSimulatorDestination {
    fn id(&self) -> String {
        destination_id(DestinationType::VisionOsSimulator, &self.udid)
    }

    fn destination_type(&self) -> DestinationType {
        DestinationType::VisionOsSimulator
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn label(&self) -> String {
        versioned_label(&self.name, &self.os_version)
    }

    fn details(&self) -> String {
        versioned_details(self.type_label(), &self.os_version, &self.udid)
    }

    fn simulator_type(&self) -> Option<SimulatorType> {
        Some(SimulatorType::AppleVision)
    }

    fn is_booted(&self) -> Option<bool> {
        Some(self.state == SimulatorState::Booted)
    }
}

/// Any simulator, as returned by a simulator provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SimulatorDestination {
    #[serde(rename = "iOSSimulator")]
    Ios(IosSimulatorDestination),
    #[serde(rename = "watchOSSimulator")]
    WatchOs(WatchOsSimulatorDestination),
    #[serde(rename = "visionOSSimulator")]
    VisionOs(VisionOsSimulatorDestination),
}

impl SimulatorDestination {
    fn inner(&self) -> &dyn DestinationInfo {
        match self {
            SimulatorDestination::Ios(s) => s,
            SimulatorDestination::WatchOs(s) => s,
            SimulatorDestination::VisionOs(s) => s,
        }
    }

    pub fn udid(&self) -> &str {
        match self {
            SimulatorDestination::Ios(s) => &s.udid,
            SimulatorDestination::WatchOs(s) => &s.udid,
            SimulatorDestination::VisionOs(s) => &s.udid,
        }
    }

    pub fn is_available(&self) -> bool {
        match self {
            SimulatorDestination::Ios(s) => s.is_available,
            SimulatorDestination::WatchOs(s) => s.is_available,
            SimulatorDestination::VisionOs(s) => s.is_available,
        }
    }
}

impl DestinationInfo for SimulatorDestination {
    fn id(&self) -> String {
        self.inner().id()
    }

    fn destination_type(&self) -> DestinationType {
        self.inner().destination_type()
    }

    fn name(&self) -> &str {
        match self {
            SimulatorDestination::Ios(s) => &s.name,
            SimulatorDestination::WatchOs(s) => &s.name,
            SimulatorDestination::VisionOs(s) => &s.name,
        }
    }

    fn label(&self) -> String {
        self.inner().label()
    }

    fn details(&self) -> String {
        self.inner().details()
    }

    fn simulator_type(&self) -> Option<SimulatorType> {
        self.inner().simulator_type()
    }

    fn is_booted(&self) -> Option<bool> {
        self.inner().is_booted()
    }
}

// ─────────────────────────────────────────────────────────────────
// Device & Host Variants
// ─────────────────────────────────────────────────────────────────

/// A physical iOS / iPadOS device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IosDeviceDestination {
    /// Hardware UDID, e.g. `00008110-001A2B3C4D5E801E`
    pub udid: String,
    /// CoreDevice identifier used by `devicectl`
    pub identifier: String,
    /// User-assigned device name, e.g. `Jane's iPhone`
    pub name: String,
    /// e.g. `iPhone`, `iPad`
    pub device_type: String,
    /// e.g. `iPhone15,2`
    pub product_type: String,
    pub os_version: String,
    /// e.g. `wired`, `localNetwork`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transport_type: Option<String>,
    pub state: DeviceState,
}

impl IosDeviceDestination {
    pub fn is_connected(&self) -> bool {
        self.state == DeviceState::Connected
    }
}

impl DestinationInfo for IosDeviceDestination {
    fn id(&self) -> String {
        destination_id(DestinationType::IosDevice, &self.udid)
    }

    fn destination_type(&self) -> DestinationType {
        DestinationType::IosDevice
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn label(&self) -> String {
        self.name.clone()
    }

    fn details(&self) -> String {
        versioned_details(&self.device_type, &self.os_version, &self.udid)
    }
}

/// The machine xcdest runs on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacOsDestination {
    pub name: String,
    /// e.g. `arm64`, `x86_64`
    pub arch: String,
}

impl MacOsDestination {
    /// The host destination for the given architecture
    pub fn host(arch: impl Into<String>) -> Self {
        Self {
            name: HOST_DESTINATION_NAME.to_string(),
            arch: arch.into(),
        }
    }
}

impl DestinationInfo for MacOsDestination {
    fn id(&self) -> String {
        destination_id(DestinationType::MacOs, &self.arch)
    }

    fn destination_type(&self) -> DestinationType {
        DestinationType::MacOs
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn label(&self) -> String {
        self.name.clone()
    }

    fn details(&self) -> String {
        format!("Type: {}, Arch: {}", self.type_label(), self.arch)
    }
}

// ─────────────────────────────────────────────────────────────────
// Destination
// ─────────────────────────────────────────────────────────────────

/// Any addressable build/run target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Destination {
    #[serde(rename = "iOSSimulator")]
    IosSimulator(IosSimulatorDestination),
    #[serde(rename = "watchOSSimulator")]
    WatchOsSimulator(WatchOsSimulatorDestination),
    #[serde(rename = "visionOSSimulator")]
    VisionOsSimulator(VisionOsSimulatorDestination),
    #[serde(rename = "iOSDevice")]
    IosDevice(IosDeviceDestination),
    #[serde(rename = "macOS")]
    MacOs(MacOsDestination),
}

impl Destination {
    fn inner(&self) -> &dyn DestinationInfo {
        match self {
            Destination::IosSimulator(d) => d,
            Destination::WatchOsSimulator(d) => d,
            Destination::VisionOsSimulator(d) => d,
            Destination::IosDevice(d) => d,
            Destination::MacOs(d) => d,
        }
    }
}

impl DestinationInfo for Destination {
    fn id(&self) -> String {
        self.inner().id()
    }

    fn destination_type(&self) -> DestinationType {
        self.inner().destination_type()
    }

    fn name(&self) -> &str {
        match self {
            Destination::IosSimulator(d) => &d.name,
            Destination::WatchOsSimulator(d) => &d.name,
            Destination::VisionOsSimulator(d) => &d.name,
            Destination::IosDevice(d) => &d.name,
            Destination::MacOs(d) => &d.name,
        }
    }

    fn label(&self) -> String {
        self.inner().label()
    }

    fn details(&self) -> String {
        self.inner().details()
    }

    fn simulator_type(&self) -> Option<SimulatorType> {
        self.inner().simulator_type()
    }

    fn is_booted(&self) -> Option<bool> {
        self.inner().is_booted()
    }
}

impl From<SimulatorDestination> for Destination {
    fn from(sim: SimulatorDestination) -> Self {
        match sim {
            SimulatorDestination::Ios(s) => Destination::IosSimulator(s),
            SimulatorDestination::WatchOs(s) => Destination::WatchOsSimulator(s),
            SimulatorDestination::VisionOs(s) => Destination::VisionOsSimulator(s),
        }
    }
}

impl From<IosSimulatorDestination> for Destination {
    fn from(sim: IosSimulatorDestination) -> Self {
        Destination::IosSimulator(sim)
    }
}

impl From<WatchOsSimulatorDestination> for Destination {
    fn from(sim: WatchOsSimulatorDestination) -> Self {
        Destination::WatchOsSimulator(sim)
    }
}

impl From<VisionOsSimulatorDestination> for Destination {
    fn from(sim: VisionOsSimulatorDestination) -> Self {
        Destination::VisionOsSimulator(sim)
    }
}

impl From<IosDeviceDestination> for Destination {
    fn from(device: IosDeviceDestination) -> Self {
        Destination::IosDevice(device)
    }
}

impl From<MacOsDestination> for Destination {
    fn from(host: MacOsDestination) -> Self {
        Destination::MacOs(host)
    }
}

/// Persisted pointer to the user's chosen destination
///
/// Re-resolving it may legitimately find nothing (the simulator was deleted,
/// the device unplugged); callers treat that as "not found", not as an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedDestination {
    pub id: String,
    #[serde(rename = "type")]
    pub destination_type: DestinationType,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iphone(udid: &str, state: SimulatorState) -> IosSimulatorDestination {
        IosSimulatorDestination {
            udid: udid.to_string(),
            is_available: true,
            state,
            name: "iPhone 15".to_string(),
            simulator_type: SimulatorType::IPhone,
            os_version: "17.0".to_string(),
            raw_device_type_identifier: "com.apple.CoreSimulator.SimDeviceType.iPhone-15"
                .to_string(),
            raw_runtime: "com.apple.CoreSimulator.SimRuntime.iOS-17-0".to_string(),
        }
    }

    fn device() -> IosDeviceDestination {
        IosDeviceDestination {
            udid: "00008110-001A2B3C4D5E801E".to_string(),
            identifier: "5B0C1C8E-0D2A-4E0B-9D8F-6B1E2F3A4C5D".to_string(),
            name: "Test iPhone".to_string(),
            device_type: "iPhone".to_string(),
            product_type: "iPhone15,2".to_string(),
            os_version: "17.1".to_string(),
            transport_type: Some("wired".to_string()),
            state: DeviceState::Connected,
        }
    }

    #[test]
    fn test_simulator_id_uses_kind_prefix() {
        let sim = iphone("ABC-123", SimulatorState::Shutdown);
        assert_eq!(sim.id(), "iossimulator-ABC-123");

        let watch = WatchOsSimulatorDestination {
            udid: "W-1".to_string(),
            is_available: true,
            state: SimulatorState::Shutdown,
            name: "Apple Watch Series 9 (45mm)".to_string(),
            os_version: "10.0".to_string(),
            raw_device_type_identifier: String::new(),
            raw_runtime: String::new(),
        };
        assert_eq!(watch.id(), "watchossimulator-W-1");
    }

    #[test]
    fn test_id_is_stable_across_clones() {
        let sim = Destination::from(iphone("ABC-123", SimulatorState::Booted));
        assert_eq!(sim.id(), sim.clone().id());
    }

    #[test]
    fn test_simulator_label_includes_os_version() {
        let sim = iphone("ABC", SimulatorState::Shutdown);
        assert_eq!(sim.label(), "iPhone 15 (17.0)");
    }

    #[test]
    fn test_simulator_details_lowercases_udid() {
        let sim = iphone("ABC-DEF", SimulatorState::Shutdown);
        assert_eq!(
            sim.details(),
            "Type: iOS Simulator, Version: 17.0, ID: abc-def"
        );
    }

    #[test]
    fn test_is_booted_derived_from_state() {
        assert_eq!(iphone("A", SimulatorState::Booted).is_booted(), Some(true));
        assert_eq!(iphone("A", SimulatorState::Shutdown).is_booted(), Some(false));
        assert_eq!(device().is_booted(), None);
    }

    #[test]
    fn test_simulator_state_parsing() {
        assert_eq!(SimulatorState::from("Booted"), SimulatorState::Booted);
        assert_eq!(SimulatorState::from("Shutdown"), SimulatorState::Shutdown);
        assert_eq!(SimulatorState::from("Shutting Down"), SimulatorState::Shutdown);
        assert_eq!(SimulatorState::from("Booting"), SimulatorState::Shutdown);
    }

    #[test]
    fn test_device_label_is_plain_name() {
        let d = device();
        assert_eq!(d.id(), "iosdevice-00008110-001A2B3C4D5E801E");
        assert_eq!(d.label(), "Test iPhone");
        assert_eq!(d.platform(), DestinationPlatform::IphoneOs);
        assert!(d.is_connected());
    }

    #[test]
    fn test_host_destination() {
        let host = MacOsDestination::host("arm64");
        assert_eq!(host.name, "My Mac");
        assert_eq!(host.id(), "macos-arm64");
        assert_eq!(host.label(), "My Mac");
        assert_eq!(host.details(), "Type: macOS, Arch: arm64");
        assert_eq!(host.platform(), DestinationPlatform::MacOsx);
    }

    #[test]
    fn test_destination_delegates_to_variant() {
        let dest = Destination::from(SimulatorDestination::Ios(iphone(
            "ABC",
            SimulatorState::Booted,
        )));
        assert_eq!(dest.destination_type(), DestinationType::IosSimulator);
        assert_eq!(dest.name(), "iPhone 15");
        assert_eq!(dest.simulator_type(), Some(SimulatorType::IPhone));
        assert_eq!(dest.platform(), DestinationPlatform::IphoneSimulator);
    }

    #[test]
    fn test_selection_projection() {
        let dest = Destination::from(iphone("ABC", SimulatorState::Shutdown));
        let selected = dest.selection();
        assert_eq!(selected.id, "iossimulator-ABC");
        assert_eq!(selected.destination_type, DestinationType::IosSimulator);
        assert_eq!(selected.name, "iPhone 15");
    }

    #[test]
    fn test_selected_destination_json_shape() {
        let selected = SelectedDestination {
            id: "macos-arm64".to_string(),
            destination_type: DestinationType::MacOs,
            name: "My Mac".to_string(),
        };
        let json = serde_json::to_value(&selected).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": "macos-arm64", "type": "macOS", "name": "My Mac"})
        );

        let back: SelectedDestination = serde_json::from_value(json).unwrap();
        assert_eq!(back, selected);
    }

    #[test]
    fn test_destination_type_parsing() {
        assert_eq!(
            "iOSSimulator".parse::<DestinationType>().unwrap(),
            DestinationType::IosSimulator
        );
        assert_eq!(
            "iosdevice".parse::<DestinationType>().unwrap(),
            DestinationType::IosDevice
        );
        assert!("tvOSSimulator".parse::<DestinationType>().is_err());
    }

    #[test]
    fn test_platform_parsing_and_mapping() {
        assert_eq!(
            "xrsimulator".parse::<DestinationPlatform>().unwrap(),
            DestinationPlatform::XrSimulator
        );
        assert!("appletvos".parse::<DestinationPlatform>().is_err());

        for t in ALL_DESTINATION_TYPES {
            assert!(SUPPORTED_DESTINATION_PLATFORMS.contains(&t.platform()));
        }
    }

    #[test]
    fn test_only_simulator_types_are_simulators() {
        assert!(DestinationType::VisionOsSimulator.is_simulator());
        assert!(!DestinationType::IosDevice.is_simulator());
        assert!(!DestinationType::MacOs.is_simulator());
    }
}

//! # xcdest-core - Destination Model and Ranking
//!
//! Foundation crate for xcdest. Provides the destination entity model, the
//! deterministic ranking comparator, error handling, and logging setup.
//!
//! This crate has **zero internal dependencies** and performs no I/O apart
//! from installing the log subscriber.
//!
//! ## Public API
//!
//! ### Entity Model (`destination`)
//! - [`Destination`] - Any build/run target (simulator, device, host)
//! - [`SimulatorDestination`] - The three simulator variants
//! - [`DestinationInfo`] - Accessors shared by every variant (`id`, `label`, ...)
//! - [`SelectedDestination`] - Persisted `{id, type, name}` selection pointer
//! - [`DestinationType`], [`DestinationPlatform`], [`SimulatorType`] - Type tags
//!
//! ### Ranking (`ranking`)
//! - [`Ranker`] - Type priority, simulator family, then name
//! - [`PriorityTables`] - Configurable priority tables
//! - [`collate()`] - Name comparison used as the final tie-break
//!
//! ### Error Handling (`error`)
//! - [`Error`] - Error enum with `fatal` vs `recoverable` classification
//! - [`Result`] - Type alias for `std::result::Result<T, Error>`
//! - [`ResultExt`] - Extension trait for adding error context
//!
//! ## Prelude
//!
//! Import commonly used types with:
//! ```rust
//! use xcdest_core::prelude::*;
//! ```

pub mod destination;
pub mod error;
pub mod logging;
pub mod prelude;
pub mod ranking;

// Re-export commonly used types at crate root for convenience
pub use destination::{
    Destination, DestinationInfo, DestinationPlatform, DestinationType, DeviceState,
    IosDeviceDestination, IosSimulatorDestination, MacOsDestination, SelectedDestination,
    SimulatorDestination, SimulatorState, SimulatorType, VisionOsSimulatorDestination,
    WatchOsSimulatorDestination, ALL_DESTINATION_TYPES, DEFAULT_HOST_ARCH,
    HOST_DESTINATION_NAME, SUPPORTED_DESTINATION_PLATFORMS,
};
pub use error::{Error, Result, ResultExt};
pub use ranking::{
    collate, PriorityTables, Ranker, DESTINATION_TYPE_PRIORITY, SIMULATOR_TYPE_PRIORITY,
};

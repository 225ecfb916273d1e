//! xcdest-app - Destination orchestration for xcdest
//!
//! This crate implements the destination manager on top of the providers in
//! `xcdest-daemon`: aggregation and ranking, the workspace selection, the
//! usage ledger that drives "most used" ordering, change events, workspace
//! storage, and configuration loading.

pub mod config;
pub mod events;
pub mod ledger;
pub mod manager;
pub mod state;

// Re-export primary types
pub use config::{init_config_dir, load_settings, Settings};
pub use events::{DestinationEvent, DestinationEventKind, EventHub};
pub use ledger::{UsageLedger, USAGE_STATISTICS_KEY};
pub use manager::{
    ArchDetector, DestinationManager, DestinationManagerBuilder, DestinationQuery,
    SELECTED_DESTINATION_KEY,
};
pub use state::{FileWorkspaceState, MemoryWorkspaceState, WorkspaceState, WorkspaceStateExt};

// Re-export daemon types for the CLI
pub use xcdest_daemon::{DevicectlProvider, SimctlProvider, ToolAvailability};

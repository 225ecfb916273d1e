//! Configuration file parsing for xcdest
//!
//! Supports:
//! - `.xcdest/config.toml` - Ranking tables, default platform filter and
//!   simulator enumeration options

pub mod settings;
pub mod types;

pub use settings::{init_config_dir, load_settings, CONFIG_FILENAME, XCDEST_DIR};
pub use types::{DestinationSettings, Settings, SimulatorSettings};

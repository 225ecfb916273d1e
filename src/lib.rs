//! xcdest Library
//!
//! Command-line front-end over the destination manager in `xcdest-app`.

pub mod cli;
pub mod output;

// Re-export main entry points
pub use cli::{execute, run, Cli, Command, Outcome};

//! xcdest - Resolve, rank and select Xcode build destinations
//!
//! This is the binary entry point. All logic lives in the library.

use std::process::ExitCode;

use clap::Parser;
use color_eyre::eyre::Result;
use xcdest::{Cli, Outcome};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    color_eyre::install()?;

    let cli = Cli::parse();

    // Logging goes to a file; a read-only data dir should not stop the CLI
    if let Err(e) = xcdest_core::logging::init() {
        eprintln!("Warning: logging disabled: {}", e);
    }

    let mut stdout = std::io::stdout().lock();
    match xcdest::run(cli, &mut stdout).await? {
        Outcome::Done => Ok(ExitCode::SUCCESS),
        Outcome::NotFound => Ok(ExitCode::from(1)),
    }
}

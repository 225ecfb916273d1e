//! Command-line interface
//!
//! Argument parsing lives in [`Cli`]; [`execute`] runs one command against
//! any [`DestinationManager`], which keeps the commands testable with
//! in-memory providers.

use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use xcdest_app::{init_config_dir, DestinationManager, DestinationQuery, ToolAvailability};
use xcdest_core::prelude::*;
use xcdest_core::{Destination, DestinationInfo, DestinationPlatform, DestinationType};
use xcdest_daemon::{DeviceProvider, SimulatorProvider};

use crate::output::{write_json, write_rows, write_selection, DestinationRow};

/// xcdest - Resolve, rank and select Xcode build destinations
#[derive(Parser, Debug)]
#[command(name = "xcdest")]
#[command(about = "Resolve, rank and select Xcode build destinations", long_about = None)]
pub struct Cli {
    /// Workspace root holding `.xcdest/` (defaults to the current directory)
    #[arg(long, short = 'w', value_name = "PATH", global = true)]
    pub workspace: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List destinations in ranked category order
    List {
        /// Only include these platforms (repeatable)
        #[arg(long = "platform", value_name = "PLATFORM")]
        platforms: Vec<DestinationPlatform>,

        /// Order by how often each destination was selected
        #[arg(long)]
        most_used: bool,

        #[arg(long)]
        json: bool,
    },

    /// List simulators
    Simulators {
        /// Apply destination ranking instead of simctl order
        #[arg(long)]
        sort: bool,

        #[arg(long)]
        json: bool,
    },

    /// Look up a destination by id
    Find {
        id: String,

        /// Only search this destination type
        #[arg(long = "type", value_name = "TYPE")]
        destination_type: Option<DestinationType>,

        #[arg(long)]
        json: bool,
    },

    /// Make a destination the workspace selection
    Select {
        id: String,

        #[arg(long = "type", value_name = "TYPE")]
        destination_type: Option<DestinationType>,
    },

    /// Clear the workspace selection
    Clear,

    /// Show the workspace selection
    Selected {
        /// Resolve the selection against live simulators and devices
        #[arg(long)]
        resolve: bool,

        #[arg(long)]
        json: bool,
    },

    /// List previously selected destinations, most used first
    MostUsed {
        #[arg(long)]
        json: bool,
    },

    /// Re-enumerate simulators and devices
    Refresh,

    /// Write a default `.xcdest/config.toml`
    Init,
}

/// Result of a command that ran without error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Done,
    NotFound,
}

impl Cli {
    pub fn workspace_path(&self) -> PathBuf {
        self.workspace
            .clone()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }
}

/// Parse-independent entry point used by `main`
pub async fn run(cli: Cli, out: &mut dyn Write) -> Result<Outcome> {
    let workspace = cli.workspace_path();
    info!("xcdest {:?} in {}", cli.command, workspace.display());

    if cli.command == Command::Init {
        init_config_dir(&workspace)?;
        writeln!(out, "Initialized {}", workspace.join(".xcdest").display())?;
        return Ok(Outcome::Done);
    }

    let manager = DestinationManager::for_workspace(&workspace)?;
    let result = execute(&manager, cli.command, out).await;

    if let Err(e) = &result {
        if blames_tooling(e) {
            let missing = ToolAvailability::check().await.missing();
            if !missing.is_empty() {
                warn!("Missing Xcode tools: {}", missing.join(", "));
            }
        }
    }

    result
}

/// Errors worth following up with a tool availability check
fn blames_tooling(error: &Error) -> bool {
    matches!(
        error,
        Error::Provider { .. } | Error::ToolNotFound { .. } | Error::Protocol { .. }
    )
}

/// Run one command against `manager`
pub async fn execute<S, D>(
    manager: &DestinationManager<S, D>,
    command: Command,
    out: &mut dyn Write,
) -> Result<Outcome>
where
    S: SimulatorProvider,
    D: DeviceProvider,
{
    match command {
        Command::List {
            platforms,
            most_used,
            json,
        } => {
            let query = DestinationQuery {
                platform_filter: (!platforms.is_empty()).then_some(platforms),
                most_used_sort: most_used,
            };
            let destinations = manager.get_destinations(&query).await?;
            write_rows(out, &rows(manager, &destinations), json)?;
        }

        Command::Simulators { sort, json } => {
            let simulators = manager.get_simulators(sort).await?;
            let ledger = manager.usage_ledger();
            let rows: Vec<_> = simulators
                .iter()
                .map(|s| DestinationRow::new(s, ledger.get(&s.id())))
                .collect();
            write_rows(out, &rows, json)?;
        }

        Command::Find {
            id,
            destination_type,
            json,
        } => match manager.find_destination(&id, destination_type).await? {
            Some(destination) => {
                let row = row(manager, &destination);
                if json {
                    write_json(out, &row)?;
                } else {
                    writeln!(out, "{}", row.to_line())?;
                    writeln!(out, "  {}", row.details)?;
                }
            }
            None => return not_found(out, &id),
        },

        Command::Select {
            id,
            destination_type,
        } => match manager.find_destination(&id, destination_type).await? {
            Some(destination) => {
                manager.set_workspace_destination(Some(&destination));
                writeln!(out, "Selected {} ({})", destination.label(), destination.id())?;
            }
            None => return not_found(out, &id),
        },

        Command::Clear => {
            manager.set_workspace_destination(None);
            writeln!(out, "Cleared workspace destination")?;
        }

        Command::Selected { resolve, json } => {
            if !resolve {
                write_selection(out, manager.get_selected_destination().as_ref(), json)?;
                return Ok(Outcome::Done);
            }
            match manager.find_workspace_selected_destination().await? {
                Some(destination) => {
                    let row = row(manager, &destination);
                    if json {
                        write_json(out, &row)?;
                    } else {
                        writeln!(out, "{}", row.to_line())?;
                    }
                }
                None => {
                    if json {
                        write_json(out, &Option::<DestinationRow>::None)?;
                    } else {
                        writeln!(out, "Selected destination is not available")?;
                    }
                    return Ok(Outcome::NotFound);
                }
            }
        }

        Command::MostUsed { json } => {
            let destinations = manager.get_most_used_destinations().await?;
            write_rows(out, &rows(manager, &destinations), json)?;
        }

        Command::Refresh => {
            manager.refresh().await?;
            let simulators = manager.get_simulators(false).await?.len();
            let devices = manager.get_ios_devices().await?.len();
            writeln!(out, "Found {} simulators and {} devices", simulators, devices)?;
        }

        Command::Init => {
            return Err(Error::invalid_argument(
                "init does not operate on a destination manager",
            ));
        }
    }

    Ok(Outcome::Done)
}

fn row<S, D>(manager: &DestinationManager<S, D>, destination: &Destination) -> DestinationRow
where
    S: SimulatorProvider,
    D: DeviceProvider,
{
    DestinationRow::new(destination, manager.usage_ledger().get(&destination.id()))
}

fn rows<S, D>(manager: &DestinationManager<S, D>, destinations: &[Destination]) -> Vec<DestinationRow>
where
    S: SimulatorProvider,
    D: DeviceProvider,
{
    let counts = manager.usage_ledger().count_map();
    destinations
        .iter()
        .map(|d| {
            let id = d.id();
            let usage = counts.get(&id).copied().unwrap_or(0);
            DestinationRow::new(d, usage)
        })
        .collect()
}

fn not_found(out: &mut dyn Write, id: &str) -> Result<Outcome> {
    writeln!(out, "No destination with id {}", id)?;
    Ok(Outcome::NotFound)
}

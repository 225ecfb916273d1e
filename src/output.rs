//! Rendering destinations for the terminal
//!
//! Text output is one destination per line. JSON output is a single
//! pretty-printed document so it can be piped into `jq`.

use std::io::Write;

use serde::Serialize;
use xcdest_core::prelude::*;
use xcdest_core::{DestinationInfo, DestinationPlatform, DestinationType, SelectedDestination};

/// One destination as shown by the CLI
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DestinationRow {
    pub id: String,
    #[serde(rename = "type")]
    pub destination_type: DestinationType,
    pub name: String,
    pub label: String,
    pub platform: DestinationPlatform,
    pub details: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_booted: Option<bool>,
    pub usage_count: u64,
}

impl DestinationRow {
    pub fn new<T: DestinationInfo + ?Sized>(destination: &T, usage_count: u64) -> Self {
        Self {
            id: destination.id(),
            destination_type: destination.destination_type(),
            name: destination.name().to_string(),
            label: destination.label(),
            platform: destination.platform(),
            details: destination.details(),
            is_booted: destination.is_booted(),
            usage_count,
        }
    }

    /// Single-line text form: booted marker, label, kind, id
    pub fn to_line(&self) -> String {
        let marker = if self.is_booted == Some(true) { '*' } else { ' ' };
        format!(
            "{} {:<36} {:<20} {}",
            marker,
            self.label,
            self.destination_type.type_label(),
            self.id
        )
    }
}

pub fn write_json<T: Serialize + ?Sized>(out: &mut dyn Write, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    writeln!(out, "{}", json)?;
    Ok(())
}

pub fn write_rows(out: &mut dyn Write, rows: &[DestinationRow], json: bool) -> Result<()> {
    if json {
        return write_json(out, rows);
    }
    if rows.is_empty() {
        writeln!(out, "No destinations found")?;
        return Ok(());
    }
    for row in rows {
        writeln!(out, "{}", row.to_line())?;
    }
    Ok(())
}

pub fn write_selection(
    out: &mut dyn Write,
    selected: Option<&SelectedDestination>,
    json: bool,
) -> Result<()> {
    if json {
        return write_json(out, &selected);
    }
    match selected {
        Some(s) => writeln!(out, "{} ({})", s.name, s.id)?,
        None => writeln!(out, "No destination selected")?,
    }
    Ok(())
}

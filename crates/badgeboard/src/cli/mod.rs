//! Command-line interface for badgeboard.
//!
//! This module provides the CLI structure for the `badgeboard` binary and
//! the small text-table renderer its commands print through.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::logging::Verbosity;

pub use commands::{
    AirportCommand, AttachCommand, BackupCommand, ConfigCommand, CredentialCommand,
    CredentialFields, EmployeeCommand, EmployeeFields, EmployeeListCommand, EmployeeQueryArgs,
    ExportCommand, ExportTarget, ImportCommand, ImportTarget, NotifyCommand, OutputFormat,
    PobCommand, StatsCommand, TabCommand,
};

/// badgeboard - Site security personnel and credential tracker
///
/// Keeps the employee roster, BOC and VRF credentials and their expiry
/// dates consistent, and answers who is on site and who is flying in.
#[derive(Debug, Parser)]
#[command(name = "badgeboard")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage employees
    #[command(subcommand, alias = "emp")]
    Employee(EmployeeCommand),

    /// Manage BOC records
    #[command(subcommand)]
    Boc(CredentialCommand),

    /// Manage VRF records
    #[command(subcommand)]
    Vrf(CredentialCommand),

    /// Count employees on and off site
    Pob(PobCommand),

    /// Show upcoming arrivals and departures
    Airport(AirportCommand),

    /// Send expiry warnings
    Notify(NotifyCommand),

    /// Import records from CSV
    Import(ImportCommand),

    /// Export records to CSV
    Export(ExportCommand),

    /// Save or restore a JSON backup
    #[command(subcommand)]
    Backup(BackupCommand),

    /// Manage employee documents
    #[command(subcommand)]
    Attach(AttachCommand),

    /// Show or store the active dashboard tab
    #[command(subcommand)]
    Tab(TabCommand),

    /// Show storage statistics
    Stats(StatsCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.verbose, self.quiet)
    }
}

/// Render rows as left-aligned columns under a header rule.
#[must_use]
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = table_line(headers.iter().copied(), &widths);
    out.push('\n');
    out.push_str(
        &widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("  "),
    );
    for row in rows {
        out.push('\n');
        out.push_str(&table_line(row.iter().map(String::as_str), &widths));
    }
    out
}

fn table_line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    cells
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

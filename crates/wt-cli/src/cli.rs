//! Command-line argument definitions.

use std::path::PathBuf;

use clap::Parser;

/// Developer work-time analyzer.
///
/// Segments activity-log exports into work sessions by inactivity gaps and
/// reports per-developer totals.
#[derive(Debug, Parser)]
#[command(name = "wt", version, about, long_about = None)]
pub struct Cli {
    /// Log files to analyze (CSV or TSV with a header row). When empty,
    /// the logs directory is scanned for *.txt and *.csv files.
    pub input_files: Vec<PathBuf>,

    /// Directory scanned for log files when no input files are given.
    #[arg(long)]
    pub logs_dir: Option<PathBuf>,

    /// Inactivity gap in minutes that closes a work session.
    #[arg(short, long)]
    pub inactivity: Option<f64>,

    /// Drop developers whose total hours fall below this threshold.
    #[arg(long)]
    pub min_hours: Option<f64>,

    /// Remove exact duplicate (user, timestamp) events before analysis,
    /// for overlapping export windows.
    #[arg(long)]
    pub dedupe: bool,

    /// Write the text report to this file instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Also export the report as two CSV files (sessions and summary).
    #[arg(long)]
    pub csv: bool,

    /// Export the report as a multi-sheet spreadsheet at this path.
    #[arg(long)]
    pub excel: Option<PathBuf>,

    /// Only show the per-developer summary, without session detail.
    #[arg(long)]
    pub summary: bool,

    /// Print the report as JSON instead of text.
    #[arg(long)]
    pub json: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

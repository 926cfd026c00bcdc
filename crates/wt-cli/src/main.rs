use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use wt_cli::{Cli, Config, input, output};
use wt_core::{AnalyzeConfig, ColumnSpec, RawSource, render_json, render_text};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let files: Vec<PathBuf> = if cli.input_files.is_empty() {
        let logs_dir = cli.logs_dir.as_ref().unwrap_or(&config.logs_dir);
        input::find_log_files(logs_dir)?
    } else {
        cli.input_files.clone()
    };

    let sources: Vec<RawSource> = files
        .iter()
        .map(|path| input::read_source(path))
        .collect::<Result<_>>()?;

    let analyze_config = AnalyzeConfig {
        inactivity_minutes: cli.inactivity.unwrap_or(config.inactivity_minutes),
        min_hours: cli.min_hours.unwrap_or(config.min_hours),
        dedupe: cli.dedupe,
    };
    let analysis = wt_core::analyze(&sources, &ColumnSpec::default(), &analyze_config)
        .context("analysis failed")?;

    tracing::info!(
        files = analysis.diagnostics.files_processed,
        events = analysis.diagnostics.events_parsed,
        skipped = analysis.diagnostics.rows_skipped,
        sessions = analysis.diagnostics.sessions_found,
        "analysis complete"
    );

    if cli.json {
        let json = render_json(&analysis.report, &analysis.diagnostics)
            .context("failed to serialize report")?;
        println!("{json}");
    } else {
        let text = render_text(&analysis.report, cli.summary);
        output::write_report(&text, cli.output.as_deref())?;
    }

    if cli.csv {
        // CSV exports land next to the report file, or next to the first
        // input when the report goes to stdout.
        let base = cli
            .output
            .clone()
            .or_else(|| files.first().cloned())
            .unwrap_or_else(|| PathBuf::from("report.txt"));
        output::write_csv_exports(&analysis.report, &base)?;
    }

    if let Some(excel_path) = &cli.excel {
        output::write_workbook(&analysis.report, analyze_config.inactivity_minutes, excel_path)?;
    }

    Ok(())
}

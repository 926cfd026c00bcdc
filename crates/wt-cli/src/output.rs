//! Writing the rendered report to its destinations.
//!
//! CSV and spreadsheet exports both consume the logical tables the core
//! produces; nothing here reaches back into segmentation or aggregation.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use rust_xlsxwriter::Workbook;
use wt_core::{Report, Table, session_table, sheets, summary_table};

/// Writes the text report to a file, or prints it when no path is given.
pub fn write_report(text: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, text)
                .with_context(|| format!("failed to write report to {}", path.display()))?;
            tracing::info!(path = %path.display(), "report written");
        }
        None => print!("{text}"),
    }
    Ok(())
}

/// Quotes a cell per RFC 4180 when it contains a delimiter, quote, or
/// newline.
fn csv_escape(cell: &str) -> String {
    if cell.contains(',') || cell.contains('"') || cell.contains('\n') {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

/// Renders a logical table as CSV text.
fn table_to_csv(table: &Table) -> String {
    let mut out = String::new();
    let write_row = |cells: &[String], out: &mut String| {
        let line = cells
            .iter()
            .map(|cell| csv_escape(cell))
            .collect::<Vec<_>>()
            .join(",");
        writeln!(out, "{line}").unwrap();
    };

    write_row(&table.columns, &mut out);
    for row in &table.rows {
        write_row(row, &mut out);
    }
    out
}

/// Derives the paths of the two CSV exports from the report path.
fn csv_paths(base: &Path) -> (PathBuf, PathBuf) {
    let stem = base
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("report");
    (
        base.with_file_name(format!("{stem}_sessions.csv")),
        base.with_file_name(format!("{stem}_summary.csv")),
    )
}

/// Writes the session and summary tables as two CSV files next to `base`.
pub fn write_csv_exports(report: &Report, base: &Path) -> Result<()> {
    let (sessions_path, summary_path) = csv_paths(base);

    fs::write(&sessions_path, table_to_csv(&session_table(report)))
        .with_context(|| format!("failed to write {}", sessions_path.display()))?;
    fs::write(&summary_path, table_to_csv(&summary_table(report)))
        .with_context(|| format!("failed to write {}", summary_path.display()))?;

    tracing::info!(
        sessions = %sessions_path.display(),
        summary = %summary_path.display(),
        "CSV exports written"
    );
    Ok(())
}

/// Writes the report as a multi-sheet spreadsheet: summary, day/week
/// pivots and listings, sessions, one tab per developer, and an Info tab.
#[allow(clippy::cast_possible_truncation)]
pub fn write_workbook(report: &Report, inactivity_minutes: f64, path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();

    for sheet in sheets(report, inactivity_minutes, Utc::now()) {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(sheet.name.as_str())?;

        for (col, name) in sheet.table.columns.iter().enumerate() {
            worksheet.write_string(0, col as u16, name.as_str())?;
        }
        for (row_idx, row) in sheet.table.rows.iter().enumerate() {
            for (col, cell) in row.iter().enumerate() {
                worksheet.write_string(row_idx as u32 + 1, col as u16, cell.as_str())?;
            }
        }
    }

    workbook
        .save(path)
        .with_context(|| format!("failed to write spreadsheet to {}", path.display()))?;
    tracing::info!(path = %path.display(), "spreadsheet written");
    Ok(())
}

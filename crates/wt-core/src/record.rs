//! Parsing raw tabular log rows into normalized activity events.
//!
//! Input files come from heterogeneous export tools, so the timestamp and
//! user columns are resolved against a configurable set of accepted header
//! names. Column resolution happens once per source; anything ambiguous or
//! missing is rejected up front rather than guessed.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Timestamp layouts accepted in activity exports. Naive stamps are taken
/// as UTC; there is no mixed-zone reconciliation.
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Errors resolving the required columns of an input source.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// No header matched the accepted names for a required field.
    #[error("{source_name}: no column found for {field} (accepted: {accepted})")]
    MissingColumn {
        source_name: String,
        field: &'static str,
        accepted: String,
    },

    /// More than one header matched a required field.
    #[error("{source_name}: ambiguous columns for {field}: {matches}")]
    AmbiguousColumn {
        source_name: String,
        field: &'static str,
        matches: String,
    },
}

/// Accepted header names per canonical field, matched case-insensitively
/// after trimming.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Header names recognized as the event timestamp.
    pub timestamp: Vec<String>,
    /// Header names recognized as the acting user.
    pub user: Vec<String>,
}

impl Default for ColumnSpec {
    fn default() -> Self {
        Self {
            timestamp: ["Date/Time (UTC)", "DateTime", "Timestamp", "Date/Time", "Time"]
                .map(String::from)
                .to_vec(),
            user: ["User", "Developer", "Username", "User Name", "Email"]
                .map(String::from)
                .to_vec(),
        }
    }
}

impl ColumnSpec {
    /// Resolves the timestamp and user column indices for a source.
    pub fn resolve(&self, source: &RawSource) -> Result<ResolvedColumns, SchemaError> {
        let timestamp = resolve_field(source, "timestamp", &self.timestamp)?;
        let user = resolve_field(source, "user", &self.user)?;
        Ok(ResolvedColumns { timestamp, user })
    }
}

/// Column indices resolved once at parse start.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedColumns {
    pub timestamp: usize,
    pub user: usize,
}

fn resolve_field(
    source: &RawSource,
    field: &'static str,
    accepted: &[String],
) -> Result<usize, SchemaError> {
    let matches: Vec<usize> = source
        .headers
        .iter()
        .enumerate()
        .filter(|(_, header)| {
            accepted
                .iter()
                .any(|name| name.trim().eq_ignore_ascii_case(header.trim()))
        })
        .map(|(idx, _)| idx)
        .collect();

    match matches.as_slice() {
        [idx] => Ok(*idx),
        [] => Err(SchemaError::MissingColumn {
            source_name: source.name.clone(),
            field,
            accepted: accepted.join(", "),
        }),
        many => Err(SchemaError::AmbiguousColumn {
            source_name: source.name.clone(),
            field,
            matches: many
                .iter()
                .map(|&idx| source.headers[idx].clone())
                .collect::<Vec<_>>()
                .join(", "),
        }),
    }
}

/// One tabular input source: a header row plus data rows, already split
/// into cells by the caller.
#[derive(Debug, Clone)]
pub struct RawSource {
    /// Identifier used in diagnostics and errors (typically the file name).
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// A normalized activity event. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub user: String,
    pub timestamp: DateTime<Utc>,
    /// Name of the source this event came from.
    pub source: String,
    /// All original cells of the row, keyed by header.
    pub raw_fields: BTreeMap<String, String>,
}

/// Result of parsing one source.
#[derive(Debug, Default)]
pub struct Parsed {
    pub events: Vec<Event>,
    /// Rows dropped for a missing user, a blank line, or an unparsable
    /// timestamp. Never fatal.
    pub rows_skipped: usize,
}

/// Parses a timestamp cell, trying each accepted layout in order.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc())
}

/// Parses all rows of a source into events.
///
/// Fails only when the required columns cannot be resolved; row-level
/// problems are skipped and counted.
pub fn parse_source(source: &RawSource, columns: &ColumnSpec) -> Result<Parsed, SchemaError> {
    let resolved = columns.resolve(source)?;
    let mut parsed = Parsed::default();

    for (row_num, row) in source.rows.iter().enumerate() {
        if row.iter().all(|cell| cell.trim().is_empty()) {
            parsed.rows_skipped += 1;
            continue;
        }

        let user = row.get(resolved.user).map_or("", |cell| cell.trim());
        if user.is_empty() {
            tracing::debug!(source = %source.name, row = row_num + 2, "skipping row without user");
            parsed.rows_skipped += 1;
            continue;
        }

        let raw_timestamp = row.get(resolved.timestamp).map_or("", String::as_str);
        let Some(timestamp) = parse_timestamp(raw_timestamp) else {
            tracing::debug!(
                source = %source.name,
                row = row_num + 2,
                value = raw_timestamp,
                "skipping row with unparsable timestamp"
            );
            parsed.rows_skipped += 1;
            continue;
        };

        let raw_fields = source
            .headers
            .iter()
            .zip(row.iter())
            .map(|(header, cell)| (header.clone(), cell.clone()))
            .collect();

        parsed.events.push(Event {
            user: user.to_string(),
            timestamp,
            source: source.name.clone(),
            raw_fields,
        });
    }

    Ok(parsed)
}

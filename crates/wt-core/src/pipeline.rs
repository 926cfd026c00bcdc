//! The full raw-rows-to-report pipeline behind one entry point.
//!
//! Data flows strictly forward: raw rows → events → sessions → aggregates.
//! Callers hand in already-read tabular sources and get back an in-memory
//! report plus run diagnostics; all file I/O stays outside the core.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::aggregate::{Report, aggregate};
use crate::record::{ColumnSpec, Event, RawSource, SchemaError, parse_source};
use crate::session::{ValidationError, build_sessions};

/// Caller-supplied analysis configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeConfig {
    /// Maximum gap in minutes between consecutive events still counted as
    /// the same working session.
    pub inactivity_minutes: f64,
    /// Drop users whose total is below this many hours (inclusive keep).
    pub min_hours: f64,
    /// Remove exact `(user, timestamp)` duplicate events before
    /// sessionization, for overlapping export windows.
    pub dedupe: bool,
}

impl Default for AnalyzeConfig {
    fn default() -> Self {
        Self {
            inactivity_minutes: 30.0,
            min_hours: 0.0,
            dedupe: false,
        }
    }
}

impl AnalyzeConfig {
    /// Checks the configuration before any input is touched.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.inactivity_minutes.is_finite() || self.inactivity_minutes < 0.0 {
            return Err(ValidationError::InvalidThreshold {
                value: self.inactivity_minutes,
            });
        }
        if !self.min_hours.is_finite() || self.min_hours < 0.0 {
            return Err(ValidationError::InvalidMinHours {
                value: self.min_hours,
            });
        }
        Ok(())
    }
}

/// Counters describing what a run consumed and produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub files_processed: usize,
    /// Rows dropped across all sources (blank, missing user, bad timestamp).
    pub rows_skipped: usize,
    pub events_parsed: usize,
    /// Sessions built before the minimum-hours filter.
    pub sessions_found: usize,
}

/// A completed analysis: the report plus its diagnostics.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub report: Report,
    pub diagnostics: Diagnostics,
}

/// Fatal analysis failures. Row-level problems never land here.
#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Runs the full pipeline over one or more sources.
///
/// Events from all sources are merged into a single stream before
/// sessionization, so a session can span a file boundary. Configuration is
/// validated before any parsing; a schema failure in any source aborts the
/// run with no partial report.
pub fn analyze(
    sources: &[RawSource],
    columns: &ColumnSpec,
    config: &AnalyzeConfig,
) -> Result<Analysis, AnalyzeError> {
    config.validate()?;

    let mut events: Vec<Event> = Vec::new();
    let mut diagnostics = Diagnostics {
        files_processed: sources.len(),
        ..Diagnostics::default()
    };

    for source in sources {
        let parsed = parse_source(source, columns)?;
        tracing::debug!(
            source = %source.name,
            events = parsed.events.len(),
            skipped = parsed.rows_skipped,
            "parsed source"
        );
        diagnostics.rows_skipped += parsed.rows_skipped;
        events.extend(parsed.events);
    }
    diagnostics.events_parsed = events.len();

    if config.dedupe {
        let mut seen: BTreeSet<(String, chrono::DateTime<chrono::Utc>)> = BTreeSet::new();
        let before = events.len();
        events.retain(|event| seen.insert((event.user.clone(), event.timestamp)));
        let dropped = before - events.len();
        if dropped > 0 {
            tracing::info!(dropped, "removed duplicate events");
        }
    }

    let sessions = build_sessions(&events, config.inactivity_minutes)?;
    diagnostics.sessions_found = sessions.len();

    let report = aggregate(sessions, config.min_hours)?;
    Ok(Analysis { report, diagnostics })
}

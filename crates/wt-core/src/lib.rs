//! Core domain logic for the work-time analyzer.
//!
//! This crate contains the fundamental types and logic for:
//! - Record parsing: normalizing raw tabular log rows into events
//! - Session building: grouping events by inactivity gaps
//! - Aggregation: per-user totals and summary statistics
//! - Formatting: text, table, and JSON renderings of a report

pub mod aggregate;
pub mod format;
pub mod pipeline;
pub mod record;
pub mod session;

pub use aggregate::{Report, UserSummary, aggregate};
pub use format::{
    Sheet, Table, developer_sheets, info_table, pivot_day_table, pivot_week_table, render_json,
    render_text, session_table, sheets, summary_table, work_by_day_table, work_by_week_table,
};
pub use pipeline::{Analysis, AnalyzeConfig, AnalyzeError, Diagnostics, analyze};
pub use record::{ColumnSpec, Event, RawSource, SchemaError};
pub use session::{Session, ValidationError, build_sessions};

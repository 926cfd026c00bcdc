//! Renderers over a single [`Report`] representation.
//!
//! Each output format (text block, CSV tables, spreadsheet sheets, JSON)
//! is an independent function of the same report, so adding a format never
//! touches segmentation or aggregation.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::Serialize;

use crate::aggregate::{Report, UserSummary};
use crate::pipeline::Diagnostics;
use crate::session::Session;

/// A logical table ready for CSV or spreadsheet rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// A named table, one per spreadsheet tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sheet {
    pub name: String,
    pub table: Table,
}

fn format_stamp(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Rounds hours to the two decimals used everywhere hours are displayed.
fn round_hours(hours: f64) -> f64 {
    (hours * 100.0).round() / 100.0
}

/// Summaries sorted by descending total hours, ties by user name ascending.
fn sorted_summaries(report: &Report) -> Vec<&UserSummary> {
    let mut summaries: Vec<&UserSummary> = report.summaries.values().collect();
    summaries.sort_by(|a, b| {
        b.total_hours
            .total_cmp(&a.total_hours)
            .then_with(|| a.user.cmp(&b.user))
    });
    summaries
}

/// Minutes of idle time between each session's end and the same user's next
/// session start. `None` for a user's last session.
fn gaps_to_next(report: &Report) -> Vec<Option<f64>> {
    let mut gaps = vec![None; report.sessions.len()];
    let mut last_by_user: BTreeMap<&str, usize> = BTreeMap::new();
    for (idx, session) in report.sessions.iter().enumerate() {
        if let Some(&prev) = last_by_user.get(session.user.as_str()) {
            #[allow(clippy::cast_precision_loss)]
            let minutes =
                (session.start - report.sessions[prev].end).num_milliseconds() as f64 / 60_000.0;
            gaps[prev] = Some(minutes);
        }
        last_by_user.insert(&session.user, idx);
    }
    gaps
}

/// Renders the human-readable report block.
///
/// With `summary_only` the per-session detail listing is omitted.
pub fn render_text(report: &Report, summary_only: bool) -> String {
    let mut out = String::new();
    writeln!(out, "WORK TIME REPORT").unwrap();
    writeln!(out, "================").unwrap();

    if report.summaries.is_empty() {
        writeln!(out, "No sessions found.").unwrap();
        return out;
    }

    writeln!(out, "Developers:  {}", report.summaries.len()).unwrap();
    writeln!(out, "Sessions:    {}", report.sessions.len()).unwrap();
    writeln!(out, "Total hours: {:.2}h", report.total_hours()).unwrap();

    writeln!(out).unwrap();
    writeln!(out, "BY DEVELOPER").unwrap();
    writeln!(out, "------------").unwrap();
    writeln!(
        out,
        "{:<28} {:>7} {:>9} {:>7}",
        "Developer", "Hours", "Sessions", "Events"
    )
    .unwrap();
    for summary in sorted_summaries(report) {
        writeln!(
            out,
            "{:<28} {:>7} {:>9} {:>7}",
            summary.user,
            format!("{:.2}h", summary.total_hours),
            summary.session_count,
            summary.event_count
        )
        .unwrap();
    }

    if !summary_only {
        writeln!(out).unwrap();
        writeln!(out, "SESSION DETAIL").unwrap();
        writeln!(out, "--------------").unwrap();
        writeln!(
            out,
            "{:<19}  {:<19}  {:<24} {:>7} {:>7} {:>9}",
            "Start", "End", "Developer", "Hours", "Events", "Gap"
        )
        .unwrap();
        let gaps = gaps_to_next(report);
        for (session, gap) in report.sessions.iter().zip(&gaps) {
            writeln!(
                out,
                "{:<19}  {:<19}  {:<24} {:>7} {:>7} {:>9}",
                format_stamp(session.start),
                format_stamp(session.end),
                session.user,
                format!("{:.2}h", session.duration_hours()),
                session.event_count,
                gap.map_or_else(|| "-".to_string(), |minutes| format!("{minutes:.0}min"))
            )
            .unwrap();
        }
    }

    out
}

/// One row per session, in report order. The gap column is empty for a
/// user's last session.
pub fn session_table(report: &Report) -> Table {
    let gaps = gaps_to_next(report);
    Table {
        columns: [
            "Developer",
            "Start",
            "End",
            "Duration (min)",
            "Duration (hours)",
            "Events",
            "Gap to Next (min)",
        ]
        .map(String::from)
        .to_vec(),
        rows: report
            .sessions
            .iter()
            .zip(&gaps)
            .map(|(session, gap)| {
                vec![
                    session.user.clone(),
                    format_stamp(session.start),
                    format_stamp(session.end),
                    format!("{:.2}", session.duration_hours() * 60.0),
                    format!("{:.2}", session.duration_hours()),
                    session.event_count.to_string(),
                    gap.map_or_else(String::new, |minutes| format!("{minutes:.2}")),
                ]
            })
            .collect(),
    }
}

/// One row per user summary, sorted by descending total hours.
pub fn summary_table(report: &Report) -> Table {
    Table {
        columns: [
            "Developer",
            "Total Hours",
            "Sessions",
            "Events",
            "First Seen",
            "Last Seen",
        ]
        .map(String::from)
        .to_vec(),
        rows: sorted_summaries(report)
            .into_iter()
            .map(|summary| {
                vec![
                    summary.user.clone(),
                    format!("{:.2}", summary.total_hours),
                    summary.session_count.to_string(),
                    summary.event_count.to_string(),
                    format_stamp(summary.first_seen),
                    format_stamp(summary.last_seen),
                ]
            })
            .collect(),
    }
}

/// Calendar day a session is attributed to (its start day, UTC).
fn session_date(session: &Session) -> NaiveDate {
    session.start.date_naive()
}

/// Monday of the week a session's start falls in.
fn session_week_start(session: &Session) -> NaiveDate {
    let date = session.start.date_naive();
    date - chrono::Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Hours pivoted over a date bucket: one column per developer, a TOTAL
/// column per row, and a closing TOTAL row.
fn pivot_table(report: &Report, index_name: &str, bucket: impl Fn(&Session) -> NaiveDate) -> Table {
    let mut users: BTreeSet<&str> = BTreeSet::new();
    let mut cells: BTreeMap<NaiveDate, BTreeMap<&str, f64>> = BTreeMap::new();
    for session in &report.sessions {
        users.insert(&session.user);
        *cells
            .entry(bucket(session))
            .or_default()
            .entry(&session.user)
            .or_insert(0.0) += session.duration_hours();
    }

    let mut columns = vec![index_name.to_string()];
    columns.extend(users.iter().map(|user| (*user).to_string()));
    columns.push("TOTAL".to_string());

    let mut rows = Vec::with_capacity(cells.len() + 1);
    let mut column_totals: BTreeMap<&str, f64> = BTreeMap::new();
    let mut grand_total = 0.0;
    for (date, by_user) in &cells {
        let mut row = vec![date.format("%Y-%m-%d").to_string()];
        let mut row_total = 0.0;
        for user in &users {
            let hours = by_user.get(user).copied().unwrap_or(0.0);
            row.push(format!("{hours:.2}"));
            row_total += hours;
            *column_totals.entry(user).or_insert(0.0) += hours;
        }
        grand_total += row_total;
        row.push(format!("{row_total:.2}"));
        rows.push(row);
    }

    let mut total_row = vec!["TOTAL".to_string()];
    for user in &users {
        total_row.push(format!(
            "{:.2}",
            column_totals.get(user).copied().unwrap_or(0.0)
        ));
    }
    total_row.push(format!("{grand_total:.2}"));
    rows.push(total_row);

    Table { columns, rows }
}

/// Hours by calendar day, one developer per column.
pub fn pivot_day_table(report: &Report) -> Table {
    pivot_table(report, "Date", session_date)
}

/// Hours by week (Monday start), one developer per column.
pub fn pivot_week_table(report: &Report) -> Table {
    pivot_table(report, "Week Start", session_week_start)
}

/// Per-bucket per-developer totals as a flat listing.
fn bucket_detail_table(
    report: &Report,
    index_name: &str,
    bucket: impl Fn(&Session) -> NaiveDate,
) -> Table {
    let mut buckets: BTreeMap<(NaiveDate, &str), (f64, usize, usize)> = BTreeMap::new();
    for session in &report.sessions {
        let entry = buckets
            .entry((bucket(session), session.user.as_str()))
            .or_insert((0.0, 0, 0));
        entry.0 += session.duration_hours();
        entry.1 += 1;
        entry.2 += session.event_count;
    }
    Table {
        columns: [index_name, "Developer", "Hours", "Sessions", "Events"]
            .map(String::from)
            .to_vec(),
        rows: buckets
            .iter()
            .map(|((date, user), (hours, sessions, events))| {
                vec![
                    date.format("%Y-%m-%d").to_string(),
                    (*user).to_string(),
                    format!("{hours:.2}"),
                    sessions.to_string(),
                    events.to_string(),
                ]
            })
            .collect(),
    }
}

/// Daily totals per developer, sorted by (day, developer).
pub fn work_by_day_table(report: &Report) -> Table {
    bucket_detail_table(report, "Date", session_date)
}

/// Weekly totals per developer, sorted by (week start, developer).
pub fn work_by_week_table(report: &Report) -> Table {
    bucket_detail_table(report, "Week Start", session_week_start)
}

/// Report-level metadata for the spreadsheet's Info tab.
pub fn info_table(report: &Report, inactivity_minutes: f64, generated_at: DateTime<Utc>) -> Table {
    let total_events: usize = report.summaries.values().map(|s| s.event_count).sum();
    let rows = vec![
        ("Total Developers", report.summaries.len().to_string()),
        ("Total Sessions", report.sessions.len().to_string()),
        ("Total Events", total_events.to_string()),
        ("Total Hours", format!("{:.2}", report.total_hours())),
        ("Inactivity Period (min)", inactivity_minutes.to_string()),
        ("Generated At", format_stamp(generated_at)),
    ];
    Table {
        columns: ["Metric", "Value"].map(String::from).to_vec(),
        rows: rows
            .into_iter()
            .map(|(metric, value)| vec![metric.to_string(), value])
            .collect(),
    }
}

/// Tab name for a developer: the part before `@`, capped at the 31-char
/// sheet-name limit, deduplicated with a numeric suffix on collision.
fn developer_sheet_name(user: &str, used: &mut BTreeSet<String>) -> String {
    let base: String = user.split('@').next().unwrap_or(user).chars().take(31).collect();
    let mut name = base.clone();
    let mut n = 2;
    while !used.insert(name.clone()) {
        let suffix = format!(" ({n})");
        let keep = 31 - suffix.chars().count();
        name = base.chars().take(keep).collect::<String>() + &suffix;
        n += 1;
    }
    name
}

/// One sheet per developer with that developer's sessions.
pub fn developer_sheets(report: &Report) -> Vec<Sheet> {
    let mut used = BTreeSet::new();
    report
        .summaries
        .keys()
        .map(|user| {
            let rows = report
                .sessions
                .iter()
                .filter(|session| session.user == *user)
                .map(|session| {
                    vec![
                        format_stamp(session.start),
                        format_stamp(session.end),
                        format!("{:.2}", session.duration_hours() * 60.0),
                        format!("{:.2}", session.duration_hours()),
                        session.event_count.to_string(),
                    ]
                })
                .collect();
            Sheet {
                name: developer_sheet_name(user, &mut used),
                table: Table {
                    columns: [
                        "Start",
                        "End",
                        "Duration (min)",
                        "Duration (hours)",
                        "Events",
                    ]
                    .map(String::from)
                    .to_vec(),
                    rows,
                },
            }
        })
        .collect()
}

/// The full spreadsheet: summary, day/week pivots and listings, all
/// sessions, one tab per developer, and a closing Info tab.
pub fn sheets(report: &Report, inactivity_minutes: f64, generated_at: DateTime<Utc>) -> Vec<Sheet> {
    let named = |name: &str, table: Table| Sheet {
        name: name.to_string(),
        table,
    };
    let mut sheets = vec![
        named("Summary", summary_table(report)),
        named("Pivot - Hours by Day", pivot_day_table(report)),
        named("Pivot - Hours by Week", pivot_week_table(report)),
        named("Work by Day", work_by_day_table(report)),
        named("Work by Week", work_by_week_table(report)),
        named("Sessions", session_table(report)),
    ];
    sheets.extend(developer_sheets(report));
    sheets.push(named(
        "Info",
        info_table(report, inactivity_minutes, generated_at),
    ));
    sheets
}

// === JSON output ===

#[derive(Debug, Serialize)]
pub struct JsonReport {
    pub diagnostics: JsonDiagnostics,
    pub totals: JsonTotals,
    pub summaries: Vec<JsonSummary>,
    pub sessions: Vec<JsonSession>,
}

#[derive(Debug, Serialize)]
pub struct JsonDiagnostics {
    pub files_processed: usize,
    pub rows_skipped: usize,
    pub events_parsed: usize,
    pub sessions_found: usize,
}

#[derive(Debug, Serialize)]
pub struct JsonTotals {
    pub developers: usize,
    pub sessions: usize,
    pub total_hours: f64,
}

#[derive(Debug, Serialize)]
pub struct JsonSummary {
    pub user: String,
    pub total_hours: f64,
    pub session_count: usize,
    pub event_count: usize,
    pub first_seen: String,
    pub last_seen: String,
}

#[derive(Debug, Serialize)]
pub struct JsonSession {
    pub user: String,
    pub start: String,
    pub end: String,
    pub duration_hours: f64,
    pub event_count: usize,
}

/// Renders the report and its run diagnostics as pretty-printed JSON.
pub fn render_json(report: &Report, diagnostics: &Diagnostics) -> Result<String, serde_json::Error> {
    let json = JsonReport {
        diagnostics: JsonDiagnostics {
            files_processed: diagnostics.files_processed,
            rows_skipped: diagnostics.rows_skipped,
            events_parsed: diagnostics.events_parsed,
            sessions_found: diagnostics.sessions_found,
        },
        totals: JsonTotals {
            developers: report.summaries.len(),
            sessions: report.sessions.len(),
            total_hours: round_hours(report.total_hours()),
        },
        summaries: sorted_summaries(report)
            .into_iter()
            .map(|summary| JsonSummary {
                user: summary.user.clone(),
                total_hours: round_hours(summary.total_hours),
                session_count: summary.session_count,
                event_count: summary.event_count,
                first_seen: summary.first_seen.to_rfc3339(),
                last_seen: summary.last_seen.to_rfc3339(),
            })
            .collect(),
        sessions: report
            .sessions
            .iter()
            .map(|session| JsonSession {
                user: session.user.clone(),
                start: session.start.to_rfc3339(),
                end: session.end.to_rfc3339(),
                duration_hours: round_hours(session.duration_hours()),
                event_count: session.event_count,
            })
            .collect(),
    };
    serde_json::to_string_pretty(&json)
}

//! Per-user aggregation of session durations.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::{Session, ValidationError};

/// Totals for one user across the full input. Derived and read-only;
/// recomputed on every run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    pub user: String,
    /// Sum of session durations at full precision.
    pub total_hours: f64,
    pub session_count: usize,
    pub event_count: usize,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

/// The final analysis artifact handed to the formatters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// All sessions, ordered by start time (ties by user name).
    pub sessions: Vec<Session>,
    pub summaries: BTreeMap<String, UserSummary>,
}

impl Report {
    /// Total hours across all users, at full precision.
    #[must_use]
    pub fn total_hours(&self) -> f64 {
        self.summaries.values().map(|s| s.total_hours).sum()
    }
}

/// Computes per-user summaries and applies the minimum-hours filter.
///
/// The filter boundary is inclusive: a user whose total is exactly
/// `min_hours` is kept. Filtered users lose their sessions as well as
/// their summary. Pure function of its inputs.
pub fn aggregate(sessions: Vec<Session>, min_hours: f64) -> Result<Report, ValidationError> {
    if !min_hours.is_finite() || min_hours < 0.0 {
        return Err(ValidationError::InvalidMinHours { value: min_hours });
    }

    let mut summaries: BTreeMap<String, UserSummary> = BTreeMap::new();
    for session in &sessions {
        summaries
            .entry(session.user.clone())
            .and_modify(|summary| {
                summary.total_hours += session.duration_hours();
                summary.session_count += 1;
                summary.event_count += session.event_count;
                summary.first_seen = summary.first_seen.min(session.start);
                summary.last_seen = summary.last_seen.max(session.end);
            })
            .or_insert_with(|| UserSummary {
                user: session.user.clone(),
                total_hours: session.duration_hours(),
                session_count: 1,
                event_count: session.event_count,
                first_seen: session.start,
                last_seen: session.end,
            });
    }

    if min_hours > 0.0 {
        let before = summaries.len();
        summaries.retain(|_, summary| summary.total_hours >= min_hours);
        let dropped = before - summaries.len();
        if dropped > 0 {
            tracing::info!(dropped, min_hours, "filtered users below minimum hours");
        }
    }

    let sessions = sessions
        .into_iter()
        .filter(|session| summaries.contains_key(&session.user))
        .collect();

    Ok(Report { sessions, summaries })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::parse_timestamp;

    fn session(user: &str, start: &str, end: &str, event_count: usize) -> Session {
        Session {
            user: user.to_string(),
            start: parse_timestamp(start).unwrap(),
            end: parse_timestamp(end).unwrap(),
            event_count,
        }
    }

    #[test]
    fn sums_sessions_per_user() {
        let report = aggregate(
            vec![
                session("alice", "2024-03-01 09:00:00", "2024-03-01 09:20:00", 3),
                session("alice", "2024-03-01 11:00:00", "2024-03-01 11:00:00", 1),
                session("bob", "2024-03-01 09:00:00", "2024-03-01 09:30:00", 2),
            ],
            0.0,
        )
        .unwrap();

        let alice = &report.summaries["alice"];
        assert_eq!(alice.session_count, 2);
        assert_eq!(alice.event_count, 4);
        assert!((alice.total_hours - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(alice.first_seen, parse_timestamp("2024-03-01 09:00:00").unwrap());
        assert_eq!(alice.last_seen, parse_timestamp("2024-03-01 11:00:00").unwrap());

        let bob = &report.summaries["bob"];
        assert_eq!(bob.session_count, 1);
        assert!((bob.total_hours - 0.5).abs() < 1e-9);
        assert!((report.total_hours() - (1.0 / 3.0 + 0.5)).abs() < 1e-9);
    }

    #[test]
    fn totals_match_session_sum_at_full_precision() {
        let sessions: Vec<Session> = (0..50)
            .map(|i| {
                let start = parse_timestamp("2024-03-01 00:00:00").unwrap()
                    + chrono::Duration::minutes(i * 90);
                Session {
                    user: "alice".to_string(),
                    start,
                    end: start + chrono::Duration::seconds(419),
                    event_count: 2,
                }
            })
            .collect();
        let expected: f64 = sessions.iter().map(Session::duration_hours).sum();

        let report = aggregate(sessions, 0.0).unwrap();
        assert!((report.summaries["alice"].total_hours - expected).abs() < 1e-9);
    }

    #[test]
    fn min_hours_boundary_is_inclusive() {
        // 0.99h = 3564s, exactly 1.0h = 3600s.
        let report = aggregate(
            vec![
                session("under", "2024-03-01 09:00:00", "2024-03-01 09:59:24", 5),
                session("exact", "2024-03-01 09:00:00", "2024-03-01 10:00:00", 5),
            ],
            1.0,
        )
        .unwrap();

        assert!(!report.summaries.contains_key("under"));
        assert!(report.summaries.contains_key("exact"));
        assert!(report.sessions.iter().all(|s| s.user == "exact"));
    }

    #[test]
    fn rejects_invalid_min_hours() {
        for value in [-0.5, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                aggregate(vec![], value).unwrap_err(),
                ValidationError::InvalidMinHours { .. }
            ));
        }
    }

    #[test]
    fn empty_sessions_yield_empty_report() {
        let report = aggregate(vec![], 0.0).unwrap();
        assert!(report.sessions.is_empty());
        assert!(report.summaries.is_empty());
        assert!(report.total_hours().abs() < f64::EPSILON);
    }
}

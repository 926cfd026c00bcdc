//! Grouping a user's events into work sessions by inactivity gaps.
//!
//! A session is a contiguous run of one user's chronologically sorted
//! events where no gap between consecutive events exceeds the configured
//! inactivity threshold.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::record::Event;

/// Invalid caller-supplied configuration. Surfaced before any processing.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// The inactivity threshold was negative or non-finite.
    #[error("inactivity threshold must be a non-negative number of minutes, got {value}")]
    InvalidThreshold { value: f64 },

    /// The minimum-hours filter was negative or non-finite.
    #[error("minimum hours filter must be a non-negative number, got {value}")]
    InvalidMinHours { value: f64 },
}

/// A contiguous run of one user's activity.
///
/// Invariant: `start <= end`. A session built from a single event has
/// `start == end` and zero duration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub event_count: usize,
}

impl Session {
    /// Session length in hours at full precision. Rounding is left to the
    /// formatter so summation does not compound rounding error.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn duration_hours(&self) -> f64 {
        (self.end - self.start).num_milliseconds() as f64 / 3_600_000.0
    }
}

/// Converts a threshold in minutes to a duration, validating it first.
fn threshold_duration(inactivity_minutes: f64) -> Result<Duration, ValidationError> {
    if !inactivity_minutes.is_finite() || inactivity_minutes < 0.0 {
        return Err(ValidationError::InvalidThreshold {
            value: inactivity_minutes,
        });
    }
    #[allow(clippy::cast_possible_truncation)]
    let millis = (inactivity_minutes * 60_000.0) as i64;
    Ok(Duration::milliseconds(millis))
}

/// Builds sessions from parsed events.
///
/// Events are partitioned by user and stably sorted by timestamp within
/// each partition, so ties preserve input order. The returned sessions are
/// ordered by start time across all users, ties broken by user name.
///
/// An empty event list yields an empty session list. A threshold of zero
/// puts every event in its own session unless timestamps are exactly equal
/// (a zero gap never closes a session).
pub fn build_sessions(
    events: &[Event],
    inactivity_minutes: f64,
) -> Result<Vec<Session>, ValidationError> {
    let threshold = threshold_duration(inactivity_minutes)?;

    let mut by_user: BTreeMap<&str, Vec<&Event>> = BTreeMap::new();
    for event in events {
        by_user.entry(&event.user).or_default().push(event);
    }

    let mut sessions = Vec::new();
    for (user, mut user_events) in by_user {
        // Stable: equal timestamps keep input order.
        user_events.sort_by_key(|event| event.timestamp);

        let mut current: Option<Session> = None;
        for event in user_events {
            match current.as_mut() {
                Some(session) if event.timestamp - session.end <= threshold => {
                    session.end = event.timestamp;
                    session.event_count += 1;
                }
                _ => {
                    if let Some(finished) = current.take() {
                        sessions.push(finished);
                    }
                    current = Some(Session {
                        user: user.to_string(),
                        start: event.timestamp,
                        end: event.timestamp,
                        event_count: 1,
                    });
                }
            }
        }
        if let Some(finished) = current {
            sessions.push(finished);
        }
    }

    sessions.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.user.cmp(&b.user)));
    tracing::debug!(
        sessions = sessions.len(),
        threshold_minutes = inactivity_minutes,
        "built sessions"
    );
    Ok(sessions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::parse_timestamp;

    fn event(user: &str, timestamp: &str) -> Event {
        Event {
            user: user.to_string(),
            timestamp: parse_timestamp(timestamp).unwrap(),
            source: "test.txt".to_string(),
            raw_fields: std::collections::BTreeMap::new(),
        }
    }

    #[test]
    fn gap_above_threshold_starts_a_new_session() {
        let events = [
            event("alice", "2024-03-01 09:00:00"),
            event("alice", "2024-03-01 09:20:00"),
            event("alice", "2024-03-01 11:00:00"),
        ];
        let sessions = build_sessions(&events, 30.0).unwrap();

        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].start, parse_timestamp("2024-03-01 09:00:00").unwrap());
        assert_eq!(sessions[0].end, parse_timestamp("2024-03-01 09:20:00").unwrap());
        assert_eq!(sessions[0].event_count, 2);
        assert_eq!(sessions[1].start, sessions[1].end);
        assert_eq!(sessions[1].event_count, 1);
    }

    #[test]
    fn gap_exactly_at_threshold_stays_in_session() {
        let events = [
            event("alice", "2024-03-01 09:00:00"),
            event("alice", "2024-03-01 09:30:00"),
        ];
        let sessions = build_sessions(&events, 30.0).unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].event_count, 2);
    }

    #[test]
    fn single_event_yields_zero_duration_session() {
        let events = [event("alice", "2024-03-01 09:00:00")];
        let sessions = build_sessions(&events, 30.0).unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].start, sessions[0].end);
        assert!((sessions[0].duration_hours()).abs() < f64::EPSILON);
    }

    #[test]
    fn zero_threshold_splits_unless_timestamps_equal() {
        let events = [
            event("alice", "2024-03-01 09:00:00"),
            event("alice", "2024-03-01 09:00:00"),
            event("alice", "2024-03-01 09:00:01"),
        ];
        let sessions = build_sessions(&events, 0.0).unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].event_count, 2);
        assert_eq!(sessions[1].event_count, 1);
    }

    #[test]
    fn duplicate_timestamps_merge_as_zero_gap() {
        let events = [
            event("alice", "2024-03-01 09:00:00"),
            event("alice", "2024-03-01 09:00:00"),
        ];
        let sessions = build_sessions(&events, 30.0).unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].event_count, 2);
    }

    #[test]
    fn out_of_order_input_is_sorted_first() {
        let events = [
            event("alice", "2024-03-01 09:20:00"),
            event("alice", "2024-03-01 09:00:00"),
        ];
        let sessions = build_sessions(&events, 30.0).unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].start, parse_timestamp("2024-03-01 09:00:00").unwrap());
        assert_eq!(sessions[0].end, parse_timestamp("2024-03-01 09:20:00").unwrap());
    }

    #[test]
    fn sessions_ordered_by_start_then_user() {
        let events = [
            event("bob", "2024-03-01 09:00:00"),
            event("alice", "2024-03-01 09:00:00"),
            event("carol", "2024-03-01 08:00:00"),
        ];
        let sessions = build_sessions(&events, 30.0).unwrap();
        let order: Vec<&str> = sessions.iter().map(|s| s.user.as_str()).collect();
        assert_eq!(order, ["carol", "alice", "bob"]);
    }

    #[test]
    fn rejects_negative_or_non_finite_threshold() {
        for value in [-1.0, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = build_sessions(&[], value).unwrap_err();
            assert!(matches!(err, ValidationError::InvalidThreshold { .. }));
        }
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(build_sessions(&[], 30.0).unwrap().is_empty());
    }

    #[test]
    fn every_session_satisfies_invariants() {
        let events = [
            event("alice", "2024-03-01 09:00:00"),
            event("bob", "2024-03-01 09:03:00"),
            event("alice", "2024-03-01 10:30:00"),
            event("bob", "2024-03-01 09:04:00"),
            event("alice", "2024-03-01 10:31:00"),
        ];
        let sessions = build_sessions(&events, 15.0).unwrap();
        for session in &sessions {
            assert!(session.event_count >= 1);
            assert!(session.start <= session.end);
        }
    }

    #[test]
    fn raising_the_threshold_never_increases_session_count() {
        let events = [
            event("alice", "2024-03-01 09:00:00"),
            event("alice", "2024-03-01 09:10:00"),
            event("alice", "2024-03-01 09:45:00"),
            event("alice", "2024-03-01 11:00:00"),
            event("bob", "2024-03-01 09:00:00"),
            event("bob", "2024-03-01 12:00:00"),
        ];
        let mut previous = usize::MAX;
        for minutes in [0.0, 5.0, 10.0, 35.0, 75.0, 180.0] {
            let count = build_sessions(&events, minutes).unwrap().len();
            assert!(
                count <= previous,
                "session count rose from {previous} to {count} at {minutes} minutes"
            );
            previous = count;
        }
    }
}

//! Checkpoint storage and seeding
//!
//! A checkpoint is a single `i64`, milliseconds since the Unix epoch, keyed
//! by input name. It records the highest updated timestamp among issues that
//! were successfully emitted, so the next pass only asks Jira for newer
//! changes.
//!
//! # Overview
//!
//! - [`CheckpointStore`] - the storage contract (get/set/delete per input)
//! - [`FileCheckpointStore`] - JSON file persistence with atomic writes
//! - [`seed_value`] - initial checkpoint for inputs without one

mod store;

pub use store::FileCheckpointStore;

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use tracing::warn;

/// Format accepted for the operator-supplied seed hint
pub const SEED_HINT_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Lookback applied when an input starts without checkpoint or hint
pub const DEFAULT_LOOKBACK_DAYS: i64 = 7;

/// Durable per-input checkpoint storage
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Get the checkpoint for an input, if one exists
    async fn get(&self, input: &str) -> Result<Option<i64>>;

    /// Set the checkpoint for an input
    async fn set(&self, input: &str, value: i64) -> Result<()>;

    /// Delete the checkpoint for an input
    async fn delete(&self, input: &str) -> Result<()>;
}

/// Parse an operator-supplied seed hint ("YYYY-MM-DD HH:MM", naive UTC)
pub fn parse_seed_hint(hint: &str) -> Option<i64> {
    NaiveDateTime::parse_from_str(hint.trim(), SEED_HINT_FORMAT)
        .ok()
        .map(|dt| dt.and_utc().timestamp_millis())
}

/// Compute the initial checkpoint for an input that has none yet.
///
/// A parseable hint wins; otherwise the seed is `now` minus
/// [`DEFAULT_LOOKBACK_DAYS`]. Deterministic given the same hint and clock.
pub fn seed_value(hint: Option<&str>, now: DateTime<Utc>) -> i64 {
    if let Some(hint) = hint {
        if let Some(millis) = parse_seed_hint(hint) {
            return millis;
        }
        warn!(
            hint,
            "last updated start time does not match the required format '{}', \
             falling back to the default lookback",
            SEED_HINT_FORMAT
        );
    }
    (now - Duration::days(DEFAULT_LOOKBACK_DAYS)).timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_seed_hint_valid() {
        let millis = parse_seed_hint("2024-03-01 12:30").unwrap();
        let expected = Utc
            .with_ymd_and_hms(2024, 3, 1, 12, 30, 0)
            .unwrap()
            .timestamp_millis();
        assert_eq!(millis, expected);
    }

    #[test]
    fn test_parse_seed_hint_invalid() {
        assert!(parse_seed_hint("2024-03-01").is_none());
        assert!(parse_seed_hint("not a date").is_none());
        assert!(parse_seed_hint("2024-03-01T12:30").is_none());
    }

    #[test]
    fn test_seed_value_prefers_hint() {
        let now = Utc.with_ymd_and_hms(2024, 3, 8, 0, 0, 0).unwrap();
        let seed = seed_value(Some("2024-03-01 12:30"), now);
        assert_eq!(seed, parse_seed_hint("2024-03-01 12:30").unwrap());
    }

    #[test]
    fn test_seed_value_default_lookback() {
        let now = Utc.with_ymd_and_hms(2024, 3, 8, 0, 0, 0).unwrap();
        let expected = Utc
            .with_ymd_and_hms(2024, 3, 1, 0, 0, 0)
            .unwrap()
            .timestamp_millis();
        assert_eq!(seed_value(None, now), expected);
        // An invalid hint falls back to the same default
        assert_eq!(seed_value(Some("yesterday"), now), expected);
    }

    #[test]
    fn test_seed_value_deterministic() {
        let now = Utc.with_ymd_and_hms(2024, 3, 8, 6, 7, 8).unwrap();
        assert_eq!(seed_value(None, now), seed_value(None, now));
        assert_eq!(
            seed_value(Some("2024-01-15 08:00"), now),
            seed_value(Some("2024-01-15 08:00"), now)
        );
    }
}

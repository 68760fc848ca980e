//! Collector driver: one pass per input
//!
//! A pass runs end-to-end for a single input: read (or seed) the
//! checkpoint, build the effective JQL, page through the search results,
//! repair truncated worklogs, emit one event per issue and finally persist
//! the highest updated timestamp that was actually emitted.
//!
//! # Failure classification
//!
//! Every failure is classified exactly once, with no retries anywhere:
//!
//! - configuration, seed persistence and main page fetch failures are
//!   fatal: the pass aborts with the checkpoint untouched
//! - worklog repair, timestamp parse and emission failures skip the single
//!   affected record and the pass continues
//! - a failure persisting the final checkpoint is logged only; emitted
//!   events are not rolled back, so the next pass may emit duplicates
//!   (at-least-once delivery is preferred over silent gaps)

use crate::checkpoint::{seed_value, CheckpointStore};
use crate::config::{AccountConfig, InputConfig, ProxyConfig};
use crate::error::Result;
use crate::fetch::SearchPages;
use crate::http::JiraClient;
use crate::query::build_jql;
use crate::sink::{Event, EventSink};
use crate::worklog::{repair_page, wants_worklog};
use chrono::{DateTime, FixedOffset, Utc};
use serde_json::Value;
use tracing::{error, info, warn};

/// Wire format of the issue updated timestamp.
///
/// Jira servers always send a millisecond fraction, but `%.f` also accepts
/// a timestamp without one. Tightening it would require a fixed fraction
/// width, which the wire format does not guarantee.
pub const UPDATED_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f%z";

/// Outcome of processing one issue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// The issue was handed to the sink
    Emitted {
        /// The issue's updated timestamp, milliseconds since epoch
        updated_millis: i64,
    },
    /// The issue was skipped; the pass continues
    Skipped(SkipReason),
}

/// Why a single issue was skipped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The updated timestamp was missing or unparseable
    UnparseableTimestamp,
    /// The sink rejected the event
    EmitFailed,
}

/// Counters reported at the end of a pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
    /// Issues successfully emitted
    pub emitted: u64,
    /// Issues skipped (timestamp parse or emission failure)
    pub skipped: u64,
    /// Pages fetched from the search API
    pub pages: u64,
    /// Issues whose worklog was repaired
    pub repaired: u64,
    /// Checkpoint value persisted at the end of the pass
    pub checkpoint: i64,
}

/// One collection pass for one input.
///
/// All per-pass state lives here; the pass is constructed fresh at entry
/// and consumed by [`Pass::run`].
pub struct Pass<'a> {
    input: &'a InputConfig,
    client: JiraClient,
    store: &'a dyn CheckpointStore,
    sink: &'a dyn EventSink,
}

impl std::fmt::Debug for Pass<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pass")
            .field("input", &self.input)
            .finish_non_exhaustive()
    }
}

impl<'a> Pass<'a> {
    /// Validate the input and build the per-pass HTTP client.
    ///
    /// This is the Init state: a missing filter, field list or account is
    /// fatal before any network call.
    pub fn new(
        input: &'a InputConfig,
        account: &AccountConfig,
        proxy: Option<&ProxyConfig>,
        store: &'a dyn CheckpointStore,
        sink: &'a dyn EventSink,
    ) -> Result<Self> {
        input.validate()?;
        let client = JiraClient::new(account, proxy)?;
        Ok(Self {
            input,
            client,
            store,
            sink,
        })
    }

    /// Run the pass to completion
    pub async fn run(self) -> Result<PassSummary> {
        self.run_at(Utc::now()).await
    }

    /// Run the pass with an explicit clock (checkpoint seeding is
    /// deterministic given the same hint and clock)
    pub async fn run_at(self, now: DateTime<Utc>) -> Result<PassSummary> {
        let input_name = self.input.name.as_str();

        // CursorReady: read the checkpoint, seeding it on first run.
        // A seed persist failure is fatal.
        let checkpoint = match self.store.get(input_name).await? {
            Some(value) => value,
            None => {
                info!(input = input_name, "checkpoint does not yet exist, initializing");
                let seed = seed_value(self.input.last_updated_start_time.as_deref(), now);
                self.store.set(input_name, seed).await?;
                info!(input = input_name, checkpoint = seed, "initialized checkpoint");
                seed
            }
        };

        // Querying
        info!(input = input_name, checkpoint, "starting pass");
        let jql = build_jql(&self.input.jql, checkpoint);

        // Paging loop. The running maximum starts at the prior checkpoint,
        // so a pass that emits nothing persists a no-op advance.
        let repair_worklogs = wants_worklog(&self.input.issue_fields);
        let mut pages = SearchPages::new(
            &self.client,
            jql,
            &self.input.issue_fields,
            self.input.expand_fields.as_deref(),
        );

        let mut summary = PassSummary {
            checkpoint,
            ..PassSummary::default()
        };
        let mut max_updated = checkpoint;

        while let Some(mut page) = pages.next_page().await? {
            summary.pages += 1;

            if repair_worklogs {
                summary.repaired +=
                    repair_page(&self.client, &mut page.issues, input_name).await as u64;
            }

            for issue in page.issues {
                match self.process_issue(issue).await {
                    RecordOutcome::Emitted { updated_millis } => {
                        summary.emitted += 1;
                        if updated_millis > max_updated {
                            max_updated = updated_millis;
                        }
                    }
                    RecordOutcome::Skipped(_) => {
                        summary.skipped += 1;
                    }
                }
            }
        }

        // Finalizing: a persist failure here is logged but does not roll
        // back already-emitted events.
        summary.checkpoint = max_updated;
        info!(input = input_name, checkpoint = max_updated, "setting new checkpoint value");
        if let Err(e) = self.store.set(input_name, max_updated).await {
            error!(
                input = input_name,
                error = %e,
                "unable to update checkpoint, the next pass runs with the old value \
                 and may emit duplicate events"
            );
        }

        // Done
        if summary.emitted > 0 {
            info!(
                input = input_name,
                emitted = summary.emitted,
                skipped = summary.skipped,
                pages = summary.pages,
                "successfully emitted issues"
            );
        } else {
            info!(
                input = input_name,
                "the pass ran successfully, there were no new issues to emit"
            );
        }

        Ok(summary)
    }

    /// Process one issue: parse its updated timestamp and emit the event.
    /// Both failure modes skip only this issue.
    async fn process_issue(&self, issue: Value) -> RecordOutcome {
        let updated = match parse_updated(&issue) {
            Ok(updated) => updated,
            Err(raw) => {
                warn!(
                    input = self.input.name.as_str(),
                    updated = raw.as_deref().unwrap_or("<missing>"),
                    "unable to parse updated time of issue, it will not be emitted"
                );
                return RecordOutcome::Skipped(SkipReason::UnparseableTimestamp);
            }
        };

        let updated_millis = updated.timestamp_millis();
        let event = Event::new(
            issue,
            updated_millis as f64 / 1000.0,
            &self.input.index,
            &self.input.name,
        );

        match self.sink.emit(&event).await {
            Ok(()) => RecordOutcome::Emitted { updated_millis },
            Err(e) => {
                warn!(
                    input = self.input.name.as_str(),
                    error = %e,
                    "unable to emit event, the issue will be skipped"
                );
                RecordOutcome::Skipped(SkipReason::EmitFailed)
            }
        }
    }
}

/// Parse the updated timestamp of an issue.
///
/// Returns the raw field value on failure so the caller can log it.
fn parse_updated(issue: &Value) -> std::result::Result<DateTime<FixedOffset>, Option<String>> {
    let raw = issue["fields"]["updated"]
        .as_str()
        .ok_or(None::<String>)?;
    DateTime::parse_from_str(raw, UPDATED_TIME_FORMAT).map_err(|_| Some(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_parse_updated_valid() {
        let issue = json!({"fields": {"updated": "2024-03-01T10:15:30.123+0100"}});
        let updated = parse_updated(&issue).unwrap();
        assert_eq!(updated.timestamp_millis(), 1_709_284_530_123);
    }

    #[test]
    fn test_parse_updated_negative_offset() {
        let issue = json!({"fields": {"updated": "2024-03-01T10:15:30.000-0500"}});
        let updated = parse_updated(&issue).unwrap();
        assert_eq!(updated.timestamp_millis(), 1_709_306_130_000);
    }

    #[test]
    fn test_parse_updated_without_fraction() {
        // The fraction is optional on the wire format
        let issue = json!({"fields": {"updated": "2024-03-01T10:15:30+0100"}});
        let updated = parse_updated(&issue).unwrap();
        assert_eq!(updated.timestamp_millis(), 1_709_284_530_000);
    }

    #[test]
    fn test_parse_updated_invalid() {
        let issue = json!({"fields": {"updated": "2024-03-01 10:15"}});
        assert_eq!(
            parse_updated(&issue).unwrap_err(),
            Some("2024-03-01 10:15".to_string())
        );
    }

    #[test]
    fn test_parse_updated_missing() {
        let issue = json!({"fields": {"summary": "no updated field"}});
        assert_eq!(parse_updated(&issue).unwrap_err(), None);

        let issue = json!({"key": "A-1"});
        assert_eq!(parse_updated(&issue).unwrap_err(), None);
    }

    #[test]
    fn test_pass_summary_default() {
        let summary = PassSummary::default();
        assert_eq!(summary.emitted, 0);
        assert_eq!(summary.skipped, 0);
        assert_eq!(summary.pages, 0);
    }
}

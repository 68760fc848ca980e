//! Truncated worklog repair
//!
//! Jira silently truncates the nested worklog collection of a search result
//! to a fixed limit (upstream bug JRASERVER-34746). When the configured
//! field list asks for worklogs, every issue whose worklog declares
//! `total > maxResults` gets a dedicated re-fetch of its full worklog
//! collection (the per-issue endpoint does not paginate, JRASERVER-69308).
//!
//! A failure repairing one issue is logged and that issue keeps its
//! truncated worklog; the page continues. This is the per-record isolation
//! boundary: page fetch failures are fatal to the pass, worklog repair
//! failures are not.

use crate::http::JiraClient;
use serde_json::Value;
use tracing::{debug, warn};

/// Field name that triggers repair when present in the configured list
pub const WORKLOG_FIELD: &str = "worklog";

/// Check whether the configured field list names the worklog field
pub fn wants_worklog(issue_fields: &str) -> bool {
    issue_fields.split(',').any(|f| f.trim() == WORKLOG_FIELD)
}

/// Check whether an issue's worklog was truncated by the server.
///
/// Only issues that declare both `maxResults` and `total` are considered.
pub fn is_truncated(issue: &Value) -> bool {
    let worklog = &issue["fields"][WORKLOG_FIELD];
    match (worklog["maxResults"].as_u64(), worklog["total"].as_u64()) {
        (Some(max_results), Some(total)) => total > max_results,
        _ => false,
    }
}

/// Re-fetch and replace truncated worklogs on a page of issues.
///
/// Returns the number of issues repaired. Failures are per-issue and
/// non-fatal.
pub async fn repair_page(client: &JiraClient, issues: &mut [Value], input: &str) -> usize {
    let mut repaired = 0;

    for issue in issues.iter_mut() {
        if !is_truncated(issue) {
            continue;
        }

        let Some(key) = issue["key"].as_str().map(ToString::to_string) else {
            warn!(input, "issue with truncated worklog has no key, skipping repair");
            continue;
        };

        debug!(input, issue = %key, "worklog is truncated, fetching all worklogs");

        match client.full_worklog(&key).await {
            Ok(full) => {
                issue["fields"][WORKLOG_FIELD] = full;
                repaired += 1;
            }
            Err(e) => {
                warn!(
                    input,
                    issue = %key,
                    error = %e,
                    "unable to fetch all worklogs, the event will carry a truncated worklog"
                );
            }
        }
    }

    repaired
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_wants_worklog() {
        assert!(wants_worklog("summary, worklog, status"));
        assert!(wants_worklog("worklog"));
        assert!(!wants_worklog("summary,status"));
        // Only an exact field name counts
        assert!(!wants_worklog("worklogs,summary"));
    }

    #[test]
    fn test_is_truncated() {
        let truncated = json!({
            "key": "A-1",
            "fields": {"worklog": {"maxResults": 20, "total": 45, "worklogs": []}}
        });
        assert!(is_truncated(&truncated));

        let complete = json!({
            "key": "A-2",
            "fields": {"worklog": {"maxResults": 20, "total": 15, "worklogs": []}}
        });
        assert!(!is_truncated(&complete));

        let exact = json!({
            "key": "A-3",
            "fields": {"worklog": {"maxResults": 20, "total": 20, "worklogs": []}}
        });
        assert!(!is_truncated(&exact));
    }

    #[test]
    fn test_is_truncated_requires_both_counters() {
        let no_total = json!({"fields": {"worklog": {"maxResults": 20}}});
        assert!(!is_truncated(&no_total));

        let no_worklog = json!({"fields": {"summary": "hi"}});
        assert!(!is_truncated(&no_worklog));

        let no_fields = json!({"key": "A-4"});
        assert_eq!(is_truncated(&no_fields), false);
    }
}

//! Effective JQL construction
//!
//! Decides whether the checkpoint is applied as a time bound on the
//! user-supplied JQL. When the operator already constrains the updated
//! field, the filter is passed through untouched and the pass runs without
//! a checkpoint bound.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

/// The Jira field used for both querying and checkpoint advancement
pub const UPDATED_FIELD: &str = "updated";

/// Splits JQL into alphabetic-only tokens
static TOKEN_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new("[^a-zA-Z]+").expect("valid regex"));

/// Check whether the JQL already constrains the updated field.
///
/// Tokenizes on any non-letter character and matches either accepted
/// spelling, so `updated > -10m` and `updatedDate >= "2024-01-01"` both
/// count, while field names that merely contain the word (`lastupdated`)
/// do not.
pub fn mentions_updated_field(jql: &str) -> bool {
    TOKEN_SPLIT.split(jql).any(|token| {
        let token = token.to_ascii_lowercase();
        token == "updated" || token == "updateddate"
    })
}

/// Build the effective JQL for one pass.
///
/// Returns the filter unmodified when it already constrains the updated
/// field; otherwise prepends `updated > <cursor_millis>`.
pub fn build_jql(jql: &str, cursor_millis: i64) -> String {
    if mentions_updated_field(jql) {
        info!("an updated field is set in the JQL filter, running without a checkpoint bound");
        return jql.to_string();
    }

    let effective = format!("{UPDATED_FIELD} > {cursor_millis} AND {}", jql.trim());
    debug!(jql = %effective, "effective JQL");
    effective
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test_case("status = Open", false; "no updated field")]
    #[test_case("updated > -10m", true; "updated as token")]
    #[test_case("updatedDate >= '2024-01-01'", true; "updatedDate spelling")]
    #[test_case("UPDATED > -1d AND project = X", true; "case insensitive")]
    #[test_case("lastupdated = foo", false; "substring does not count")]
    #[test_case("project = UPD AND labels = updatedlater", false; "merged token does not count")]
    #[test_case("summary ~ 'updated'", true; "quoted word still tokenizes")]
    fn test_mentions_updated_field(jql: &str, expected: bool) {
        assert_eq!(mentions_updated_field(jql), expected);
    }

    #[test]
    fn test_build_jql_prepends_bound() {
        assert_eq!(
            build_jql("status = Open", 1000),
            "updated > 1000 AND status = Open"
        );
    }

    #[test]
    fn test_build_jql_trims_filter() {
        assert_eq!(
            build_jql("  project = BUGS  ", 1_700_000_000_000),
            "updated > 1700000000000 AND project = BUGS"
        );
    }

    #[test]
    fn test_build_jql_passthrough() {
        assert_eq!(build_jql("updated > -10m", 1000), "updated > -10m");
    }
}

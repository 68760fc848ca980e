//! Paginated issue search fetcher
//!
//! Drives repeated `startAt`-offset requests against the search API until a
//! page comes back empty. The offset advances by the server-declared
//! `maxResults` of each response, never by a client-side page size, because
//! different server deployments apply different limits. Server-reported
//! totals are never consulted.
//!
//! Requests are strictly sequential: each offset depends on the previous
//! response, so pages are never fetched in parallel.

use crate::error::{Error, Result};
use crate::http::{JiraClient, SearchPage};
use crate::query::UPDATED_FIELD;
use tracing::{debug, info};

/// Lazy sequence of search pages for one pass
pub struct SearchPages<'a> {
    client: &'a JiraClient,
    jql: String,
    fields: String,
    expand: Option<String>,
    start_at: u64,
    done: bool,
}

impl<'a> SearchPages<'a> {
    /// Start a paginated search.
    ///
    /// The updated field is always requested in addition to the configured
    /// issue fields; both the field list and the expand directives have
    /// spaces stripped before transmission.
    pub fn new(
        client: &'a JiraClient,
        jql: impl Into<String>,
        issue_fields: &str,
        expand: Option<&str>,
    ) -> Self {
        Self {
            client,
            jql: jql.into(),
            fields: request_fields(issue_fields),
            expand: expand.map(strip_spaces),
            start_at: 0,
            done: false,
        }
    }

    /// Fetch the next page, or `None` once the server returns an empty page.
    ///
    /// Any fetch or decode failure is fatal to the pass and surfaces here.
    pub async fn next_page(&mut self) -> Result<Option<SearchPage>> {
        if self.done {
            return Ok(None);
        }

        info!(start_at = self.start_at, "sending request to Jira search API");
        let page = self
            .client
            .search(&self.jql, &self.fields, self.expand.as_deref(), self.start_at)
            .await?;

        if page.is_empty() {
            debug!("all API pages have been queried");
            self.done = true;
            return Ok(None);
        }

        // A non-empty page with a zero page size could never advance the
        // offset; abort instead of re-requesting the same page forever.
        if page.max_results == 0 {
            return Err(Error::decode(
                "Jira search response declared maxResults=0 for a non-empty page",
            ));
        }

        self.start_at += page.max_results;
        Ok(Some(page))
    }
}

/// The `fields` request parameter: updated plus the configured fields
fn request_fields(issue_fields: &str) -> String {
    format!("{UPDATED_FIELD},{}", strip_spaces(issue_fields))
}

fn strip_spaces(value: &str) -> String {
    value.replace(' ', "")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_request_fields_prepends_updated() {
        assert_eq!(request_fields("summary,status"), "updated,summary,status");
    }

    #[test]
    fn test_request_fields_strips_spaces() {
        assert_eq!(
            request_fields("summary, status, worklog"),
            "updated,summary,status,worklog"
        );
    }

    #[test]
    fn test_strip_spaces_on_expand() {
        assert_eq!(strip_spaces("changelog, renderedFields"), "changelog,renderedFields");
    }
}

//! Jira REST API client
//!
//! A thin client over the two endpoints the collector uses: the paginated
//! issue search and the unpaginated per-issue worklog fetch. There is no
//! retry layer: a transport failure or non-success status is surfaced to
//! the caller, which treats it as fatal for search and as a per-issue skip
//! for worklogs.

mod client;

pub use client::{JiraClient, SearchPage};

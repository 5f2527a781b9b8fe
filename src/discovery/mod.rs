//! Repository discovery feeds.
//!
//! Two independent producers push repo names into the scan queue: an archive
//! replayer that walks hourly GH Archive dumps a few hours behind real time,
//! and a live poller on the public events API. Both funnel through the same
//! event-shape filter here.

pub mod archive;
pub mod poll;

use serde::Deserialize;
use std::collections::HashSet;

use crate::core::model::RepoId;

/// Event types worth scanning: fresh repos and fresh pushes.
pub const INTERESTING_EVENTS: [&str; 3] = ["CreateEvent", "PushEvent", "PublicEvent"];

#[derive(Debug, Deserialize)]
pub struct RawEvent {
    #[serde(rename = "type")]
    pub kind: String,
    pub repo: Option<EventRepo>,
}

#[derive(Debug, Deserialize)]
pub struct EventRepo {
    /// Always `owner/name` in the events payload.
    pub name: String,
}

/// Filters a batch of events down to unique scannable repos, preserving feed
/// order.
pub fn extract_repos(events: &[RawEvent]) -> Vec<RepoId> {
    let mut seen = HashSet::new();
    let mut repos = Vec::new();
    for event in events {
        if !INTERESTING_EVENTS.contains(&event.kind.as_str()) {
            continue;
        }
        let Some(repo) = &event.repo else { continue };
        let Some(id) = RepoId::parse(&repo.name) else { continue };
        if seen.insert(id.full_name()) {
            repos.push(id);
        }
    }
    repos
}

use serde::Serialize;
use std::fmt;

use crate::detect::providers::Provider;

/// An (owner, repo) pair. Created once by discovery or an enqueue request,
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RepoId {
    pub owner: String,
    pub name: String,
}

impl RepoId {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Parses an `owner/name` pair; anything else is rejected.
    pub fn parse(full_name: &str) -> Option<Self> {
        let (owner, name) = full_name.split_once('/')?;
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return None;
        }
        Some(Self::new(owner, name))
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// A credential candidate extracted from one file. The raw key lives only for
/// the duration of the scan; serialization carries the mask and hash.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Detection {
    pub provider: Provider,
    #[serde(skip_serializing)]
    pub key: String,
    pub key_masked: String,
    pub key_hash: String,
    pub line: usize,
    pub entropy: f64,
    pub confidence: u8,
}

/// A file pulled from a repository, ready for detection.
#[derive(Debug, Clone)]
pub struct RepoFile {
    pub path: String,
    pub content: String,
}

/// Classification for scans that settled without a normal pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    AlreadyScanned,
    NoFiles,
    RateLimited,
    FetchFailed,
}

/// Result of one worker iteration over a repository.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanOutcome {
    pub owner: String,
    pub repo: String,
    pub findings: Vec<Detection>,
    pub files_scanned: usize,
    pub duration_ms: u64,
    pub error: Option<OutcomeKind>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialStatus {
    pub total: usize,
    pub available: usize,
    pub rate_limited: usize,
}

/// Full state snapshot published on the `status` event and returned by the
/// control surface.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    pub running: bool,
    pub repos_per_minute: u32,
    pub queue_size: usize,
    pub total_found: u64,
    pub total_scanned: u64,
    pub scanning_repos: Vec<String>,
    pub credentials: CredentialStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_owner_name() {
        let id = RepoId::parse("octocat/hello-world").unwrap();
        assert_eq!(id.owner, "octocat");
        assert_eq!(id.name, "hello-world");
        assert_eq!(id.full_name(), "octocat/hello-world");
    }

    #[test]
    fn parse_rejects_malformed_names() {
        assert!(RepoId::parse("no-slash").is_none());
        assert!(RepoId::parse("/leading").is_none());
        assert!(RepoId::parse("trailing/").is_none());
        assert!(RepoId::parse("a/b/c").is_none());
    }

    #[test]
    fn detection_serialization_never_carries_the_raw_key() {
        let detection = Detection {
            provider: Provider::OpenAi,
            key: "sk-proj-verySecretRawValue1234567890".to_string(),
            key_masked: "sk-proj-****...****7890".to_string(),
            key_hash: "deadbeef".to_string(),
            line: 3,
            entropy: 4.2,
            confidence: 90,
        };

        let value = serde_json::to_value(&detection).unwrap();
        let object = value.as_object().unwrap();
        assert!(!object.contains_key("key"));
        assert_eq!(object["keyMasked"], "sk-proj-****...****7890");
        assert_eq!(object["keyHash"], "deadbeef");
        assert!(!value.to_string().contains("verySecretRawValue"));
    }
}

//! Persistence boundary.
//!
//! The core consumes persistence through the [`Store`] trait and never
//! specifies a schema. [`MemoryStore`] is the default backend; a relational
//! implementation can be plugged in from outside. Duplicate-insert races on
//! a finding hash are tolerated with last-write-wins.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

use crate::core::error::Result;
use crate::detect::providers::Provider;

/// A persisted finding. Only the masked key and its hash ever reach this
/// layer.
#[derive(Debug, Clone)]
pub struct FindingRecord {
    pub provider: Provider,
    pub key_masked: String,
    pub key_hash: String,
    pub repo_owner: String,
    pub repo_name: String,
    pub file_path: String,
    pub line: usize,
    pub confidence: u8,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewFinding {
    pub provider: Provider,
    pub key_masked: String,
    pub key_hash: String,
    pub repo_owner: String,
    pub repo_name: String,
    pub file_path: String,
    pub line: usize,
    pub confidence: u8,
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct StoredCredential {
    pub value: String,
    pub label: Option<String>,
    pub usage: u64,
    pub used_at: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn find_by_hash(&self, hash: &str) -> Result<Option<FindingRecord>>;
    async fn create_finding(&self, finding: NewFinding) -> Result<()>;
    async fn is_repo_scanned(&self, owner: &str, repo: &str) -> Result<bool>;
    async fn mark_repo_scanned(&self, owner: &str, repo: &str, findings: usize) -> Result<()>;
    async fn list_active_credentials(&self) -> Result<Vec<StoredCredential>>;
    async fn upsert_credential(&self, value: &str, label: Option<&str>) -> Result<()>;
    async fn increment_credential_usage(&self, value: &str) -> Result<()>;
    async fn remove_credential(&self, value: &str) -> Result<()>;
}

/// Keeps every record in process memory.
#[derive(Default)]
pub struct MemoryStore {
    findings: Mutex<HashMap<String, FindingRecord>>,
    scanned: Mutex<HashMap<String, usize>>,
    credentials: Mutex<HashMap<String, StoredCredential>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn repo_key(owner: &str, repo: &str) -> String {
        format!("{}/{}", owner, repo)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_by_hash(&self, hash: &str) -> Result<Option<FindingRecord>> {
        Ok(self.findings.lock().unwrap().get(hash).cloned())
    }

    async fn create_finding(&self, finding: NewFinding) -> Result<()> {
        let record = FindingRecord {
            provider: finding.provider,
            key_masked: finding.key_masked,
            key_hash: finding.key_hash.clone(),
            repo_owner: finding.repo_owner,
            repo_name: finding.repo_name,
            file_path: finding.file_path,
            line: finding.line,
            confidence: finding.confidence,
            url: finding.url,
            created_at: Utc::now(),
        };
        self.findings
            .lock()
            .unwrap()
            .insert(finding.key_hash, record);
        Ok(())
    }

    async fn is_repo_scanned(&self, owner: &str, repo: &str) -> Result<bool> {
        Ok(self
            .scanned
            .lock()
            .unwrap()
            .contains_key(&Self::repo_key(owner, repo)))
    }

    async fn mark_repo_scanned(&self, owner: &str, repo: &str, findings: usize) -> Result<()> {
        self.scanned
            .lock()
            .unwrap()
            .insert(Self::repo_key(owner, repo), findings);
        Ok(())
    }

    async fn list_active_credentials(&self) -> Result<Vec<StoredCredential>> {
        let mut credentials: Vec<StoredCredential> =
            self.credentials.lock().unwrap().values().cloned().collect();
        credentials.sort_by_key(|c| c.usage);
        Ok(credentials)
    }

    async fn upsert_credential(&self, value: &str, label: Option<&str>) -> Result<()> {
        let mut credentials = self.credentials.lock().unwrap();
        credentials
            .entry(value.to_string())
            .and_modify(|c| c.label = label.map(str::to_string))
            .or_insert_with(|| StoredCredential {
                value: value.to_string(),
                label: label.map(str::to_string),
                usage: 0,
                used_at: None,
            });
        Ok(())
    }

    async fn increment_credential_usage(&self, value: &str) -> Result<()> {
        if let Some(credential) = self.credentials.lock().unwrap().get_mut(value) {
            credential.usage += 1;
            credential.used_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn remove_credential(&self, value: &str) -> Result<()> {
        self.credentials.lock().unwrap().remove(value);
        Ok(())
    }
}

//! Credential detection over file content.
//!
//! `detect` is a pure function from content and path to a list of
//! [`Detection`]s. The only shared state is the compiled pattern tables,
//! built once at first use. A multi-pattern pre-flight pass skips the
//! per-provider extraction entirely for the vast majority of files, which
//! contain none of the trigger substrings.

pub mod filters;
pub mod heuristics;
pub mod providers;

use aho_corasick::AhoCorasick;
use lazy_static::lazy_static;
use sha2::{Digest, Sha256};

use crate::core::model::Detection;
use providers::PROFILES;

/// Candidates below this entropy are judged too structured to be secrets.
pub const MIN_ENTROPY: f64 = 3.0;

lazy_static! {
    static ref PREFLIGHT: AhoCorasick = {
        let keywords: Vec<&str> = PROFILES
            .iter()
            .flat_map(|profile| profile.keywords.iter().copied())
            .collect();
        AhoCorasick::new(&keywords).unwrap()
    };
}

/// Cheap multi-pattern substring test over every provider's trigger keywords.
pub fn preflight(content: &str) -> bool {
    PREFLIGHT.is_match(content)
}

/// First 8 and last 4 characters survive; short keys collapse to a constant.
/// Counts characters, not bytes, so arbitrary input cannot split a char.
pub fn mask_key(key: &str) -> String {
    let length = key.chars().count();
    if length <= 12 {
        return "****".to_string();
    }
    let head: String = key.chars().take(8).collect();
    let tail: String = key.chars().skip(length - 4).collect();
    format!("{}****...****{}", head, tail)
}

/// SHA-256 hex digest of the raw candidate, used only for deduplication.
pub fn hash_key(key: &str) -> String {
    Sha256::digest(key.as_bytes())
        .iter()
        .map(|byte| format!("{:02x}", byte))
        .collect()
}

fn line_of(content: &str, offset: usize) -> usize {
    content.as_bytes()[..offset]
        .iter()
        .filter(|&&byte| byte == b'\n')
        .count()
        + 1
}

fn confidence_for(key: &str, entropy: f64, prefix: &str) -> u8 {
    let mut confidence: u32 = if entropy >= 4.0 { 30 } else { 15 };
    if heuristics::has_mixed_case(key) {
        confidence += 20;
    }
    if heuristics::has_digits(key) {
        confidence += 10;
    }
    if key.starts_with(prefix) {
        confidence += 25;
    }
    // Flat bonus for surviving every filter
    confidence += 15;
    confidence.min(100) as u8
}

/// Extracts credential candidates from one file.
pub fn detect(content: &str, path: &str) -> Vec<Detection> {
    let mut findings = Vec::new();

    if !preflight(content) {
        return findings;
    }
    if filters::is_skipped_path(path) {
        return findings;
    }

    for profile in PROFILES.iter() {
        for m in profile.pattern.find_iter(content) {
            let key = m.as_str();
            if key.len() < profile.min_length {
                continue;
            }
            if filters::is_banned(key) {
                continue;
            }
            let entropy = heuristics::shannon_entropy(key);
            if entropy < MIN_ENTROPY {
                continue;
            }

            findings.push(Detection {
                provider: profile.provider,
                key: key.to_string(),
                key_masked: mask_key(key),
                key_hash: hash_key(key),
                line: line_of(content, m.start()),
                entropy,
                confidence: confidence_for(key, entropy, profile.prefix),
            });
        }
    }

    findings
}

//! False-positive suppression: candidate banlist, path skip-list, and the
//! extension allow-list used when enumerating repository files.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

use super::heuristics;

lazy_static! {
    /// Heuristics for placeholder and documentation keys. Repeated-character
    /// runs are checked separately; the regex crate has no backreferences.
    static ref BANLIST: Vec<Regex> = vec![
        // Placeholder keywords
        Regex::new(r"(?i)(your|my|the|replace|placeholder|example|test|sample|dummy|fake|xxx+)_?(key|token|secret)").unwrap(),
        Regex::new(r"(?i)^(sk-)?(test|example|demo|sample)").unwrap(),
        Regex::new(r"(?i)^sk-ant-(test|example|demo)").unwrap(),
        // Sequential filler
        Regex::new(r"(?i)(abc123|qwerty|asdfgh|zxcvbn)").unwrap(),
        // Known example keys from documentation
        Regex::new(r"(?i)sk-proj-abcdefghijklmnop").unwrap(),
        Regex::new(r"(?i)sk-ant-api03-xxxxxxxx").unwrap(),
        // Assignment to obvious dummy values
        Regex::new(r#"(?i)(api_key|secret|token)\s*[=:]\s*["'](xxx+|your_key|changeme)"#).unwrap(),
    ];

    /// Paths never worth scanning: vendored code, lockfiles, generated output.
    static ref SKIP_PATHS: Vec<Regex> = vec![
        Regex::new(r"(?i)node_modules").unwrap(),
        Regex::new(r"(?i)vendor").unwrap(),
        Regex::new(r"(?i)\.min\.(js|css)$").unwrap(),
        Regex::new(r"(?i)package-lock\.json$").unwrap(),
        Regex::new(r"(?i)yarn\.lock$").unwrap(),
        Regex::new(r"(?i)pnpm-lock\.yaml$").unwrap(),
        Regex::new(r"(?i)\.d\.ts$").unwrap(),
        Regex::new(r"(?i)dist/").unwrap(),
        Regex::new(r"(?i)build/").unwrap(),
        Regex::new(r"(?i)\.next/").unwrap(),
        Regex::new(r"(?i)__pycache__").unwrap(),
        Regex::new(r"(?i)\.git/").unwrap(),
    ];

    /// Extensions worth fetching when walking a repository tree.
    pub static ref SCAN_EXTENSIONS: HashSet<&'static str> = [
        ".js", ".ts", ".jsx", ".tsx", ".mjs", ".cjs",
        ".py", ".rb", ".go", ".java", ".kt", ".rs",
        ".env",
        ".yaml", ".yml", ".json", ".toml", ".ini", ".conf", ".cfg",
        ".sh", ".bash", ".zsh", ".fish",
        ".md", ".txt", ".example", ".sample",
    ]
    .into_iter()
    .collect();
}

/// True when the candidate looks like a placeholder rather than a secret.
pub fn is_banned(candidate: &str) -> bool {
    if heuristics::has_repeated_run(candidate, 6) {
        return true;
    }
    BANLIST.iter().any(|pattern| pattern.is_match(candidate))
}

pub fn is_skipped_path(path: &str) -> bool {
    SKIP_PATHS.iter().any(|pattern| pattern.is_match(path))
}

/// Extension allow-list check, with `.env` variants matched by name since
/// files like `.env.local` hide their marker mid-name.
pub fn is_scannable_file(name: &str) -> bool {
    let extension = name.rfind('.').map(|i| &name[i..]).unwrap_or("");
    SCAN_EXTENSIONS.contains(extension) || name.contains(".env")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_keys_are_banned() {
        assert!(is_banned("sk-test-example-placeholder"));
        assert!(is_banned("example_key"));
        assert!(is_banned("sk-proj-abcdefghijklmnopqrstuv"));
        assert!(is_banned("xai-qwerty12345678901234"));
    }

    #[test]
    fn repeated_runs_are_banned() {
        assert!(is_banned("sk-or-aaaaaaaaaaaaaaaaaaaa"));
    }

    #[test]
    fn plausible_keys_pass_the_banlist() {
        assert!(!is_banned("sk-proj-Ab3dEf6hIj9kLm2nOp5qRs8t"));
        assert!(!is_banned("gsk_Ab3dEf6hIj9kLm2nOp5qRs8tUv1wXy4z"));
    }

    #[test]
    fn vendored_and_generated_paths_are_skipped() {
        assert!(is_skipped_path("node_modules/pkg/index.js"));
        assert!(is_skipped_path("app/dist/bundle.js"));
        assert!(is_skipped_path("assets/app.min.js"));
        assert!(is_skipped_path("package-lock.json"));
        assert!(is_skipped_path("types/index.d.ts"));
        assert!(!is_skipped_path("src/config.py"));
    }

    #[test]
    fn extension_allow_list() {
        assert!(is_scannable_file("settings.py"));
        assert!(is_scannable_file("config.yaml"));
        assert!(is_scannable_file(".env.production"));
        assert!(is_scannable_file(".env.local"));
        assert!(is_scannable_file("docker.env"));
        assert!(!is_scannable_file("logo.png"));
        assert!(!is_scannable_file("binary.exe"));
        // Env-style suffixes only count behind the .env name marker
        assert!(!is_scannable_file("foo.local"));
        assert!(!is_scannable_file("settings.production"));
    }
}

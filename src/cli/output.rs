use colored::Colorize;

use crate::core::model::{Detection, OutcomeKind, ScanOutcome, StatusSnapshot};
use crate::detect::providers::PROFILES;

pub struct OutputFormatter;

impl OutputFormatter {
    /// Print the startup banner
    pub fn print_banner() {
        println!("{}", "=".repeat(70).bright_cyan());
        println!("{}", "  KeyScan - LLM API Key Leak Scanner".bright_cyan().bold());
        println!("{}", "=".repeat(70).bright_cyan());
        println!();
    }

    /// Print an ethical use warning
    pub fn print_ethical_warning() {
        println!("{}", "⚠️  ETHICAL USE ONLY ⚠️".yellow().bold());
        println!("This tool is for security research and responsible disclosure only.");
        println!("By using this tool, you agree to:");
        println!("  {} Use findings for research and awareness", "✓".green());
        println!("  {} Report leaked keys to their owners", "✓".green());
        println!("  {} Not use keys for unauthorized purposes", "✓".green());
        println!();
    }

    /// Print a single detection. Only the masked form ever reaches the
    /// terminal.
    pub fn print_detection(detection: &Detection, file_path: &str) {
        println!(
            "  {} Found {} key: {} in {} (line {}, confidence {})",
            "✓".green(),
            detection.provider.to_string().bright_yellow(),
            detection.key_masked.bright_cyan(),
            file_path.bright_white(),
            detection.line,
            detection.confidence
        );
    }

    /// Print the outcome of a repo scan
    pub fn print_outcome(outcome: &ScanOutcome) {
        let status = match outcome.error {
            None => "scanned".bright_green(),
            Some(OutcomeKind::AlreadyScanned) => "already scanned".bright_black(),
            Some(OutcomeKind::NoFiles) => "no scannable files".bright_black(),
            Some(OutcomeKind::RateLimited) => "rate limited".bright_red(),
            Some(OutcomeKind::FetchFailed) => "fetch failed".bright_red(),
        };
        println!(
            "  {}/{}: {} ({} files, {} findings, {}ms)",
            outcome.owner.bright_cyan(),
            outcome.repo.bright_cyan(),
            status,
            outcome.files_scanned,
            outcome.findings.len().to_string().bright_white(),
            outcome.duration_ms
        );
    }

    /// Print a status snapshot
    pub fn print_status(status: &StatusSnapshot) {
        println!();
        println!("{}", "  Scanner Status".bright_cyan().bold());
        println!(
            "    Running: {}",
            if status.running {
                "yes".bright_green()
            } else {
                "no".bright_red()
            }
        );
        println!("    Queue size: {}", status.queue_size.to_string().bright_white());
        println!(
            "    Repos/min: {}",
            status.repos_per_minute.to_string().bright_white()
        );
        println!(
            "    Total scanned: {}",
            status.total_scanned.to_string().bright_white()
        );
        println!(
            "    Total found: {}",
            status.total_found.to_string().bright_green()
        );
        println!(
            "    Credentials: {} total, {} available, {} rate limited",
            status.credentials.total.to_string().bright_white(),
            status.credentials.available.to_string().bright_green(),
            status.credentials.rate_limited.to_string().bright_red()
        );
        println!();
    }

    /// List the known provider profiles
    pub fn print_providers() {
        println!("{}", "  Known Providers".bright_cyan().bold());
        for profile in PROFILES.iter() {
            println!(
                "    {} ({}, min length {}, prefix {})",
                profile.display_name.bright_white().bold(),
                profile.provider.to_string().bright_cyan(),
                profile.min_length,
                profile.prefix.bright_yellow()
            );
        }
        println!();
    }

    /// Print error message
    pub fn print_error(message: &str) {
        eprintln!("{} {}", "❌".bright_red(), message.red());
    }

    /// Print warning message
    pub fn print_warning(message: &str) {
        println!("{} {}", "⚠️".bright_yellow(), message.yellow());
    }

    /// Print success message
    pub fn print_success(message: &str) {
        println!("{} {}", "✓".bright_green(), message.green());
    }

    /// Print info message
    pub fn print_info(message: &str) {
        println!("{} {}", "ℹ️".bright_blue(), message);
    }
}

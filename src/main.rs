use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use keyscan::cli::{Cli, Commands, OutputFormatter};
use keyscan::core::config::Config;
use keyscan::core::events::{Event, EventKind, StatusHub};
use keyscan::core::model::RepoId;
use keyscan::discovery::archive::ArchiveReplay;
use keyscan::discovery::poll::LivePoll;
use keyscan::github::fetcher::FileSource;
use keyscan::github::{GitHubClient, RepoFetcher, TokenPool};
use keyscan::scanner::Scanner;
use keyscan::store::{MemoryStore, Store};
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() {
    // Load .env file if it exists
    let _ = dotenv::dotenv();

    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_target(false)
        .init();

    OutputFormatter::print_banner();

    if let Err(e) = execute_command(cli.command).await {
        OutputFormatter::print_error(&format!("Error: {}", e));
        std::process::exit(1);
    }
}

async fn execute_command(command: Commands) -> keyscan::Result<()> {
    match command {
        Commands::Run { discovery, workers } => run_command(discovery, workers).await?,
        Commands::Scan { repo } => scan_command(repo).await?,
        Commands::Detect { path } => detect_command(path)?,
        Commands::Providers => OutputFormatter::print_providers(),
    }
    Ok(())
}

struct Core {
    client: Arc<GitHubClient>,
    scanner: Arc<Scanner>,
    hub: Arc<StatusHub>,
}

/// Wires store, credential pool, client, fetcher, and scanner together.
async fn build_core(config: &Config) -> keyscan::Result<Core> {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let pool = Arc::new(TokenPool::new(
        Arc::clone(&store),
        config.github.base_url.clone(),
        Duration::from_secs(config.github.request_timeout_secs),
    ));
    pool.initialize().await?;

    let status = pool.status();
    if status.total == 0 {
        return Err(keyscan::ScanError::NoCredentials);
    }
    info!("{} GitHub credential(s) loaded", status.total);

    let client = Arc::new(GitHubClient::new(Arc::clone(&pool), &config.github));
    let fetcher: Arc<dyn FileSource> = Arc::new(RepoFetcher::new(Arc::clone(&client)));
    let hub = Arc::new(StatusHub::new());
    let scanner = Scanner::new(
        config.scanner.clone(),
        store,
        fetcher,
        pool,
        Arc::clone(&hub),
    );

    Ok(Core { client, scanner, hub })
}

async fn run_command(discovery: String, workers: Option<usize>) -> keyscan::Result<()> {
    OutputFormatter::print_ethical_warning();

    let mut config = Config::load()?;
    if let Some(workers) = workers {
        config.scanner.workers = workers;
    }
    let core = build_core(&config).await?;
    core.scanner.start();

    // Findings printed as they land.
    let (_sub, mut findings) = core.hub.subscribe(EventKind::Finding);
    tokio::spawn(async move {
        while let Some(Event::Finding(outcome)) = findings.recv().await {
            OutputFormatter::print_outcome(&outcome);
            for detection in &outcome.findings {
                // Per-repo file paths are in the store; the event carries
                // the repo-level summary.
                OutputFormatter::print_detection(detection, &format!("{}/{}", outcome.owner, outcome.repo));
            }
        }
    });

    // Periodic status line.
    {
        let scanner = Arc::clone(&core.scanner);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(30));
            loop {
                ticker.tick().await;
                if !scanner.is_running() {
                    break;
                }
                OutputFormatter::print_status(&scanner.status());
            }
        });
    }

    let archive = matches!(discovery.as_str(), "archive" | "both");
    let live = matches!(discovery.as_str(), "live" | "both");
    if !archive && !live {
        return Err(keyscan::ScanError::Config(format!(
            "unknown discovery mode '{}' (expected archive, live, or both)",
            discovery
        )));
    }
    if archive {
        let replay = ArchiveReplay::new(Arc::clone(&core.scanner), config.discovery.clone());
        tokio::spawn(replay.run());
        OutputFormatter::print_info("Archive replay enabled");
    }
    if live {
        let poll = LivePoll::new(
            Arc::clone(&core.scanner),
            Arc::clone(&core.client),
            &config.discovery,
        );
        tokio::spawn(poll.run());
        OutputFormatter::print_info("Live events polling enabled");
    }

    OutputFormatter::print_success("Scanner running, press Ctrl+C to stop");
    tokio::signal::ctrl_c().await?;
    core.scanner.stop();
    OutputFormatter::print_status(&core.scanner.status());
    OutputFormatter::print_success("Stopped");
    Ok(())
}

/// One-shot scan of a single repository, bypassing the queue.
async fn scan_command(repo: String) -> keyscan::Result<()> {
    let id = RepoId::parse(&repo).ok_or_else(|| {
        keyscan::ScanError::Config(format!("'{}' is not an owner/name pair", repo))
    })?;

    let config = Config::load()?;
    let core = build_core(&config).await?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    spinner.set_message(format!("Fetching files from {}", id));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let fetcher = RepoFetcher::new(Arc::clone(&core.client));
    let files = fetcher
        .list_scannable_files(
            &id.owner,
            &id.name,
            config.scanner.max_files_per_repo,
            config.scanner.fetch_concurrency,
        )
        .await?;
    spinner.finish_and_clear();

    if files.is_empty() {
        OutputFormatter::print_warning("No scannable files found");
        return Ok(());
    }

    let mut total = 0;
    for file in &files {
        for detection in keyscan::detect::detect(&file.content, &file.path) {
            OutputFormatter::print_detection(&detection, &file.path);
            total += 1;
        }
    }

    println!();
    if total == 0 {
        OutputFormatter::print_success(&format!("{} files scanned, no keys found", files.len()));
    } else {
        println!(
            "  {} {} finding(s) across {} files",
            "⚠️".bright_yellow(),
            total.to_string().bright_red().bold(),
            files.len()
        );
    }
    Ok(())
}

/// Offline detection over a local file.
fn detect_command(path: String) -> keyscan::Result<()> {
    let content = fs::read_to_string(&path)?;
    let detections = keyscan::detect::detect(&content, &path);

    if detections.is_empty() {
        OutputFormatter::print_success("No keys found");
        return Ok(());
    }
    for detection in &detections {
        OutputFormatter::print_detection(detection, &path);
    }
    OutputFormatter::print_warning(&format!("{} finding(s)", detections.len()));
    Ok(())
}

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "keyscan")]
#[command(version, about = "Continuous scanner for leaked LLM provider API keys in public GitHub repos", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the continuous discovery-and-scan pipeline
    Run {
        /// Discovery feeds to enable (archive, live, both)
        #[arg(short, long, default_value = "both")]
        discovery: String,

        /// Number of scan workers (overrides config)
        #[arg(short, long)]
        workers: Option<usize>,
    },

    /// Scan a single repository and print the findings
    Scan {
        /// Repository as owner/name
        repo: String,
    },

    /// Run detection over a local file without touching the network
    Detect {
        /// Path to the file to scan
        path: String,
    },

    /// List the providers the detector knows about
    Providers,
}

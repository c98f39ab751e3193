use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "flo")]
#[command(about = "Flotilla - reconcile and health-check a single-host service fleet")]
#[command(version)]
pub struct Cli {
    /// Config directory (defaults to ~/.flo)
    #[arg(short, long)]
    pub config_dir: Option<PathBuf>,

    /// Suppress everything except errors
    #[arg(short, long)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Bring working trees up to date (clone, fast-forward, or skip)
    Sync {
        /// Services to sync (defaults to all)
        services: Vec<String>,
    },
    /// Probe every configured service and report health
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Start services via systemd
    Start {
        /// Services to start (defaults to all manageable services)
        services: Vec<String>,
    },
    /// Stop services via systemd
    Stop {
        /// Services to stop (defaults to all manageable services)
        services: Vec<String>,
    },
    /// Restart services via systemd
    Restart {
        /// Services to restart (defaults to all manageable services)
        services: Vec<String>,
    },
    /// Show service logs
    Logs {
        /// Service name
        service: String,
        /// Number of lines to show
        #[arg(short = 'n', long)]
        tail: Option<usize>,
    },
    /// List configured servers
    Servers,
    /// Inspect or repair the configuration documents
    #[command(subcommand)]
    Config(ConfigCommands),
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_name = "SHELL")]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Create missing documents and fill in missing fields from defaults
    Heal,
    /// Print the paths of the configuration documents
    Path,
    /// Print the documents themselves
    Show,
}

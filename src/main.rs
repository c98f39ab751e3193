mod cli;
mod commands;
mod output;

use clap::{CommandFactory, Parser};
use cli::{Cli, Commands};
use flotilla::{ControlAction, Error as FloError, Registry, Store};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        if let Some(flo_error) = e.downcast_ref::<FloError>() {
            eprintln!("Error: {}", flo_error);
            if let Some(suggestion) = flo_error.suggestion() {
                eprintln!("\nHint: {}", suggestion);
            }
        } else {
            eprintln!("Error: {:#}", e);
        }
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let out: &dyn output::UserOutput = if cli.quiet {
        &output::QuietOutput
    } else {
        &output::CliOutput
    };

    // ── Tier 1: Commands that need nothing at all ─────────────────────
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = Cli::command();
        let bin_name = cmd.get_name().to_string();
        clap_complete::generate(*shell, &mut cmd, bin_name, &mut std::io::stdout());
        return Ok(());
    }

    let registry = Registry::builtin();

    // ── Tier 2: Commands that need the registry but not the documents ─
    match &cli.command {
        Commands::Start { services } => {
            return commands::run_lifecycle(&registry, ControlAction::Start, services.clone(), out)
                .await;
        }
        Commands::Stop { services } => {
            return commands::run_lifecycle(&registry, ControlAction::Stop, services.clone(), out)
                .await;
        }
        Commands::Restart { services } => {
            return commands::run_lifecycle(
                &registry,
                ControlAction::Restart,
                services.clone(),
                out,
            )
            .await;
        }
        Commands::Logs { service, tail } => {
            return commands::run_logs(&registry, service, *tail, out).await;
        }
        _ => {} // fall through to document-loading path
    }

    // ── Tier 3: Commands that load (and heal) the documents ───────────
    let store = Store::open(cli.config_dir.clone())?;

    match cli.command {
        Commands::Sync { services } => {
            let (config, _) = store.load_healed(&registry)?;
            let cancel = CancellationToken::new();
            spawn_ctrl_c(cancel.clone());
            commands::run_sync(&registry, &config, services, cancel, out).await
        }
        Commands::Status { json } => {
            let (config, _) = store.load_healed(&registry)?;
            commands::run_status(&registry, &config, json, out).await
        }
        Commands::Servers => {
            let (config, _) = store.load_healed(&registry)?;
            commands::run_servers(&config.servers, out)
        }
        Commands::Config(config_cmd) => commands::run_config(&store, &registry, config_cmd, out),
        // Handled in earlier tiers
        Commands::Start { .. }
        | Commands::Stop { .. }
        | Commands::Restart { .. }
        | Commands::Logs { .. }
        | Commands::Completions { .. } => {
            unreachable!("handled in earlier dispatch tiers");
        }
    }
}

/// Flips the token on the first interrupt so a sync pass stops cleanly
/// between services instead of dying mid-clone.
fn spawn_ctrl_c(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, finishing current service");
            cancel.cancel();
        }
    });
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

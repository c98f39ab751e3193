use crate::output::UserOutput;
use flotilla::{FleetConfig, GitCli, Registry, SyncOutcome, Synchronizer, Systemctl};
use tokio_util::sync::CancellationToken;

pub async fn run_sync(
    registry: &Registry,
    config: &FleetConfig,
    services: Vec<String>,
    cancel: CancellationToken,
    out: &dyn UserOutput,
) -> anyhow::Result<()> {
    // Reject unknown names up front instead of silently syncing nothing.
    for name in &services {
        let known = registry.find(name).is_some() || config.services.find(name).is_some();
        if !known {
            return Err(flotilla::Error::UnknownService(name.clone()).into());
        }
    }

    let git = GitCli::new();
    let units = Systemctl::new();
    let sync =
        Synchronizer::new(&git, &units, registry, &config.options).with_cancellation(cancel);
    let report = sync.run(&config.services, &services).await;

    out.status("Sync Report:");
    out.status(&format!("{:-<64}", ""));
    for row in &report.rows {
        let icon = match row.outcome {
            SyncOutcome::Cloned | SyncOutcome::Updated | SyncOutcome::UpToDate => "+",
            SyncOutcome::Skipped => "o",
            SyncOutcome::Error => "x",
        };
        out.status(&format!(
            "  {} {:<14} {:<12} {}",
            icon, row.service_id, row.outcome, row.reason
        ));
    }
    out.blank();

    match report.as_result() {
        Ok(()) => {
            out.success(&report.summary());
            Ok(())
        }
        Err(e) => {
            out.error(&report.summary());
            Err(e.into())
        }
    }
}

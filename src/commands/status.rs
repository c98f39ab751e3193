use crate::output::UserOutput;
use flotilla::probe;
use flotilla::{FleetConfig, HealthRow, HealthStatus, Registry};

pub async fn run_status(
    registry: &Registry,
    config: &FleetConfig,
    json: bool,
    out: &dyn UserOutput,
) -> anyhow::Result<()> {
    // One service at a time, in category order, so the report is stable.
    let mut rows: Vec<HealthRow> = Vec::with_capacity(config.services.len());
    for (kind, entry) in config.services.iter_ordered() {
        rows.push(probe::check(registry, &config.options, kind, entry).await);
    }

    if json {
        out.status(&serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    out.status("Service Health:");
    out.status(&format!("{:-<78}", ""));

    if rows.is_empty() {
        out.status("  No services configured");
        return Ok(());
    }

    for row in &rows {
        let icon = match row.status {
            HealthStatus::Ok => "+",
            HealthStatus::Bad => "x",
            HealthStatus::NotApplicable => "o",
        };
        let uptime = row
            .uptime_secs
            .map(format_uptime)
            .unwrap_or_else(|| "-".to_string());
        out.status(&format!(
            "  {} {:<14} {:<5} {:<24} {:<20} {}",
            icon, row.service_id, row.status, row.address, row.version, uptime
        ));
        if let Some(reason) = &row.reason {
            out.status(&format!("      {}", reason));
        }
    }
    Ok(())
}

fn format_uptime(secs: u64) -> String {
    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3_600;
    let minutes = (secs % 3_600) / 60;
    if days > 0 {
        format!("{}d {}h", days, hours)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uptime_renders_largest_two_units() {
        assert_eq!(format_uptime(30), "0m");
        assert_eq!(format_uptime(150), "2m");
        assert_eq!(format_uptime(3_900), "1h 5m");
        assert_eq!(format_uptime(200_000), "2d 7h");
    }
}

use crate::output::UserOutput;
use flotilla::store::expand_home;
use flotilla::{Error, Registry};

const DEFAULT_TAIL: usize = 50;

pub async fn run_logs(
    registry: &Registry,
    service: &str,
    tail: Option<usize>,
    out: &dyn UserOutput,
) -> anyhow::Result<()> {
    let def = registry
        .find(service)
        .ok_or_else(|| Error::UnknownService(service.to_string()))?;

    let path = expand_home(def.log_path);
    if !path.exists() {
        return Err(Error::NotFound(format!("log file {}", path.display())).into());
    }

    let contents = tokio::fs::read_to_string(&path).await?;
    let lines: Vec<&str> = contents.lines().collect();
    let tail = tail.unwrap_or(DEFAULT_TAIL);
    let start = lines.len().saturating_sub(tail);

    out.status(&format!("Logs for {}:", def.short_name));
    out.status(&format!("{:-<50}", ""));
    if lines.is_empty() {
        out.status("  (empty)");
        return Ok(());
    }
    for line in &lines[start..] {
        out.status(line);
    }
    Ok(())
}

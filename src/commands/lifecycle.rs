use crate::output::UserOutput;
use flotilla::{control, ControlAction, Registry, ServiceDefinition, Systemctl};

pub async fn run_lifecycle(
    registry: &Registry,
    action: ControlAction,
    services: Vec<String>,
    out: &dyn UserOutput,
) -> anyhow::Result<()> {
    let mut targets: Vec<&ServiceDefinition> = Vec::new();
    if services.is_empty() {
        targets.extend(registry.manageable());
    } else {
        for name in &services {
            match registry.find(name) {
                Some(def) if def.is_manageable() => targets.push(def),
                Some(def) => out.warning(&format!(
                    "  o {:<14} not under lifecycle control, skipping",
                    def.short_name
                )),
                None => return Err(flotilla::Error::UnknownService(name.clone()).into()),
            }
        }
    }

    if targets.is_empty() {
        out.warning("Nothing to do: no manageable services selected");
        return Ok(());
    }

    out.status(&format!(
        "Running {} on {} unit(s)...",
        action,
        targets.len()
    ));
    let systemctl = Systemctl::new();
    let outcomes = control::apply(&systemctl, action, &targets).await;

    // Every unit gets its line before failures are summarized.
    for outcome in &outcomes {
        match &outcome.error {
            None => out.status(&format!(
                "  + {:<14} {} ({})",
                outcome.service_id,
                outcome.action.past_tense(),
                outcome.unit
            )),
            Some(error) => out.error(&format!(
                "  x {:<14} {}: {}",
                outcome.service_id, outcome.unit, error
            )),
        }
    }
    out.blank();

    let result = control::aggregate(&outcomes);
    if result.is_ok() {
        out.success(&format!(
            "{} unit(s) {}",
            outcomes.len(),
            action.past_tense()
        ));
    }
    result.map_err(Into::into)
}

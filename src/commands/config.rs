use crate::cli::ConfigCommands;
use crate::output::UserOutput;
use flotilla::{Registry, Store};

pub fn run_config(
    store: &Store,
    registry: &Registry,
    command: ConfigCommands,
    out: &dyn UserOutput,
) -> anyhow::Result<()> {
    match command {
        ConfigCommands::Heal => {
            let (_, report) = store.load_healed(registry)?;
            out.status("Healing configuration documents:");
            for (file, outcome) in &report.entries {
                out.status(&format!("  {:<16} {}", file, outcome.as_str()));
            }
            out.blank();
            if report.changed() == 0 {
                out.success("Nothing to heal");
            } else {
                out.success(&format!("{} document(s) updated", report.changed()));
            }
        }
        ConfigCommands::Path => {
            out.status(&store.services_path().display().to_string());
            out.status(&store.options_path().display().to_string());
            out.status(&store.servers_path().display().to_string());
        }
        ConfigCommands::Show => {
            let (config, _) = store.load_healed(registry)?;
            out.status(&format!("# {}", store.services_path().display()));
            out.status(&serde_json::to_string_pretty(&config.services)?);
            out.blank();
            out.status(&format!("# {}", store.options_path().display()));
            out.status(&serde_json::to_string_pretty(&config.options)?);
            out.blank();
            out.status(&format!("# {}", store.servers_path().display()));
            out.status(&serde_json::to_string_pretty(&config.servers)?);
        }
    }
    Ok(())
}

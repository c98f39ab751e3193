use crate::output::UserOutput;
use flotilla::ServerMap;

pub fn run_servers(servers: &ServerMap, out: &dyn UserOutput) -> anyhow::Result<()> {
    out.status("Configured Servers:");
    out.status(&format!("{:-<50}", ""));

    if servers.servers.is_empty() {
        out.status("  No servers configured");
        return Ok(());
    }

    for (name, server) in &servers.servers {
        let target = if server.user.is_empty() {
            server.host.clone()
        } else {
            format!("{}@{}", server.user, server.host)
        };
        out.status(&format!("  {:<12} {}", name, target));
        if !server.identity_file.is_empty() {
            out.status(&format!("      key: {}", server.identity_file));
        }
    }
    Ok(())
}

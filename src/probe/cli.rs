//! CLI tool probe.
//!
//! A tool proves it is alive by answering `--version`. Two output shapes
//! are recognized: the build stamp of eight dotted fields, rendered as
//! `major.minor.patch (hash)`, and branded output carrying a trademark
//! marker, rendered as the text before the marker. Anything else leaves
//! the version column at N/A while the tool still counts as healthy.

use super::{HealthRow, HealthStatus, PROBE_TIMEOUT};
use crate::registry::Registry;
use crate::store::ServiceEntry;
use tokio::process::Command;
use tokio::time::timeout;

/// Dotted fields in a full build stamp.
const VERSION_FIELDS: usize = 8;
/// Zero-based position of the build hash inside the stamp.
const HASH_FIELD: usize = 6;
const TRADEMARK: char = '™';

/// Parses known `--version` output shapes.
fn extract_version(raw: &str) -> Option<String> {
    let trimmed = raw.trim();

    let fields: Vec<&str> = trimmed.split('.').collect();
    if fields.len() == VERSION_FIELDS
        && fields[..3]
            .iter()
            .all(|f| !f.is_empty() && f.bytes().all(|b| b.is_ascii_digit()))
    {
        return Some(format!(
            "{}.{}.{} ({})",
            fields[0], fields[1], fields[2], fields[HASH_FIELD]
        ));
    }

    if let Some(idx) = trimmed.find(TRADEMARK) {
        let head = trimmed[..idx].trim();
        if !head.is_empty() {
            return Some(head.to_string());
        }
    }

    None
}

pub(super) async fn check(registry: &Registry, entry: &ServiceEntry) -> HealthRow {
    // The invocable name comes from the registry; an entry nobody ever
    // declared builtin has nothing we could run.
    let Some(def) = registry.by_id(&entry.id) else {
        return HealthRow::not_applicable(&entry.id);
    };
    let command = def.short_name;
    let address = command.to_string();

    let output = match timeout(
        PROBE_TIMEOUT,
        Command::new(command).arg("--version").output(),
    )
    .await
    {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            return HealthRow::bad(&entry.id, address, format!("failed to run: {}", e))
        }
        Err(_) => {
            return HealthRow::bad(&entry.id, address, "version check timed out".to_string())
        }
    };

    if !output.status.success() {
        return HealthRow::bad(
            &entry.id,
            address,
            format!("exit status {}", output.status.code().unwrap_or(-1)),
        );
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let mut row = HealthRow::new(&entry.id, address, HealthStatus::Ok);
    if let Some(version) = extract_version(&stdout) {
        row.version = version;
    }
    row
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_build_stamp_renders_semver_with_hash() {
        let raw = "2.14.0.8812.release.linux.9f3ac1d.0\n";
        assert_eq!(extract_version(raw), Some("2.14.0 (9f3ac1d)".to_string()));
    }

    #[test]
    fn stamp_with_wrong_field_count_is_rejected() {
        assert_eq!(extract_version("2.14.0.8812"), None);
        assert_eq!(extract_version("1.2.3.4.5.6.7.8.9"), None);
    }

    #[test]
    fn stamp_with_non_numeric_semver_fields_is_rejected() {
        assert_eq!(extract_version("a.b.c.8812.release.linux.9f3ac1d.0"), None);
    }

    #[test]
    fn trademark_output_keeps_text_before_marker() {
        assert_eq!(
            extract_version("Runner™ build 5, all rights reserved"),
            Some("Runner".to_string())
        );
    }

    #[test]
    fn unrecognized_output_yields_none() {
        assert_eq!(extract_version("runner version 1.2.3"), None);
        assert_eq!(extract_version(""), None);
    }
}

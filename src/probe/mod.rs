//! Multi-protocol health probes.
//!
//! `flo status` asks every configured service how it is doing. Different
//! kinds speak different protocols, so [`check`] dispatches on the declared
//! kind: HTTP JSON for resident services, the cache wire protocol for
//! infrastructure, `--version` for CLI tools. Probes never return errors;
//! whatever happens is folded into a [`HealthRow`], so one unreachable
//! service can never hide its siblings from the report.

mod cache;
mod cli;
mod http;

pub use cache::ping;
pub(crate) use cache::ping_configured;

use crate::registry::{Registry, ServiceKind};
use crate::store::{Options, ServiceEntry};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Upper bound on any single network or process probe.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Placeholder for fields a probe could not determine.
pub const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HealthStatus {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "BAD")]
    Bad,
    /// The service declares no reachable endpoint. Not a failure.
    #[serde(rename = "N/A")]
    NotApplicable,
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HealthStatus::Ok => "OK",
            HealthStatus::Bad => "BAD",
            HealthStatus::NotApplicable => "N/A",
        })
    }
}

/// One service's probe result.
#[derive(Debug, Clone, Serialize)]
pub struct HealthRow {
    pub service_id: String,
    pub address: String,
    pub version: String,
    pub status: HealthStatus,
    /// Failure context, present on BAD rows.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uptime_secs: Option<u64>,
    /// Protocol-specific extras reported by the service itself.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<serde_json::Map<String, serde_json::Value>>,
    pub checked_at: DateTime<Utc>,
}

impl HealthRow {
    fn new(service_id: &str, address: String, status: HealthStatus) -> Self {
        HealthRow {
            service_id: service_id.to_string(),
            address,
            version: NOT_AVAILABLE.to_string(),
            status,
            reason: None,
            uptime_secs: None,
            metrics: None,
            checked_at: Utc::now(),
        }
    }

    /// Row for a service with nothing to probe.
    fn not_applicable(service_id: &str) -> Self {
        HealthRow::new(
            service_id,
            NOT_AVAILABLE.to_string(),
            HealthStatus::NotApplicable,
        )
    }

    fn bad(service_id: &str, address: String, reason: String) -> Self {
        let mut row = HealthRow::new(service_id, address, HealthStatus::Bad);
        row.reason = Some(reason);
        row
    }
}

/// Probes one service, choosing the protocol by its declared kind.
///
/// Never fails: transport errors, protocol violations and timeouts all
/// become BAD rows.
pub async fn check(
    registry: &Registry,
    options: &Options,
    kind: ServiceKind,
    entry: &ServiceEntry,
) -> HealthRow {
    match kind {
        ServiceKind::Cli => cli::check(registry, entry).await,
        ServiceKind::Os => cache::check(options, entry).await,
        _ => http::check(entry).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_applicable_row_has_na_everywhere() {
        let row = HealthRow::not_applicable("svc-runner");
        assert_eq!(row.status, HealthStatus::NotApplicable);
        assert_eq!(row.address, NOT_AVAILABLE);
        assert_eq!(row.version, NOT_AVAILABLE);
        assert!(row.reason.is_none());
    }

    #[test]
    fn status_serializes_to_report_tags() {
        assert_eq!(serde_json::to_string(&HealthStatus::Ok).unwrap(), "\"OK\"");
        assert_eq!(
            serde_json::to_string(&HealthStatus::NotApplicable).unwrap(),
            "\"N/A\""
        );
    }

    #[test]
    fn serialized_row_omits_absent_optionals() {
        let row = HealthRow::new("svc-hub", "localhost:4000".to_string(), HealthStatus::Ok);
        let json = serde_json::to_string(&row).unwrap();
        assert!(!json.contains("reason"));
        assert!(!json.contains("uptime_secs"));
        assert!(!json.contains("metrics"));
        assert!(json.contains("checked_at"));
    }
}

//! HTTP JSON probe.
//!
//! Resident services expose `GET /status` returning a small JSON body. The
//! endpoint as configured may omit the scheme; `http://` is assumed then.
//! A 2xx answer that does not speak the JSON contract still counts as OK,
//! reachability being the one thing every HTTP service can prove.

use super::{HealthRow, HealthStatus, PROBE_TIMEOUT};
use crate::store::ServiceEntry;
use reqwest::Client;
use serde::Deserialize;
use std::sync::OnceLock;
use url::Url;

static SHARED_CLIENT: OnceLock<Client> = OnceLock::new();

fn shared_client() -> &'static Client {
    SHARED_CLIENT.get_or_init(|| {
        Client::builder()
            .timeout(PROBE_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new())
    })
}

/// Body of a conforming `/status` response. Unknown fields are ignored,
/// missing ones fall back to their defaults.
#[derive(Debug, Deserialize)]
struct StatusPayload {
    #[serde(default)]
    version: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    uptime: Option<f64>,
    #[serde(default)]
    metrics: Option<serde_json::Map<String, serde_json::Value>>,
}

/// Prefixes `http://` when no scheme is given and appends the status path.
fn status_url(endpoint: &str) -> Result<Url, url::ParseError> {
    let base = if endpoint.contains("://") {
        endpoint.to_string()
    } else {
        format!("http://{}", endpoint)
    };
    Url::parse(&format!("{}/status", base.trim_end_matches('/')))
}

fn describe_failure(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "request timed out".to_string()
    } else if e.is_connect() {
        "connection refused or unreachable".to_string()
    } else {
        e.to_string()
    }
}

pub(super) async fn check(entry: &ServiceEntry) -> HealthRow {
    if entry.http.is_empty() {
        return HealthRow::not_applicable(&entry.id);
    }
    let address = entry.http.clone();

    let url = match status_url(&entry.http) {
        Ok(url) => url,
        Err(e) => return HealthRow::bad(&entry.id, address, format!("invalid endpoint: {}", e)),
    };

    tracing::debug!("probing {}", url);
    let response = match shared_client().get(url).send().await {
        Ok(response) => response,
        Err(e) => return HealthRow::bad(&entry.id, address, describe_failure(&e)),
    };

    let http_status = response.status();
    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => {
            return HealthRow::bad(&entry.id, address, format!("failed reading body: {}", e))
        }
    };

    match serde_json::from_str::<StatusPayload>(&body) {
        Ok(payload) => {
            let healthy = if payload.status.is_empty() {
                http_status.is_success()
            } else {
                payload.status.eq_ignore_ascii_case("ok")
                    || payload.status.eq_ignore_ascii_case("healthy")
            };
            let mut row = HealthRow::new(
                &entry.id,
                address,
                if healthy {
                    HealthStatus::Ok
                } else {
                    HealthStatus::Bad
                },
            );
            if !payload.version.is_empty() {
                row.version = payload.version;
            }
            row.uptime_secs = payload.uptime.map(|u| u.max(0.0) as u64);
            row.metrics = payload.metrics;
            if !healthy {
                row.reason = Some(if payload.status.is_empty() {
                    format!("HTTP {}", http_status)
                } else {
                    format!("service reports '{}'", payload.status)
                });
            }
            row
        }
        // Reachable but not speaking the contract. A 2xx is still a live
        // service; anything else is a failure.
        Err(_) if http_status.is_success() => {
            HealthRow::new(&entry.id, address, HealthStatus::Ok)
        }
        Err(_) => HealthRow::bad(
            &entry.id,
            address,
            format!("HTTP {} with unparsable body", http_status),
        ),
    }
}

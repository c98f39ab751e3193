//! Probe behavior against scripted local listeners.
//!
//! Each protocol is exercised end to end over a real socket: a hand-rolled
//! HTTP responder for the JSON contract, a scripted cache server that
//! records every command it receives, and the registry dispatch for CLI
//! tools. Probes must fold every failure into a row; none of these tests
//! expects an `Err`.

use flotilla::probe::{self, HealthStatus, NOT_AVAILABLE};
use flotilla::store::Credentials;
use flotilla::{Options, Registry, ServiceEntry, ServiceKind};
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Serves one canned HTTP response per connection.
async fn spawn_http(status_line: &'static str, body: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("Failed to read local addr");
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            loop {
                match socket.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        request.extend_from_slice(&buf[..n]);
                        if request.windows(4).any(|w| w == b"\r\n\r\n") {
                            break;
                        }
                    }
                }
            }
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            let _ = socket.write_all(response.as_bytes()).await;
        }
    });
    addr
}

/// Scripted cache server: answers each received command with the next
/// canned reply and hands back everything it received once the client
/// hangs up.
async fn spawn_cache(replies: Vec<&'static str>) -> (SocketAddr, oneshot::Receiver<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("Failed to read local addr");
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        let Ok((mut socket, _)) = listener.accept().await else {
            return;
        };
        let mut received = Vec::new();
        let mut replies = replies.into_iter();
        let mut buf = [0u8; 256];
        loop {
            match socket.read(&mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    received.push(String::from_utf8_lossy(&buf[..n]).trim().to_string());
                    match replies.next() {
                        Some(reply) => {
                            if socket.write_all(reply.as_bytes()).await.is_err() {
                                break;
                            }
                        }
                        None => break,
                    }
                }
            }
        }
        let _ = tx.send(received);
    });
    (addr, rx)
}

fn http_entry(addr: SocketAddr) -> ServiceEntry {
    ServiceEntry {
        id: "svc-hub".to_string(),
        http: addr.to_string(),
        ..ServiceEntry::default()
    }
}

fn cache_entry(addr: SocketAddr, password: Option<&str>) -> ServiceEntry {
    ServiceEntry {
        id: "svc-cache".to_string(),
        socket: addr.to_string(),
        credentials: password.map(|p| Credentials {
            password: p.to_string(),
            db: 0,
        }),
        ..ServiceEntry::default()
    }
}

async fn check(kind: ServiceKind, entry: &ServiceEntry) -> probe::HealthRow {
    let registry = Registry::builtin();
    let options = Options::default();
    probe::check(&registry, &options, kind, entry).await
}

/// An address nothing listens on: bind, read it, drop the listener.
async fn dead_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    listener.local_addr().expect("Failed to read local addr")
}

#[tokio::test]
async fn test_http_probe_lifts_the_status_contract() {
    let addr = spawn_http(
        "200 OK",
        r#"{"service":"hub","version":"2.4.1","status":"ok","uptime":5400.5,"metrics":{"connections":12}}"#,
    )
    .await;

    let row = check(ServiceKind::Cs, &http_entry(addr)).await;

    assert_eq!(row.status, HealthStatus::Ok);
    assert_eq!(row.version, "2.4.1");
    assert_eq!(row.uptime_secs, Some(5400));
    assert_eq!(row.address, addr.to_string());
    let metrics = row.metrics.expect("metrics");
    assert_eq!(metrics["connections"], serde_json::json!(12));
    assert!(row.reason.is_none());
}

#[tokio::test]
async fn test_http_probe_reports_degraded_payloads_as_bad() {
    let addr = spawn_http("200 OK", r#"{"version":"2.4.1","status":"degraded"}"#).await;

    let row = check(ServiceKind::Be, &http_entry(addr)).await;

    assert_eq!(row.status, HealthStatus::Bad);
    // Fields the service did report are still lifted.
    assert_eq!(row.version, "2.4.1");
    assert_eq!(row.reason.as_deref(), Some("service reports 'degraded'"));
}

#[tokio::test]
async fn test_http_probe_accepts_a_plain_200() {
    let addr = spawn_http("200 OK", "pong").await;

    let row = check(ServiceKind::Fe, &http_entry(addr)).await;

    assert_eq!(row.status, HealthStatus::Ok);
    assert_eq!(row.version, NOT_AVAILABLE);
    assert!(row.uptime_secs.is_none());
}

#[tokio::test]
async fn test_http_probe_unparsable_error_body_is_bad() {
    let addr = spawn_http("500 Internal Server Error", "boom").await;

    let row = check(ServiceKind::Cs, &http_entry(addr)).await;

    assert_eq!(row.status, HealthStatus::Bad);
    assert!(row.reason.expect("reason").contains("HTTP 500"));
}

#[tokio::test]
async fn test_http_probe_unreachable_endpoint_is_bad_not_an_error() {
    let addr = dead_addr().await;

    let row = check(ServiceKind::Th, &http_entry(addr)).await;

    assert_eq!(row.status, HealthStatus::Bad);
    assert!(row.reason.is_some());
}

#[tokio::test]
async fn test_entry_without_http_endpoint_is_not_applicable() {
    let entry = ServiceEntry {
        id: "svc-hub".to_string(),
        ..ServiceEntry::default()
    };

    let row = check(ServiceKind::Cs, &entry).await;

    assert_eq!(row.status, HealthStatus::NotApplicable);
    assert_eq!(row.address, NOT_AVAILABLE);
}

#[tokio::test]
async fn test_cache_probe_pings_without_credentials() {
    let (addr, received) = spawn_cache(vec!["+PONG\r\n"]).await;

    let row = check(ServiceKind::Os, &cache_entry(addr, None)).await;

    assert_eq!(row.status, HealthStatus::Ok);
    let commands = received.await.expect("server finished");
    assert_eq!(commands, vec!["PING"]);
}

#[tokio::test]
async fn test_cache_probe_authenticates_before_pinging() {
    let (addr, received) = spawn_cache(vec!["+OK\r\n", "+PONG\r\n"]).await;

    let row = check(ServiceKind::Os, &cache_entry(addr, Some("secret"))).await;

    assert_eq!(row.status, HealthStatus::Ok);
    let commands = received.await.expect("server finished");
    assert_eq!(commands, vec!["AUTH secret", "PING"]);
}

#[tokio::test]
async fn test_cache_probe_rejected_auth_short_circuits() {
    let (addr, received) = spawn_cache(vec!["-ERR invalid password\r\n"]).await;

    let row = check(ServiceKind::Os, &cache_entry(addr, Some("wrong"))).await;

    assert_eq!(row.status, HealthStatus::Bad);
    let reason = row.reason.expect("reason");
    assert!(reason.starts_with("Auth failed"), "reason was: {reason}");

    // No PING ever crossed the refused connection.
    let commands = received.await.expect("server finished");
    assert_eq!(commands, vec!["AUTH wrong"]);
}

#[tokio::test]
async fn test_cache_probe_unexpected_ping_reply_is_bad() {
    let (addr, _received) = spawn_cache(vec!["-ERR loading dataset\r\n"]).await;

    let row = check(ServiceKind::Os, &cache_entry(addr, None)).await;

    assert_eq!(row.status, HealthStatus::Bad);
    assert!(row
        .reason
        .expect("reason")
        .contains("unexpected PING reply"));
}

#[tokio::test]
async fn test_cache_probe_connection_refused_is_bad() {
    let addr = dead_addr().await;

    let row = check(ServiceKind::Os, &cache_entry(addr, None)).await;

    assert_eq!(row.status, HealthStatus::Bad);
    assert!(row.reason.expect("reason").contains("connection"));
}

#[tokio::test]
async fn test_cache_entry_without_socket_is_not_applicable() {
    let entry = ServiceEntry {
        id: "svc-cache".to_string(),
        ..ServiceEntry::default()
    };

    let row = check(ServiceKind::Os, &entry).await;

    assert_eq!(row.status, HealthStatus::NotApplicable);
}

#[tokio::test]
async fn test_cli_tool_missing_binary_is_bad() {
    // svc-runner resolves to the `runner` command, which does not exist
    // in the test environment.
    let entry = ServiceEntry {
        id: "svc-runner".to_string(),
        ..ServiceEntry::default()
    };

    let row = check(ServiceKind::Cli, &entry).await;

    assert_eq!(row.status, HealthStatus::Bad);
    assert_eq!(row.address, "runner");
    assert!(row.reason.expect("reason").contains("failed to run"));
}

#[tokio::test]
async fn test_cli_entry_unknown_to_the_registry_is_not_applicable() {
    let entry = ServiceEntry {
        id: "svc-mystery".to_string(),
        ..ServiceEntry::default()
    };

    let row = check(ServiceKind::Cli, &entry).await;

    assert_eq!(row.status, HealthStatus::NotApplicable);
}

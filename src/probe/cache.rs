//! Cache probe, speaking the inline-command subset of the cache protocol.
//!
//! One short-lived connection per probe: `AUTH <password>` when credentials
//! are configured, then `PING`. Each command is a single CRLF-terminated
//! line answered by a single `+`-prefixed line. A failed AUTH
//! short-circuits; no command is ever sent over a connection that refused
//! authentication.

use super::{HealthRow, HealthStatus, PROBE_TIMEOUT};
use crate::error::{Error, Result};
use crate::store::{Options, ServiceEntry};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Sends one command line and returns the reply chunk.
async fn roundtrip(stream: &mut TcpStream, line: &str, limit: Duration) -> Result<String> {
    timeout(limit, stream.write_all(line.as_bytes()))
        .await
        .map_err(|_| Error::Transport("write timed out".to_string()))?
        .map_err(|e| Error::Transport(format!("write failed: {}", e)))?;

    let mut buf = [0u8; 256];
    let read = timeout(limit, stream.read(&mut buf))
        .await
        .map_err(|_| Error::Transport("read timed out".to_string()))?
        .map_err(|e| Error::Transport(format!("read failed: {}", e)))?;
    if read == 0 {
        return Err(Error::Protocol(
            "connection closed before reply".to_string(),
        ));
    }
    Ok(String::from_utf8_lossy(&buf[..read]).into_owned())
}

/// Connects, authenticates when a password is given, and pings.
pub async fn ping(addr: &str, password: Option<&str>, limit: Duration) -> Result<()> {
    let mut stream = timeout(limit, TcpStream::connect(addr))
        .await
        .map_err(|_| Error::Transport(format!("connection to {} timed out", addr)))?
        .map_err(|e| Error::Transport(format!("connection to {} failed: {}", addr, e)))?;

    if let Some(password) = password {
        let reply = roundtrip(&mut stream, &format!("AUTH {}\r\n", password), limit).await?;
        if !reply.starts_with("+OK") {
            return Err(Error::Protocol(format!("Auth failed: {}", reply.trim())));
        }
    }

    let reply = roundtrip(&mut stream, "PING\r\n", limit).await?;
    if !reply.starts_with("+PONG") {
        return Err(Error::Protocol(format!(
            "unexpected PING reply: {}",
            reply.trim()
        )));
    }
    Ok(())
}

/// Pings using whatever credentials are configured for this entry.
pub(crate) async fn ping_configured(
    options: &Options,
    entry: &ServiceEntry,
    limit: Duration,
) -> Result<()> {
    ping(&entry.socket, configured_password(options, entry), limit).await
}

/// Entry credentials win; the shared cache credentials from options are the
/// fallback. Empty passwords mean "no AUTH".
fn configured_password<'a>(options: &'a Options, entry: &'a ServiceEntry) -> Option<&'a str> {
    entry
        .credentials
        .as_ref()
        .map(|c| c.password.as_str())
        .filter(|p| !p.is_empty())
        .or_else(|| Some(options.cache.password.as_str()).filter(|p| !p.is_empty()))
}

pub(super) async fn check(options: &Options, entry: &ServiceEntry) -> HealthRow {
    if entry.socket.is_empty() {
        return HealthRow::not_applicable(&entry.id);
    }
    let address = entry.socket.clone();
    match ping(
        &entry.socket,
        configured_password(options, entry),
        PROBE_TIMEOUT,
    )
    .await
    {
        Ok(()) => HealthRow::new(&entry.id, address, HealthStatus::Ok),
        Err(e) => {
            let reason = match &e {
                Error::Transport(m) | Error::Protocol(m) => m.clone(),
                other => other.to_string(),
            };
            HealthRow::bad(&entry.id, address, reason)
        }
    }
}

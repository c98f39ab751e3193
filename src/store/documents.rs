//! The three JSON documents kept under the config directory.

use crate::registry::{Registry, ServiceKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Credentials for probes that authenticate before speaking their protocol.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub db: u32,
}

/// One configured service instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceEntry {
    /// Stable identifier, matching the registry where the service is builtin.
    pub id: String,
    /// Upstream git remote. Empty means there is nothing to sync.
    #[serde(default)]
    pub repo: String,
    /// Working tree location, `~`-relative or absolute.
    #[serde(default)]
    pub source: String,
    /// HTTP endpoint probed by `flo status`. Scheme is optional.
    #[serde(default)]
    pub http: String,
    /// Raw TCP endpoint for socket-protocol probes.
    #[serde(default)]
    pub socket: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Credentials>,
}

/// `services.json`: every service this host knows about, grouped by kind.
///
/// The map is a `BTreeMap` keyed by [`ServiceKind`], so iteration (and the
/// serialized document) always follows category order. Within a category,
/// entries keep their declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceMap {
    #[serde(default)]
    pub services: BTreeMap<ServiceKind, Vec<ServiceEntry>>,
}

impl ServiceMap {
    /// The document a fresh host starts from, derived from the registry.
    pub fn defaults(registry: &Registry) -> Self {
        let mut services: BTreeMap<ServiceKind, Vec<ServiceEntry>> = BTreeMap::new();
        for def in registry.all() {
            let entry = ServiceEntry {
                id: def.id.to_string(),
                repo: def.repo_url.unwrap_or_default().to_string(),
                source: def.source_path.to_string(),
                http: if def.kind != ServiceKind::Os && def.port != 0 {
                    format!("localhost:{}", def.port)
                } else {
                    String::new()
                },
                socket: if def.kind == ServiceKind::Os {
                    format!("127.0.0.1:{}", def.port)
                } else {
                    String::new()
                },
                credentials: None,
            };
            services.entry(def.kind).or_default().push(entry);
        }
        ServiceMap { services }
    }

    /// Iterates all entries in category order, then declaration order.
    pub fn iter_ordered(&self) -> impl Iterator<Item = (ServiceKind, &ServiceEntry)> {
        self.services
            .iter()
            .flat_map(|(kind, entries)| entries.iter().map(move |e| (*kind, e)))
    }

    pub fn find(&self, id: &str) -> Option<(ServiceKind, &ServiceEntry)> {
        self.iter_ordered().find(|(_, e)| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.services.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// `options.json`: operator preferences plus per-service free-form settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Options {
    #[serde(default)]
    pub editor: String,
    #[serde(default)]
    pub theme: String,
    /// Credentials the cache probe falls back to when the service entry
    /// carries none of its own.
    #[serde(default)]
    pub cache: Credentials,
    /// Free-form per-service settings, keyed by service id.
    #[serde(default)]
    pub services: BTreeMap<String, BTreeMap<String, Value>>,
}

impl Options {
    pub fn defaults(registry: &Registry) -> Self {
        let mut services = BTreeMap::new();
        for def in registry.all() {
            let mut settings = BTreeMap::new();
            settings.insert("autostart".to_string(), Value::Bool(def.is_manageable()));
            if def.is_buildable() {
                settings.insert("branch".to_string(), Value::String("main".to_string()));
            }
            services.insert(def.id.to_string(), settings);
        }
        Options {
            editor: "vi".to_string(),
            theme: "dark".to_string(),
            cache: Credentials::default(),
            services,
        }
    }
}

/// One remote host in `servers.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerEntry {
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub user: String,
    /// SSH identity file, serialized as `key` in the document.
    #[serde(default, rename = "key")]
    pub identity_file: String,
}

/// `servers.json`: named hosts, for tooling that reaches beyond this machine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerMap {
    #[serde(default)]
    pub servers: BTreeMap<String, ServerEntry>,
}

impl ServerMap {
    pub fn defaults() -> Self {
        let mut servers = BTreeMap::new();
        servers.insert(
            "local".to_string(),
            ServerEntry {
                host: "127.0.0.1".to_string(),
                user: String::new(),
                identity_file: String::new(),
            },
        );
        servers.insert(
            "git".to_string(),
            ServerEntry {
                host: "code.lan".to_string(),
                user: "git".to_string(),
                identity_file: "~/.ssh/id_ed25519".to_string(),
            },
        );
        ServerMap { servers }
    }
}

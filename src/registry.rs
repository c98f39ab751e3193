//! Builtin service catalog.
//!
//! The registry is the compile-time source of truth for the fleet: which
//! services exist, what kind they are, where their repositories and logs
//! live, and which systemd unit (if any) manages them. It is constructed
//! once and passed by reference to whatever needs it; nothing in this
//! crate reaches for a global.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Service categories, ordered the way reports display them.
///
/// The derived `Ord` follows declaration order, which is the canonical
/// display order for every table this crate prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    /// Core services.
    Cs,
    /// Backend services.
    Be,
    /// Third-party integrations.
    Th,
    /// Frontend services.
    Fe,
    /// Command-line tools, invoked on demand rather than resident.
    Cli,
    /// Off-the-shelf infrastructure (e.g. the cache), managed but not built.
    Os,
}

impl ServiceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ServiceKind::Cs => "cs",
            ServiceKind::Be => "be",
            ServiceKind::Th => "th",
            ServiceKind::Fe => "fe",
            ServiceKind::Cli => "cli",
            ServiceKind::Os => "os",
        }
    }

    /// Human-readable section header for tables.
    pub fn label(self) -> &'static str {
        match self {
            ServiceKind::Cs => "core",
            ServiceKind::Be => "backend",
            ServiceKind::Th => "third-party",
            ServiceKind::Fe => "frontend",
            ServiceKind::Cli => "cli tools",
            ServiceKind::Os => "infrastructure",
        }
    }

    /// Whether this kind is subject to lifecycle control. CLI tools have no
    /// resident process; `os` infrastructure is provisioned by the host, not
    /// started and stopped through here.
    pub fn is_manageable(self) -> bool {
        !matches!(self, ServiceKind::Cli | ServiceKind::Os)
    }

    pub fn all() -> [ServiceKind; 6] {
        [
            ServiceKind::Cs,
            ServiceKind::Be,
            ServiceKind::Th,
            ServiceKind::Fe,
            ServiceKind::Cli,
            ServiceKind::Os,
        ]
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable entry in the builtin catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDefinition {
    /// Stable identifier, used as the key in the service map.
    pub id: &'static str,
    /// Short name accepted on the command line.
    pub short_name: &'static str,
    pub kind: ServiceKind,
    /// Primary listen port. Zero for services that do not listen.
    pub port: u16,
    /// Upstream git remote. `None` for services we manage but do not build.
    pub repo_url: Option<&'static str>,
    /// Working tree location, `~`-relative.
    pub source_path: &'static str,
    /// systemd unit name, if the service runs under systemd.
    pub unit: Option<&'static str>,
    /// Log file location, `~`-relative.
    pub log_path: &'static str,
}

impl ServiceDefinition {
    /// Whether this service is subject to start/stop/restart.
    pub fn is_manageable(&self) -> bool {
        self.kind.is_manageable() && self.unit.is_some()
    }

    /// Whether `flo sync` should maintain a working tree for this service.
    pub fn is_buildable(&self) -> bool {
        self.repo_url.is_some() && self.kind != ServiceKind::Os
    }

    pub fn repo_display(&self) -> &str {
        self.repo_url.unwrap_or("N/A")
    }
}

const BUILTIN: &[ServiceDefinition] = &[
    ServiceDefinition {
        id: "svc-hub",
        short_name: "hub",
        kind: ServiceKind::Cs,
        port: 4000,
        repo_url: Some("git@code.lan:fleet/hub.git"),
        source_path: "~/fleet/hub",
        unit: Some("fleet-hub.service"),
        log_path: "~/fleet/logs/hub.log",
    },
    ServiceDefinition {
        id: "svc-auth",
        short_name: "auth",
        kind: ServiceKind::Cs,
        port: 4010,
        repo_url: Some("git@code.lan:fleet/auth.git"),
        source_path: "~/fleet/auth",
        unit: Some("fleet-auth.service"),
        log_path: "~/fleet/logs/auth.log",
    },
    ServiceDefinition {
        id: "svc-metrics",
        short_name: "metrics",
        kind: ServiceKind::Be,
        port: 4100,
        repo_url: Some("git@code.lan:fleet/metrics.git"),
        source_path: "~/fleet/metrics",
        unit: Some("fleet-metrics.service"),
        log_path: "~/fleet/logs/metrics.log",
    },
    ServiceDefinition {
        id: "svc-notes",
        short_name: "notes",
        kind: ServiceKind::Be,
        port: 4110,
        repo_url: Some("git@code.lan:fleet/notes.git"),
        source_path: "~/fleet/notes",
        unit: Some("fleet-notes.service"),
        log_path: "~/fleet/logs/notes.log",
    },
    ServiceDefinition {
        id: "svc-search",
        short_name: "search",
        kind: ServiceKind::Th,
        port: 4200,
        repo_url: Some("git@code.lan:fleet/search.git"),
        source_path: "~/fleet/search",
        unit: Some("fleet-search.service"),
        log_path: "~/fleet/logs/search.log",
    },
    ServiceDefinition {
        id: "svc-console",
        short_name: "console",
        kind: ServiceKind::Fe,
        port: 4300,
        repo_url: Some("git@code.lan:fleet/console.git"),
        source_path: "~/fleet/console",
        unit: Some("fleet-console.service"),
        log_path: "~/fleet/logs/console.log",
    },
    ServiceDefinition {
        id: "svc-runner",
        short_name: "runner",
        kind: ServiceKind::Cli,
        port: 0,
        repo_url: Some("git@code.lan:fleet/runner.git"),
        source_path: "~/fleet/runner",
        unit: None,
        log_path: "~/fleet/logs/runner.log",
    },
    ServiceDefinition {
        id: "svc-cache",
        short_name: "cache",
        kind: ServiceKind::Os,
        port: 6379,
        repo_url: None,
        source_path: "",
        unit: Some("redis-server.service"),
        log_path: "~/fleet/logs/cache.log",
    },
];

/// Immutable catalog of known services.
///
/// Construct one with [`Registry::builtin`] and pass it down by reference.
#[derive(Debug, Clone)]
pub struct Registry {
    definitions: Vec<ServiceDefinition>,
}

impl Registry {
    /// The fleet this host runs. Declaration order is display order.
    pub fn builtin() -> Self {
        Registry {
            definitions: BUILTIN.to_vec(),
        }
    }

    /// Registry with an explicit definition list, for tests and tooling.
    pub fn with_definitions(definitions: Vec<ServiceDefinition>) -> Self {
        Registry { definitions }
    }

    pub fn all(&self) -> &[ServiceDefinition] {
        &self.definitions
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn by_id(&self, id: &str) -> Option<&ServiceDefinition> {
        self.definitions.iter().find(|d| d.id == id)
    }

    pub fn by_short_name(&self, name: &str) -> Option<&ServiceDefinition> {
        self.definitions.iter().find(|d| d.short_name == name)
    }

    pub fn by_unit(&self, unit: &str) -> Option<&ServiceDefinition> {
        self.definitions.iter().find(|d| d.unit == Some(unit))
    }

    /// Resolves a user-supplied name: short name first, then id, then unit.
    pub fn find(&self, name: &str) -> Option<&ServiceDefinition> {
        self.by_short_name(name)
            .or_else(|| self.by_id(name))
            .or_else(|| self.by_unit(name))
    }

    pub fn of_kind(&self, kind: ServiceKind) -> impl Iterator<Item = &ServiceDefinition> {
        self.definitions.iter().filter(move |d| d.kind == kind)
    }

    /// Definitions eligible for systemd lifecycle control.
    pub fn manageable(&self) -> impl Iterator<Item = &ServiceDefinition> {
        self.definitions.iter().filter(|d| d.is_manageable())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_order_matches_display_order() {
        assert!(ServiceKind::Cs < ServiceKind::Be);
        assert!(ServiceKind::Be < ServiceKind::Th);
        assert!(ServiceKind::Th < ServiceKind::Fe);
        assert!(ServiceKind::Fe < ServiceKind::Cli);
        assert!(ServiceKind::Cli < ServiceKind::Os);
    }

    #[test]
    fn kind_serializes_to_lowercase_tag() {
        let json = serde_json::to_string(&ServiceKind::Th).unwrap();
        assert_eq!(json, "\"th\"");
        let back: ServiceKind = serde_json::from_str("\"os\"").unwrap();
        assert_eq!(back, ServiceKind::Os);
    }

    #[test]
    fn find_resolves_short_name_id_and_unit() {
        let registry = Registry::builtin();
        assert_eq!(registry.find("hub").unwrap().id, "svc-hub");
        assert_eq!(registry.find("svc-hub").unwrap().short_name, "hub");
        assert_eq!(registry.find("fleet-hub.service").unwrap().short_name, "hub");
        assert!(registry.find("nope").is_none());
    }

    #[test]
    fn cli_tools_are_never_manageable() {
        let registry = Registry::builtin();
        let runner = registry.by_short_name("runner").unwrap();
        assert!(!runner.is_manageable());
        assert!(registry
            .manageable()
            .all(|d| d.kind != ServiceKind::Cli && d.kind != ServiceKind::Os));
        assert_eq!(registry.manageable().count(), 6);
    }

    #[test]
    fn cache_keeps_its_unit_but_is_not_lifecycle_managed() {
        let registry = Registry::builtin();
        let cache = registry.by_short_name("cache").unwrap();
        assert!(!cache.is_manageable());
        assert!(!cache.is_buildable());
        assert_eq!(cache.repo_display(), "N/A");
        // The unit stays visible so liveness checks can consult it.
        assert_eq!(cache.unit, Some("redis-server.service"));
    }

    #[test]
    fn of_kind_selects_exactly_one_category() {
        let registry = Registry::builtin();
        let core: Vec<_> = registry.of_kind(ServiceKind::Cs).collect();
        assert_eq!(core.len(), 2);
        assert!(core.iter().all(|d| d.kind == ServiceKind::Cs));
        assert_eq!(ServiceKind::Cs.label(), "core");
    }

    #[test]
    fn builtin_ids_and_short_names_are_unique() {
        let registry = Registry::builtin();
        for def in registry.all() {
            assert_eq!(registry.by_id(def.id).unwrap().id, def.id);
            assert_eq!(registry.by_short_name(def.short_name).unwrap().id, def.id);
        }
        let mut ids: Vec<_> = registry.all().iter().map(|d| d.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), registry.len());
    }
}

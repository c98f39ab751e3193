//! Persistence for the configuration documents.
//!
//! Everything lives as pretty-printed JSON in one directory, `~/.flo` by
//! default. Loading goes through [`Store::load_healed`], which repairs each
//! document against its registry-derived defaults before handing it out, so
//! the rest of the crate never sees a missing file or a half-filled map.

mod documents;

pub use documents::{Credentials, Options, ServerEntry, ServerMap, ServiceEntry, ServiceMap};

use crate::error::{Error, Result};
use crate::heal::Heal;
use crate::registry::Registry;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const SERVICES_FILE: &str = "services.json";
pub const OPTIONS_FILE: &str = "options.json";
pub const SERVERS_FILE: &str = "servers.json";

/// Expands a leading `~/` to the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// The default config directory, `~/.flo`.
pub fn default_config_dir() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(".flo"))
        .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))
}

/// What healing did to one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealOutcome {
    /// Document was already complete.
    Untouched,
    /// Missing keys or empty scalars were filled in and the file rewritten.
    Healed,
    /// Document did not exist and was created from defaults.
    Created,
}

impl HealOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            HealOutcome::Untouched => "ok",
            HealOutcome::Healed => "healed",
            HealOutcome::Created => "created",
        }
    }
}

/// Per-document results of a healing pass.
#[derive(Debug, Clone)]
pub struct HealReport {
    pub entries: Vec<(String, HealOutcome)>,
}

impl HealReport {
    pub fn changed(&self) -> usize {
        self.entries
            .iter()
            .filter(|(_, outcome)| *outcome != HealOutcome::Untouched)
            .count()
    }
}

/// All three documents, loaded and healed together.
#[derive(Debug, Clone)]
pub struct FleetConfig {
    pub services: ServiceMap,
    pub options: Options,
    pub servers: ServerMap,
}

/// Handle on the config directory.
pub struct Store {
    dir: PathBuf,
}

impl Store {
    /// Opens the config directory, creating it if necessary. `None` means
    /// the default location.
    pub fn open(dir: Option<PathBuf>) -> Result<Self> {
        let dir = match dir {
            Some(dir) => dir,
            None => default_config_dir()?,
        };
        fs::create_dir_all(&dir)?;
        Ok(Store { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn services_path(&self) -> PathBuf {
        self.dir.join(SERVICES_FILE)
    }

    pub fn options_path(&self) -> PathBuf {
        self.dir.join(OPTIONS_FILE)
    }

    pub fn servers_path(&self) -> PathBuf {
        self.dir.join(SERVERS_FILE)
    }

    pub fn load_services(&self) -> Result<ServiceMap> {
        self.read_document(&self.services_path())
    }

    pub fn save_services(&self, map: &ServiceMap) -> Result<()> {
        self.write_document(&self.services_path(), map)
    }

    pub fn load_options(&self) -> Result<Options> {
        self.read_document(&self.options_path())
    }

    pub fn save_options(&self, options: &Options) -> Result<()> {
        self.write_document(&self.options_path(), options)
    }

    pub fn load_servers(&self) -> Result<ServerMap> {
        self.read_document(&self.servers_path())
    }

    pub fn save_servers(&self, servers: &ServerMap) -> Result<()> {
        self.write_document(&self.servers_path(), servers)
    }

    /// Loads all three documents, healing each against its defaults first.
    ///
    /// Missing documents are created from defaults and healed documents are
    /// written back, so a second call finds nothing left to repair. Values
    /// the user has set are never overwritten.
    pub fn load_healed(&self, registry: &Registry) -> Result<(FleetConfig, HealReport)> {
        let (services, services_outcome) =
            self.heal_document(&self.services_path(), ServiceMap::defaults(registry))?;
        let (options, options_outcome) =
            self.heal_document(&self.options_path(), Options::defaults(registry))?;
        let (servers, servers_outcome) =
            self.heal_document(&self.servers_path(), ServerMap::defaults())?;

        let report = HealReport {
            entries: vec![
                (SERVICES_FILE.to_string(), services_outcome),
                (OPTIONS_FILE.to_string(), options_outcome),
                (SERVERS_FILE.to_string(), servers_outcome),
            ],
        };
        Ok((
            FleetConfig {
                services,
                options,
                servers,
            },
            report,
        ))
    }

    fn heal_document<T>(&self, path: &Path, default: T) -> Result<(T, HealOutcome)>
    where
        T: Serialize + DeserializeOwned + Heal,
    {
        match self.read_document::<T>(path) {
            Ok(mut document) => {
                if document.heal_from(&default) {
                    tracing::info!("healed {}", path.display());
                    self.write_document(path, &document)?;
                    Ok((document, HealOutcome::Healed))
                } else {
                    Ok((document, HealOutcome::Untouched))
                }
            }
            Err(Error::NotFound(_)) => {
                tracing::info!("creating {} from defaults", path.display());
                self.write_document(path, &default)?;
                Ok((default, HealOutcome::Created))
            }
            Err(e) => Err(e),
        }
    }

    fn read_document<T: DeserializeOwned>(&self, path: &Path) -> Result<T> {
        if !path.exists() {
            return Err(Error::NotFound(path.display().to_string()));
        }
        let raw = fs::read_to_string(path)?;
        serde_json::from_str(&raw)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    fn write_document<T: Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        let rendered = serde_json::to_string_pretty(value)?;
        fs::write(path, rendered + "\n")?;
        Ok(())
    }
}

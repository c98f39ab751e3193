//! # Flotilla
//!
//! A reconciliation and health-check engine for a single-host fleet of
//! personal services.
//!
//! ## Features
//!
//! - **Git-state-driven sync**: Clone missing working trees, fast-forward
//!   clean ones, and skip anything with uncommitted or unpushed work
//! - **Multi-protocol health checks**: HTTP JSON for resident services, the
//!   cache wire protocol for infrastructure, `--version` for CLI tools
//! - **Self-healing configuration**: Missing documents are created and
//!   incomplete ones filled in from defaults, without ever overwriting a
//!   value the operator set
//! - **Concurrent lifecycle control**: start/stop/restart fan out over all
//!   systemd units at once, with per-unit outcomes
//! - **Cancellation Support**: A sync pass stops cleanly between services
//!   via `CancellationToken`
//!
//! ## Quick Start
//!
//! ```no_run
//! use flotilla::{GitCli, Registry, Store, Synchronizer, Systemctl};
//!
//! # async fn example() -> Result<(), flotilla::Error> {
//! let registry = Registry::builtin();
//! let store = Store::open(None)?;
//! let (config, _report) = store.load_healed(&registry)?;
//!
//! let git = GitCli::new();
//! let units = Systemctl::new();
//! let sync = Synchronizer::new(&git, &units, &registry, &config.options);
//! let report = sync.run(&config.services, &[]).await;
//! println!("{}", report.summary());
//! # Ok(())
//! # }
//! ```
//!
//! ## Concurrency Model
//!
//! Sync and health checks run one service at a time so reports keep a
//! stable order and `git` never contends with itself. Lifecycle actions
//! are the exception: they fan out concurrently and join on the whole
//! group, since systemd serializes per-unit work anyway.

pub mod control;
pub mod error;
pub mod heal;
pub mod probe;
pub mod registry;
pub mod repo;
pub mod store;
pub mod sync;

// Re-export commonly used types
pub use control::{ControlAction, ControlOutcome, Systemctl, UnitControl};
pub use error::{Error, Result};
pub use heal::Heal;
pub use probe::{HealthRow, HealthStatus};
pub use registry::{Registry, ServiceDefinition, ServiceKind};
pub use repo::{GitCli, GitOps, RepoStatus};
pub use store::{FleetConfig, Options, ServerMap, ServiceEntry, ServiceMap, Store};
pub use sync::{SyncOutcome, SyncReport, Synchronizer};

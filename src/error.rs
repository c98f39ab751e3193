use miette::Diagnostic;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unknown service: {0}")]
    #[diagnostic(
        code(flo::service::unknown),
        help("Check available services with `flo status` or review ~/.flo/services.json")
    )]
    UnknownService(String),

    #[error("{} exists but is not a git repository", .0.display())]
    #[diagnostic(
        code(flo::repo::invalid),
        help("Move the directory aside or run `git init` inside it before syncing")
    )]
    InvalidRepository(PathBuf),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("'{command}' failed: {detail}")]
    #[diagnostic(code(flo::command::failed))]
    CommandFailed { command: String, detail: String },

    #[error("Control action failed for '{service}': {message}")]
    #[diagnostic(
        code(flo::control::failed),
        help("Inspect the unit with `systemctl status <unit>` and check `flo logs <service>`")
    )]
    ControlFailed { service: String, message: String },

    #[error("{failed} of {total} services failed to synchronize")]
    #[diagnostic(code(flo::sync::failed))]
    SyncFailed { failed: usize, total: usize },

    #[error("Multiple errors occurred:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Multiple(Vec<Error>),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns a helpful suggestion for resolving this error, if available.
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Error::UnknownService(name) => Some(format!(
                "Run 'flo status' to list known services. Did you mean a different name than '{}'?",
                name
            )),
            Error::InvalidRepository(path) => Some(format!(
                "Move {} aside (or delete it) and run 'flo sync' again to get a fresh clone.",
                path.display()
            )),
            Error::CommandFailed { command, .. } if command.starts_with("git") => Some(
                "Check that git is installed and the remote is reachable: git ls-remote <url>"
                    .to_string(),
            ),
            Error::CommandFailed { command, .. } if command.starts_with("systemctl") => Some(
                "Check that systemd manages this unit: systemctl list-units --type=service"
                    .to_string(),
            ),
            Error::ControlFailed { service, .. } => Some(format!(
                "Check the unit state with: systemctl status\nThen inspect the log with: flo logs {}",
                service
            )),
            Error::SyncFailed { .. } => Some(
                "Re-run with RUST_LOG=debug for per-repository detail: RUST_LOG=debug flo sync"
                    .to_string(),
            ),
            Error::NotFound(what) if what.ends_with(".json") => Some(
                "Run 'flo config heal' to recreate missing configuration documents.".to_string(),
            ),
            Error::Config(_) => Some(
                "Run 'flo config show' to inspect the documents under ~/.flo".to_string(),
            ),
            _ => None,
        }
    }

    /// Formats the error with its suggestion (if any) for user-friendly display.
    pub fn with_suggestion(&self) -> String {
        match self.suggestion() {
            Some(suggestion) => format!("{}\n\nHint: {}", self, suggestion),
            None => self.to_string(),
        }
    }
}

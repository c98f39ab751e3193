mod config;
mod lifecycle;
mod logs;
mod servers;
mod status;
mod sync;

pub use config::run_config;
pub use lifecycle::run_lifecycle;
pub use logs::run_logs;
pub use servers::run_servers;
pub use status::run_status;
pub use sync::run_sync;

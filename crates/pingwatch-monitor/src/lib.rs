//! Round-robin reachability monitoring and one-shot checks.

pub mod cancel;
pub mod check;
pub mod config;
pub mod error;
pub mod monitor;
pub mod report;

pub use cancel::{CancelToken, Sleeper, ThreadSleeper};
pub use check::{run_check, CheckOptions, CheckSummary};
pub use config::{validate_probe_settings, ConfigError, MonitorConfig};
pub use error::MonitorError;
pub use monitor::Monitor;
pub use report::Palette;

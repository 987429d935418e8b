//! Reachability probing through the system `ping` binary.

pub mod error;
pub mod parser;
pub mod process;
pub mod runner;

pub use error::ProbeError;
pub use parser::{parse_ping_summary, PingSummary};
pub use process::{run_with_deadline, ProcessOutput};
pub use runner::{
    ensure_ping_available, ping_args, probe_all, probe_all_with_progress, BatchPool, ProbeSettings,
    Prober, SuccessPolicy, SystemPingProber,
};

use crate::config::ConfigError;
use pingwatch_probe::ProbeError;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    ProbeUnavailable(#[from] ProbeError),

    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}

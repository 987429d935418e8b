use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProbeError {
    /// The probing program could not be executed on this host.
    #[error("`{program}` is not available on this host: {source}")]
    Unavailable {
        program: String,
        #[source]
        source: io::Error,
    },
}

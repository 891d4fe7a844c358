use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Why a dataset could not be installed as the engine's graph.
///
/// Every variant leaves the previously loaded graph in place.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot open edge list '{}': {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed reading edge list '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("estimated graph size {estimated_bytes} bytes exceeds limit of {limit_bytes} bytes")]
    MemoryLimit {
        estimated_bytes: u64,
        limit_bytes: u64,
    },
}

/// Rejected engine configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid engine config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("comment prefix {0:?} would shadow edge lines")]
    InvalidCommentPrefix(char),

    #[error("max_memory_mb must be between 0 and {max}, got {got}")]
    MemoryLimitOutOfRange { got: u64, max: u64 },
}

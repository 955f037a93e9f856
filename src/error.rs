// ============================================
// error.rs - Library Errors
// ============================================
// Parsing never fails; errors only come from loading
// configuration files and peer batches.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("failed to parse peer batch: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, Error>;

use std::path::PathBuf;

use thiserror::Error;

/// Failures at the load boundary. A malformed record is never partially used.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("missing input: {path}")]
    Missing { path: PathBuf },
    #[error("malformed input {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed reading {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl InputError {
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::Missing { path } | Self::Malformed { path, .. } | Self::Unreadable { path, .. } => {
                path
            }
        }
    }
}

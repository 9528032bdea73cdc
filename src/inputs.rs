use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::InputError;

pub fn load_required<T: DeserializeOwned>(path: &Path) -> Result<T, InputError> {
    let raw = fs::read_to_string(path).map_err(|err| match err.kind() {
        ErrorKind::NotFound => InputError::Missing {
            path: path.to_path_buf(),
        },
        _ => InputError::Unreadable {
            path: path.to_path_buf(),
            source: err,
        },
    })?;
    serde_json::from_str(&raw).map_err(|source| InputError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}

/// Loads a record that may be absent; any failure degrades to `None`.
pub fn load_optional<T: DeserializeOwned>(path: &Path) -> Option<T> {
    match load_required(path) {
        Ok(value) => Some(value),
        Err(InputError::Missing { .. }) => {
            info!("optional input {} not present", path.display());
            None
        }
        Err(err) => {
            warn!("ignoring optional input: {err}");
            None
        }
    }
}

pub fn write_report<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed creating directory: {}", parent.display()))?;
        }
    }
    let body = serde_json::to_string_pretty(value)?;
    fs::write(path, body).with_context(|| format!("failed writing report: {}", path.display()))?;
    info!("wrote {}", path.display());
    Ok(())
}

// Application state module
// Read-only state shared by every connection task

use std::path::{Path, PathBuf};

use super::types::ServerConfig;
use crate::error::ServerError;

/// Application state
#[derive(Debug)]
pub struct AppState {
    pub config: ServerConfig,
    /// Canonical root; every served path must stay below it
    root: PathBuf,
}

impl AppState {
    /// Canonicalize the root directory and wrap the configuration
    pub fn new(config: ServerConfig) -> Result<Self, ServerError> {
        let root = config
            .root
            .canonicalize()
            .map_err(|source| ServerError::Root {
                path: config.root.clone(),
                source,
            })?;

        if !root.is_dir() {
            return Err(ServerError::Root {
                path: config.root.clone(),
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "not a directory",
                ),
            });
        }

        Ok(Self { config, root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

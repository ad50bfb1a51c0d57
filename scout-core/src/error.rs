//! Error types for scout operations

use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ScoutError {
    #[error("Not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Glob pattern error: {0}")]
    GlobPattern(String),

    #[error("Regex error: {0}")]
    Regex(String),

    #[error("Config parse error: {0}")]
    ConfigParse(String),

    #[error("Background task failed: {0}")]
    Join(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ScoutError {
    /// Wrap an I/O error, keeping not-found distinct from other failures.
    pub fn io(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            Self::NotFound(path.to_path_buf())
        } else {
            Self::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

//! Error types for the lint command

use std::path::PathBuf;

use azsec_core::{ConfigError, DocumentError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LinterError {
    /// The directory to lint does not exist
    #[error("Directory {0} does not exist")]
    MissingDirectory(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Document(#[from] DocumentError),

    /// Failed to load or parse a configuration file
    #[error("Failed to load configuration from {path}: {message}")]
    ConfigLoad { path: PathBuf, message: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    /// Configuration file already exists
    #[error("Configuration file {0} already exists")]
    ConfigExists(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize output: {0}")]
    Serialize(#[from] serde_json::Error),
}

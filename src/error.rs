// ABOUTME: Application-wide error types for imagewait.
// ABOUTME: Uses thiserror for ergonomic error handling.

use crate::registry::RegistryError;
use crate::wait::WaitError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("file already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("configuration file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("no image given, please specify an image")]
    MissingImage,

    #[error("could not set up registry client: {0}")]
    Client(#[from] RegistryError),

    #[error(transparent)]
    Wait(#[from] WaitError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Not found: {0}")]
    NotFound(String),

    /// Covers both `..` escapes and keys outside the allowed prefix.
    #[error("Path traversal: {0}")]
    PathTraversal(String),

    #[error("Object store error: {0}")]
    Store(String),

    #[error("Object store call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Malformed playlist: {0}")]
    MalformedPlaylist(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True for the failures that must look identical to a missing object.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::PathTraversal(_))
    }
}

impl From<opendal::Error> for Error {
    fn from(err: opendal::Error) -> Self {
        match err.kind() {
            opendal::ErrorKind::NotFound => Self::NotFound(err.to_string()),
            opendal::ErrorKind::ConfigInvalid => Self::Config(err.to_string()),
            _ => Self::Store(err.to_string()),
        }
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

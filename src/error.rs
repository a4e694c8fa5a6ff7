//! Unified error type.

use std::path::PathBuf;

use thiserror::Error;

/// The error type returned by ohmybank's fallible operations.
///
/// Application-level outcomes (404, 405, an empty activity list) are
/// expressed as HTTP [`Response`](crate::Response) values, not as `Error`s.
/// This type surfaces startup and infrastructure failures only: loading the
/// datasets, reading configuration, binding to a port.
#[derive(Debug, Error)]
pub enum Error {
    /// Binding the listener or accepting a connection failed.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// The environment could not be deserialized into a [`Config`](crate::Config).
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// A dataset file is missing or malformed.
    #[error("dataset {}: {reason}", .path.display())]
    Dataset {
        /// The file that failed to load.
        path: PathBuf,
        /// What was wrong with it.
        reason: String,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

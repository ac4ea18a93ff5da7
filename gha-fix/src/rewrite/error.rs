//! Rewrite error types.

use crate::pin::PinError;
use crate::timeout::TimeoutError;
use thiserror::Error;

/// Errors returned by a [`Transform`](crate::rewrite::Transform).
#[derive(Debug, Error)]
pub enum TransformError {
    /// Pinning failed.
    #[error(transparent)]
    Pin(#[from] PinError),

    /// Adding timeouts failed.
    #[error(transparent)]
    Timeout(#[from] TimeoutError),
}

/// Errors that abort a multi-file rewrite.
#[derive(Debug, Error)]
pub enum RewriteError {
    /// Failed to read a workflow file.
    #[error("Failed to read file '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A named workflow file is not valid UTF-8.
    #[error("File '{path}' is not valid UTF-8: {source}")]
    EncodingError {
        path: String,
        #[source]
        source: std::string::FromUtf8Error,
    },

    /// Failed to write a rewritten workflow file.
    #[error("Failed to write file '{path}': {source}")]
    WriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The transform rejected a file. No file was written.
    #[error("Failed to process '{path}': {source}")]
    Transform {
        path: String,
        #[source]
        source: TransformError,
    },

    /// Failed to walk the directory tree.
    #[error("Failed to search for workflow files in '{path}': {source}")]
    WalkError {
        path: String,
        #[source]
        source: walkdir::Error,
    },
}

//! Configuration error types.

use thiserror::Error;

/// Reasons `gha-fix.toml` could not be turned into a [`Config`](crate::config::Config).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file exists but could not be read.
    #[error("Cannot read config file '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML or has keys of the wrong type.
    #[error("Invalid gha-fix.toml at '{path}': {source}")]
    TomlError {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    /// `timeout-minutes` or `concurrency` is zero.
    #[error("Out-of-range setting in '{path}': {message}")]
    ValidationError { path: String, message: String },
}

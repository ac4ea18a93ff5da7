#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

pub mod config;
pub mod pin;
pub mod rewrite;
pub mod timeout;

pub use config::{Config, ConfigError, PinConfig, TimeoutConfig};
pub use pin::{
    parse_line, ActionReference, GitHubResolver, ParsedUsesLine, Pin, PinError, PinOptions,
    Pinner, ResolveError, ResolvedVersion, VersionResolver,
};
pub use rewrite::{
    discover_workflow_files, rewrite_files, RewriteError, RewriteOptions, RewriteResult,
    Transform, TransformError, Transformed, DEFAULT_IGNORE_DIRS,
};
pub use timeout::{Fixer, Position, Timeout, TimeoutError};

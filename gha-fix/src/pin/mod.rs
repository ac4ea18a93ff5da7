//! Pinning of action and reusable workflow references to commit SHAs.
//!
//! A `uses: actions/checkout@v4` line becomes
//! `uses: actions/checkout@<sha> # v4.2.2`. Only the reference on the
//! matched line is touched; every other byte of the file is kept.

mod error;
mod reference;
mod resolver;
mod rewriter;

pub use error::{PinError, ResolveError};
pub use reference::{parse_line, ActionReference, ParsedUsesLine};
pub use resolver::{GitHubResolver, ResolvedVersion, VersionResolver};
pub use rewriter::{Pin, PinOptions};

use crate::rewrite::{rewrite_files, RewriteError, RewriteOptions, RewriteResult};
use std::path::{Path, PathBuf};
use tracing::info;

/// Pins references across a set of workflow files.
pub struct Pinner<R = GitHubResolver> {
    pin: Pin<R>,
    rewrite_options: RewriteOptions,
}

impl Pinner<GitHubResolver> {
    /// Creates a pinner resolving references through the GitHub API.
    ///
    /// # Errors
    ///
    /// Returns [`PinError::Octocrab`] if the GitHub client cannot be built.
    pub fn new(
        token: &str,
        pin_options: PinOptions,
        rewrite_options: RewriteOptions,
    ) -> Result<Self, PinError> {
        let resolver = GitHubResolver::from_token(token)?;
        Ok(Self::with_resolver(resolver, pin_options, rewrite_options))
    }
}

impl<R: VersionResolver> Pinner<R> {
    /// Creates a pinner with a custom resolver.
    pub fn with_resolver(
        resolver: R,
        pin_options: PinOptions,
        rewrite_options: RewriteOptions,
    ) -> Self {
        Self {
            pin: Pin::new(resolver, pin_options),
            rewrite_options,
        }
    }

    /// Pins the given files, or every workflow file under `root` if `paths` is empty.
    ///
    /// Files are only written once every file has been pinned successfully.
    ///
    /// # Errors
    ///
    /// Returns [`RewriteError`] if any file cannot be read, pinned or written.
    pub async fn pin(&self, root: &Path, paths: &[PathBuf]) -> Result<RewriteResult, RewriteError> {
        let result = rewrite_files(root, paths, &self.rewrite_options, &self.pin).await?;
        if result.changed {
            info!(changed = result.file_count, "Pinned actions to commit SHAs");
        } else {
            info!("No changes needed, all actions are already pinned");
        }
        Ok(result)
    }
}

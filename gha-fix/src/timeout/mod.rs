//! Adds `timeout-minutes` to workflow jobs that do not set one.
//!
//! The YAML is parsed only to locate jobs. Edits are spliced into the
//! original text line by line, so comments, quoting and spacing survive.

mod error;
mod fixer;
pub(crate) mod indent;
pub(crate) mod jobs;
pub(crate) mod structure;

pub use error::TimeoutError;
pub use fixer::Fixer;
pub use structure::Position;

use crate::rewrite::{rewrite_files, RewriteError, RewriteOptions, RewriteResult};
use std::path::{Path, PathBuf};
use tracing::info;

/// Adds timeouts across a set of workflow files.
#[derive(Debug, Clone)]
pub struct Timeout {
    fixer: Fixer,
    rewrite_options: RewriteOptions,
}

impl Timeout {
    /// Creates a timeout rewriter inserting `timeout-minutes: <timeout_minutes>`.
    ///
    /// # Errors
    ///
    /// Returns [`TimeoutError::InvalidTimeout`] if `timeout_minutes` is zero.
    pub fn new(timeout_minutes: u64, rewrite_options: RewriteOptions) -> Result<Self, TimeoutError> {
        if timeout_minutes == 0 {
            return Err(TimeoutError::InvalidTimeout);
        }

        Ok(Self {
            fixer: Fixer::new(timeout_minutes),
            rewrite_options,
        })
    }

    /// Fixes the given files, or every workflow file under `root` if `paths` is empty.
    ///
    /// Files are only written once every file has been fixed successfully.
    ///
    /// # Errors
    ///
    /// Returns [`RewriteError`] if any file cannot be read, fixed or written.
    pub async fn fix(&self, root: &Path, paths: &[PathBuf]) -> Result<RewriteResult, RewriteError> {
        let result = rewrite_files(root, paths, &self.rewrite_options, &self.fixer).await?;
        if result.changed {
            info!(
                changed = result.file_count,
                timeout_minutes = self.fixer.timeout_minutes(),
                "Added timeout-minutes to workflow jobs"
            );
        } else {
            info!("No changes needed, all jobs have timeout-minutes");
        }
        Ok(result)
    }
}

//! Pinning error types.

use thiserror::Error;

/// Errors returned by a [`VersionResolver`](crate::pin::VersionResolver).
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The reference already points at a commit SHA; nothing to do.
    #[error("reference is already pinned to a commit SHA")]
    AlreadyResolved,

    /// GitHub API error.
    #[error("GitHub API error: {0}")]
    GitHubError(#[from] octocrab::Error),

    /// No commit could be found for the reference.
    #[error("no commit found for {reference}")]
    NotFound { reference: String },
}

/// Errors that abort pinning a file.
#[derive(Debug, Error)]
pub enum PinError {
    /// Resolving a reference failed for a reason other than it already being pinned.
    #[error("failed to resolve '{reference}': {source}")]
    Resolve {
        reference: String,
        #[source]
        source: ResolveError,
    },

    /// GitHub API client initialization errors.
    #[error(transparent)]
    Octocrab(#[from] octocrab::Error),
}

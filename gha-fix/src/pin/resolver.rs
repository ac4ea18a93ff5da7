//! Version resolution for action references.

use crate::pin::{ActionReference, ResolveError};
use octocrab::models::repos::Tag;
use octocrab::Octocrab;
use serde::Deserialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, PoisonError};
use tracing::{debug, warn};

/// Tags fetched per page when looking for a ref comment.
const TAGS_PER_PAGE: u8 = 100;

/// Upper bound on tag pages fetched for a single repository.
const MAX_TAG_PAGES: usize = 10;

/// A reference resolved to an immutable commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVersion {
    /// Full 40 character commit SHA.
    pub commit_sha: String,

    /// Human readable ref written as the trailing comment (e.g. "v4.2.2").
    pub ref_comment: String,
}

/// Resolves action references to commit SHAs.
///
/// Implementations shared across concurrent file rewrites must be safe to
/// call from several tasks at once; caching and request coalescing are up to
/// the implementation.
pub trait VersionResolver: Send + Sync {
    /// Resolves `reference` to a commit.
    ///
    /// Returns [`ResolveError::AlreadyResolved`] when the reference is already
    /// a commit SHA and must be left alone.
    fn resolve_version(
        &self,
        reference: &ActionReference,
    ) -> impl Future<Output = Result<ResolvedVersion, ResolveError>> + Send;
}

/// Commit payload returned by `GET /repos/{owner}/{repo}/commits/{ref}`.
#[derive(Debug, Deserialize)]
struct CommitResponse {
    sha: String,
}

/// Resolves references through the GitHub REST API.
///
/// The base repository decides the SHA; subdirectory and workflow paths are
/// not part of the lookup. Results are cached per `owner/repo@ref`.
pub struct GitHubResolver {
    octocrab: Octocrab,
    cache: Mutex<HashMap<String, ResolvedVersion>>,
}

impl GitHubResolver {
    /// Creates a resolver using an existing client.
    pub fn new(octocrab: Octocrab) -> Self {
        Self {
            octocrab,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Creates a resolver authenticated with a personal access token.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be built.
    pub fn from_token(token: impl Into<String>) -> Result<Self, octocrab::Error> {
        let octocrab = Octocrab::builder().personal_token(token.into()).build()?;
        Ok(Self::new(octocrab))
    }

    fn cached(&self, key: &str) -> Option<ResolvedVersion> {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn remember(&self, key: String, resolved: ResolvedVersion) {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, resolved);
    }

    async fn fetch_commit_sha(&self, reference: &ActionReference) -> Result<String, ResolveError> {
        let route = format!(
            "/repos/{}/{}/commits/{}",
            reference.owner, reference.repo, reference.ref_or_sha
        );
        match self.octocrab.get::<CommitResponse, _, ()>(route, None).await {
            Ok(commit) => Ok(commit.sha),
            Err(octocrab::Error::GitHub { source, .. })
                if is_missing_commit(source.status_code.as_u16()) =>
            {
                Err(ResolveError::NotFound {
                    reference: reference.to_string(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn fetch_tags(&self, reference: &ActionReference) -> Result<Vec<Tag>, ResolveError> {
        let mut page = self
            .octocrab
            .repos(&reference.owner, &reference.repo)
            .list_tags()
            .per_page(TAGS_PER_PAGE)
            .send()
            .await?;

        let mut tags = std::mem::take(&mut page.items);
        let mut pages = 1;

        while let Some(mut next_page) = self.octocrab.get_page::<Tag>(&page.next).await? {
            tags.append(&mut next_page.items);
            page.next = next_page.next;
            pages += 1;

            if pages >= MAX_TAG_PAGES {
                warn!(
                    repo = %reference.base_repository(),
                    max_pages = MAX_TAG_PAGES,
                    "Reached maximum tag pages"
                );
                break;
            }
        }

        Ok(tags)
    }
}

impl VersionResolver for GitHubResolver {
    async fn resolve_version(
        &self,
        reference: &ActionReference,
    ) -> Result<ResolvedVersion, ResolveError> {
        if reference.has_commit_sha() {
            return Err(ResolveError::AlreadyResolved);
        }

        let key = format!("{}@{}", reference.base_repository(), reference.ref_or_sha);
        if let Some(resolved) = self.cached(&key) {
            debug!(reference = %key, "Resolved from cache");
            return Ok(resolved);
        }

        let commit_sha = self.fetch_commit_sha(reference).await?;
        let tags = self.fetch_tags(reference).await?;
        let ref_comment = most_specific_tag(
            tags.iter()
                .map(|tag| (tag.name.as_str(), tag.commit.sha.as_str())),
            &commit_sha,
        )
        .unwrap_or(reference.ref_or_sha.as_str())
        .to_string();

        debug!(reference = %key, commit_sha = %commit_sha, ref_comment = %ref_comment, "Resolved reference");

        let resolved = ResolvedVersion {
            commit_sha,
            ref_comment,
        };
        self.remember(key, resolved.clone());
        Ok(resolved)
    }
}

/// GitHub answers 404 for an unknown repository and 422 for an unknown ref.
fn is_missing_commit(status: u16) -> bool {
    matches!(status, 404 | 422)
}

/// Picks the most specific tag name pointing at `commit_sha`.
///
/// `v4.2.2` beats `v4.2` beats `v4`; ties go to the longer name.
fn most_specific_tag<'a>(
    tags: impl IntoIterator<Item = (&'a str, &'a str)>,
    commit_sha: &str,
) -> Option<&'a str> {
    tags.into_iter()
        .filter(|(_, sha)| *sha == commit_sha)
        .map(|(name, _)| name)
        .max_by_key(|name| (name.split('.').count(), name.len()))
}

//! Line-level rewriting of `uses:` references to commit SHAs.

use crate::pin::{parse_line, ActionReference, PinError, ResolveError, VersionResolver};
use crate::rewrite::{Transform, Transformed};
use std::future::Future;
use tracing::debug;

/// Filters deciding which references are left alone.
#[derive(Debug, Clone, Default)]
pub struct PinOptions {
    /// Owners whose references are skipped (e.g. "actions").
    pub ignore_owners: Vec<String>,

    /// Repositories in `owner/repo` format whose references are skipped.
    pub ignore_repos: Vec<String>,

    /// Pin actions even when their owner is ignored.
    ///
    /// Reusable workflows keep honouring the owner list.
    pub strict_pinning_202508: bool,
}

/// Pins `uses:` references in workflow text to commit SHAs.
pub struct Pin<R> {
    resolver: R,
    options: PinOptions,
}

impl<R: VersionResolver> Pin<R> {
    /// Creates a rewriter backed by `resolver`.
    pub fn new(resolver: R, options: PinOptions) -> Self {
        Self { resolver, options }
    }

    /// Pins every reference in `content`.
    ///
    /// Either every reference that needs pinning is rewritten, or an error is
    /// returned and nothing is.
    ///
    /// # Errors
    ///
    /// Returns [`PinError::Resolve`] if the resolver fails for any reference.
    pub async fn apply(&self, content: &str) -> Result<Transformed, PinError> {
        let mut lines = Vec::new();
        let mut changed = false;

        for line in content.split('\n') {
            let (body, line_ending) = match line.strip_suffix('\r') {
                Some(body) => (body, "\r"),
                None => (line, ""),
            };

            let replaced = self.replace_line(body).await?;
            changed |= replaced.changed;
            lines.push(replaced.content + line_ending);
        }

        if !changed {
            return Ok(Transformed::unchanged(content));
        }

        Ok(Transformed::changed(lines.join("\n")))
    }

    /// Pins the reference on a single line, if it has one that needs pinning.
    ///
    /// # Errors
    ///
    /// Returns [`PinError::Resolve`] if the resolver fails.
    pub async fn replace_line(&self, line: &str) -> Result<Transformed, PinError> {
        let Some(parsed) = parse_line(line) else {
            return Ok(Transformed::unchanged(line));
        };

        let reference = &parsed.definition;
        if self.is_ignored(reference) {
            debug!(reference = %reference, "Skipping ignored reference");
            return Ok(Transformed::unchanged(line));
        }

        match self.resolver.resolve_version(reference).await {
            Ok(resolved) => Ok(Transformed::changed(
                parsed.render_pinned(&resolved.commit_sha, &resolved.ref_comment),
            )),
            Err(ResolveError::AlreadyResolved) => {
                debug!(reference = %reference, "Reference already pinned");
                Ok(Transformed::unchanged(line))
            }
            Err(source) => Err(PinError::Resolve {
                reference: reference.to_string(),
                source,
            }),
        }
    }

    /// Applies the owner and repository ignore lists to the base repository.
    fn is_ignored(&self, reference: &ActionReference) -> bool {
        let base_repository = reference.base_repository();
        if self.options.ignore_repos.contains(&base_repository) {
            return true;
        }

        if !self.options.ignore_owners.contains(&reference.owner) {
            return false;
        }

        !self.options.strict_pinning_202508 || reference.is_reusable_workflow()
    }
}

impl<R: VersionResolver> Transform for Pin<R> {
    type Error = PinError;

    fn transform(
        &self,
        content: &str,
    ) -> impl Future<Output = Result<Transformed, Self::Error>> + Send {
        self.apply(content)
    }
}

//! Inserts `timeout-minutes` into jobs that lack it.

use crate::rewrite::{Transform, Transformed};
use crate::timeout::indent::job_property_indent;
use crate::timeout::jobs::{insertion_positions, is_github_workflow};
use crate::timeout::structure::parse_documents;
use crate::timeout::TimeoutError;
use std::future::{self, Future};
use tracing::debug;

/// Adds `timeout-minutes` to every job that has none.
///
/// Jobs calling a reusable workflow (`uses:`) are skipped, as are jobs that
/// already set a timeout, whatever its value.
#[derive(Debug, Clone, Copy)]
pub struct Fixer {
    timeout_minutes: u64,
}

impl Fixer {
    /// Creates a fixer inserting `timeout-minutes: <timeout_minutes>`.
    pub fn new(timeout_minutes: u64) -> Self {
        Self { timeout_minutes }
    }

    /// Returns the configured timeout.
    pub fn timeout_minutes(&self) -> u64 {
        self.timeout_minutes
    }

    /// Adds timeouts to the jobs in `content`.
    ///
    /// Files that do not look like GitHub workflows, including YAML that fails
    /// to parse, come back unchanged without an error.
    ///
    /// # Errors
    ///
    /// Returns [`TimeoutError::FlowStyleNotSupported`] or
    /// [`TimeoutError::CompactJobSyntaxNotSupported`] for job syntax that cannot
    /// be edited line by line, and [`TimeoutError::IndentNotCalculated`] if a
    /// job's property indentation cannot be determined. No edits are made in
    /// either case.
    pub fn fix(&self, content: &str) -> Result<Transformed, TimeoutError> {
        if !content.contains("jobs:") || !content.contains("runs-on:") {
            return Ok(Transformed::unchanged(content));
        }

        check_supported_syntax(content)?;

        let documents = match parse_documents(content) {
            Ok(documents) => documents,
            Err(e) => {
                debug!(error = %e, "Failed to parse YAML, skipping");
                return Ok(Transformed::unchanged(content));
            }
        };

        if !is_github_workflow(&documents) {
            debug!("Not a GitHub workflow, skipping");
            return Ok(Transformed::unchanged(content));
        }

        let positions = insertion_positions(&documents);
        let mut lines: Vec<String> = content.split('\n').map(str::to_string).collect();
        let mut inserted = 0;

        // Highest line first so earlier positions stay valid.
        for position in positions.iter().rev() {
            if position.line == 0 || position.line > lines.len() {
                continue;
            }

            let indent = job_property_indent(&lines, position.line)?;
            let line_ending = if lines[position.line - 1].ends_with('\r') {
                "\r"
            } else {
                ""
            };
            lines.insert(
                position.line,
                format!(
                    "{indent}timeout-minutes: {}{line_ending}",
                    self.timeout_minutes
                ),
            );
            inserted += 1;
        }

        if inserted == 0 {
            return Ok(Transformed::unchanged(content));
        }

        debug!(jobs = inserted, "Added timeout-minutes");
        Ok(Transformed::changed(lines.join("\n")))
    }
}

/// Rejects job syntax the line-based insertion cannot handle.
fn check_supported_syntax(content: &str) -> Result<(), TimeoutError> {
    for line in content.split('\n') {
        if line.contains(": {")
            && (line.contains("runs-on:") || line.contains("steps:") || line.contains("uses:"))
        {
            return Err(TimeoutError::FlowStyleNotSupported);
        }

        if line.contains(":runs-on:") {
            return Err(TimeoutError::CompactJobSyntaxNotSupported);
        }
    }
    Ok(())
}

impl Transform for Fixer {
    type Error = TimeoutError;

    fn transform(
        &self,
        content: &str,
    ) -> impl Future<Output = Result<Transformed, Self::Error>> + Send {
        future::ready(self.fix(content))
    }
}

//! Workflow validation and per-job classification.

use crate::timeout::structure::{Node, Position};
use tracing::debug;

/// Top-level keys a GitHub workflow may contain.
///
/// Comments never reach the tree, so they need no entry here.
const WORKFLOW_KEYS: [&str; 8] = [
    "name",
    "run-name",
    "on",
    "permissions",
    "env",
    "defaults",
    "concurrency",
    "jobs",
];

/// Job properties that only appear in GitHub workflow jobs.
const WORKFLOW_JOB_KEYS: [&str; 3] = ["runs-on", "uses", "container"];

/// What to do with a single job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum JobDecision {
    /// Insert `timeout-minutes` after the job key.
    Insert,
    /// Calls a reusable workflow.
    ReusableWorkflow,
    /// Already has `timeout-minutes`, literal or expression.
    HasTimeout,
    /// Inline job without `runs-on`.
    NoRunner,
    /// Body is not a mapping, e.g. empty.
    NotMapping,
}

/// A job entry of the `jobs` mapping.
#[derive(Debug)]
pub(crate) struct Job<'a> {
    pub(crate) name: &'a str,
    pub(crate) key: Position,
    body: Option<&'a [(Node, Node)]>,
    flow_style: bool,
}

impl<'a> Job<'a> {
    fn new(key: &'a Node, value: &'a Node) -> Self {
        Self {
            name: key.key_str(),
            key: key.start,
            body: value.as_mapping(),
            flow_style: key.start.line == value.start.line,
        }
    }

    /// Checks the job's direct properties only.
    fn has_property(&self, name: &str) -> bool {
        self.body
            .is_some_and(|body| body.iter().any(|(key, _)| key.key_str() == name))
    }

    pub(crate) fn decision(&self) -> JobDecision {
        if self.body.is_none() {
            return JobDecision::NotMapping;
        }
        if self.has_property("timeout-minutes") {
            return JobDecision::HasTimeout;
        }
        if self.has_property("uses") {
            return JobDecision::ReusableWorkflow;
        }
        if self.flow_style && !self.has_property("runs-on") {
            return JobDecision::NoRunner;
        }
        JobDecision::Insert
    }
}

/// Every `jobs` mapping in the root mapping of `document`.
fn jobs_mappings(document: &Node) -> impl Iterator<Item = &[(Node, Node)]> {
    document
        .as_mapping()
        .unwrap_or_default()
        .iter()
        .filter(|(key, _)| key.key_str() == "jobs")
        .filter_map(|(_, value)| value.as_mapping())
}

/// Lists the jobs of every document.
pub(crate) fn jobs(documents: &[Node]) -> Vec<Job<'_>> {
    documents
        .iter()
        .flat_map(jobs_mappings)
        .flatten()
        .map(|(key, value)| Job::new(key, value))
        .collect()
}

/// Checks that the documents look like a GitHub workflow.
///
/// Every top-level key must be a known workflow key and at least one job must
/// carry `runs-on`, `uses` or `container`. A document with an unknown key
/// rejects the whole file.
pub(crate) fn is_github_workflow(documents: &[Node]) -> bool {
    for document in documents {
        let Some(root) = document.as_mapping() else {
            continue;
        };

        let unknown_key = root.iter().map(|(key, _)| key.key_str()).find(|key| {
            !key.is_empty() && !WORKFLOW_KEYS.contains(key)
        });
        if let Some(key) = unknown_key {
            debug!(key, "Unknown top-level key, not a GitHub workflow");
            return false;
        }

        let has_workflow_job = jobs_mappings(document)
            .flatten()
            .filter_map(|(_, value)| value.as_mapping())
            .any(|job| {
                job.iter()
                    .any(|(key, _)| WORKFLOW_JOB_KEYS.contains(&key.key_str()))
            });
        if has_workflow_job {
            return true;
        }
    }
    false
}

/// Positions of the job keys that need `timeout-minutes`, in document order.
pub(crate) fn insertion_positions(documents: &[Node]) -> Vec<Position> {
    jobs(documents)
        .into_iter()
        .filter_map(|job| match job.decision() {
            JobDecision::Insert => Some(job.key),
            decision => {
                debug!(job = job.name, ?decision, "Skipping job");
                None
            }
        })
        .collect()
}

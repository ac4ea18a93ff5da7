//! Concurrent rewriting of workflow files.
//!
//! Every file is transformed in memory first. Only when all of them succeed
//! are the changed ones written back, each through a temporary file in the
//! same directory that is renamed over the original.

mod discovery;
mod error;

pub use discovery::{discover_workflow_files, DEFAULT_IGNORE_DIRS};
pub use error::{RewriteError, TransformError};

use futures::stream::{self, StreamExt};
use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, info_span, Instrument};

/// Result of transforming a single file's content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transformed {
    /// The new content. Equal to the input when nothing changed.
    pub content: String,

    /// Whether the content differs from the input.
    pub changed: bool,
}

impl Transformed {
    /// Content returned as-is.
    pub fn unchanged(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            changed: false,
        }
    }

    /// Content that was rewritten.
    pub fn changed(content: String) -> Self {
        Self {
            content,
            changed: true,
        }
    }
}

/// A whole-file text transformation.
pub trait Transform: Sync {
    /// Error returned when the file must be left untouched.
    type Error: Into<TransformError>;

    /// Transforms the content of one file.
    fn transform(
        &self,
        content: &str,
    ) -> impl Future<Output = Result<Transformed, Self::Error>> + Send;
}

/// Options shared by every multi-file rewrite.
#[derive(Debug, Clone)]
pub struct RewriteOptions {
    /// Directory names skipped while searching for workflow files.
    pub ignore_dirs: Vec<String>,

    /// Maximum number of files transformed at once.
    pub concurrency: usize,
}

impl Default for RewriteOptions {
    fn default() -> Self {
        Self {
            ignore_dirs: DEFAULT_IGNORE_DIRS.iter().map(|dir| dir.to_string()).collect(),
            concurrency: 8,
        }
    }
}

/// Outcome of a multi-file rewrite.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteResult {
    /// Whether any file was written.
    pub changed: bool,

    /// Number of files written.
    pub file_count: usize,
}

struct PendingWrite {
    path: PathBuf,
    content: String,
}

/// Applies `transform` to `paths`, or to every workflow file under `root` if
/// `paths` is empty.
///
/// Relative paths are resolved against `root`. Discovered files that are not
/// valid UTF-8 are skipped; explicitly named ones are an error.
///
/// # Errors
///
/// Returns [`RewriteError`] if discovery, reading or transforming any file
/// fails, in which case nothing is written, or if writing a changed file fails.
pub async fn rewrite_files<T: Transform>(
    root: &Path,
    paths: &[PathBuf],
    options: &RewriteOptions,
    transform: &T,
) -> Result<RewriteResult, RewriteError> {
    let discovered = paths.is_empty();
    let files = if discovered {
        discover_workflow_files(root, &options.ignore_dirs)?
    } else {
        paths
            .iter()
            .map(|path| {
                if path.is_absolute() {
                    path.clone()
                } else {
                    root.join(path)
                }
            })
            .collect()
    };

    if files.is_empty() {
        info!(root = %root.display(), "No workflow files found");
        return Ok(RewriteResult::default());
    }

    info!(count = files.len(), "Processing workflow files");

    let results: Vec<Result<Option<PendingWrite>, RewriteError>> = stream::iter(files)
        .map(|path| {
            let span = info_span!("rewrite", path = %path.display());
            transform_file(path, discovered, transform).instrument(span)
        })
        .buffer_unordered(options.concurrency.max(1))
        .collect()
        .await;

    let mut pending = Vec::new();
    for result in results {
        if let Some(write) = result? {
            pending.push(write);
        }
    }
    pending.sort_by(|a, b| a.path.cmp(&b.path));

    for write in &pending {
        persist(&write.path, &write.content)?;
        info!(path = %write.path.display(), "Updated file");
    }

    Ok(RewriteResult {
        changed: !pending.is_empty(),
        file_count: pending.len(),
    })
}

async fn transform_file<T: Transform>(
    path: PathBuf,
    discovered: bool,
    transform: &T,
) -> Result<Option<PendingWrite>, RewriteError> {
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| RewriteError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

    let content = match String::from_utf8(bytes) {
        Ok(content) => content,
        Err(e) if discovered => {
            debug!(error = %e, "Not valid UTF-8, skipping");
            return Ok(None);
        }
        Err(e) => {
            return Err(RewriteError::EncodingError {
                path: path.display().to_string(),
                source: e,
            })
        }
    };

    let transformed =
        transform
            .transform(&content)
            .await
            .map_err(|e| RewriteError::Transform {
                path: path.display().to_string(),
                source: e.into(),
            })?;

    if !transformed.changed {
        debug!("No changes needed");
        return Ok(None);
    }

    Ok(Some(PendingWrite {
        path,
        content: transformed.content,
    }))
}

/// Replaces `path` with `content`, keeping the original permissions.
fn persist(path: &Path, content: &str) -> Result<(), RewriteError> {
    let write_error = |source: std::io::Error| RewriteError::WriteError {
        path: path.display().to_string(),
        source,
    };

    let directory = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let permissions = std::fs::metadata(path).map_err(write_error)?.permissions();

    let mut file = NamedTempFile::new_in(directory).map_err(write_error)?;
    file.write_all(content.as_bytes()).map_err(write_error)?;
    file.as_file()
        .set_permissions(permissions)
        .map_err(write_error)?;
    file.persist(path).map_err(|e| write_error(e.error))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeout::TimeoutError;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// Uppercases content, failing on files containing "fail".
    #[derive(Default)]
    struct Uppercase {
        calls: AtomicUsize,
    }

    impl Transform for Uppercase {
        type Error = TimeoutError;

        async fn transform(&self, content: &str) -> Result<Transformed, Self::Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if content.contains("fail") {
                return Err(TimeoutError::FlowStyleNotSupported);
            }
            let upper = content.to_uppercase();
            if upper == content {
                Ok(Transformed::unchanged(content))
            } else {
                Ok(Transformed::changed(upper))
            }
        }
    }

    fn write(root: &Path, relative: &str, content: &str) -> PathBuf {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    #[tokio::test]
    async fn rewrites_discovered_files() {
        let temp = TempDir::new().unwrap();
        let changed = write(temp.path(), ".github/workflows/a.yml", "jobs: a\n");
        let unchanged = write(temp.path(), ".github/workflows/b.yaml", "JOBS: B\n");
        let ignored = write(temp.path(), "node_modules/c.yml", "jobs: c\n");

        let transform = Uppercase::default();
        let result = rewrite_files(temp.path(), &[], &RewriteOptions::default(), &transform)
            .await
            .unwrap();

        assert_eq!(
            result,
            RewriteResult {
                changed: true,
                file_count: 1
            }
        );
        assert_eq!(transform.calls.load(Ordering::SeqCst), 2);
        assert_eq!(fs::read_to_string(changed).unwrap(), "JOBS: A\n");
        assert_eq!(fs::read_to_string(unchanged).unwrap(), "JOBS: B\n");
        assert_eq!(fs::read_to_string(ignored).unwrap(), "jobs: c\n");
    }

    #[tokio::test]
    async fn resolves_relative_paths_against_root() {
        let temp = TempDir::new().unwrap();
        let selected = write(temp.path(), "ci/one.yml", "one\n");
        let other = write(temp.path(), "ci/two.yml", "two\n");

        let result = rewrite_files(
            temp.path(),
            &[PathBuf::from("ci/one.yml")],
            &RewriteOptions::default(),
            &Uppercase::default(),
        )
        .await
        .unwrap();

        assert_eq!(result.file_count, 1);
        assert_eq!(fs::read_to_string(selected).unwrap(), "ONE\n");
        assert_eq!(fs::read_to_string(other).unwrap(), "two\n");
    }

    #[tokio::test]
    async fn failure_leaves_every_file_untouched() {
        let temp = TempDir::new().unwrap();
        let good = write(temp.path(), "a.yml", "good\n");
        let bad = write(temp.path(), "b.yml", "fail\n");

        let options = RewriteOptions {
            concurrency: 1,
            ..RewriteOptions::default()
        };
        let error = rewrite_files(temp.path(), &[], &options, &Uppercase::default())
            .await
            .unwrap_err();

        assert!(matches!(
            error,
            RewriteError::Transform {
                source: TransformError::Timeout(TimeoutError::FlowStyleNotSupported),
                ..
            }
        ));
        assert_eq!(fs::read_to_string(good).unwrap(), "good\n");
        assert_eq!(fs::read_to_string(bad).unwrap(), "fail\n");
    }

    #[tokio::test]
    async fn skips_discovered_files_that_are_not_utf8() {
        let temp = TempDir::new().unwrap();
        let valid = write(temp.path(), "a.yml", "valid\n");
        let latin1 = temp.path().join("b.yml");
        fs::write(&latin1, [0x6e, 0x61, 0x6d, 0x65, 0x3a, 0x20, 0xff, 0xfe, 0x0a]).unwrap();

        let transform = Uppercase::default();
        let result = rewrite_files(temp.path(), &[], &RewriteOptions::default(), &transform)
            .await
            .unwrap();

        assert_eq!(result.file_count, 1);
        assert_eq!(transform.calls.load(Ordering::SeqCst), 1);
        assert_eq!(fs::read_to_string(valid).unwrap(), "VALID\n");
        assert_eq!(
            fs::read(latin1).unwrap(),
            vec![0x6e, 0x61, 0x6d, 0x65, 0x3a, 0x20, 0xff, 0xfe, 0x0a]
        );
    }

    #[tokio::test]
    async fn named_file_that_is_not_utf8_is_an_error() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("b.yml"), [0xff, 0xfe]).unwrap();

        let error = rewrite_files(
            temp.path(),
            &[PathBuf::from("b.yml")],
            &RewriteOptions::default(),
            &Uppercase::default(),
        )
        .await
        .unwrap_err();

        assert!(matches!(error, RewriteError::EncodingError { .. }));
    }

    #[tokio::test]
    async fn missing_file_is_a_read_error() {
        let temp = TempDir::new().unwrap();

        let error = rewrite_files(
            temp.path(),
            &[PathBuf::from("missing.yml")],
            &RewriteOptions::default(),
            &Uppercase::default(),
        )
        .await
        .unwrap_err();

        assert!(matches!(error, RewriteError::IoError { .. }));
    }

    #[tokio::test]
    async fn empty_tree_is_unchanged() {
        let temp = TempDir::new().unwrap();

        let result = rewrite_files(
            temp.path(),
            &[],
            &RewriteOptions::default(),
            &Uppercase::default(),
        )
        .await
        .unwrap();

        assert_eq!(result, RewriteResult::default());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn keeps_file_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let path = write(temp.path(), "a.yml", "content\n");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o640)).unwrap();

        rewrite_files(temp.path(), &[], &RewriteOptions::default(), &Uppercase::default())
            .await
            .unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o640);
        assert_eq!(fs::read_to_string(&path).unwrap(), "CONTENT\n");
    }
}

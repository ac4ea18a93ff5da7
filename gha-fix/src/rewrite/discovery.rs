//! Workflow file discovery.

use crate::rewrite::RewriteError;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// Directories skipped when searching for workflow files.
pub const DEFAULT_IGNORE_DIRS: [&str; 13] = [
    ".git",
    "node_modules",
    "dist",
    "out",
    "vendor",
    ".idea",
    ".vscode",
    "bin",
    "build",
    "tmp",
    "coverage",
    ".cache",
    "__pycache__",
];

/// Finds every `.yml` and `.yaml` file under `root`, sorted by path.
///
/// Directories named in `ignore_dirs` are not descended into. The root itself
/// is always searched, whatever its name.
///
/// # Errors
///
/// Returns [`RewriteError::WalkError`] if a directory cannot be read.
pub fn discover_workflow_files(
    root: &Path,
    ignore_dirs: &[String],
) -> Result<Vec<PathBuf>, RewriteError> {
    let mut files = Vec::new();

    let walker = WalkDir::new(root)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_ignored_dir(entry, ignore_dirs));

    for entry in walker {
        let entry = entry.map_err(|e| RewriteError::WalkError {
            path: root.display().to_string(),
            source: e,
        })?;

        if entry.file_type().is_file() && is_workflow_file(entry.path()) {
            files.push(entry.into_path());
        }
    }

    files.sort();
    debug!(root = %root.display(), count = files.len(), "Discovered workflow files");
    Ok(files)
}

fn is_ignored_dir(entry: &DirEntry, ignore_dirs: &[String]) -> bool {
    entry.file_type().is_dir()
        && ignore_dirs
            .iter()
            .any(|dir| entry.file_name() == OsStr::new(dir))
}

fn is_workflow_file(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|extension| extension == "yml" || extension == "yaml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "name: test\n").unwrap();
    }

    fn default_ignore_dirs() -> Vec<String> {
        DEFAULT_IGNORE_DIRS.iter().map(|dir| dir.to_string()).collect()
    }

    fn relative(root: &Path, files: Vec<PathBuf>) -> Vec<String> {
        files
            .iter()
            .map(|path| path.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect()
    }

    #[test]
    fn finds_yml_and_yaml_files_sorted() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), ".github/workflows/test.yml");
        touch(temp.path(), ".github/workflows/build.yaml");
        touch(temp.path(), "action.yml");
        touch(temp.path(), "README.md");

        let files = discover_workflow_files(temp.path(), &default_ignore_dirs()).unwrap();

        assert_eq!(
            relative(temp.path(), files),
            vec![
                ".github/workflows/build.yaml",
                ".github/workflows/test.yml",
                "action.yml",
            ]
        );
    }

    #[test]
    fn skips_ignored_directories() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), ".github/workflows/ci.yml");
        touch(temp.path(), "node_modules/pkg/workflow.yml");
        touch(temp.path(), "nested/dist/workflow.yml");
        touch(temp.path(), "custom/workflow.yml");

        let mut ignore_dirs = default_ignore_dirs();
        ignore_dirs.push("custom".to_string());
        let files = discover_workflow_files(temp.path(), &ignore_dirs).unwrap();

        assert_eq!(relative(temp.path(), files), vec![".github/workflows/ci.yml"]);
    }

    #[test]
    fn ignore_list_only_matches_directories() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "build.yml");
        touch(temp.path(), "build/workflow.yml");

        let files = discover_workflow_files(temp.path(), &["build.yml".to_string()]).unwrap();

        assert_eq!(
            relative(temp.path(), files),
            vec!["build.yml", "build/workflow.yml"]
        );
    }

    #[test]
    fn missing_root_is_an_error() {
        let temp = TempDir::new().unwrap();
        let result = discover_workflow_files(&temp.path().join("missing"), &[]);
        assert!(matches!(result, Err(RewriteError::WalkError { .. })));
    }
}

//! Configuration loading.
//!
//! Settings come from an optional `gha-fix.toml`. Every key is optional and
//! falls back to the defaults below:
//!
//! ```toml
//! ignore-dirs = [".git", "node_modules"]
//! concurrency = 8
//!
//! [pin]
//! ignore-owners = ["actions"]
//! ignore-repos = ["docker/login-action"]
//! strict-pinning-202508 = false
//! github-token = "..."
//!
//! [timeout]
//! timeout-minutes = 5
//! ```

mod error;

pub use error::ConfigError;

use crate::pin::PinOptions;
use crate::rewrite::{RewriteOptions, DEFAULT_IGNORE_DIRS};
use serde::Deserialize;
use std::path::Path;
use tracing::{info, warn};

/// File name looked up by [`Config::discover`].
pub const CONFIG_FILE_NAME: &str = "gha-fix.toml";

/// Environment variable that overrides `pin.github-token`.
pub const GITHUB_TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    /// Directory names skipped while searching for workflow files.
    pub ignore_dirs: Vec<String>,

    /// Maximum number of files processed at once.
    pub concurrency: usize,

    /// Settings for pinning.
    pub pin: PinConfig,

    /// Settings for adding timeouts.
    pub timeout: TimeoutConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ignore_dirs: DEFAULT_IGNORE_DIRS.iter().map(|dir| dir.to_string()).collect(),
            concurrency: 8,
            pin: PinConfig::default(),
            timeout: TimeoutConfig::default(),
        }
    }
}

/// `[pin]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct PinConfig {
    /// Owners whose references are skipped.
    pub ignore_owners: Vec<String>,

    /// `owner/repo` repositories whose references are skipped.
    pub ignore_repos: Vec<String>,

    /// Pin actions from ignored owners anyway; reusable workflows stay ignored.
    pub strict_pinning_202508: bool,

    /// Token for the GitHub API. `GITHUB_TOKEN` takes precedence.
    pub github_token: Option<String>,
}

/// `[timeout]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct TimeoutConfig {
    /// Value written as `timeout-minutes`.
    pub timeout_minutes: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { timeout_minutes: 5 }
    }
}

impl Config {
    /// Loads and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid TOML, or
    /// holds out-of-range values.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::TomlError {
            path: path.display().to_string(),
            source: e,
        })?;

        config.validate(path)?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Loads `gha-fix.toml` from `dir`, or returns the defaults if there is none.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be loaded.
    pub fn discover(dir: &Path) -> Result<Self, ConfigError> {
        let path = dir.join(CONFIG_FILE_NAME);
        if !path.is_file() {
            warn!(path = %path.display(), "No configuration file, using defaults");
            return Ok(Self::default());
        }
        Self::load(&path)
    }

    fn validate(&self, path: &Path) -> Result<(), ConfigError> {
        if self.timeout.timeout_minutes == 0 {
            return Err(ConfigError::ValidationError {
                path: path.display().to_string(),
                message: "timeout.timeout-minutes must be greater than 0".to_string(),
            });
        }

        if self.concurrency == 0 {
            return Err(ConfigError::ValidationError {
                path: path.display().to_string(),
                message: "concurrency must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    /// Returns the GitHub token, preferring the `GITHUB_TOKEN` environment variable.
    pub fn github_token(&self) -> Option<String> {
        match std::env::var(GITHUB_TOKEN_ENV) {
            Ok(token) if !token.is_empty() => return Some(token),
            Ok(_) => warn!("{GITHUB_TOKEN_ENV} is empty, falling back to pin.github-token"),
            Err(_) => {}
        }

        let token = self.pin.github_token.clone().filter(|token| !token.is_empty());
        if token.is_none() {
            warn!("No GitHub token configured");
        }
        token
    }

    /// Returns the pin filters.
    pub fn pin_options(&self) -> PinOptions {
        PinOptions {
            ignore_owners: self.pin.ignore_owners.clone(),
            ignore_repos: self.pin.ignore_repos.clone(),
            strict_pinning_202508: self.pin.strict_pinning_202508,
        }
    }

    /// Returns the file discovery and concurrency settings.
    pub fn rewrite_options(&self) -> RewriteOptions {
        RewriteOptions {
            ignore_dirs: self.ignore_dirs.clone(),
            concurrency: self.concurrency,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_config(dir: &Path, content: &str) -> std::path::PathBuf {
        let path = dir.join(CONFIG_FILE_NAME);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn can_load_full_config() {
        let temp = TempDir::new().unwrap();
        let path = write_config(
            temp.path(),
            r#"
ignore-dirs = ["vendor"]
concurrency = 2

[pin]
ignore-owners = ["actions"]
ignore-repos = ["docker/login-action"]
strict-pinning-202508 = true
github-token = "file-token"

[timeout]
timeout-minutes = 30
"#,
        );

        let config = Config::load(&path).unwrap();

        assert_eq!(config.ignore_dirs, vec!["vendor"]);
        assert_eq!(config.concurrency, 2);
        assert_eq!(config.pin.ignore_owners, vec!["actions"]);
        assert_eq!(config.pin.ignore_repos, vec!["docker/login-action"]);
        assert!(config.pin.strict_pinning_202508);
        assert_eq!(config.pin.github_token.as_deref(), Some("file-token"));
        assert_eq!(config.timeout.timeout_minutes, 30);
    }

    #[test]
    fn missing_keys_use_defaults() {
        let temp = TempDir::new().unwrap();
        let path = write_config(temp.path(), "[pin]\nignore-owners = [\"Finatext\"]\n");

        let config = Config::load(&path).unwrap();

        assert_eq!(config.ignore_dirs.len(), DEFAULT_IGNORE_DIRS.len());
        assert!(config.ignore_dirs.contains(&"node_modules".to_string()));
        assert_eq!(config.concurrency, 8);
        assert_eq!(config.timeout.timeout_minutes, 5);
        assert!(!config.pin.strict_pinning_202508);
        assert_eq!(config.pin_options().ignore_owners, vec!["Finatext"]);
    }

    #[test]
    fn discover_without_file_returns_defaults() {
        let temp = TempDir::new().unwrap();

        let config = Config::discover(temp.path()).unwrap();

        assert_eq!(config.timeout.timeout_minutes, 5);
        assert_eq!(config.rewrite_options().concurrency, 8);
    }

    #[test]
    fn discover_reads_file() {
        let temp = TempDir::new().unwrap();
        write_config(temp.path(), "[timeout]\ntimeout-minutes = 12\n");

        let config = Config::discover(temp.path()).unwrap();

        assert_eq!(config.timeout.timeout_minutes, 12);
    }

    #[test]
    fn rejects_zero_timeout() {
        let temp = TempDir::new().unwrap();
        let path = write_config(temp.path(), "[timeout]\ntimeout-minutes = 0\n");

        let result = Config::load(&path);

        assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
    }

    #[test]
    fn rejects_zero_concurrency() {
        let temp = TempDir::new().unwrap();
        let path = write_config(temp.path(), "concurrency = 0\n");

        let result = Config::load(&path);

        assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
    }

    #[test]
    fn reports_invalid_toml() {
        let temp = TempDir::new().unwrap();
        let path = write_config(temp.path(), "[timeout\n");

        let result = Config::load(&path);

        assert!(matches!(result, Err(ConfigError::TomlError { .. })));
    }

    #[test]
    fn reports_missing_file() {
        let temp = TempDir::new().unwrap();

        let result = Config::load(&temp.path().join("missing.toml"));

        assert!(matches!(result, Err(ConfigError::IoError { .. })));
    }

    #[test]
    fn env_token_takes_precedence() {
        let config = Config {
            pin: PinConfig {
                github_token: Some("file-token".to_string()),
                ..PinConfig::default()
            },
            ..Config::default()
        };

        temp_env::with_var(GITHUB_TOKEN_ENV, Some("env-token"), || {
            assert_eq!(config.github_token().as_deref(), Some("env-token"));
        });

        temp_env::with_var_unset(GITHUB_TOKEN_ENV, || {
            assert_eq!(config.github_token().as_deref(), Some("file-token"));
        });

        temp_env::with_var(GITHUB_TOKEN_ENV, Some(""), || {
            assert_eq!(config.github_token().as_deref(), Some("file-token"));
        });
    }

    #[test]
    fn empty_file_token_is_not_a_token() {
        let config = Config {
            pin: PinConfig {
                github_token: Some(String::new()),
                ..PinConfig::default()
            },
            ..Config::default()
        };

        temp_env::with_var_unset(GITHUB_TOKEN_ENV, || {
            assert_eq!(config.github_token(), None);
        });
    }

    #[test]
    fn no_token_configured() {
        temp_env::with_var_unset(GITHUB_TOKEN_ENV, || {
            assert_eq!(Config::default().github_token(), None);
        });
    }
}

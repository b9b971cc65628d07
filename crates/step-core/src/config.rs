//! Configuration for artifact output.
//!
//! Uses the same `key=value` file format as the rest of the tooling:
//! blank lines and `#` comments are skipped, values may be quoted.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable overriding the project root.
pub const PROJECT_ROOT_ENV: &str = "STEP_PROJECT_ROOT";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("invalid config line: {0}")]
    InvalidLine(String),
    #[error("unknown config key: {0}")]
    UnknownKey(String),
}

/// Source of the project root path.
pub trait ConfigProvider {
    fn project_root(&self) -> &Path;
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Config {
    pub project_root: PathBuf,
    /// Report directory, relative to `project_root`.
    pub report_dir: PathBuf,
    /// Per-assertion screenshots, relative to `report_dir`.
    pub screenshots_dir: PathBuf,
    /// Failure screenshots, relative to `report_dir`.
    pub failure_screenshots_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project_root: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            report_dir: PathBuf::from("reports/html-report"),
            screenshots_dir: PathBuf::from("screenshots"),
            failure_screenshots_dir: PathBuf::from("failure_screenshots"),
        }
    }
}

impl ConfigProvider for Config {
    fn project_root(&self) -> &Path {
        &self.project_root
    }
}

impl Config {
    /// Defaults rooted at `project_root`.
    pub fn for_project(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            ..Self::default()
        }
    }

    /// Defaults, with the project root taken from `STEP_PROJECT_ROOT` if set.
    pub fn from_env() -> Self {
        match std::env::var_os(PROJECT_ROOT_ENV) {
            Some(root) if !root.is_empty() => Self::for_project(root),
            _ => Self::default(),
        }
    }

    /// Load config from a file, merging with defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.load_file(path)?;
        Ok(config)
    }

    /// Load and merge values from a config file.
    pub fn load_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(path)?;
        self.parse_content(&content)
    }

    fn parse_content(&mut self, content: &str) -> Result<(), ConfigError> {
        for line in content.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let Some((key, value)) = trimmed.split_once('=') else {
                return Err(ConfigError::InvalidLine(line.to_string()));
            };

            self.apply_value(key.trim(), &Self::unquote(value.trim()))?;
        }
        Ok(())
    }

    fn unquote(value: &str) -> String {
        if value.len() >= 2
            && ((value.starts_with('"') && value.ends_with('"'))
                || (value.starts_with('\'') && value.ends_with('\'')))
        {
            return value[1..value.len() - 1].to_string();
        }
        value.to_string()
    }

    fn apply_value(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "project_root" => self.project_root = PathBuf::from(value),
            "report_dir" => self.report_dir = PathBuf::from(value),
            "screenshots_dir" => self.screenshots_dir = PathBuf::from(value),
            "failure_screenshots_dir" => self.failure_screenshots_dir = PathBuf::from(value),
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }

    /// `<project_root>/<report_dir>`.
    pub fn report_root(&self) -> PathBuf {
        self.project_root.join(&self.report_dir)
    }
}

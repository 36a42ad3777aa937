//! Configuration management for mdatlas.
//!
//! Parses `mdatlas.toml` with serde and discovers it in the working directory
//! or any parent. Every section is optional: conversion needs only `[render]`,
//! and the publishing commands ask for their section with
//! [`Config::require_confluence`] or [`Config::require_jira`].
//!
//! CLI settings are applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String values in `[confluence]` and `[jira]` support:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default

mod expand;

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use expand::{expand_env, expand_opt};

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "mdatlas.toml";

/// CLI settings that override configuration file values.
///
/// Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    pub enable_math: Option<bool>,
    /// Override `confluence.space_key`.
    pub space_key: Option<String>,
    /// Override `jira.project_key`.
    pub project_key: Option<String>,
}

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub render: RenderConfig,
    pub confluence: Option<ConfluenceConfig>,
    pub jira: Option<JiraConfig>,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Rendering switches shared by every dialect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Render math spans with the dialect's math markup.
    pub enable_math: bool,
    /// Turn soft line breaks into hard breaks.
    pub preserve_line_breaks: bool,
    /// Drop the first level-1 heading when it supplied the title.
    pub strip_title: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            enable_math: false,
            preserve_line_breaks: true,
            strip_title: false,
        }
    }
}

/// Confluence configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct ConfluenceConfig {
    /// Confluence server base URL.
    pub base_url: String,
    pub username: String,
    /// API token used as the basic auth password.
    pub api_token: String,
    /// Space that pages are published into.
    pub space_key: String,
    /// Default parent page title.
    #[serde(default)]
    pub parent_page: Option<String>,
}

impl ConfluenceConfig {
    /// Validate that all required fields are properly set.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any field is empty or has invalid format.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.base_url, "confluence.base_url")?;
        require_http_url(&self.base_url, "confluence.base_url")?;
        require_non_empty(&self.username, "confluence.username")?;
        require_non_empty(&self.api_token, "confluence.api_token")?;
        require_non_empty(&self.space_key, "confluence.space_key")?;
        Ok(())
    }

    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.base_url = expand_env(&self.base_url, "confluence.base_url")?;
        self.username = expand_env(&self.username, "confluence.username")?;
        self.api_token = expand_env(&self.api_token, "confluence.api_token")?;
        self.space_key = expand_env(&self.space_key, "confluence.space_key")?;
        expand_opt(&mut self.parent_page, "confluence.parent_page")
    }
}

/// Jira configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct JiraConfig {
    /// Jira server base URL.
    pub base_url: String,
    pub username: String,
    /// API token used as the basic auth password.
    pub api_token: String,
    /// Project that issues are created in.
    pub project_key: String,
    #[serde(default = "default_issue_type")]
    pub issue_type: String,
    #[serde(default = "default_priority")]
    pub priority: String,
    #[serde(default)]
    pub assignee: Option<String>,
    /// Parent issue for created issues.
    #[serde(default)]
    pub parent_key: Option<String>,
    /// Component ids attached to created issues.
    #[serde(default)]
    pub components: Vec<String>,
    #[serde(default)]
    pub labels: Vec<String>,
}

impl JiraConfig {
    /// Validate that all required fields are properly set.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any field is empty or has invalid format.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.base_url, "jira.base_url")?;
        require_http_url(&self.base_url, "jira.base_url")?;
        require_non_empty(&self.username, "jira.username")?;
        require_non_empty(&self.api_token, "jira.api_token")?;
        require_non_empty(&self.project_key, "jira.project_key")?;
        require_non_empty(&self.issue_type, "jira.issue_type")?;
        require_non_empty(&self.priority, "jira.priority")?;
        Ok(())
    }

    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.base_url = expand_env(&self.base_url, "jira.base_url")?;
        self.username = expand_env(&self.username, "jira.username")?;
        self.api_token = expand_env(&self.api_token, "jira.api_token")?;
        self.project_key = expand_env(&self.project_key, "jira.project_key")?;
        self.issue_type = expand_env(&self.issue_type, "jira.issue_type")?;
        self.priority = expand_env(&self.priority, "jira.priority")?;
        expand_opt(&mut self.assignee, "jira.assignee")?;
        expand_opt(&mut self.parent_key, "jira.parent_key")
    }
}

fn default_issue_type() -> String {
    "Task".to_owned()
}

fn default_priority() -> String {
    "Medium".to_owned()
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`jira.api_token`").
        field: String,
        /// Error message (e.g., "${`JIRA_TOKEN`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a URL field to use http:// or https:// scheme.
fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

/// Mask a secret, keeping its last four characters.
#[must_use]
pub fn redact(secret: &str) -> String {
    let count = secret.chars().count();
    if count <= 4 {
        return "****".to_owned();
    }
    let tail: String = secret.chars().skip(count - 4).collect();
    format!("****{tail}")
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `mdatlas.toml` in current directory and parents,
    /// falling back to defaults when none exists.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails or
    /// an environment variable is missing.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(enable_math) = settings.enable_math {
            self.render.enable_math = enable_math;
        }
        if let Some(space_key) = &settings.space_key
            && let Some(confluence) = self.confluence.as_mut()
        {
            confluence.space_key.clone_from(space_key);
        }
        if let Some(project_key) = &settings.project_key
            && let Some(jira) = self.jira.as_mut()
        {
            jira.project_key.clone_from(project_key);
        }
    }

    /// Get validated Confluence configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if the section is missing or invalid.
    pub fn require_confluence(&self) -> Result<&ConfluenceConfig, ConfigError> {
        let conf = self.confluence.as_ref().ok_or_else(|| {
            ConfigError::Validation("[confluence] section required in config".into())
        })?;
        conf.validate()?;
        Ok(conf)
    }

    /// Get validated Jira configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if the section is missing or invalid.
    pub fn require_jira(&self) -> Result<&JiraConfig, ConfigError> {
        let jira = self
            .jira
            .as_ref()
            .ok_or_else(|| ConfigError::Validation("[jira] section required in config".into()))?;
        jira.validate()?;
        Ok(jira)
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;
        config.expand_env_vars()?;
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Expand environment variable references in publisher sections.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        if let Some(confluence) = self.confluence.as_mut() {
            confluence.expand_env_vars()?;
        }
        if let Some(jira) = self.jira.as_mut() {
            jira.expand_env_vars()?;
        }
        Ok(())
    }
}

/// TOML-like listing with API tokens redacted.
impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.config_path {
            Some(path) => writeln!(f, "# {}", path.display())?,
            None => writeln!(f, "# defaults (no {CONFIG_FILENAME} found)")?,
        }

        writeln!(f, "[render]")?;
        writeln!(f, "enable_math = {}", self.render.enable_math)?;
        writeln!(
            f,
            "preserve_line_breaks = {}",
            self.render.preserve_line_breaks
        )?;
        writeln!(f, "strip_title = {}", self.render.strip_title)?;

        if let Some(c) = &self.confluence {
            writeln!(f, "\n[confluence]")?;
            writeln!(f, "base_url = {:?}", c.base_url)?;
            writeln!(f, "username = {:?}", c.username)?;
            writeln!(f, "api_token = {:?}", redact(&c.api_token))?;
            writeln!(f, "space_key = {:?}", c.space_key)?;
            if let Some(parent) = &c.parent_page {
                writeln!(f, "parent_page = {parent:?}")?;
            }
        }

        if let Some(j) = &self.jira {
            writeln!(f, "\n[jira]")?;
            writeln!(f, "base_url = {:?}", j.base_url)?;
            writeln!(f, "username = {:?}", j.username)?;
            writeln!(f, "api_token = {:?}", redact(&j.api_token))?;
            writeln!(f, "project_key = {:?}", j.project_key)?;
            writeln!(f, "issue_type = {:?}", j.issue_type)?;
            writeln!(f, "priority = {:?}", j.priority)?;
            if let Some(assignee) = &j.assignee {
                writeln!(f, "assignee = {assignee:?}")?;
            }
            if let Some(parent) = &j.parent_key {
                writeln!(f, "parent_key = {parent:?}")?;
            }
            writeln!(f, "components = {:?}", j.components)?;
            writeln!(f, "labels = {:?}", j.labels)?;
        }
        Ok(())
    }
}

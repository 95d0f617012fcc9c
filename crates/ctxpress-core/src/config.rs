//! Configuration management for ctxpress
//!
//! Supports feature-specific configuration sections:
//! - [diff] - change filtering and diff simplification settings
//! - [advisor] - token budget and tokenizer settings
//! - [log] - logging settings

use crate::error::{CoreError, CoreResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Current configuration version
pub const CURRENT_CONFIG_VERSION: &str = "1";

/// Supported configuration versions
pub const SUPPORTED_CONFIG_VERSIONS: &[&str] = &["1"];

/// File name of the per-repository config
pub const REPO_CONFIG_FILE: &str = ".ctxpress.toml";

static ENV_VAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$([A-Z_][A-Z0-9_]*)").expect("valid env var regex"));

/// Root configuration structure supporting multiple features
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Configuration version for tracking schema changes
    #[serde(default = "default_config_version")]
    pub version: String,

    /// Diff simplification configuration
    #[serde(default)]
    pub diff: Option<DiffConfig>,

    /// Prompt advisor configuration
    #[serde(default)]
    pub advisor: Option<AdvisorConfig>,

    /// Logging configuration
    #[serde(default)]
    pub log: Option<LogConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_config_version(),
            diff: None,
            advisor: None,
            log: None,
        }
    }
}

/// Configuration for change filtering and diff simplification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffConfig {
    /// Path patterns (`glob:`, `regex:` or bare glob) excluded from diffs
    #[serde(default)]
    pub ignore_patterns: Vec<String>,

    /// Maximum number of changes handed to the patch builder
    #[serde(default = "default_max_changes")]
    pub max_changes: usize,

    /// Changes with more bytes than this are skipped
    #[serde(default = "default_large_file_threshold_bytes")]
    pub large_file_threshold_bytes: u64,

    /// Emit context lines around changed lines
    #[serde(default = "default_true")]
    pub include_context: bool,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            ignore_patterns: Vec::new(),
            max_changes: default_max_changes(),
            large_file_threshold_bytes: default_large_file_threshold_bytes(),
            include_context: true,
        }
    }
}

/// Configuration for the prompt strategy advisor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisorConfig {
    /// Tokens available for code in a prompt
    #[serde(default = "default_token_budget")]
    pub token_budget: usize,

    /// Model or encoding name used to count tokens
    #[serde(default = "default_encoding")]
    pub encoding: String,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            token_budget: default_token_budget(),
            encoding: default_encoding(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Write logs to this file instead of stderr
    #[serde(default)]
    pub file: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_config_version() -> String {
    CURRENT_CONFIG_VERSION.to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_changes() -> usize {
    500
}

// 20 MiB, the content loading limit for a single file
fn default_large_file_threshold_bytes() -> u64 {
    20 * 1024 * 1024
}

fn default_token_budget() -> usize {
    2048
}

fn default_encoding() -> String {
    "cl100k_base".to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}

/// Get the configuration home directory
/// Respects XDG_CONFIG_HOME environment variable
pub fn get_config_home() -> Option<PathBuf> {
    std::env::var_os("XDG_CONFIG_HOME")
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
}

impl Config {
    /// Check if the configuration version is supported
    pub fn is_version_supported(&self) -> bool {
        SUPPORTED_CONFIG_VERSIONS.contains(&self.version.as_str())
    }

    /// Get a warning message for unsupported versions
    pub fn version_warning(&self) -> Option<String> {
        if !self.is_version_supported() {
            Some(format!(
                "Configuration version '{}' is not supported. Supported versions: {}. Using defaults where needed.",
                self.version,
                SUPPORTED_CONFIG_VERSIONS.join(", ")
            ))
        } else {
            None
        }
    }

    pub fn diff_config(&self) -> DiffConfig {
        self.diff.clone().unwrap_or_default()
    }

    pub fn advisor_config(&self) -> AdvisorConfig {
        self.advisor.clone().unwrap_or_default()
    }

    pub fn log_config(&self) -> LogConfig {
        self.log.clone().unwrap_or_default()
    }

    /// Load configuration from file
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| CoreError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Config =
            toml::from_str(&content).map_err(|e| CoreError::ConfigParse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        // Set to current version if empty
        if config.version.is_empty() {
            config.version = CURRENT_CONFIG_VERSION.to_string();
        }

        Ok(config)
    }

    /// Get the default config directory path
    pub fn get_config_dir() -> Option<PathBuf> {
        get_config_home().map(|home| home.join("ctxpress"))
    }

    /// Load configuration with priority:
    /// 1. Defaults
    /// 2. Global config ($XDG_CONFIG_HOME/ctxpress/config.toml)
    /// 3. Repo config (.ctxpress.toml in the current directory)
    /// 4. Explicit config file
    pub fn load(custom_config: Option<&str>) -> CoreResult<Self> {
        Self::load_layered(
            Self::get_config_dir().as_deref(),
            Path::new("."),
            custom_config,
        )
    }

    /// Same as [`Config::load`] with the global and repo locations spelled out
    pub fn load_layered(
        global_dir: Option<&Path>,
        repo_dir: &Path,
        custom_config: Option<&str>,
    ) -> CoreResult<Self> {
        let mut config = Self::default();

        if let Some(global_dir) = global_dir {
            let global_config = global_dir.join("config.toml");
            if global_config.exists() {
                config = config.merge(Self::load_from_file(&global_config)?);
            }
        }

        let repo_config = repo_dir.join(REPO_CONFIG_FILE);
        if repo_config.exists() {
            config = config.merge(Self::load_from_file(&repo_config)?);
        }

        if let Some(custom_config) = custom_config {
            let custom_path = PathBuf::from(expand_path(custom_config));
            config = config.merge(Self::load_from_file(&custom_path)?);
        }

        if let Some(log) = config.log.as_mut() {
            log.file = log.file.as_deref().map(expand_path);
        }

        Ok(config)
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(mut self, other: Config) -> Self {
        if !other.version.is_empty() {
            self.version = other.version;
        }
        if other.diff.is_some() {
            self.diff = other.diff;
        }
        if other.advisor.is_some() {
            self.advisor = other.advisor;
        }
        if other.log.is_some() {
            self.log = other.log;
        }
        self
    }
}

/// Expand tilde and environment variables in paths
pub fn expand_path(path: &str) -> String {
    let mut expanded = path.to_string();

    if expanded.starts_with("~/") {
        if let Some(home) = dirs::home_dir() {
            expanded = expanded.replacen("~/", &format!("{}/", home.display()), 1);
        }
    } else if expanded == "~" {
        if let Some(home) = dirs::home_dir() {
            expanded = home.to_string_lossy().to_string();
        }
    }

    if expanded.contains('$') {
        expanded = ENV_VAR_RE
            .replace_all(&expanded, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${}", var_name))
            })
            .to_string();
    }

    expanded
}

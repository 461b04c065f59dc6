use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::github::DEFAULT_API_URL;

pub const CONFIG_FILE: &str = ".changed-files.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Input required and not supplied: repo-token")]
    MissingToken,
}

/// Optional settings loaded from .changed-files.toml.
/// Every field can also be supplied on the command line or through the environment,
/// which take precedence.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub github: GitHubConfig,

    #[serde(default)]
    pub filter: FilterConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GitHubConfig {
    /// GitHub API token. If None, falls back to GITHUB_TOKEN env var.
    pub token: Option<String>,
    /// REST API root, for GitHub Enterprise Server
    pub api_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterConfig {
    /// Regex applied to changed filenames
    pub pattern: Option<String>,
}

impl Config {
    /// Load configuration from .changed-files.toml in the current directory.
    /// Returns default config if the file doesn't exist.
    pub fn load() -> Result<Config, ConfigError> {
        let path = Path::new(CONFIG_FILE);
        if path.exists() {
            Self::load_from(path)
        } else {
            Ok(Config::default())
        }
    }

    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Resolve the repo token: explicit input first, then the config file,
    /// then GITHUB_TOKEN. Blank values count as absent.
    pub fn repo_token(&self, input: Option<&str>) -> Result<String, ConfigError> {
        let present = |t: &String| !t.trim().is_empty();
        input
            .map(str::to_string)
            .filter(present)
            .or_else(|| self.github.token.clone().filter(present))
            .or_else(|| std::env::var("GITHUB_TOKEN").ok().filter(present))
            .ok_or(ConfigError::MissingToken)
    }

    pub fn api_url(&self, input: Option<&str>) -> String {
        input
            .map(str::to_string)
            .or_else(|| self.github.api_url.clone())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
    }

    pub fn pattern(&self, input: Option<&str>) -> Option<String> {
        input
            .map(str::to_string)
            .or_else(|| self.filter.pattern.clone())
    }
}

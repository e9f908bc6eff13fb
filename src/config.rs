use crate::error::{ReleaseError, Result};
use crate::history::{DEFAULT_MAX_PAGES, DEFAULT_PAGE_SIZE};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// File name looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "releasetagger.toml";

/// Represents the complete configuration for release-tagger.
///
/// Every key is optional in the file; the trunk branch may instead come from the command line.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub trunk_branch: Option<String>,

    #[serde(default)]
    pub history: HistoryConfig,

    #[serde(default)]
    pub publish: PublishConfig,
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_max_pages() -> usize {
    DEFAULT_MAX_PAGES
}

/// How commit history is paged while looking for a boundary commit.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct HistoryConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Page ceiling per walk; 0 means no ceiling
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        HistoryConfig {
            page_size: default_page_size(),
            max_pages: default_max_pages(),
        }
    }
}

impl HistoryConfig {
    pub fn page_ceiling(&self) -> Option<usize> {
        (self.max_pages > 0).then_some(self.max_pages)
    }
}

fn default_tagger_name() -> String {
    "release-tagger".to_string()
}

fn default_tagger_email() -> String {
    "release-tagger@localhost".to_string()
}

/// Where refs are published and who signs the tag objects.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PublishConfig {
    /// Remote to fetch from and push every written ref to; local only when unset
    #[serde(default)]
    pub remote: Option<String>,

    #[serde(default = "default_tagger_name")]
    pub tagger_name: String,

    #[serde(default = "default_tagger_email")]
    pub tagger_email: String,
}

impl Default for PublishConfig {
    fn default() -> Self {
        PublishConfig {
            remote: None,
            tagger_name: default_tagger_name(),
            tagger_email: default_tagger_email(),
        }
    }
}

impl Config {
    /// Trunk branch from the command line, else from the file.
    pub fn resolve_trunk(&self, from_cli: Option<&str>) -> Result<String> {
        from_cli
            .or(self.trunk_branch.as_deref())
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                ReleaseError::config(
                    "No trunk branch given. Pass --trunk <BRANCH> or set trunk_branch in releasetagger.toml",
                )
            })
    }
}

/// Parse configuration from TOML text
pub fn parse_config(text: &str) -> Result<Config> {
    toml::from_str(text).map_err(|e| ReleaseError::config(format!("Invalid configuration: {}", e)))
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `releasetagger.toml` in current directory
/// 3. `.releasetagger.toml` in the user config directory
/// 4. Default configuration if no file found
///
/// # Returns
/// * `Ok(Config)` - Loaded or default configuration
/// * `Err` - If a file exists but cannot be read or parsed
pub fn load_config(config_path: Option<&str>) -> Result<Config> {
    let config_str = if let Some(path) = config_path {
        fs::read_to_string(path)?
    } else if Path::new(CONFIG_FILE_NAME).exists() {
        fs::read_to_string(CONFIG_FILE_NAME)?
    } else if let Some(config_dir) = dirs::config_dir() {
        let config_path = config_dir.join(format!(".{}", CONFIG_FILE_NAME));
        if config_path.exists() {
            fs::read_to_string(config_path)?
        } else {
            return Ok(Config::default());
        }
    } else {
        return Ok(Config::default());
    };

    parse_config(&config_str)
}

use crate::actions::Capabilities;
use crate::api::TreeStatus;
use crate::error::{NavigatorError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const API_URL_ENV: &str = "ORG_NAVIGATOR_API_URL";
pub const TOKEN_ENV: &str = "ORG_NAVIGATOR_TOKEN";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub tree: TreeConfig,
    pub capabilities: Capabilities,
    pub layout: LayoutConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub token: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    pub show_inactive: bool,
    pub status: TreeStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Percentage of the width given to the tree pane
    pub tree_panel_width: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api".to_string(),
            token: None,
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            tree_panel_width: 55,
        }
    }
}

impl LayoutConfig {
    pub fn tree_percentage(&self) -> u16 {
        self.tree_panel_width.clamp(20, 80)
    }
}

impl Config {
    /// `$XDG_CONFIG_HOME/org-navigator/config.toml` or the platform equivalent
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("org-navigator").join("config.toml"))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            NavigatorError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Explicit path (must exist), else the default path when present, else
    /// defaults. Environment overrides are applied last.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::load_from_file(path)?,
            None => match Self::default_path().filter(|path| path.is_file()) {
                Some(path) => {
                    log::info!("Loading config from {}", path.display());
                    Self::load_from_file(&path)?
                }
                None => {
                    log::debug!("No config file found, using defaults");
                    Self::default()
                }
            },
        };
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                self.api.base_url = url;
            }
        }
        if let Ok(token) = std::env::var(TOKEN_ENV) {
            self.api.token = Some(token).filter(|t| !t.is_empty());
        }
    }

    pub fn with_api_url(mut self, api_url: Option<String>) -> Self {
        if let Some(url) = api_url {
            self.api.base_url = url;
        }
        self
    }
}

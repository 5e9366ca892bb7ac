use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_USER_AGENT: &str = "hubtool/0.1";
pub const DEFAULT_API_URL: &str = "https://api.amplience.net/v2/content";
pub const DEFAULT_AUTH_URL: &str = "https://auth.amplience.net/oauth/token";
pub const DEFAULT_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct HubConfig {
    #[serde(default)]
    pub hub: HubSection,
    #[serde(skip)]
    pub overrides: CredentialOverrides,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct HubSection {
    pub api_url: Option<String>,
    pub auth_url: Option<String>,
    pub hub_id: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub user_agent: Option<String>,
    pub page_size: Option<usize>,
}

/// Values given on the command line. They win over env and the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialOverrides {
    pub hub_id: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

/// Settings after layering flag > env > config file > default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubSettings {
    pub api_url: String,
    pub auth_url: String,
    pub hub_id: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub user_agent: String,
    pub page_size: usize,
}

impl HubConfig {
    /// Keep command-line credentials alongside the loaded file.
    pub fn with_overrides(mut self, overrides: &CredentialOverrides) -> Self {
        self.overrides = overrides.clone();
        self
    }

    pub fn resolve_with_lookup<F>(&self, lookup_env: F) -> HubSettings
    where
        F: Fn(&str) -> Option<String>,
    {
        let layered = |flag: Option<&str>, key: &str, file: Option<&str>| {
            non_empty(flag)
                .or_else(|| non_empty(lookup_env(key).as_deref()))
                .or_else(|| non_empty(file))
        };
        let hub = &self.hub;
        let overrides = &self.overrides;

        HubSettings {
            api_url: layered(None, "HUB_API_URL", hub.api_url.as_deref())
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            auth_url: layered(None, "HUB_AUTH_URL", hub.auth_url.as_deref())
                .unwrap_or_else(|| DEFAULT_AUTH_URL.to_string()),
            hub_id: layered(
                overrides.hub_id.as_deref(),
                "HUB_ID",
                hub.hub_id.as_deref(),
            ),
            client_id: layered(
                overrides.client_id.as_deref(),
                "HUB_CLIENT_ID",
                hub.client_id.as_deref(),
            ),
            client_secret: layered(
                overrides.client_secret.as_deref(),
                "HUB_CLIENT_SECRET",
                hub.client_secret.as_deref(),
            ),
            user_agent: layered(None, "HUB_USER_AGENT", hub.user_agent.as_deref())
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            page_size: match hub.page_size {
                Some(size) if size > 0 => size,
                _ => DEFAULT_PAGE_SIZE,
            },
        }
    }
}

/// Load and parse a HubConfig from a TOML file. Returns default if file doesn't exist.
pub fn load_config(config_path: &Path) -> Result<HubConfig> {
    if !config_path.exists() {
        return Ok(HubConfig::default());
    }
    let content = fs::read_to_string(config_path)
        .with_context(|| format!("failed to read {}", config_path.display()))?;
    let parsed: HubConfig = toml::from_str(&content)
        .with_context(|| format!("failed to parse {}", config_path.display()))?;
    Ok(parsed)
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

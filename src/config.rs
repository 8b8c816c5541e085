use crate::error::{Error, Result};
use crate::finnotech::ClientIdentity;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use url::Url;

const CONFIG_DIR_PREFIX: &str = "finnotech";

const SANDBOX_BASE_URL: &str = "https://apibeta.finnotech.ir";
const LIVE_BASE_URL: &str = "https://api.finnotech.ir";

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    pub finnotech: FinnotechConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct FinnotechConfig {
    pub client_id: String,
    pub client_secret: String,
    /// National id of the client owner, sent with client-credentials requests
    pub nid: String,
    #[serde(default)]
    pub sandbox: bool,
    /// Overrides the sandbox/live host, e.g. for a proxy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl FinnotechConfig {
    pub fn api_base_url(&self) -> String {
        if let Some(base_url) = &self.base_url {
            return base_url.trim_end_matches('/').to_string();
        }

        match self.sandbox {
            true => SANDBOX_BASE_URL.to_string(),
            false => LIVE_BASE_URL.to_string(),
        }
    }

    pub fn identity(&self) -> ClientIdentity {
        ClientIdentity {
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            nid: self.nid.clone(),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.client_id.is_empty() || self.client_secret.is_empty() {
            return Err(Error::Config(
                "Finnotech client_id and client_secret must be set in config file".to_string(),
            ));
        }

        if self.nid.is_empty() {
            return Err(Error::Config(
                "Finnotech nid must be set in config file".to_string(),
            ));
        }

        if let Some(base_url) = &self.base_url {
            let url = Url::parse(base_url)
                .map_err(|e| Error::Config(format!("Invalid base_url {:?}: {}", base_url, e)))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(Error::Config(format!(
                    "base_url must use http or https, got {}",
                    url.scheme()
                )));
            }
        }

        Ok(())
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_file()?;

        if !config_path.exists() {
            return Err(Error::Config(format!(
                "Config file not found at {:?}. Please create one.",
                config_path
            )));
        }

        let contents = fs::read_to_string(&config_path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;

        config.finnotech.validate()?;

        Ok(config)
    }

    fn xdg_dirs() -> xdg::BaseDirectories {
        xdg::BaseDirectories::with_prefix(CONFIG_DIR_PREFIX)
    }

    /// Get the config file path
    pub fn config_file() -> Result<PathBuf> {
        let xdg_dirs = Self::xdg_dirs();
        xdg_dirs
            .place_config_file("config.toml")
            .map_err(|e| Error::Config(format!("Failed to create config directory: {}", e)))
    }

    /// Get a cache file path
    pub fn cache_file(filename: &str) -> Result<PathBuf> {
        let xdg = Self::xdg_dirs();
        xdg.place_cache_file(filename)
            .map_err(|e| Error::Config(format!("Failed to create cache file path: {}", e)))
    }
}

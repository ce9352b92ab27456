//! Application configuration.
//!
//! The backend endpoint and API key come from the environment (usually via
//! a `.env` file); small persisted preferences such as the last login email
//! live in `config.json` under the user's config directory.

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// Application name used for config/cache/data directory paths.
const APP_NAME: &str = "crewcache";

/// Config file name.
const CONFIG_FILE: &str = "config.json";

/// Environment variable naming the backend project URL.
pub const BACKEND_URL_VAR: &str = "CREWCACHE_BACKEND_URL";

/// Environment variable holding the backend API key.
pub const API_KEY_VAR: &str = "CREWCACHE_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct Prefs {
    last_email: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub backend_url: String,
    pub api_key: String,
    pub last_email: Option<String>,
    /// Profile name; isolates the demo backend's state from the real one.
    profile: String,
    /// When set, cache and data live under this directory instead of the
    /// platform defaults.
    base_dir: Option<PathBuf>,
}

impl Config {
    /// Load the backend endpoint from the environment and merge in the
    /// persisted preferences.
    pub fn from_env() -> Result<Self> {
        let backend_url = std::env::var(BACKEND_URL_VAR).ok();
        let api_key = std::env::var(API_KEY_VAR).ok();
        let (backend_url, api_key) = match (backend_url, api_key) {
            (Some(url), Some(key)) if !url.is_empty() && !key.is_empty() => (url, key),
            _ => {
                return Err(anyhow!(
                    "Missing backend environment variables ({} and {}). Please check your .env file.",
                    BACKEND_URL_VAR,
                    API_KEY_VAR
                ))
            }
        };

        let prefs = Self::load_prefs().unwrap_or_default();
        Ok(Self {
            backend_url,
            api_key,
            last_email: prefs.last_email,
            profile: "default".to_string(),
            base_dir: None,
        })
    }

    /// Configuration for the built-in demo backend: no endpoint, and state
    /// kept under a separate profile so it never mixes with real data.
    pub fn demo() -> Self {
        Self {
            backend_url: String::new(),
            api_key: String::new(),
            last_email: None,
            profile: "demo".to_string(),
            base_dir: None,
        }
    }

    /// Keep all persisted state under `dir` instead of the platform
    /// config/cache directories.
    pub fn with_base_dir(mut self, dir: PathBuf) -> Self {
        self.base_dir = Some(dir);
        self
    }

    /// Persist the preferences (not the endpoint or key).
    pub fn save(&self) -> Result<()> {
        let path = self.config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let prefs = Prefs {
            last_email: self.last_email.clone(),
        };
        let contents = serde_json::to_string_pretty(&prefs)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn load_prefs() -> Result<Prefs> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not find config directory"))?;
        let path = config_dir.join(APP_NAME).join(CONFIG_FILE);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Prefs::default())
        }
    }

    fn config_path(&self) -> Result<PathBuf> {
        if let Some(ref base) = self.base_dir {
            return Ok(base.join(CONFIG_FILE));
        }
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory for the persisted cache mirrors (session-scoped state).
    pub fn cache_dir(&self) -> Result<PathBuf> {
        if let Some(ref base) = self.base_dir {
            return Ok(base.join("cache"));
        }
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME).join(&self.profile))
    }

    /// Directory for durable state (the auth snapshot).
    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(ref base) = self.base_dir {
            return Ok(base.join("data"));
        }
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME).join(&self.profile))
    }

    pub fn is_demo(&self) -> bool {
        self.profile == "demo"
    }
}

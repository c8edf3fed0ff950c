//! # Configuration Management
//!
//! This module loads the dashboard settings from a TOML file chosen by the
//! `SPLASH_ENV` environment selector. It provides the forecasting API roots and
//! seawall coordinates for each site, plus runtime flags.
//!
//! | `SPLASH_ENV` | file |
//! |---|---|
//! | `local` | `config/splash.local.toml` |
//! | `docker` | `config/splash.docker.toml` |
//! | `staging` | `config/splash.staging.toml` |
//! | anything else | `config/splash.production.toml` |
//!
//! `DAWLISH_API_ENDPOINT` and `PENZANCE_API_ENDPOINT` override the API roots
//! read from the file.

use crate::Site;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

/// Environment variable selecting which settings file to load
pub const ENV_SELECTOR: &str = "SPLASH_ENV";

/// Dashboard configuration loaded from the selected settings file
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub dawlish: SiteConfig,
    pub penzance: SiteConfig,
    pub app: AppConfig,
}

/// Forecasting backend and seawall location for one site
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SiteConfig {
    /// Root URL of the site's forecasting API (resources are appended)
    pub api_root: String,
    pub lat_seawall: f64,
    pub lon_seawall: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Verbose logging
    pub debug: bool,
    /// Per-request timeout for backend calls
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            dawlish: SiteConfig {
                api_root: "http://localhost:8000/dawlish".to_string(),
                lat_seawall: 50.5806,
                lon_seawall: -3.4637,
            },
            penzance: SiteConfig {
                api_root: "http://localhost:8000/penzance".to_string(),
                lat_seawall: 50.1150,
                lon_seawall: -5.5330,
            },
            app: AppConfig {
                debug: false,
                request_timeout_secs: 30,
            },
        }
    }
}

/// Settings file path for a `SPLASH_ENV` value
pub fn config_path_for(environment: Option<&str>) -> &'static str {
    match environment {
        Some("local") => "config/splash.local.toml",
        Some("docker") => "config/splash.docker.toml",
        Some("staging") => "config/splash.staging.toml",
        _ => "config/splash.production.toml",
    }
}

impl Config {
    /// Load the settings file selected by `SPLASH_ENV`, then apply endpoint
    /// overrides from the environment.
    pub fn load() -> Self {
        let environment = env::var(ENV_SELECTOR).ok();
        let mut config = Self::load_from_path(config_path_for(environment.as_deref()));
        config.apply_env_overrides();
        config
    }

    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(config) => {
                    info!("Loaded dashboard configuration from {}", path.display());
                    config
                }
                Err(e) => {
                    warn!("Invalid config file format in {}: {}", path.display(), e);
                    warn!("Using default configuration");
                    Self::default()
                }
            },
            Err(_) => {
                info!(
                    "No config file found at {}, using default configuration",
                    path.display()
                );
                Self::default()
            }
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(root) = env::var("DAWLISH_API_ENDPOINT") {
            self.dawlish.api_root = root;
        }
        if let Ok(root) = env::var("PENZANCE_API_ENDPOINT") {
            self.penzance.api_root = root;
        }
    }

    pub fn site(&self, site: Site) -> &SiteConfig {
        match site {
            Site::Dawlish => &self.dawlish,
            Site::Penzance => &self.penzance,
        }
    }
}

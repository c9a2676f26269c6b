//! Configuration System using Figment
//!
//! Configuration is layered, later sources overriding earlier ones:
//! 1. Built-in defaults
//! 2. `config/chemion.toml` (or a file given on the command line)
//! 3. Environment variables prefixed with `CHEMION_`, using `__` between sections
//!
//! # Example
//! ```no_run
//! use chemion_designer::config::DesignerConfig;
//!
//! // CHEMION_SERVICE__BASE_URL=http://glasses.local:8000 overrides the file
//! let config = DesignerConfig::load()?;
//! println!("Backend: {}", config.service.base_url);
//! # Ok::<(), figment::Error>(())
//! ```

use crate::grid::Intensity;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file location.
pub const DEFAULT_CONFIG_PATH: &str = "config/chemion.toml";

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DesignerConfig {
    /// Application settings
    #[serde(default)]
    pub application: ApplicationConfig,
    /// Glasses backend settings
    #[serde(default)]
    pub service: ServiceConfig,
    /// Canvas settings
    #[serde(default)]
    pub designer: CanvasConfig,
}

/// Application-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Application name
    pub name: String,
    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Log output format (pretty, compact, json)
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

/// Glasses backend configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Base URL of the HTTP backend
    pub base_url: String,
}

/// Canvas configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasConfig {
    /// Brush intensity at startup
    #[serde(default = "default_intensity")]
    pub default_intensity: Intensity,
}

// Default value functions
fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_intensity() -> Intensity {
    Intensity::Full
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: "chemion-designer".to_string(),
            log_level: "info".to_string(),
            log_format: default_log_format(),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
        }
    }
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            default_intensity: default_intensity(),
        }
    }
}

impl DesignerConfig {
    /// Load configuration from `config/chemion.toml` and environment variables
    ///
    /// A missing file is not an error; defaults and the environment still apply.
    pub fn load() -> Result<Self, figment::Error> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from a specific file path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, figment::Error> {
        Self::figment(path).extract()
    }

    /// The layered provider stack, exposed for callers that add their own layers.
    pub fn figment<P: AsRef<Path>>(path: P) -> Figment {
        Figment::from(Serialized::defaults(DesignerConfig::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("CHEMION_").split("__"))
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        let level = self.application.log_level.to_lowercase();
        if !valid_levels.contains(&level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.application.log_level,
                valid_levels.join(", ")
            ));
        }

        let valid_formats = ["pretty", "compact", "json"];
        let format = self.application.log_format.to_lowercase();
        if !valid_formats.contains(&format.as_str()) {
            return Err(format!(
                "Invalid log_format '{}'. Must be one of: {}",
                self.application.log_format,
                valid_formats.join(", ")
            ));
        }

        let url = reqwest::Url::parse(&self.service.base_url)
            .map_err(|e| format!("Invalid service base_url '{}': {}", self.service.base_url, e))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(format!(
                "Invalid service base_url '{}': scheme must be http or https",
                self.service.base_url
            ));
        }

        Ok(())
    }
}

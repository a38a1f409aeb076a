//! Persisted prompt defaults
//!
//! Non-secret answers from previous runs, reloaded as the defaults for
//! the next run's prompts. Credentials are never written here.

use serde::{Deserialize, Serialize};

use crate::config::file::File;
use crate::errors::DeployError;

/// Saved prompt defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedDefaults {
    #[serde(default = "default_resource_group")]
    pub resource_group: String,

    #[serde(default = "default_registry")]
    pub registry: String,

    #[serde(default = "default_region")]
    pub region: String,

    #[serde(default = "default_instance_base")]
    pub instance_base: String,

    #[serde(default = "default_image_base")]
    pub image_base: String,

    #[serde(default = "default_cpu")]
    pub cpu: f64,

    #[serde(default = "default_memory_gb")]
    pub memory_gb: f64,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_context_dir")]
    pub context_dir: String,

    /// Collision suffix from the first run of this configuration.
    /// Re-runs reuse it so they converge on the same instance instead
    /// of leaking a new one per run.
    #[serde(default)]
    pub suffix: Option<String>,
}

fn default_resource_group() -> String {
    "weather-mcp-rg".to_string()
}

fn default_registry() -> String {
    "weathermcpacr".to_string()
}

fn default_region() -> String {
    "eastus".to_string()
}

fn default_instance_base() -> String {
    "weather-mcp".to_string()
}

fn default_image_base() -> String {
    "weather-mcp".to_string()
}

fn default_cpu() -> f64 {
    1.0
}

fn default_memory_gb() -> f64 {
    1.5
}

fn default_port() -> u16 {
    8000
}

fn default_context_dir() -> String {
    ".".to_string()
}

impl Default for SavedDefaults {
    fn default() -> Self {
        Self {
            resource_group: default_resource_group(),
            registry: default_registry(),
            region: default_region(),
            instance_base: default_instance_base(),
            image_base: default_image_base(),
            cpu: default_cpu(),
            memory_gb: default_memory_gb(),
            port: default_port(),
            context_dir: default_context_dir(),
            suffix: None,
        }
    }
}

/// Location of the settings file (`~/.skylift/settings.json`)
pub fn settings_file() -> File {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    File::new(format!("{}/.skylift/settings.json", home))
}

/// Load saved defaults, falling back to the built-in ones
pub async fn load() -> SavedDefaults {
    let file = settings_file();
    if !file.exists().await {
        return SavedDefaults::default();
    }
    file.read_json().await.unwrap_or_default()
}

/// Persist the defaults for the next run
pub async fn save(defaults: &SavedDefaults) -> Result<(), DeployError> {
    settings_file().write_json(defaults).await
}

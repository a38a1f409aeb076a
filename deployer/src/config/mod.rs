//! Deployment configuration
//!
//! Gathers every run parameter interactively before any side-effecting
//! call begins, so the reconciliation logic downstream only ever sees an
//! immutable config value.

pub mod file;
pub mod prompt;
pub mod settings;

use std::collections::HashMap;
use std::path::PathBuf;

use tracing::debug;

use crate::config::prompt::Prompt;
use crate::config::settings::SavedDefaults;
use crate::errors::DeployError;

/// Transports the workload can serve
const TRANSPORTS: [&str; 2] = ["sse", "streamable-http"];

/// Immutable configuration for one deployment run
#[derive(Debug, Clone)]
pub struct DeploymentConfig {
    /// Target resource group
    pub resource_group: String,

    /// Registry name (globally unique scope)
    pub registry: String,

    pub region: String,

    pub cpu: f64,
    pub memory_gb: f64,

    /// The single port the workload exposes
    pub port: u16,

    /// Base name for the instance and DNS label
    pub instance_base: String,

    /// Base name for the image repository
    pub image_base: String,

    /// Docker build context directory
    pub context_dir: PathBuf,

    /// Start command override passed to the instance
    pub command: Vec<String>,

    /// Environment for the workload
    pub env: HashMap<String, String>,
}

/// Gather and confirm the configuration for this run.
///
/// Prompts start from the defaults persisted by the previous run; the
/// confirmed (non-secret) answers are persisted back for the next one.
pub async fn gather(prompt: &mut dyn Prompt) -> Result<DeploymentConfig, DeployError> {
    let saved = settings::load().await;
    debug!("Loaded prompt defaults from {:?}", settings::settings_file().path());

    let resource_group = prompt.ask("Resource group", Some(&saved.resource_group))?;
    let region = prompt.ask("Region", Some(&saved.region))?;

    let registry = loop {
        let answer = prompt.ask("Registry name", Some(&saved.registry))?;
        match validate_registry_name(&answer) {
            Ok(()) => break answer,
            Err(e) => println!("  {}", e),
        }
    };

    let instance_base = prompt.ask("Instance base name", Some(&saved.instance_base))?;
    let image_base = prompt.ask("Image name", Some(&saved.image_base))?;
    let context_dir = prompt.ask("Build context directory", Some(&saved.context_dir))?;

    let cpu = ask_parsed(prompt, "CPU cores", &saved.cpu.to_string())?;
    let memory_gb = ask_parsed(prompt, "Memory (GB)", &saved.memory_gb.to_string())?;
    let port: u16 = ask_parsed(prompt, "Port", &saved.port.to_string())?;

    let transport_idx = prompt.choose("Transport", &TRANSPORTS, 0)?;
    let transport = TRANSPORTS[transport_idx];

    let config = DeploymentConfig {
        command: workload_command(transport, port),
        env: workload_env(transport, port),
        resource_group,
        registry,
        region,
        cpu,
        memory_gb,
        port,
        instance_base,
        image_base,
        context_dir: PathBuf::from(context_dir),
    };

    println!();
    println!("Deployment configuration:");
    println!("  Resource group: {}", config.resource_group);
    println!("  Registry:       {}", config.registry);
    println!("  Region:         {}", config.region);
    println!("  Compute:        {} CPU / {} GB", config.cpu, config.memory_gb);
    println!("  Port:           {}", config.port);
    println!("  Transport:      {}", transport);
    println!("  Build context:  {}", config.context_dir.display());
    println!();

    if !prompt.confirm("Proceed with this configuration?", true)? {
        return Err(DeployError::ConfigError("cancelled by operator".to_string()));
    }

    let defaults = SavedDefaults {
        resource_group: config.resource_group.clone(),
        registry: config.registry.clone(),
        region: config.region.clone(),
        instance_base: config.instance_base.clone(),
        image_base: config.image_base.clone(),
        cpu: config.cpu,
        memory_gb: config.memory_gb,
        port: config.port,
        context_dir: config.context_dir.display().to_string(),
        suffix: saved.suffix.clone(),
    };
    if let Err(e) = settings::save(&defaults).await {
        debug!("Could not persist prompt defaults: {}", e);
    }

    Ok(config)
}

fn ask_parsed<T: std::str::FromStr>(
    prompt: &mut dyn Prompt,
    question: &str,
    default: &str,
) -> Result<T, DeployError> {
    loop {
        let answer = prompt.ask(question, Some(default))?;
        match answer.parse() {
            Ok(value) => return Ok(value),
            Err(_) => println!("  Invalid value: {}", answer),
        }
    }
}

/// Start command handed to the instance, replacing the image default.
///
/// The image's baked-in arguments take precedence over same-named
/// environment variables in the server's argument parser, so the
/// transport must be forced on the command line.
fn workload_command(transport: &str, port: u16) -> Vec<String> {
    vec![
        "python".to_string(),
        "weather_server.py".to_string(),
        "--transport".to_string(),
        transport.to_string(),
        "--host".to_string(),
        "0.0.0.0".to_string(),
        "--port".to_string(),
        port.to_string(),
    ]
}

fn workload_env(transport: &str, port: u16) -> HashMap<String, String> {
    HashMap::from([
        ("MCP_TRANSPORT".to_string(), transport.to_string()),
        ("MCP_PORT".to_string(), port.to_string()),
    ])
}

/// Validate a registry name against the provider's naming rule:
/// 5-50 characters, lowercase alphanumeric only.
pub fn validate_registry_name(name: &str) -> Result<(), DeployError> {
    if name.len() < 5 || name.len() > 50 {
        return Err(DeployError::ConfigError(format!(
            "registry name must be 5-50 characters, got {}",
            name.len()
        )));
    }
    if !name.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()) {
        return Err(DeployError::ConfigError(
            "registry name must be lowercase alphanumeric".to_string(),
        ));
    }
    Ok(())
}

//! Deployment reporting
//!
//! Pure read-then-format: derives endpoint URLs, renders the success
//! summary with verification commands, and on failure prints the phase,
//! the error, best-known resource state, and the exact teardown
//! commands for whatever was created.

use colored::Colorize;

use crate::config::DeploymentConfig;
use crate::errors::DeployError;
use crate::models::instance::InstanceObservation;
use crate::models::resources::{ImageArtifact, RegistryState};

/// Phases of one orchestration run, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Configure,
    Preflight,
    Resolve,
    Publish,
    Reconcile,
    Report,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Phase::Configure => "configuration",
            Phase::Preflight => "preflight",
            Phase::Resolve => "resource resolution",
            Phase::Publish => "artifact pipeline",
            Phase::Reconcile => "instance reconciliation",
            Phase::Report => "reporting",
        };
        write!(f, "{}", s)
    }
}

/// Best-known remote state, updated as phases complete.
///
/// Drives the teardown text: only resources that were actually touched
/// get cleanup commands.
#[derive(Debug, Clone, Default)]
pub struct PartialState {
    /// Target resource group, once resolved, and whether this run created it
    pub resource_group: Option<String>,
    pub group_created: bool,

    /// Registry as (owning group, name), and whether this run created it
    pub registry: Option<(String, String)>,
    pub registry_created: bool,

    /// Tags pushed by this run
    pub pushed_tags: Vec<String>,

    /// Instance as (group, name), once a create or delete was issued
    pub instance: Option<(String, String)>,
}

/// Endpoint URLs served by the deployed instance
pub fn endpoints(fqdn: &str, port: u16) -> (String, String) {
    (
        format!("http://{}:{}/mcp/", fqdn, port),
        format!("http://{}:{}/sse", fqdn, port),
    )
}

/// Render the success summary
pub fn print_summary(
    config: &DeploymentConfig,
    registry: &RegistryState,
    artifact: &ImageArtifact,
    instance_name: &str,
    observation: &InstanceObservation,
    timed_out: bool,
) {
    println!();
    if timed_out {
        println!("{}", "Deployment submitted (instance still starting)".yellow().bold());
    } else {
        println!("{}", "Deployment complete".green().bold());
    }
    println!();
    println!("  Resource group: {}", config.resource_group);
    println!("  Registry:       {} ({})", registry.name, registry.login_server);
    println!("  Image:          {}", artifact.versioned_ref());
    println!("  Instance:       {}", instance_name);
    if let Some(ip) = &observation.public_ip {
        println!("  Public IP:      {}", ip);
    }

    if let Some(fqdn) = &observation.fqdn {
        let (mcp_url, sse_url) = endpoints(fqdn, config.port);
        println!("  FQDN:           {}", fqdn);
        println!();
        println!("Endpoints:");
        println!("  {}", mcp_url.as_str().cyan());
        println!("  {}", sse_url.as_str().cyan());
        println!();
        println!("Verify:");
        println!("  curl -i {}", sse_url);
        println!("  curl -i -X POST {} -H 'Content-Type: application/json'", mcp_url);
    }

    println!();
    println!("Tear down when finished:");
    print!("{}", teardown_text(&summary_state(config, registry, instance_name)));
}

/// Render a failure report with cleanup guidance
pub fn print_failure(phase: Phase, error: &DeployError, state: &PartialState) {
    let phase_name = phase.to_string();
    eprintln!();
    eprintln!(
        "{} {}",
        "Deployment failed during".red().bold(),
        phase_name.as_str().red().bold()
    );
    eprintln!("  {}", error);
    eprintln!();

    if state.resource_group.is_none() && state.registry.is_none() && state.instance.is_none() {
        eprintln!("No remote resources were touched.");
        eprintln!("Re-run the deployer once the problem is fixed.");
        return;
    }

    eprintln!("Best-known state:");
    if let Some(group) = &state.resource_group {
        let origin = if state.group_created { "created by this run" } else { "pre-existing" };
        eprintln!("  Resource group {} ({})", group, origin);
    }
    if let Some((group, name)) = &state.registry {
        let origin = if state.registry_created { "created by this run" } else { "pre-existing" };
        eprintln!("  Registry {} in group {} ({})", name, group, origin);
    }
    for tag in &state.pushed_tags {
        eprintln!("  Pushed tag {}", tag);
    }
    if let Some((group, name)) = &state.instance {
        eprintln!("  Instance {} in group {} (state uncertain)", name, group);
    }
    eprintln!();
    eprintln!("Re-running the deployer is safe: every create is preceded by an");
    eprintln!("existence check and the instance is recreated from scratch.");
    eprintln!();
    eprintln!("To tear down instead:");
    eprint!("{}", teardown_text(state));
}

/// Copy-pasteable cleanup commands for whatever exists
pub fn teardown_text(state: &PartialState) -> String {
    let mut text = String::new();

    if let Some((group, name)) = &state.instance {
        text.push_str(&format!("  az container delete -g {} -n {} --yes\n", group, name));
    }
    if state.registry_created {
        if let Some((group, name)) = &state.registry {
            text.push_str(&format!("  az acr delete -g {} -n {} --yes\n", group, name));
        }
    }
    if state.group_created {
        if let Some(group) = &state.resource_group {
            text.push_str(&format!("  az group delete -n {} --yes\n", group));
        }
    }

    if text.is_empty() {
        text.push_str("  (nothing to tear down)\n");
    }
    text
}

fn summary_state(
    config: &DeploymentConfig,
    registry: &RegistryState,
    instance_name: &str,
) -> PartialState {
    PartialState {
        resource_group: Some(config.resource_group.clone()),
        group_created: false,
        registry: Some((registry.resource_group.clone(), registry.name.clone())),
        registry_created: false,
        pushed_tags: Vec::new(),
        instance: Some((config.resource_group.clone(), instance_name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_urls() {
        let (mcp, sse) = endpoints("app-ab12cd34ef56.eastus.azurecontainer.io", 8080);
        assert_eq!(mcp, "http://app-ab12cd34ef56.eastus.azurecontainer.io:8080/mcp/");
        assert_eq!(sse, "http://app-ab12cd34ef56.eastus.azurecontainer.io:8080/sse");
    }

    #[test]
    fn test_teardown_scoped_to_created_resources() {
        let state = PartialState {
            resource_group: Some("rg-test".to_string()),
            group_created: false,
            registry: Some(("rg-test".to_string(), "regtest123".to_string())),
            registry_created: true,
            pushed_tags: vec![],
            instance: Some(("rg-test".to_string(), "app-1".to_string())),
        };

        let text = teardown_text(&state);
        assert!(text.contains("az container delete -g rg-test -n app-1"));
        assert!(text.contains("az acr delete -g rg-test -n regtest123"));
        // The group pre-existed, so it must not be offered for deletion
        assert!(!text.contains("az group delete"));
    }

    #[test]
    fn test_teardown_empty_state() {
        let text = teardown_text(&PartialState::default());
        assert!(text.contains("nothing to tear down"));
    }
}

//! Orchestration driver
//!
//! Sequences the components in strict dependency order: config →
//! names → preflight → resolution → pipeline → reconciliation →
//! report. Each phase only consumes values produced by earlier ones;
//! nothing is mutated backward. Any phase error lands in the uniform
//! failure handler, which reports the phase, the error, the best-known
//! partial state, and teardown commands.

use std::future::Future;
use std::pin::Pin;

use tracing::info;

use crate::app::options::AppOptions;
use crate::authn;
use crate::config::{self, prompt::Prompt, prompt::StdinPrompt, DeploymentConfig};
use crate::deploy::pipeline::ArtifactPipeline;
use crate::deploy::reconciler::InstanceReconciler;
use crate::errors::DeployError;
use crate::models::instance::{ImageRegistryAuth, InstanceSpec, OsType, RestartPolicy};
use crate::models::resources::{ImageArtifact, RegistryState};
use crate::naming::{self, NameAllocation};
use crate::preflight;
use crate::provider::AzureProvider;
use crate::report::{self, PartialState, Phase};
use crate::resolve::ResourceResolver;
use crate::utils::version_info;

/// Environment variable selecting the subscription to deploy into
pub const SUBSCRIPTION_ENV_VAR: &str = "AZURE_SUBSCRIPTION_ID";

/// Environment variable selecting the sign-in tenant
pub const TENANT_ENV_VAR: &str = "AZURE_TENANT_ID";

/// Run one deployment
pub async fn run(
    options: AppOptions,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), DeployError> {
    let version = version_info();
    println!("Skylift deployer v{} ({})", version.version, version.git_hash);
    println!();

    let mut prompt = StdinPrompt::new(options.assume_defaults);
    let mut state = PartialState::default();

    match run_phases(&options, &mut prompt, &mut state, Box::pin(shutdown_signal)).await {
        Ok(()) => Ok(()),
        Err((phase, error)) => {
            report::print_failure(phase, &error, &state);
            Err(error)
        }
    }
}

async fn run_phases(
    options: &AppOptions,
    prompt: &mut dyn Prompt,
    state: &mut PartialState,
    shutdown_signal: Pin<Box<dyn Future<Output = ()> + Send>>,
) -> Result<(), (Phase, DeployError)> {
    // Configuration: all human input is gathered up front, so the
    // phases below run against an immutable config value.
    let config = config::gather(prompt)
        .await
        .map_err(|e| (Phase::Configure, e))?;

    // Names are fixed before any remote mutation. A saved configuration
    // keeps its suffix across re-runs so reconciliation converges on the
    // same instance; only a fresh configuration draws a new one.
    let saved = config::settings::load().await;
    let names = match saved.suffix.as_deref() {
        Some(suffix) => naming::with_suffix(&config.instance_base, &config.image_base, suffix),
        None => naming::allocate(&config.instance_base, &config.image_base),
    };
    if saved.suffix.is_none() {
        let mut updated = saved;
        updated.suffix = Some(names.suffix.clone());
        if let Err(e) = config::settings::save(&updated).await {
            info!("Could not persist run suffix: {}", e);
        }
    }
    info!("Run suffix: {}", names.suffix);

    // Preflight: local tooling, auth session, subscription confirmation
    let provider = preflight_phase(prompt)
        .await
        .map_err(|e| (Phase::Preflight, e))?;

    // Resolution
    let resolver = ResourceResolver::new(&provider);

    let group = resolver
        .resolve_group(prompt, &config.resource_group, &config.region)
        .await
        .map_err(|e| (Phase::Resolve, e))?;
    state.resource_group = Some(group.state.name.clone());
    state.group_created = group.created;

    let registry = resolver
        .resolve_registry(prompt, &config.resource_group, &config.registry, &config.region)
        .await
        .map_err(|e| (Phase::Resolve, e))?;
    state.registry = Some((registry.state.resource_group.clone(), registry.state.name.clone()));
    state.registry_created = registry.created;

    // Artifact pipeline
    let artifact = ImageArtifact::new(names.image_repository.clone(), registry.state.login_server.clone());
    ArtifactPipeline::new(&provider)
        .publish(&config, &registry.state, &artifact)
        .await
        .map_err(|e| (Phase::Publish, e))?;
    state.pushed_tags = artifact.refs().to_vec();

    // Reconciliation
    let spec = instance_spec(&config, &names, &artifact, &registry.state)
        .map_err(|e| (Phase::Reconcile, e))?;
    state.instance = Some((config.resource_group.clone(), spec.name.clone()));

    let reconciler = InstanceReconciler::new(&provider, options.reconcile.clone());
    let outcome = reconciler
        .reconcile(&config.resource_group, &spec, shutdown_signal)
        .await
        .map_err(|e| (Phase::Reconcile, e))?;

    // Report
    report::print_summary(
        &config,
        &registry.state,
        &artifact,
        &spec.name,
        outcome.observation(),
        outcome.timed_out(),
    );

    Ok(())
}

/// Build the session and verified provider binding
async fn preflight_phase(prompt: &mut dyn Prompt) -> Result<AzureProvider, DeployError> {
    let tenant = std::env::var(TENANT_ENV_VAR).unwrap_or_else(|_| "organizations".to_string());
    let token = authn::ensure_session(prompt, &tenant).await?;

    let subscription_id = match std::env::var(SUBSCRIPTION_ENV_VAR) {
        Ok(id) => id,
        Err(_) => prompt.ask("Subscription ID", None)?,
    };

    let provider = AzureProvider::new(&token, subscription_id)?;
    let report = preflight::run(prompt, &provider).await?;
    info!(
        "Preflight passed: {}, subscription {}",
        report.docker_version, report.subscription.subscription_id
    );

    Ok(provider)
}

/// Assemble the desired instance spec from the run's outputs.
///
/// The OS type is fixed at Linux here; `InstanceSpec` cannot be built
/// without one, so a create call can never omit it.
fn instance_spec(
    config: &DeploymentConfig,
    names: &NameAllocation,
    artifact: &ImageArtifact,
    registry: &RegistryState,
) -> Result<InstanceSpec, DeployError> {
    let credentials = registry.credentials.as_ref().ok_or_else(|| {
        DeployError::Internal("registry credentials were not resolved".to_string())
    })?;

    Ok(InstanceSpec {
        name: names.instance_name.clone(),
        image: artifact.versioned_ref(),
        region: config.region.clone(),
        cpu: config.cpu,
        memory_gb: config.memory_gb,
        port: config.port,
        env: config.env.clone(),
        command: config.command.clone(),
        os_type: OsType::Linux,
        restart_policy: RestartPolicy::Always,
        public_ip: true,
        dns_label: names.dns_label.clone(),
        registry_auth: Some(ImageRegistryAuth {
            server: registry.login_server.clone(),
            username: credentials.username.clone(),
            password: credentials.password.clone(),
        }),
    })
}

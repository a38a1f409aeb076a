//! Preflight checks
//!
//! Everything here runs before any remote resource is touched; a
//! failure aborts the run with nothing to clean up.

use tracing::info;

use crate::config::prompt::Prompt;
use crate::deploy::docker;
use crate::errors::DeployError;
use crate::models::resources::SubscriptionInfo;
use crate::provider::CloudProvider;

/// What preflight verified
#[derive(Debug, Clone)]
pub struct PreflightReport {
    pub docker_version: String,
    pub subscription: SubscriptionInfo,
}

/// Verify local tooling and the remote session.
///
/// Checks the docker CLI and daemon, proves the auth session against the
/// control plane by describing the subscription, and has the operator
/// confirm the tenant/subscription before anything is created.
pub async fn run(
    prompt: &mut dyn Prompt,
    provider: &dyn CloudProvider,
) -> Result<PreflightReport, DeployError> {
    let docker_version = docker::version().await.map_err(|e| {
        DeployError::PreconditionError(format!(
            "docker CLI not available ({}); install docker and retry",
            e
        ))
    })?;
    info!("Docker is available: {}", docker_version);

    docker::daemon_ready().await.map_err(|e| {
        DeployError::PreconditionError(format!(
            "docker daemon is not reachable ({}); start the docker service and retry",
            e
        ))
    })?;

    // A successful call here also proves the token is accepted
    let subscription = provider.subscription_show().await.map_err(|e| {
        DeployError::PreconditionError(format!("could not verify the Azure session: {}", e))
    })?;

    println!();
    println!("Signed in to:");
    println!("  Subscription: {} ({})", subscription.display_name, subscription.subscription_id);
    println!("  Tenant:       {}", subscription.tenant_id);
    println!();

    if !prompt.confirm("Deploy to this subscription?", true)? {
        return Err(DeployError::PreconditionError(
            "subscription not confirmed; set AZURE_SUBSCRIPTION_ID to the desired subscription and re-run"
                .to_string(),
        ));
    }

    Ok(PreflightReport {
        docker_version,
        subscription,
    })
}

//! End-to-end orchestration properties against the in-memory control
//! plane: the fresh-deploy scenario and the re-run idempotence
//! guarantee.

mod common;

use std::time::Duration;

use common::{sample_spec, MockProvider, ScriptedPrompt};
use skylift::deploy::reconciler::{InstanceReconciler, ReconcileOptions};
use skylift::models::resources::ImageArtifact;
use skylift::naming;
use skylift::report;
use skylift::resolve::ResourceResolver;

fn fast_options() -> ReconcileOptions {
    ReconcileOptions {
        poll_interval: Duration::from_millis(1),
        max_polls: 5,
        absence_polls: 3,
        timeout_is_fatal: false,
    }
}

fn noop_sleep(_: Duration) -> std::future::Ready<()> {
    std::future::ready(())
}

fn never() -> std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send>> {
    Box::pin(std::future::pending())
}

/// One resolution + reconciliation pass, the way the driver sequences it
async fn run_once(provider: &MockProvider, suffix: &str) {
    let mut prompt = ScriptedPrompt::new(&[]);
    let resolver = ResourceResolver::new(provider);

    resolver
        .resolve_group(&mut prompt, "rg-test", "eastus")
        .await
        .unwrap();
    resolver
        .resolve_registry(&mut prompt, "rg-test", "regtest123", "eastus")
        .await
        .unwrap();

    let names = naming::with_suffix("app", "app", suffix);
    let spec = sample_spec(&names.instance_name);

    let reconciler = InstanceReconciler::new(provider, fast_options());
    let outcome = reconciler
        .reconcile_with("rg-test", &spec, noop_sleep, never())
        .await
        .unwrap();
    assert!(!outcome.timed_out());
}

#[tokio::test]
async fn fresh_deploy_scenario() {
    let provider = MockProvider::new();
    let mut prompt = ScriptedPrompt::new(&[]);
    let resolver = ResourceResolver::new(&provider);

    // Registry does not exist anywhere: resolution must create
    let registry = resolver
        .resolve_registry(&mut prompt, "rg-test", "regtest123", "eastus")
        .await
        .unwrap();
    assert!(registry.created);

    // The artifact mints a time-stamped version tag plus latest
    let names = naming::allocate("app", "app");
    let artifact = ImageArtifact::new(names.image_repository.clone(), registry.state.login_server.clone());
    assert!(artifact.version_tag.starts_with("v-"));
    let [versioned, latest] = artifact.refs();
    assert!(versioned.ends_with(&artifact.version_tag));
    assert!(latest.ends_with(":latest"));

    // No instance with the target name exists: create, poll to running
    let spec = sample_spec(&names.instance_name);
    let reconciler = InstanceReconciler::new(&provider, fast_options());
    let outcome = reconciler
        .reconcile_with("rg-test", &spec, noop_sleep, never())
        .await
        .unwrap();

    let observation = outcome.observation();
    let fqdn = observation.fqdn.as_deref().unwrap();
    assert_eq!(fqdn, format!("app-{}.eastus.azurecontainer.io", names.suffix));

    let (mcp_url, sse_url) = report::endpoints(fqdn, 8080);
    assert_eq!(
        mcp_url,
        format!("http://app-{}.eastus.azurecontainer.io:8080/mcp/", names.suffix)
    );
    assert_eq!(
        sse_url,
        format!("http://app-{}.eastus.azurecontainer.io:8080/sse", names.suffix)
    );
}

#[tokio::test]
async fn rerun_is_idempotent() {
    let provider = MockProvider::new();

    // A re-run of the same configuration reuses the persisted suffix
    let suffix = "ab12cd34ef56";
    run_once(&provider, suffix).await;
    run_once(&provider, suffix).await;

    let plane = provider.plane.lock().unwrap();

    // Exactly one group, one registry, one instance; never two instances
    assert_eq!(plane.groups.len(), 1);
    assert_eq!(plane.registries.len(), 1);
    assert_eq!(plane.instances.len(), 1);

    // The second run deleted the first instance before recreating
    assert_eq!(plane.created_instances, 2);
    assert_eq!(plane.deleted_instances, 1);

    // Creation calls happened exactly once per resource kind
    let group_creates = plane.calls.iter().filter(|c| c.starts_with("group_create")).count();
    let registry_creates = plane.calls.iter().filter(|c| c.starts_with("registry_create")).count();
    assert_eq!(group_creates, 1);
    assert_eq!(registry_creates, 1);
}

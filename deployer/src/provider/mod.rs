//! Cloud control-plane interface
//!
//! One trait method per remote operation the orchestrator performs.
//! Everything upstream of this trait is deterministic and testable with
//! a synthetic implementation; `AzureProvider` binds each method to the
//! ARM REST API.

pub mod azure;

use async_trait::async_trait;

use crate::errors::DeployError;
use crate::models::instance::{InstanceObservation, InstanceSpec};
use crate::models::resources::{
    RegistryCredentials, RegistryNameCheck, RegistryState, ResourceGroupState, SubscriptionInfo,
};

pub use azure::AzureProvider;

/// Remote control-plane operations, provider-agnostic
#[async_trait]
pub trait CloudProvider: Send + Sync {
    /// Describe the subscription the session operates against
    async fn subscription_show(&self) -> Result<SubscriptionInfo, DeployError>;

    /// Look up a resource group by name (per-subscription scope)
    async fn group_exists(&self, name: &str) -> Result<Option<ResourceGroupState>, DeployError>;

    /// Create a resource group in the given region
    async fn group_create(&self, name: &str, region: &str) -> Result<ResourceGroupState, DeployError>;

    /// Check registry name availability (global scope, all tenants)
    async fn registry_check_name(&self, name: &str) -> Result<RegistryNameCheck, DeployError>;

    /// Find a registry by name anywhere in the subscription
    async fn registry_find(&self, name: &str) -> Result<Option<RegistryState>, DeployError>;

    /// Look up a registry within a specific resource group
    async fn registry_show(
        &self,
        group: &str,
        name: &str,
    ) -> Result<Option<RegistryState>, DeployError>;

    /// Create a registry in the given group
    async fn registry_create(
        &self,
        group: &str,
        name: &str,
        region: &str,
    ) -> Result<RegistryState, DeployError>;

    /// Enable admin-level pull credentials on a registry
    async fn registry_enable_admin(&self, group: &str, name: &str) -> Result<(), DeployError>;

    /// Fetch the registry's admin credential pair
    async fn registry_credentials(
        &self,
        group: &str,
        name: &str,
    ) -> Result<RegistryCredentials, DeployError>;

    /// List the tags currently visible for a repository
    async fn registry_list_tags(
        &self,
        login_server: &str,
        credentials: &RegistryCredentials,
        repository: &str,
    ) -> Result<Vec<String>, DeployError>;

    /// Observe the instance with the given name, if present
    async fn instance_show(
        &self,
        group: &str,
        name: &str,
    ) -> Result<Option<InstanceObservation>, DeployError>;

    /// Delete the instance
    async fn instance_delete(&self, group: &str, name: &str) -> Result<(), DeployError>;

    /// Create the instance from the full desired spec
    async fn instance_create(
        &self,
        group: &str,
        spec: &InstanceSpec,
    ) -> Result<InstanceObservation, DeployError>;
}

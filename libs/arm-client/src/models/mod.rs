//! ARM API models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Error envelope returned by every ARM endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct CloudError {
    pub error: CloudErrorBody,
}

/// Error body with provider error code and message
#[derive(Debug, Clone, Deserialize)]
pub struct CloudErrorBody {
    pub code: String,
    pub message: String,
}

/// Subscription, as returned by GET /subscriptions/{id}
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: String,
    pub subscription_id: String,
    pub display_name: String,
    pub tenant_id: String,
    pub state: Option<String>,
}

/// Resource group
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceGroup {
    pub id: String,
    pub name: String,
    pub location: String,
    #[serde(default)]
    pub tags: Option<serde_json::Value>,
}

/// Body for PUT /resourcegroups/{name}
#[derive(Debug, Clone, Serialize)]
pub struct ResourceGroupCreate {
    pub location: String,
}

/// Body for the global registry name availability check
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryNameRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub resource_type: String,
}

impl RegistryNameRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            resource_type: "Microsoft.ContainerRegistry/registries".to_string(),
        }
    }
}

/// Result of the registry name availability check
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryNameStatus {
    pub name_available: bool,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Container registry resource
#[derive(Debug, Clone, Deserialize)]
pub struct Registry {
    pub id: String,
    pub name: String,
    pub location: String,
    pub properties: RegistryProperties,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryProperties {
    pub login_server: String,
    #[serde(default)]
    pub admin_user_enabled: bool,
    #[serde(default)]
    pub provisioning_state: Option<String>,
}

/// Paged registry listing
#[derive(Debug, Clone, Deserialize)]
pub struct RegistryList {
    #[serde(default)]
    pub value: Vec<Registry>,
}

/// Body for PUT .../registries/{name}
#[derive(Debug, Clone, Serialize)]
pub struct RegistryCreate {
    pub location: String,
    pub sku: Sku,
    pub properties: RegistryCreateProperties,
}

#[derive(Debug, Clone, Serialize)]
pub struct Sku {
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryCreateProperties {
    pub admin_user_enabled: bool,
}

/// Body for PATCH .../registries/{name}
#[derive(Debug, Clone, Serialize)]
pub struct RegistryUpdate {
    pub properties: RegistryCreateProperties,
}

/// Result of POST .../registries/{name}/listCredentials
#[derive(Debug, Clone, Deserialize)]
pub struct RegistryCredentialsResult {
    pub username: String,
    #[serde(default)]
    pub passwords: Vec<RegistryPassword>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegistryPassword {
    pub name: String,
    pub value: String,
}

/// ACR data-plane tag listing (GET /acr/v1/{image}/_tags)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcrTagList {
    #[serde(default)]
    pub registry: Option<String>,
    #[serde(default)]
    pub image_name: Option<String>,
    #[serde(default)]
    pub tags: Vec<AcrTag>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AcrTag {
    pub name: String,
}

/// Container group resource (Microsoft.ContainerInstance)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerGroup {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub location: String,
    pub properties: ContainerGroupProperties,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerGroupProperties {
    pub containers: Vec<Container>,
    /// Required by the provider; creation is rejected without it
    pub os_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restart_policy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<IpAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_registry_credentials: Option<Vec<ImageRegistryCredential>>,
    #[serde(default, skip_serializing)]
    pub provisioning_state: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Container {
    pub name: String,
    pub properties: ContainerProperties,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerProperties {
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<String>>,
    #[serde(default)]
    pub ports: Vec<ContainerPort>,
    #[serde(default)]
    pub environment_variables: Vec<EnvironmentVariable>,
    pub resources: ResourceRequirements,
    #[serde(default, skip_serializing)]
    pub instance_view: Option<ContainerInstanceView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerPort {
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentVariable {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceRequirements {
    pub requests: ResourceRequests,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRequests {
    pub cpu: f64,
    #[serde(rename = "memoryInGB")]
    pub memory_in_gb: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpAddress {
    #[serde(rename = "type")]
    pub ip_type: String,
    #[serde(default)]
    pub ports: Vec<ContainerPort>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns_name_label: Option<String>,
    #[serde(default, skip_serializing)]
    pub fqdn: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRegistryCredential {
    pub server: String,
    pub username: String,
    pub password: String,
}

/// Read-only container runtime view returned on GET
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerInstanceView {
    #[serde(default)]
    pub current_state: Option<ContainerState>,
    #[serde(default)]
    pub restart_count: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerState {
    pub state: String,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub detail_status: Option<String>,
}

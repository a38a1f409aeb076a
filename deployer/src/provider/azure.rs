//! Azure Resource Manager binding
//!
//! Implements each control-plane operation against the ARM REST API
//! directly; the only subprocess the deployer ever spawns is docker.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::{header, Client, Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use arm_client::models as arm;

use crate::authn::access_token::AccessToken;
use crate::errors::DeployError;
use crate::models::instance::{InstanceObservation, InstanceSpec, InstanceState};
use crate::models::resources::{
    RegistryCredentials, RegistryNameCheck, RegistryState, ResourceGroupState, SubscriptionInfo,
};
use crate::provider::CloudProvider;
use crate::utils::{calc_exp_backoff, CooldownOptions};

const MANAGEMENT_BASE: &str = "https://management.azure.com";

const API_SUBSCRIPTIONS: &str = "2022-12-01";
const API_GROUPS: &str = "2021-04-01";
const API_REGISTRY: &str = "2023-07-01";
const API_INSTANCE: &str = "2023-05-01";

/// Attempts per call; only 429s and 5xx are retried
const MAX_ATTEMPTS: u32 = 3;

/// ARM REST client scoped to one subscription
pub struct AzureProvider {
    client: Client,
    token: SecretString,
    subscription_id: String,
}

impl AzureProvider {
    pub fn new(token: &AccessToken, subscription_id: String) -> Result<Self, DeployError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(100))
            .build()?;

        debug!(
            "ARM binding ready (container registry api {}, container instance api {})",
            API_REGISTRY, API_INSTANCE
        );

        Ok(Self {
            client,
            token: SecretString::from(token.bearer().to_string()),
            subscription_id,
        })
    }

    fn subscription_url(&self, suffix: &str, api_version: &str) -> String {
        format!(
            "{}/subscriptions/{}{}?api-version={}",
            MANAGEMENT_BASE, self.subscription_id, suffix, api_version
        )
    }

    async fn execute(
        &self,
        method: Method,
        url: &str,
        body: Option<serde_json::Value>,
    ) -> Result<reqwest::Response, DeployError> {
        let cooldown = CooldownOptions::default();
        let mut attempt = 0;
        loop {
            debug!("{} {}", method, url);
            let mut request = self
                .client
                .request(method.clone(), url)
                .bearer_auth(self.token.expose_secret());
            if let Some(ref value) = body {
                request = request.json(value);
            }

            let response = request.send().await?;
            let status = response.status();

            let transient = status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error();
            if transient && attempt + 1 < MAX_ATTEMPTS {
                let wait = calc_exp_backoff(&cooldown, attempt);
                warn!("Transient {} from control plane, retrying in {:?}", status, wait);
                tokio::time::sleep(wait).await;
                attempt += 1;
                continue;
            }

            return Ok(response);
        }
    }

    /// Turn a non-success response into a `CloudApiError`
    async fn api_error(response: reqwest::Response) -> DeployError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        match serde_json::from_str::<arm::CloudError>(&body) {
            Ok(err) => DeployError::CloudApiError(format!(
                "{} {}: {}",
                status, err.error.code, err.error.message
            )),
            Err(_) => DeployError::CloudApiError(format!("{}: {}", status, body)),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, DeployError> {
        let response = self.execute(Method::GET, url, None).await?;
        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }
        Ok(response.json().await?)
    }

    /// GET that treats 404 as absence instead of an error
    async fn get_optional<T: DeserializeOwned>(&self, url: &str) -> Result<Option<T>, DeployError> {
        let response = self.execute(Method::GET, url, None).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }
        Ok(Some(response.json().await?))
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        body: serde_json::Value,
    ) -> Result<T, DeployError> {
        let response = self.execute(method, url, Some(body)).await?;
        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }
        Ok(response.json().await?)
    }

    async fn delete(&self, url: &str) -> Result<(), DeployError> {
        let response = self.execute(Method::DELETE, url, None).await?;
        let status = response.status();
        // 404 means already absent, which is the desired end state
        if status.is_success() || status == StatusCode::NOT_FOUND {
            return Ok(());
        }
        Err(Self::api_error(response).await)
    }
}

#[async_trait::async_trait]
impl CloudProvider for AzureProvider {
    async fn subscription_show(&self) -> Result<SubscriptionInfo, DeployError> {
        let url = self.subscription_url("", API_SUBSCRIPTIONS);
        let subscription: arm::Subscription = self.get_json(&url).await?;
        Ok(SubscriptionInfo {
            subscription_id: subscription.subscription_id,
            display_name: subscription.display_name,
            tenant_id: subscription.tenant_id,
        })
    }

    async fn group_exists(&self, name: &str) -> Result<Option<ResourceGroupState>, DeployError> {
        let url = self.subscription_url(&format!("/resourcegroups/{}", name), API_GROUPS);
        let group: Option<arm::ResourceGroup> = self.get_optional(&url).await?;
        Ok(group.map(|g| ResourceGroupState {
            name: g.name,
            exists: true,
            region: g.location,
        }))
    }

    async fn group_create(&self, name: &str, region: &str) -> Result<ResourceGroupState, DeployError> {
        let url = self.subscription_url(&format!("/resourcegroups/{}", name), API_GROUPS);
        let body = serde_json::to_value(arm::ResourceGroupCreate {
            location: region.to_string(),
        })?;
        let group: arm::ResourceGroup = self.send_json(Method::PUT, &url, body).await?;
        Ok(ResourceGroupState {
            name: group.name,
            exists: true,
            region: group.location,
        })
    }

    async fn registry_check_name(&self, name: &str) -> Result<RegistryNameCheck, DeployError> {
        let url = self.subscription_url(
            "/providers/Microsoft.ContainerRegistry/checkNameAvailability",
            API_REGISTRY,
        );
        let body = serde_json::to_value(arm::RegistryNameRequest::new(name))?;
        let status: arm::RegistryNameStatus = self.send_json(Method::POST, &url, body).await?;
        Ok(RegistryNameCheck {
            available: status.name_available,
            message: status.message,
        })
    }

    async fn registry_find(&self, name: &str) -> Result<Option<RegistryState>, DeployError> {
        let url = self.subscription_url(
            "/providers/Microsoft.ContainerRegistry/registries",
            API_REGISTRY,
        );
        let listing: arm::RegistryList = self.get_json(&url).await?;
        Ok(listing
            .value
            .into_iter()
            .find(|r| r.name == name)
            .map(registry_state_from))
    }

    async fn registry_show(
        &self,
        group: &str,
        name: &str,
    ) -> Result<Option<RegistryState>, DeployError> {
        let url = self.subscription_url(&registry_path(group, name), API_REGISTRY);
        let registry: Option<arm::Registry> = self.get_optional(&url).await?;
        Ok(registry.map(registry_state_from))
    }

    async fn registry_create(
        &self,
        group: &str,
        name: &str,
        region: &str,
    ) -> Result<RegistryState, DeployError> {
        let url = self.subscription_url(&registry_path(group, name), API_REGISTRY);
        let body = serde_json::to_value(arm::RegistryCreate {
            location: region.to_string(),
            sku: arm::Sku {
                name: "Basic".to_string(),
            },
            properties: arm::RegistryCreateProperties {
                admin_user_enabled: true,
            },
        })?;
        let registry: arm::Registry = self.send_json(Method::PUT, &url, body).await?;
        Ok(registry_state_from(registry))
    }

    async fn registry_enable_admin(&self, group: &str, name: &str) -> Result<(), DeployError> {
        let url = self.subscription_url(&registry_path(group, name), API_REGISTRY);
        let body = serde_json::to_value(arm::RegistryUpdate {
            properties: arm::RegistryCreateProperties {
                admin_user_enabled: true,
            },
        })?;
        let _: arm::Registry = self.send_json(Method::PATCH, &url, body).await?;
        Ok(())
    }

    async fn registry_credentials(
        &self,
        group: &str,
        name: &str,
    ) -> Result<RegistryCredentials, DeployError> {
        let url = self.subscription_url(
            &format!("{}/listCredentials", registry_path(group, name)),
            API_REGISTRY,
        );
        let result: arm::RegistryCredentialsResult = self
            .send_json(Method::POST, &url, serde_json::json!({}))
            .await?;
        let password = result
            .passwords
            .into_iter()
            .next()
            .ok_or_else(|| DeployError::CloudApiError("registry returned no passwords".to_string()))?;
        Ok(RegistryCredentials {
            username: result.username,
            password: SecretString::from(password.value),
        })
    }

    async fn registry_list_tags(
        &self,
        login_server: &str,
        credentials: &RegistryCredentials,
        repository: &str,
    ) -> Result<Vec<String>, DeployError> {
        let base = Url::parse(&format!("https://{}", login_server))
            .map_err(|e| DeployError::Internal(format!("bad login server: {}", e)))?;
        let url = base
            .join(&format!("acr/v1/{}/_tags", repository))
            .map_err(|e| DeployError::Internal(format!("bad repository path: {}", e)))?;

        let basic = BASE64.encode(format!(
            "{}:{}",
            credentials.username,
            credentials.password.expose_secret()
        ));
        let response = self
            .client
            .get(url)
            .header(header::AUTHORIZATION, format!("Basic {}", basic))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        let listing: arm::AcrTagList = response.json().await?;
        Ok(listing.tags.into_iter().map(|t| t.name).collect())
    }

    async fn instance_show(
        &self,
        group: &str,
        name: &str,
    ) -> Result<Option<InstanceObservation>, DeployError> {
        let url = self.subscription_url(&instance_path(group, name), API_INSTANCE);
        let container_group: Option<arm::ContainerGroup> = self.get_optional(&url).await?;
        Ok(container_group.map(|cg| observe(&cg)))
    }

    async fn instance_delete(&self, group: &str, name: &str) -> Result<(), DeployError> {
        let url = self.subscription_url(&instance_path(group, name), API_INSTANCE);
        self.delete(&url).await
    }

    async fn instance_create(
        &self,
        group: &str,
        spec: &InstanceSpec,
    ) -> Result<InstanceObservation, DeployError> {
        let url = self.subscription_url(&instance_path(group, &spec.name), API_INSTANCE);
        let body = serde_json::to_value(container_group_body(spec))?;
        let container_group: arm::ContainerGroup = self.send_json(Method::PUT, &url, body).await?;
        Ok(observe(&container_group))
    }
}

fn registry_path(group: &str, name: &str) -> String {
    format!(
        "/resourceGroups/{}/providers/Microsoft.ContainerRegistry/registries/{}",
        group, name
    )
}

fn instance_path(group: &str, name: &str) -> String {
    format!(
        "/resourceGroups/{}/providers/Microsoft.ContainerInstance/containerGroups/{}",
        group, name
    )
}

/// Map an ARM registry resource into our state model, recovering the
/// owning resource group from the resource ID
fn registry_state_from(registry: arm::Registry) -> RegistryState {
    RegistryState {
        resource_group: owning_group(&registry.id).unwrap_or_default(),
        name: registry.name,
        exists: true,
        admin_enabled: registry.properties.admin_user_enabled,
        login_server: registry.properties.login_server,
        credentials: None,
    }
}

fn owning_group(resource_id: &str) -> Option<String> {
    let mut segments = resource_id.split('/');
    while let Some(segment) = segments.next() {
        if segment.eq_ignore_ascii_case("resourceGroups") {
            return segments.next().map(|s| s.to_string());
        }
    }
    None
}

/// Build the full create body for a container group.
///
/// `osType` comes straight from the spec's non-optional field; the
/// provider rejects creation without it.
fn container_group_body(spec: &InstanceSpec) -> arm::ContainerGroup {
    let ports = vec![arm::ContainerPort {
        port: spec.port,
        protocol: Some("TCP".to_string()),
    }];

    let environment_variables = spec
        .env
        .iter()
        .map(|(name, value)| arm::EnvironmentVariable {
            name: name.clone(),
            value: value.clone(),
        })
        .collect();

    let ip_address = spec.public_ip.then(|| arm::IpAddress {
        ip_type: "Public".to_string(),
        ports: ports.clone(),
        ip: None,
        dns_name_label: Some(spec.dns_label.clone()),
        fqdn: None,
    });

    let image_registry_credentials = spec.registry_auth.as_ref().map(|auth| {
        vec![arm::ImageRegistryCredential {
            server: auth.server.clone(),
            username: auth.username.clone(),
            password: auth.password.expose_secret().to_string(),
        }]
    });

    arm::ContainerGroup {
        id: None,
        name: Some(spec.name.clone()),
        location: spec.region.clone(),
        properties: arm::ContainerGroupProperties {
            containers: vec![arm::Container {
                name: spec.name.clone(),
                properties: arm::ContainerProperties {
                    image: spec.image.clone(),
                    command: Some(spec.command.clone()),
                    ports,
                    environment_variables,
                    resources: arm::ResourceRequirements {
                        requests: arm::ResourceRequests {
                            cpu: spec.cpu,
                            memory_in_gb: spec.memory_gb,
                        },
                    },
                    instance_view: None,
                },
            }],
            os_type: spec.os_type.as_str().to_string(),
            restart_policy: Some(spec.restart_policy.as_str().to_string()),
            ip_address,
            image_registry_credentials,
            provisioning_state: None,
        },
    }
}

/// Map a polled container group into an instance observation
fn observe(container_group: &arm::ContainerGroup) -> InstanceObservation {
    let properties = &container_group.properties;
    let container_state = properties
        .containers
        .first()
        .and_then(|c| c.properties.instance_view.as_ref())
        .and_then(|view| view.current_state.as_ref())
        .map(|state| state.state.as_str());

    let state = match properties.provisioning_state.as_deref() {
        Some("Failed") => InstanceState::Failed,
        Some("Succeeded") => match container_state {
            Some("Running") => InstanceState::Running,
            Some("Terminated") => InstanceState::Failed,
            _ => InstanceState::Pending,
        },
        Some(_) => InstanceState::Pending,
        None => InstanceState::Unknown,
    };

    let (public_ip, fqdn) = match &properties.ip_address {
        Some(ip) => (ip.ip.clone(), ip.fqdn.clone()),
        None => (None, None),
    };

    InstanceObservation {
        state,
        public_ip,
        fqdn,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::instance::{OsType, RestartPolicy};
    use std::collections::HashMap;

    fn sample_spec() -> InstanceSpec {
        InstanceSpec {
            name: "app-ab12cd34ef56".to_string(),
            image: "myacr.azurecr.io/weather-mcp-ab12cd34ef56:v-20260805-120000".to_string(),
            region: "eastus".to_string(),
            cpu: 1.0,
            memory_gb: 1.5,
            port: 8080,
            env: HashMap::from([("MCP_TRANSPORT".to_string(), "sse".to_string())]),
            command: vec!["python".to_string(), "weather_server.py".to_string()],
            os_type: OsType::Linux,
            restart_policy: RestartPolicy::Always,
            public_ip: true,
            dns_label: "app-ab12cd34ef56".to_string(),
            registry_auth: None,
        }
    }

    #[test]
    fn test_create_body_always_carries_os_type() {
        let body = serde_json::to_value(container_group_body(&sample_spec())).unwrap();
        assert_eq!(body["properties"]["osType"], "Linux");
        assert_eq!(body["properties"]["restartPolicy"], "Always");
    }

    #[test]
    fn test_create_body_overrides_command_and_dns() {
        let body = serde_json::to_value(container_group_body(&sample_spec())).unwrap();
        let container = &body["properties"]["containers"][0]["properties"];
        assert_eq!(container["command"][0], "python");
        assert_eq!(
            body["properties"]["ipAddress"]["dnsNameLabel"],
            "app-ab12cd34ef56"
        );
        assert_eq!(container["resources"]["requests"]["memoryInGB"], 1.5);
    }

    #[test]
    fn test_owning_group_from_resource_id() {
        let id = "/subscriptions/sub-1/resourceGroups/rg-other/providers/Microsoft.ContainerRegistry/registries/regtest123";
        assert_eq!(owning_group(id), Some("rg-other".to_string()));
        assert_eq!(owning_group("/subscriptions/sub-1"), None);
    }

    #[test]
    fn test_observe_state_mapping() {
        let json = serde_json::json!({
            "location": "eastus",
            "properties": {
                "containers": [{
                    "name": "app",
                    "properties": {
                        "image": "img",
                        "resources": {"requests": {"cpu": 1.0, "memoryInGB": 1.5}},
                        "instanceView": {"currentState": {"state": "Running"}}
                    }
                }],
                "osType": "Linux",
                "provisioningState": "Succeeded",
                "ipAddress": {
                    "type": "Public",
                    "ip": "20.1.2.3",
                    "fqdn": "app.eastus.azurecontainer.io"
                }
            }
        });
        let group: arm::ContainerGroup = serde_json::from_value(json).unwrap();
        let observation = observe(&group);
        assert_eq!(observation.state, InstanceState::Running);
        assert_eq!(observation.public_ip.as_deref(), Some("20.1.2.3"));
        assert_eq!(observation.fqdn.as_deref(), Some("app.eastus.azurecontainer.io"));
    }

    #[test]
    fn test_observe_pending_while_creating() {
        let json = serde_json::json!({
            "location": "eastus",
            "properties": {
                "containers": [{
                    "name": "app",
                    "properties": {
                        "image": "img",
                        "resources": {"requests": {"cpu": 1.0, "memoryInGB": 1.5}}
                    }
                }],
                "osType": "Linux",
                "provisioningState": "Creating"
            }
        });
        let group: arm::ContainerGroup = serde_json::from_value(json).unwrap();
        assert_eq!(observe(&group).state, InstanceState::Pending);
    }
}

//! Shared test doubles: a scripted prompt and an in-memory control plane

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use secrecy::SecretString;

use skylift::config::prompt::Prompt;
use skylift::errors::DeployError;
use skylift::models::instance::{
    ImageRegistryAuth, InstanceObservation, InstanceSpec, InstanceState, OsType, RestartPolicy,
};
use skylift::models::resources::{
    RegistryCredentials, RegistryNameCheck, RegistryState, ResourceGroupState, SubscriptionInfo,
};
use skylift::provider::CloudProvider;

/// Prompt double that replays scripted answers and falls back to the
/// question's default when the script runs out
pub struct ScriptedPrompt {
    answers: VecDeque<String>,
}

impl ScriptedPrompt {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: answers.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Prompt for ScriptedPrompt {
    fn ask(&mut self, question: &str, default: Option<&str>) -> Result<String, DeployError> {
        match self.answers.pop_front() {
            Some(answer) if !answer.is_empty() => Ok(answer),
            Some(_) | None => default
                .map(|d| d.to_string())
                .ok_or_else(|| DeployError::ConfigError(format!("no scripted answer for: {}", question))),
        }
    }

    fn confirm(&mut self, _question: &str, default: bool) -> Result<bool, DeployError> {
        match self.answers.pop_front() {
            Some(answer) if answer == "y" => Ok(true),
            Some(answer) if answer == "n" => Ok(false),
            _ => Ok(default),
        }
    }

    fn choose(&mut self, _question: &str, _options: &[&str], default: usize) -> Result<usize, DeployError> {
        match self.answers.pop_front() {
            Some(answer) => Ok(answer.parse().unwrap_or(default)),
            None => Ok(default),
        }
    }
}

pub struct MockRegistry {
    pub group: String,
    pub admin_enabled: bool,
    pub login_server: String,
    pub tags: HashMap<String, Vec<String>>,
}

pub struct MockInstance {
    pub dns_label: String,
    pub region: String,
    /// Readiness polls observed so far
    pub shows: u32,
}

#[derive(Default)]
pub struct MockPlane {
    /// group name -> region
    pub groups: HashMap<String, String>,
    /// registry name -> registry (names are globally scoped)
    pub registries: HashMap<String, MockRegistry>,
    /// names taken by tenants this subscription cannot see
    pub foreign_names: Vec<String>,
    /// "group/name" -> instance
    pub instances: HashMap<String, MockInstance>,
    /// call log, e.g. "registry_create:regtest123"
    pub calls: Vec<String>,
    pub created_instances: u32,
    pub deleted_instances: u32,
    /// polls that report pending before the instance turns running
    pub pending_polls: u32,
    /// make any created instance go to failed instead of running
    pub fail_instance: bool,
}

/// In-memory control plane implementing every remote operation
pub struct MockProvider {
    pub plane: Mutex<MockPlane>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            plane: Mutex::new(MockPlane::default()),
        }
    }

    pub fn with_plane(plane: MockPlane) -> Self {
        Self {
            plane: Mutex::new(plane),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.plane.lock().unwrap().calls.clone()
    }

    pub fn called(&self, prefix: &str) -> bool {
        self.calls().iter().any(|c| c.starts_with(prefix))
    }

    fn registry_state(name: &str, registry: &MockRegistry) -> RegistryState {
        RegistryState {
            name: name.to_string(),
            exists: true,
            resource_group: registry.group.clone(),
            admin_enabled: registry.admin_enabled,
            login_server: registry.login_server.clone(),
            credentials: None,
        }
    }

    fn observe(instance: &MockInstance, state: InstanceState) -> InstanceObservation {
        InstanceObservation {
            state,
            public_ip: Some("20.0.0.1".to_string()),
            fqdn: Some(format!(
                "{}.{}.azurecontainer.io",
                instance.dns_label, instance.region
            )),
        }
    }
}

#[async_trait]
impl CloudProvider for MockProvider {
    async fn subscription_show(&self) -> Result<SubscriptionInfo, DeployError> {
        self.plane.lock().unwrap().calls.push("subscription_show".to_string());
        Ok(SubscriptionInfo {
            subscription_id: "sub-0000".to_string(),
            display_name: "Test Subscription".to_string(),
            tenant_id: "tenant-0000".to_string(),
        })
    }

    async fn group_exists(&self, name: &str) -> Result<Option<ResourceGroupState>, DeployError> {
        let mut plane = self.plane.lock().unwrap();
        plane.calls.push(format!("group_exists:{}", name));
        Ok(plane.groups.get(name).map(|region| ResourceGroupState {
            name: name.to_string(),
            exists: true,
            region: region.clone(),
        }))
    }

    async fn group_create(&self, name: &str, region: &str) -> Result<ResourceGroupState, DeployError> {
        let mut plane = self.plane.lock().unwrap();
        plane.calls.push(format!("group_create:{}", name));
        plane.groups.insert(name.to_string(), region.to_string());
        Ok(ResourceGroupState {
            name: name.to_string(),
            exists: true,
            region: region.to_string(),
        })
    }

    async fn registry_check_name(&self, name: &str) -> Result<RegistryNameCheck, DeployError> {
        let mut plane = self.plane.lock().unwrap();
        plane.calls.push(format!("registry_check_name:{}", name));
        let taken =
            plane.registries.contains_key(name) || plane.foreign_names.iter().any(|n| n == name);
        Ok(RegistryNameCheck {
            available: !taken,
            message: taken.then(|| "name already in use".to_string()),
        })
    }

    async fn registry_find(&self, name: &str) -> Result<Option<RegistryState>, DeployError> {
        let mut plane = self.plane.lock().unwrap();
        plane.calls.push(format!("registry_find:{}", name));
        Ok(plane
            .registries
            .get(name)
            .map(|r| Self::registry_state(name, r)))
    }

    async fn registry_show(
        &self,
        group: &str,
        name: &str,
    ) -> Result<Option<RegistryState>, DeployError> {
        let mut plane = self.plane.lock().unwrap();
        plane.calls.push(format!("registry_show:{}:{}", group, name));
        Ok(plane
            .registries
            .get(name)
            .filter(|r| r.group == group)
            .map(|r| Self::registry_state(name, r)))
    }

    async fn registry_create(
        &self,
        group: &str,
        name: &str,
        _region: &str,
    ) -> Result<RegistryState, DeployError> {
        let mut plane = self.plane.lock().unwrap();
        plane.calls.push(format!("registry_create:{}", name));
        if plane.registries.contains_key(name) || plane.foreign_names.iter().any(|n| n == name) {
            return Err(DeployError::CloudApiError(format!(
                "409 RegistryNameNotAvailable: {} is already in use",
                name
            )));
        }
        let registry = MockRegistry {
            group: group.to_string(),
            admin_enabled: true,
            login_server: format!("{}.azurecr.io", name),
            tags: HashMap::new(),
        };
        let state = Self::registry_state(name, &registry);
        plane.registries.insert(name.to_string(), registry);
        Ok(state)
    }

    async fn registry_enable_admin(&self, _group: &str, name: &str) -> Result<(), DeployError> {
        let mut plane = self.plane.lock().unwrap();
        plane.calls.push(format!("registry_enable_admin:{}", name));
        match plane.registries.get_mut(name) {
            Some(registry) => {
                registry.admin_enabled = true;
                Ok(())
            }
            None => Err(DeployError::NotFound(format!("registry {}", name))),
        }
    }

    async fn registry_credentials(
        &self,
        _group: &str,
        name: &str,
    ) -> Result<RegistryCredentials, DeployError> {
        let mut plane = self.plane.lock().unwrap();
        plane.calls.push(format!("registry_credentials:{}", name));
        if !plane.registries.contains_key(name) {
            return Err(DeployError::NotFound(format!("registry {}", name)));
        }
        Ok(RegistryCredentials {
            username: name.to_string(),
            password: SecretString::from("mock-password".to_string()),
        })
    }

    async fn registry_list_tags(
        &self,
        _login_server: &str,
        _credentials: &RegistryCredentials,
        repository: &str,
    ) -> Result<Vec<String>, DeployError> {
        let plane = self.plane.lock().unwrap();
        Ok(plane
            .registries
            .values()
            .find_map(|r| r.tags.get(repository))
            .cloned()
            .unwrap_or_default())
    }

    async fn instance_show(
        &self,
        group: &str,
        name: &str,
    ) -> Result<Option<InstanceObservation>, DeployError> {
        let mut plane = self.plane.lock().unwrap();
        plane.calls.push(format!("instance_show:{}", name));
        let pending_polls = plane.pending_polls;
        let fail = plane.fail_instance;
        let key = format!("{}/{}", group, name);
        Ok(plane.instances.get_mut(&key).map(|instance| {
            instance.shows += 1;
            let state = if fail {
                InstanceState::Failed
            } else if instance.shows > pending_polls {
                InstanceState::Running
            } else {
                InstanceState::Pending
            };
            Self::observe(instance, state)
        }))
    }

    async fn instance_delete(&self, group: &str, name: &str) -> Result<(), DeployError> {
        let mut plane = self.plane.lock().unwrap();
        plane.calls.push(format!("instance_delete:{}", name));
        plane.instances.remove(&format!("{}/{}", group, name));
        plane.deleted_instances += 1;
        Ok(())
    }

    async fn instance_create(
        &self,
        group: &str,
        spec: &InstanceSpec,
    ) -> Result<InstanceObservation, DeployError> {
        let mut plane = self.plane.lock().unwrap();
        plane.calls.push(format!("instance_create:{}", spec.name));
        let instance = MockInstance {
            dns_label: spec.dns_label.clone(),
            region: spec.region.clone(),
            shows: 0,
        };
        let observation = Self::observe(&instance, InstanceState::Pending);
        plane
            .instances
            .insert(format!("{}/{}", group, spec.name), instance);
        plane.created_instances += 1;
        Ok(observation)
    }
}

/// A minimal spec for reconciler tests
pub fn sample_spec(name: &str) -> InstanceSpec {
    InstanceSpec {
        name: name.to_string(),
        image: format!("regtest123.azurecr.io/app:{}", "v-20260805-120000"),
        region: "eastus".to_string(),
        cpu: 1.0,
        memory_gb: 1.5,
        port: 8080,
        env: HashMap::from([("MCP_TRANSPORT".to_string(), "sse".to_string())]),
        command: vec!["python".to_string(), "weather_server.py".to_string()],
        os_type: OsType::Linux,
        restart_policy: RestartPolicy::Always,
        public_ip: true,
        dns_label: name.to_string(),
        registry_auth: Some(ImageRegistryAuth {
            server: "regtest123.azurecr.io".to_string(),
            username: "regtest123".to_string(),
            password: SecretString::from("mock-password".to_string()),
        }),
    }
}

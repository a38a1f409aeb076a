//! Resource resolution
//!
//! Two structurally similar procedures with different uniqueness scopes.
//! Resource groups are unique per subscription, so a name either exists
//! here or is free. Registry names are unique across all tenants of the
//! provider: a name can be taken by a group we can see, or by someone we
//! cannot see at all, and creation on a taken name fails with a provider
//! collision error. The conflict branch therefore never creates; it
//! surfaces the owner and makes the operator decide.

use tracing::{info, warn};

use crate::config::prompt::Prompt;
use crate::config::validate_registry_name;
use crate::errors::DeployError;
use crate::models::resources::{RegistryState, ResourceGroupState};
use crate::provider::CloudProvider;

/// A resolved resource group, with whether this run created it
#[derive(Debug, Clone)]
pub struct ResolvedGroup {
    pub state: ResourceGroupState,
    pub created: bool,
}

/// A resolved registry, with whether this run created it
#[derive(Debug, Clone)]
pub struct ResolvedRegistry {
    pub state: RegistryState,
    pub created: bool,
}

pub struct ResourceResolver<'a> {
    provider: &'a dyn CloudProvider,
}

impl<'a> ResourceResolver<'a> {
    pub fn new(provider: &'a dyn CloudProvider) -> Self {
        Self { provider }
    }

    /// Resolve the target resource group: reuse it if present, otherwise
    /// offer region-tagged creation.
    pub async fn resolve_group(
        &self,
        prompt: &mut dyn Prompt,
        name: &str,
        region: &str,
    ) -> Result<ResolvedGroup, DeployError> {
        if let Some(group) = self.provider.group_exists(name).await? {
            info!("Resource group {} exists in {}, reusing", group.name, group.region);
            return Ok(ResolvedGroup {
                state: group,
                created: false,
            });
        }

        if !prompt.confirm(
            &format!("Resource group {} does not exist. Create it in {}?", name, region),
            true,
        )? {
            return Err(DeployError::PreconditionError(format!(
                "resource group {} is required",
                name
            )));
        }

        let group = self.provider.group_create(name, region).await?;
        info!("Created resource group {} in {}", group.name, group.region);
        Ok(ResolvedGroup {
            state: group,
            created: true,
        })
    }

    /// Resolve the registry, looping on operator-chosen names until one
    /// is created, reused, or explicitly reused from a foreign group.
    ///
    /// On success the returned state carries the owning resource group
    /// (which may differ from `target_group`), admin access enabled,
    /// and a fetched credential pair.
    pub async fn resolve_registry(
        &self,
        prompt: &mut dyn Prompt,
        target_group: &str,
        initial_name: &str,
        region: &str,
    ) -> Result<ResolvedRegistry, DeployError> {
        let mut name = initial_name.to_string();
        let mut created = false;

        let mut registry = loop {
            // Cheap per-group lookup first: a registry already in the
            // target group is always a straight reuse.
            if let Some(registry) = self.provider.registry_show(target_group, &name).await? {
                info!("Registry {} exists in {}, reusing", registry.name, target_group);
                break registry;
            }

            let check = self.provider.registry_check_name(&name).await?;
            if check.available {
                if !prompt.confirm(
                    &format!("Registry {} does not exist. Create it in {}?", name, target_group),
                    true,
                )? {
                    return Err(DeployError::PreconditionError(format!(
                        "registry {} is required",
                        name
                    )));
                }
                let registry = self.provider.registry_create(target_group, &name, region).await?;
                info!("Created registry {} ({})", registry.name, registry.login_server);
                created = true;
                break registry;
            }

            // Name is taken globally, but not by the target group
            match self.provider.registry_find(&name).await? {
                Some(existing) => {
                    warn!(
                        "Registry name {} is owned by resource group {}",
                        name, existing.resource_group
                    );
                    println!(
                        "Registry {} already exists, owned by resource group {}.",
                        name, existing.resource_group
                    );
                    let choice = prompt.choose(
                        "How do you want to proceed?",
                        &["Reuse it where it is", "Pick a different registry name"],
                        0,
                    )?;
                    if choice == 0 {
                        info!(
                            "Reusing registry {} from group {}",
                            existing.name, existing.resource_group
                        );
                        break existing;
                    }
                    name = self.ask_new_name(prompt).await?;
                }
                None => {
                    // Taken by a subscription or tenant we cannot see;
                    // reuse is impossible, creation would collide.
                    println!(
                        "Registry name {} is taken by another subscription or tenant{}",
                        name,
                        check
                            .message
                            .as_deref()
                            .map(|m| format!(" ({})", m))
                            .unwrap_or_default()
                    );
                    let choice = prompt.choose(
                        "How do you want to proceed?",
                        &["Pick a different registry name", "Abort"],
                        0,
                    )?;
                    if choice != 0 {
                        return Err(DeployError::NameConflict(format!(
                            "registry name {} is globally taken and not visible in this subscription",
                            name
                        )));
                    }
                    name = self.ask_new_name(prompt).await?;
                }
            }
        };

        // Admin pull credentials must be on before the pipeline runs;
        // enabling them is one of the two sanctioned in-place mutations.
        if !registry.admin_enabled {
            info!("Enabling admin access on registry {}", registry.name);
            self.provider
                .registry_enable_admin(&registry.resource_group, &registry.name)
                .await?;
            registry.admin_enabled = true;
        }

        let credentials = self
            .provider
            .registry_credentials(&registry.resource_group, &registry.name)
            .await?;
        registry.credentials = Some(credentials);

        Ok(ResolvedRegistry {
            state: registry,
            created,
        })
    }

    async fn ask_new_name(&self, prompt: &mut dyn Prompt) -> Result<String, DeployError> {
        loop {
            let answer = prompt.ask("New registry name", None)?;
            match validate_registry_name(&answer) {
                Ok(()) => return Ok(answer),
                Err(e) => println!("  {}", e),
            }
        }
    }
}

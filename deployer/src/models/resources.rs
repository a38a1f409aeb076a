//! Remote resource state models
//!
//! These are snapshots of provider-owned state, passed forward between
//! orchestration steps and never mutated backward.

use chrono::Utc;
use secrecy::SecretString;

/// The subscription the run operates against
#[derive(Debug, Clone)]
pub struct SubscriptionInfo {
    pub subscription_id: String,
    pub display_name: String,
    pub tenant_id: String,
}

/// Observed state of a resource group
#[derive(Debug, Clone)]
pub struct ResourceGroupState {
    pub name: String,
    pub exists: bool,
    pub region: String,
}

/// Admin credential pair for a registry
///
/// Fetched on demand and held in memory only; the password is never
/// written to disk or logged.
#[derive(Debug, Clone)]
pub struct RegistryCredentials {
    pub username: String,
    pub password: SecretString,
}

/// Observed state of a container registry
///
/// `resource_group` is the group that actually owns the registry, which
/// may differ from the run's target group: registry names are globally
/// unique across all tenants, so an existing name can belong to anyone.
#[derive(Debug, Clone)]
pub struct RegistryState {
    pub name: String,
    pub exists: bool,
    pub resource_group: String,
    pub admin_enabled: bool,
    pub login_server: String,
    pub credentials: Option<RegistryCredentials>,
}

/// Result of the global registry name availability check
#[derive(Debug, Clone)]
pub struct RegistryNameCheck {
    pub available: bool,
    pub message: Option<String>,
}

/// A built, tagged, pushable container image reference
///
/// Immutable once pushed; every run mints a fresh version tag instead of
/// mutating an existing one.
#[derive(Debug, Clone)]
pub struct ImageArtifact {
    /// Repository name inside the registry (carries the run suffix)
    pub repository: String,

    /// Time-derived version tag, distinct across runs
    pub version_tag: String,

    /// Registry login server the refs are qualified with
    pub login_server: String,
}

impl ImageArtifact {
    pub fn new(repository: impl Into<String>, login_server: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            version_tag: format!("v-{}", Utc::now().format("%Y%m%d-%H%M%S")),
            login_server: login_server.into(),
        }
    }

    /// Fully qualified reference for the version-stamped tag
    pub fn versioned_ref(&self) -> String {
        format!("{}/{}:{}", self.login_server, self.repository, self.version_tag)
    }

    /// Fully qualified reference for the floating `latest` tag
    pub fn latest_ref(&self) -> String {
        format!("{}/{}:latest", self.login_server, self.repository)
    }

    /// Both refs, in push order
    pub fn refs(&self) -> [String; 2] {
        [self.versioned_ref(), self.latest_ref()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_refs() {
        let artifact = ImageArtifact::new("weather-mcp-ab12cd34ef56", "myacr.azurecr.io");
        assert!(artifact.version_tag.starts_with("v-"));
        assert_eq!(
            artifact.versioned_ref(),
            format!("myacr.azurecr.io/weather-mcp-ab12cd34ef56:{}", artifact.version_tag)
        );
        assert_eq!(
            artifact.latest_ref(),
            "myacr.azurecr.io/weather-mcp-ab12cd34ef56:latest"
        );
    }
}

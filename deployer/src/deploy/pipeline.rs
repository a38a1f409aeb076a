//! Artifact pipeline: build, authenticate, push, verify

use tracing::{info, warn};

use crate::config::DeploymentConfig;
use crate::deploy::docker;
use crate::errors::DeployError;
use crate::models::resources::{ImageArtifact, RegistryState};
use crate::provider::CloudProvider;

pub struct ArtifactPipeline<'a> {
    provider: &'a dyn CloudProvider,
}

impl<'a> ArtifactPipeline<'a> {
    pub fn new(provider: &'a dyn CloudProvider) -> Self {
        Self { provider }
    }

    /// Build the image with both tags, push them, and verify the
    /// version tag is visible in the registry.
    ///
    /// Build, login, and push failures are fatal. The visibility check
    /// is advisory only: listing can lag a fresh push, and a truly
    /// missing image makes instance creation fail loudly anyway.
    pub async fn publish(
        &self,
        config: &DeploymentConfig,
        registry: &RegistryState,
        artifact: &ImageArtifact,
    ) -> Result<(), DeployError> {
        if !config.context_dir.join("Dockerfile").exists() {
            return Err(DeployError::BuildError(format!(
                "no Dockerfile in build context {}",
                config.context_dir.display()
            )));
        }

        let credentials = registry.credentials.as_ref().ok_or_else(|| {
            DeployError::Internal("registry credentials were not resolved".to_string())
        })?;

        let refs = artifact.refs();
        docker::build(&config.context_dir, &refs).await?;
        docker::login(&registry.login_server, &credentials.username, &credentials.password).await?;
        for image_ref in &refs {
            docker::push(image_ref).await?;
        }

        match self
            .provider
            .registry_list_tags(&registry.login_server, credentials, &artifact.repository)
            .await
        {
            Ok(tags) if tags.contains(&artifact.version_tag) => {
                info!(
                    "Verified tag {} in {}/{}",
                    artifact.version_tag, registry.login_server, artifact.repository
                );
            }
            Ok(tags) => {
                warn!(
                    "Tag {} not yet listed in {}/{} (saw {:?}); continuing, listing may lag",
                    artifact.version_tag, registry.login_server, artifact.repository, tags
                );
            }
            Err(e) => {
                warn!("Could not verify pushed tags: {}; continuing", e);
            }
        }

        Ok(())
    }
}

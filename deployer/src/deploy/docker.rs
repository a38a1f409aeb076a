//! Local docker CLI wrapper
//!
//! The control plane is driven over REST, but the image is built and
//! pushed with the operator's local docker installation.

use std::path::Path;
use std::process::Stdio;

use secrecy::{ExposeSecret, SecretString};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

use crate::errors::DeployError;

/// Report the docker client version
pub async fn version() -> Result<String, DeployError> {
    let output = Command::new("docker")
        .args(["--version"])
        .output()
        .await
        .map_err(|e| DeployError::PreconditionError(format!("failed to run docker: {}", e)))?;

    if !output.status.success() {
        return Err(DeployError::PreconditionError(
            "docker --version failed".to_string(),
        ));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Check that the docker daemon answers
pub async fn daemon_ready() -> Result<(), DeployError> {
    let output = Command::new("docker")
        .args(["info", "--format", "{{.ServerVersion}}"])
        .output()
        .await
        .map_err(|e| DeployError::PreconditionError(format!("failed to run docker info: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(DeployError::PreconditionError(format!(
            "docker daemon not reachable: {}",
            stderr.trim()
        )));
    }

    debug!(
        "Docker daemon version: {}",
        String::from_utf8_lossy(&output.stdout).trim()
    );
    Ok(())
}

/// Build the image from the given context, applying every tag at once
pub async fn build(context: &Path, tags: &[String]) -> Result<(), DeployError> {
    info!("Building image from {} with {} tag(s)", context.display(), tags.len());

    let mut command = Command::new("docker");
    command.arg("build");
    for tag in tags {
        command.args(["-t", tag]);
    }
    command.arg(context);

    let status = command
        .status()
        .await
        .map_err(|e| DeployError::BuildError(format!("failed to run docker build: {}", e)))?;

    if !status.success() {
        return Err(DeployError::BuildError(format!(
            "docker build failed for context {}",
            context.display()
        )));
    }

    Ok(())
}

/// Log in to a registry, feeding the password over stdin so it never
/// appears in the process list
pub async fn login(server: &str, username: &str, password: &SecretString) -> Result<(), DeployError> {
    debug!("Authenticating to registry {}", server);

    let mut child = Command::new("docker")
        .args(["login", server, "-u", username, "--password-stdin"])
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| DeployError::PushError(format!("failed to run docker login: {}", e)))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(password.expose_secret().as_bytes())
            .await
            .map_err(|e| DeployError::PushError(format!("failed to pass credential: {}", e)))?;
    }

    let output = child
        .wait_with_output()
        .await
        .map_err(|e| DeployError::PushError(format!("docker login did not finish: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(DeployError::PushError(format!(
            "docker login to {} failed: {}",
            server,
            stderr.trim()
        )));
    }

    info!("Authenticated to registry {}", server);
    Ok(())
}

/// Push a single tag
pub async fn push(tag: &str) -> Result<(), DeployError> {
    info!("Pushing {}", tag);

    let status = Command::new("docker")
        .args(["push", tag])
        .status()
        .await
        .map_err(|e| DeployError::PushError(format!("failed to run docker push: {}", e)))?;

    if !status.success() {
        return Err(DeployError::PushError(format!("docker push failed for {}", tag)));
    }

    Ok(())
}

//! Instance spec and observation models

use std::collections::HashMap;

use secrecy::SecretString;

/// Operating system of the container host
///
/// A required part of every create call; the provider rejects creation
/// without it, so the spec cannot be constructed without one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsType {
    Linux,
    Windows,
}

impl OsType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OsType::Linux => "Linux",
            OsType::Windows => "Windows",
        }
    }
}

/// Restart policy for the instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartPolicy {
    Always,
    OnFailure,
    Never,
}

impl RestartPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            RestartPolicy::Always => "Always",
            RestartPolicy::OnFailure => "OnFailure",
            RestartPolicy::Never => "Never",
        }
    }
}

/// Pull credential handed to the instance for its image registry
#[derive(Debug, Clone)]
pub struct ImageRegistryAuth {
    pub server: String,
    pub username: String,
    pub password: SecretString,
}

/// Desired state of the single compute instance
#[derive(Debug, Clone)]
pub struct InstanceSpec {
    /// Instance name (base name + collision suffix)
    pub name: String,

    /// Fully qualified image reference to run
    pub image: String,

    /// Region the instance is created in
    pub region: String,

    pub cpu: f64,
    pub memory_gb: f64,

    /// The single exposed port
    pub port: u16,

    pub env: HashMap<String, String>,

    /// Explicit start command, fully replacing the image's default
    /// arguments. The baked-in defaults win over same-named environment
    /// variables in the workload's argument parser, so environment
    /// alone would silently leave the server in the wrong transport.
    pub command: Vec<String>,

    pub os_type: OsType,
    pub restart_policy: RestartPolicy,

    /// Request a public IP for the instance
    pub public_ip: bool,

    /// Region-unique DNS label
    pub dns_label: String,

    pub registry_auth: Option<ImageRegistryAuth>,
}

/// Polled lifecycle state of the instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceState {
    Unknown,
    Pending,
    Running,
    Failed,
}

impl std::fmt::Display for InstanceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            InstanceState::Unknown => "unknown",
            InstanceState::Pending => "pending",
            InstanceState::Running => "running",
            InstanceState::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// One polled observation of the running instance
///
/// Discarded and recreated on every redeploy, never updated in place.
#[derive(Debug, Clone)]
pub struct InstanceObservation {
    pub state: InstanceState,
    pub public_ip: Option<String>,
    pub fqdn: Option<String>,
}

//! Authentication against the cloud control plane

pub mod access_token;
pub mod login;

use tracing::{info, warn};

use crate::authn::access_token::AccessToken;
use crate::config::prompt::Prompt;
use crate::errors::DeployError;

/// Environment variable holding a pre-acquired ARM bearer token
pub const TOKEN_ENV_VAR: &str = "AZURE_ACCESS_TOKEN";

/// Produce a valid, non-expired session token.
///
/// Prefers `AZURE_ACCESS_TOKEN`; if that is missing or expired, asks the
/// operator for consent to run the device-code sign-in. Refusal aborts
/// the run before any remote state is touched.
pub async fn ensure_session(
    prompt: &mut dyn Prompt,
    tenant: &str,
) -> Result<AccessToken, DeployError> {
    if let Ok(raw) = std::env::var(TOKEN_ENV_VAR) {
        let token = AccessToken::from_raw(raw)?;
        if !token.is_expired() {
            info!("Using session from {} (expires {})", TOKEN_ENV_VAR, token.expires_at());
            return Ok(token);
        }
        warn!("Token in {} is expired", TOKEN_ENV_VAR);
    }

    let consent = prompt.confirm(
        "No valid Azure session found. Sign in with a device code now?",
        true,
    )?;
    if !consent {
        return Err(DeployError::PreconditionError(format!(
            "not authenticated; set {} or consent to the device-code sign-in",
            TOKEN_ENV_VAR
        )));
    }

    let token = login::device_code_login(tenant).await?;
    info!("Signed in; session expires {}", token.expires_at());
    Ok(token)
}

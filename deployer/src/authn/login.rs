//! OAuth2 device-code sign-in against the Microsoft identity platform

use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::authn::access_token::AccessToken;
use crate::errors::DeployError;

/// Well-known public client ID of the Azure CLI
const CLIENT_ID: &str = "04b07795-8ddb-461a-bbee-02f9e1bf7b46";

/// Scope for management-plane tokens
const ARM_SCOPE: &str = "https://management.azure.com/.default";

const LOGIN_BASE: &str = "https://login.microsoftonline.com";

#[derive(Debug, Deserialize)]
struct DeviceCodeResponse {
    device_code: String,
    user_code: String,
    verification_uri: String,
    expires_in: u64,
    interval: u64,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Run the device-code flow and return a management-plane token.
///
/// Prints the verification URL and user code, then polls the token
/// endpoint at the server-directed interval until the operator finishes
/// signing in or the code expires.
pub async fn device_code_login(tenant: &str) -> Result<AccessToken, DeployError> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()?;

    let device: DeviceCodeResponse = request_device_code(&client, tenant).await?;

    match &device.message {
        Some(message) => println!("{}", message),
        None => println!(
            "To sign in, open {} and enter the code {}",
            device.verification_uri, device.user_code
        ),
    }

    let mut interval = device.interval.max(1);
    let deadline = tokio::time::Instant::now() + Duration::from_secs(device.expires_in);

    loop {
        if tokio::time::Instant::now() >= deadline {
            return Err(DeployError::AuthError(
                "device code expired before sign-in completed".to_string(),
            ));
        }
        tokio::time::sleep(Duration::from_secs(interval)).await;

        let response = client
            .post(format!("{}/{}/oauth2/v2.0/token", LOGIN_BASE, tenant))
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:device_code"),
                ("client_id", CLIENT_ID),
                ("device_code", device.device_code.as_str()),
            ])
            .send()
            .await?;

        if response.status().is_success() {
            let token: TokenResponse = response.json().await?;
            return AccessToken::from_raw(token.access_token);
        }

        let body = response.text().await.unwrap_or_default();
        let pending: TokenErrorResponse = serde_json::from_str(&body).map_err(|_| {
            DeployError::AuthError(format!("unexpected token endpoint response: {}", body))
        })?;

        match pending.error.as_str() {
            "authorization_pending" => {
                debug!("Sign-in pending, polling again in {}s", interval);
            }
            "slow_down" => {
                interval += 5;
            }
            _ => {
                return Err(DeployError::AuthError(format!(
                    "device-code sign-in failed: {}",
                    pending.error_description.unwrap_or(pending.error)
                )));
            }
        }
    }
}

async fn request_device_code(
    client: &reqwest::Client,
    tenant: &str,
) -> Result<DeviceCodeResponse, DeployError> {
    let response = client
        .post(format!("{}/{}/oauth2/v2.0/devicecode", LOGIN_BASE, tenant))
        .form(&[("client_id", CLIENT_ID), ("scope", ARM_SCOPE)])
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(DeployError::AuthError(format!(
            "device code request failed: {} - {}",
            status, body
        )));
    }

    Ok(response.json().await?)
}

//! Google OAuth credential loading and access token refresh.

use std::env;

use serde::Deserialize;
use tracing::info;

use crate::{secrets, Error, Result};

/// Scope requested when refreshing the access token.
pub const CALENDAR_SCOPE: &str = "https://www.googleapis.com/auth/calendar";

/// Authorized-user credentials able to mint access tokens.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    /// Token endpoint carried by the credentials blob, if any
    #[serde(default)]
    pub token_uri: Option<String>,
}

impl GoogleCredentials {
    /// Parse an authorized-user JSON blob.
    pub fn from_json(blob: &str) -> Result<Self> {
        serde_json::from_str(blob)
            .map_err(|e| Error::Auth(format!("Failed to parse Google credentials: {}", e)))
    }
}

/// Where the Google credentials come from.
#[derive(Debug, Clone)]
pub enum CredentialSource {
    /// ARN of a Secrets Manager secret holding the JSON blob
    SecretsManager(String),
    /// JSON blob supplied inline
    Inline(String),
    /// Individual values from the environment
    Parts(GoogleCredentials),
}

impl CredentialSource {
    /// Pick the credential source from the environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Pick the credential source through `lookup`.
    ///
    /// `GOOGLE_CREDENTIALS_SECRET_ARN` wins over `GOOGLE_CREDENTIALS`, which wins
    /// over `CLIENT_ID` / `CLIENT_SECRET` / `REFRESH_TOKEN`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(arn) = lookup("GOOGLE_CREDENTIALS_SECRET_ARN") {
            return Ok(Self::SecretsManager(arn));
        }
        if let Some(blob) = lookup("GOOGLE_CREDENTIALS") {
            return Ok(Self::Inline(blob));
        }

        let var = |name: &str| match lookup(name) {
            Some(value) => Ok(value),
            None => Err(Error::Auth(format!("{} not set", name))),
        };

        Ok(Self::Parts(GoogleCredentials {
            client_id: var("CLIENT_ID")?,
            client_secret: var("CLIENT_SECRET")?,
            refresh_token: var("REFRESH_TOKEN")?,
            token_uri: None,
        }))
    }

    /// Resolve the source into concrete credentials.
    pub async fn load(self) -> Result<GoogleCredentials> {
        match self {
            Self::SecretsManager(arn) => {
                let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
                let client = aws_sdk_secretsmanager::Client::new(&config);
                secrets::get_google_credentials(&client, &arn).await
            }
            Self::Inline(blob) => GoogleCredentials::from_json(&blob),
            Self::Parts(creds) => Ok(creds),
        }
    }
}

/// Token endpoint response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Exchange the refresh token for a fresh access token.
///
/// `default_token_uri` is used unless the credentials carry their own.
pub async fn refresh_access_token(
    http_client: &reqwest::Client,
    credentials: &GoogleCredentials,
    default_token_uri: &str,
) -> Result<String> {
    let token_uri = credentials.token_uri.as_deref().unwrap_or(default_token_uri);

    let params = [
        ("refresh_token", credentials.refresh_token.as_str()),
        ("client_id", credentials.client_id.as_str()),
        ("client_secret", credentials.client_secret.as_str()),
        ("grant_type", "refresh_token"),
        ("scope", CALENDAR_SCOPE),
    ];

    let response = http_client
        .post(token_uri)
        .form(&params)
        .send()
        .await
        .map_err(|e| Error::Auth(format!("Token refresh request failed: {}", e)))?;

    if !response.status().is_success() {
        let status = response.status();
        let error_text = response.text().await.unwrap_or_default();
        return Err(Error::Auth(format!(
            "Token refresh failed ({}): {}",
            status, error_text
        )));
    }

    let token: TokenResponse = response
        .json()
        .await
        .map_err(|e| Error::Auth(format!("Failed to parse token response: {}", e)))?;

    info!(expires_in = ?token.expires_in, "Refreshed Google access token");

    Ok(token.access_token)
}

//! GitHub App installation authentication.
//!
//! An App authenticates in two hops: a short-lived RS256 JWT signed with the
//! App's private key, exchanged at
//! `POST /app/installations/{installation_id}/access_tokens` for an
//! installation token. The installation token is what [`GitHubClient`]
//! sends on every API call.
//!
//! [`GitHubClient`]: crate::GitHubClient

use chrono::{DateTime, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::client::{api_root, bearer, default_user_agent, error_from_response, http_client};
use crate::error::GitHubError;
use crate::models::InstallationTokenBody;
use crate::Result;

/// Backdate `iat` to absorb clock drift between runner and GitHub.
const CLOCK_DRIFT_SECS: i64 = 60;
/// GitHub rejects App JWTs that live longer than ten minutes.
const JWT_LIFETIME_SECS: i64 = 540;

/// The App / installation triple.
pub struct AppCredentials {
    /// App ID or client ID, used as the JWT issuer.
    pub app_id: String,
    pub installation_id: u64,
    /// PEM-encoded RSA private key of the App.
    pub private_key: SecretString,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct AppClaims {
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
}

/// Sign the App JWT valid from `now - 60s` to `now + 9min`.
pub(crate) fn app_jwt(
    app_id: &str,
    private_key: &SecretString,
    now: DateTime<Utc>,
) -> Result<String> {
    let key = EncodingKey::from_rsa_pem(private_key.expose_secret().as_bytes())
        .map_err(|e| GitHubError::InvalidPrivateKey(e.to_string()))?;
    let claims = AppClaims {
        iat: now.timestamp() - CLOCK_DRIFT_SECS,
        exp: now.timestamp() + JWT_LIFETIME_SECS,
        iss: app_id.to_string(),
    };
    Ok(encode(&Header::new(Algorithm::RS256), &claims, &key)?)
}

/// Exchanges App credentials for an installation token.
pub struct AppAuthenticator {
    http: Client,
    base_url: Url,
    credentials: AppCredentials,
}

impl AppAuthenticator {
    /// `base_url` is the API root, as for [`GitHubConfig`](crate::GitHubConfig).
    pub fn new(base_url: &str, credentials: AppCredentials) -> Result<Self> {
        Ok(Self {
            http: http_client(&default_user_agent(), None)?,
            base_url: api_root(base_url)?,
            credentials,
        })
    }

    /// Sign a fresh JWT and trade it for an installation token.
    pub async fn installation_token(&self) -> Result<SecretString> {
        let jwt = app_jwt(
            &self.credentials.app_id,
            &self.credentials.private_key,
            Utc::now(),
        )?;
        let url = self
            .base_url
            .join(&format!(
                "app/installations/{}/access_tokens",
                self.credentials.installation_id
            ))
            .map_err(|e| GitHubError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })?;

        let response = self
            .http
            .post(url)
            .header(AUTHORIZATION, bearer(&jwt)?)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(GitHubError::TokenExchange(error_from_response(response).await));
        }

        let body: InstallationTokenBody = response.json().await?;
        info!(
            installation_id = self.credentials.installation_id,
            expires_at = ?body.expires_at,
            "obtained GitHub App installation token"
        );
        Ok(SecretString::new(body.token.into()))
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! GitHub App installation-token minting and caching.
//!
//! The manager signs a short-lived RS256 app JWT, exchanges it for an
//! installation token at the host's token endpoint, and caches the result
//! until shortly before expiry. It is process-wide state with an explicit
//! constructor and holds no caller identity: installation ids arrive with
//! each request.

use crate::error::{ProviderError, ProviderErrorKind};
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Margin subtracted from a token's expiry before it is considered stale.
const EXPIRY_MARGIN_MINS: i64 = 5;

/// App JWT lifetime. GitHub caps app JWTs at 10 minutes.
const JWT_LIFETIME_MINS: i64 = 9;

/// Static GitHub App configuration, from the environment at process start.
#[derive(Clone)]
pub struct GithubAppConfig {
    pub app_id: String,
    /// PEM-encoded RSA private key.
    pub private_key: String,
    /// Enterprise host, when not github.com.
    pub enterprise_host: Option<String>,
}

impl GithubAppConfig {
    /// Load from `GITHUB_APP_ID` / `GITHUB_APP_PRIVATE_KEY` /
    /// `GITHUB_ENTERPRISE_HOST`. Returns None when the app is not
    /// configured (provider passthrough then requires user tokens).
    pub fn from_env() -> Option<Self> {
        let app_id = std::env::var("GITHUB_APP_ID").ok().filter(|v| !v.is_empty())?;
        let private_key = std::env::var("GITHUB_APP_PRIVATE_KEY").ok().filter(|v| !v.is_empty())?;
        Some(Self {
            app_id,
            private_key,
            enterprise_host: std::env::var("GITHUB_ENTERPRISE_HOST").ok().filter(|v| !v.is_empty()),
        })
    }
}

/// A user ↔ installation mapping entry, persisted per namespace by the
/// cluster layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallationRecord {
    pub user_id: String,
    pub installation_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connected_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
struct AppClaims {
    iat: i64,
    exp: i64,
    iss: String,
}

#[derive(Debug, Deserialize)]
struct InstallationTokenResponse {
    token: String,
    expires_at: DateTime<Utc>,
}

#[derive(Clone)]
struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

/// Mints and caches installation tokens for (installation, host) pairs.
pub struct TokenManager {
    config: GithubAppConfig,
    http: reqwest::Client,
    cache: Mutex<HashMap<(u64, String), CachedToken>>,
}

impl TokenManager {
    pub fn new(config: GithubAppConfig, http: reqwest::Client) -> Self {
        Self { config, http, cache: Mutex::new(HashMap::new()) }
    }

    /// The default host tokens are minted for.
    pub fn default_host(&self) -> &str {
        self.config.enterprise_host.as_deref().unwrap_or("github.com")
    }

    /// Mint (or reuse) an installation token for the given installation on
    /// the given host.
    pub async fn mint_installation_token_for_host(
        &self,
        installation_id: u64,
        host: &str,
    ) -> Result<String, ProviderError> {
        let key = (installation_id, host.to_string());
        let now = Utc::now();
        if let Some(cached) = self.cache.lock().get(&key) {
            if cached.expires_at - Duration::minutes(EXPIRY_MARGIN_MINS) > now {
                return Ok(cached.token.clone());
            }
        }

        let jwt = self.sign_app_jwt(now)?;
        let url = token_endpoint(host, installation_id);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&jwt)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .send()
            .await
            .map_err(|e| ProviderError::other(format!("token endpoint unreachable: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(
                status.as_u16(),
                format!("installation token mint failed: {body}"),
                None,
            )
            .with_remediation(
                "Check the GitHub App id/key and that the app is installed for this account",
            ));
        }

        let minted: InstallationTokenResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::other(format!("malformed token response: {e}")))?;

        self.cache.lock().insert(
            key,
            CachedToken { token: minted.token.clone(), expires_at: minted.expires_at },
        );
        Ok(minted.token)
    }

    fn sign_app_jwt(&self, now: DateTime<Utc>) -> Result<String, ProviderError> {
        let claims = AppClaims {
            // Backdate to absorb clock skew between us and the provider.
            iat: (now - Duration::minutes(1)).timestamp(),
            exp: (now + Duration::minutes(JWT_LIFETIME_MINS)).timestamp(),
            iss: self.config.app_id.clone(),
        };
        let key = jsonwebtoken::EncodingKey::from_rsa_pem(self.config.private_key.as_bytes())
            .map_err(|e| {
                ProviderError::new(
                    ProviderErrorKind::Auth,
                    format!("invalid GitHub App private key: {e}"),
                )
                .with_remediation("Provide a PKCS#1/PKCS#8 PEM key in GITHUB_APP_PRIVATE_KEY")
            })?;
        jsonwebtoken::encode(
            &jsonwebtoken::Header::new(jsonwebtoken::Algorithm::RS256),
            &claims,
            &key,
        )
        .map_err(|e| ProviderError::other(format!("jwt signing failed: {e}")))
    }

    /// Drop all cached tokens (tests, disconnect).
    pub fn clear_cache(&self) {
        self.cache.lock().clear();
    }

    #[cfg(test)]
    pub(crate) fn cache_token(&self, installation_id: u64, host: &str, token: &str, expires_at: DateTime<Utc>) {
        self.cache.lock().insert(
            (installation_id, host.to_string()),
            CachedToken { token: token.to_string(), expires_at },
        );
    }
}

fn token_endpoint(host: &str, installation_id: u64) -> String {
    if host == "github.com" {
        format!("https://api.github.com/app/installations/{installation_id}/access_tokens")
    } else {
        format!("https://{host}/api/v3/app/installations/{installation_id}/access_tokens")
    }
}

#[cfg(test)]
#[path = "token_tests.rs"]
mod tests;

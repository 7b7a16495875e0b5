// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Bearer tokens for workspace requests.
//!
//! A personal access token is used as-is. Service principal credentials go
//! through the workspace OIDC token endpoint with the client-credentials
//! grant; the access token is cached until shortly before it expires.

use crate::Result;
use crate::config::Credentials;
use crate::error::PlatformError;
use diagnostics::*;
use oauth2::{
    AuthUrl, ClientId, ClientSecret, Scope, TokenResponse, TokenUrl, basic::BasicClient,
    reqwest::async_http_client,
};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

const OAUTH_SCOPE: &str = "all-apis";

/// Refresh this long before the reported expiry
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Used when the token endpoint omits `expires_in`
const DEFAULT_LIFETIME: Duration = Duration::from_secs(3600);

struct CachedToken {
    secret: String,
    refresh_at: Instant,
}

pub struct TokenSource {
    credentials: Credentials,
    base_url: String,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenSource {
    pub fn new(credentials: Credentials, base_url: &str) -> Self {
        Self {
            credentials,
            base_url: base_url.to_string(),
            cached: Mutex::new(None),
        }
    }

    /// Current access token, fetching a new one when needed
    pub async fn bearer(&self) -> Result<String> {
        let (client_id, client_secret) = match &self.credentials {
            Credentials::Token(token) => return Ok(token.clone()),
            Credentials::ClientCredentials {
                client_id,
                client_secret,
            } => (client_id, client_secret),
        };

        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.refresh_at {
                return Ok(token.secret.clone());
            }
        }

        debug!("Requesting OAuth token for {client_id}", client_id: client_id.as_str());
        let fresh = self.exchange(client_id, client_secret).await?;
        let secret = fresh.secret.clone();
        *cached = Some(fresh);
        Ok(secret)
    }

    async fn exchange(&self, client_id: &str, client_secret: &str) -> Result<CachedToken> {
        let oauth_client = BasicClient::new(
            ClientId::new(client_id.to_string()),
            Some(ClientSecret::new(client_secret.to_string())),
            AuthUrl::new(self.auth_url())
                .map_err(|e| PlatformError::Auth(format!("invalid authorization URL: {e}")))?,
            Some(
                TokenUrl::new(self.token_url())
                    .map_err(|e| PlatformError::Auth(format!("invalid token URL: {e}")))?,
            ),
        );

        let token = oauth_client
            .exchange_client_credentials()
            .add_scope(Scope::new(OAUTH_SCOPE.to_string()))
            .request_async(async_http_client)
            .await
            .map_err(|e| {
                PlatformError::Auth(format!(
                    "client-credentials exchange at {} failed: {e}",
                    self.token_url()
                ))
            })?;

        let lifetime = token.expires_in().unwrap_or(DEFAULT_LIFETIME);
        Ok(CachedToken {
            secret: token.access_token().secret().clone(),
            refresh_at: Instant::now() + lifetime.saturating_sub(EXPIRY_MARGIN),
        })
    }

    fn auth_url(&self) -> String {
        format!("{}/oidc/v1/authorize", self.base_url)
    }

    fn token_url(&self) -> String {
        format!("{}/oidc/v1/token", self.base_url)
    }
}

//! Trusted-publishing token exchange
//!
//! Exchanges the ambient CI identity token for a short-lived registry
//! token. Registry tokens are package-scoped, so the exchange runs
//! fresh for every package name.

use serde::Deserialize;
use tracing::{debug, instrument};

use gantry_core::error::RegistryError;

/// Identity-token endpoint configuration, as exposed by the CI runner.
#[derive(Debug, Clone)]
pub struct OidcConfig {
    /// Identity-token request URL
    pub request_url: String,
    /// Bearer token authorizing the identity-token request
    pub request_token: String,
    /// Audience the identity token is minted for
    pub audience: String,
}

impl OidcConfig {
    pub fn new(request_url: String, request_token: String) -> Self {
        Self {
            request_url,
            request_token,
            audience: "npm:registry.npmjs.org".to_string(),
        }
    }

    /// Set the token audience
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = audience.into();
        self
    }
}

/// Token exchange client.
pub(crate) struct OidcExchange {
    config: OidcConfig,
    registry_url: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct IdentityTokenResponse {
    value: String,
}

#[derive(Deserialize)]
struct RegistryTokenResponse {
    token: String,
}

impl OidcExchange {
    pub(crate) fn new(config: OidcConfig, registry_url: String, client: reqwest::Client) -> Self {
        Self {
            config,
            registry_url,
            client,
        }
    }

    /// Obtain a registry token scoped to `package_name`.
    #[instrument(skip(self))]
    pub(crate) async fn mint_for(&self, package_name: &str) -> Result<String, RegistryError> {
        let id_token = self.exchange_identity_token().await?;
        let registry_token = self
            .exchange_registry_token(package_name, &id_token)
            .await?;
        debug!(package = package_name, "registry token minted");
        Ok(registry_token)
    }

    /// Request an identity token for the configured audience.
    async fn exchange_identity_token(&self) -> Result<String, RegistryError> {
        let separator = if self.config.request_url.contains('?') {
            '&'
        } else {
            '?'
        };
        let url = format!(
            "{}{}audience={}",
            self.config.request_url, separator, self.config.audience
        );

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.config.request_token)
            .send()
            .await
            .map_err(|e| RegistryError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(RegistryError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: IdentityTokenResponse = response
            .json()
            .await
            .map_err(|e| RegistryError::RequestFailed(e.to_string()))?;
        Ok(body.value)
    }

    /// Trade the identity token for a package-scoped registry token.
    async fn exchange_registry_token(
        &self,
        package_name: &str,
        id_token: &str,
    ) -> Result<String, RegistryError> {
        let url = format!(
            "{}/-/npm/v1/oidc/token/exchange/package/{}",
            self.registry_url.trim_end_matches('/'),
            package_name.replace('/', "%2F")
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(id_token)
            .send()
            .await
            .map_err(|e| RegistryError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(RegistryError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: RegistryTokenResponse = response
            .json()
            .await
            .map_err(|e| RegistryError::RequestFailed(e.to_string()))?;
        Ok(body.token)
    }
}

//! npm registry adapter

use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

use gantry_core::error::RegistryError;
use gantry_core::package::Package;
use gantry_core::traits::{AuthStrategy, LookupOutcome, PackageMetadata, Registry};
use gantry_core::version::{PrereleaseId, PublishTag};

use crate::credentials::{ensure_credentials_file, registry_host};
use crate::oidc::{OidcConfig, OidcExchange};
use crate::pnpm::run_pnpm;

/// Environment variable the static-token credentials placeholder expands.
const STATIC_TOKEN_ENV: &str = "NODE_AUTH_TOKEN";

/// Environment variable carrying per-package trusted-publishing tokens.
const EXCHANGED_TOKEN_ENV: &str = "GANTRY_REGISTRY_TOKEN";

/// npm registry configuration
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Registry base URL
    pub registry_url: String,
    /// Identity-token exchange endpoint, when trusted publishing is on
    pub oidc: Option<OidcConfig>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            registry_url: "https://registry.npmjs.org".to_string(),
            oidc: None,
        }
    }
}

impl RegistryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the registry base URL
    pub fn with_registry_url(mut self, url: impl Into<String>) -> Self {
        self.registry_url = url.into();
        self
    }

    /// Enable trusted publishing
    pub fn with_oidc(mut self, oidc: OidcConfig) -> Self {
        self.oidc = Some(oidc);
        self
    }
}

/// npm registry adapter: metadata over HTTP, mutations through pnpm.
pub struct NpmRegistry {
    config: RegistryConfig,
    client: reqwest::Client,
}

/// Registry metadata document (the fields the gate cares about)
#[derive(Debug, Deserialize)]
struct ViewResponse {
    name: Option<String>,
    #[serde(default, rename = "dist-tags")]
    dist_tags: std::collections::HashMap<String, String>,
}

impl NpmRegistry {
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn metadata_url(&self, name: &str) -> String {
        format!(
            "{}/{}",
            self.config.registry_url.trim_end_matches('/'),
            name.replace('/', "%2F")
        )
    }

    fn oidc_exchange(&self) -> Result<OidcExchange, RegistryError> {
        let oidc = self.config.oidc.clone().ok_or_else(|| {
            RegistryError::AuthenticationFailed(
                "trusted publishing requested but no identity-token endpoint configured"
                    .to_string(),
            )
        })?;
        Ok(OidcExchange::new(
            oidc,
            self.config.registry_url.clone(),
            self.client.clone(),
        ))
    }
}

#[async_trait]
impl Registry for NpmRegistry {
    /// Metadata lookup. 404 is a definitive "not published"; transport
    /// and decode failures stay ambiguous.
    #[instrument(skip(self))]
    async fn view(&self, name: &str) -> LookupOutcome {
        let url = self.metadata_url(name);

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => return LookupOutcome::Failed(e.to_string()),
        };

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return LookupOutcome::NotFound;
        }
        if !status.is_success() {
            return LookupOutcome::Failed(format!("registry returned {}", status));
        }

        let body: ViewResponse = match response.json().await {
            Ok(body) => body,
            Err(e) => return LookupOutcome::Failed(e.to_string()),
        };

        match body.name {
            Some(name) if !name.is_empty() => {
                let latest = body.dist_tags.get("latest").cloned();
                LookupOutcome::Found(PackageMetadata { name, latest })
            }
            _ => LookupOutcome::NotFound,
        }
    }

    #[instrument(skip(self, pkg), fields(package = %pkg.name))]
    async fn version_prerelease(
        &self,
        pkg: &Package,
        preid: &PrereleaseId,
    ) -> Result<String, RegistryError> {
        let preid_arg = format!("--preid={}", preid);
        let output = run_pnpm(
            &pkg.path,
            &[
                "version",
                "prerelease",
                preid_arg.as_str(),
                "--no-git-tag-version",
            ],
            &[],
        )
        .await?;

        Ok(output.trim().to_string())
    }

    /// Materialize authentication once, before the first publish.
    async fn prepare_auth(
        &self,
        workspace_root: &Path,
        strategy: AuthStrategy,
    ) -> Result<(), RegistryError> {
        let host = registry_host(&self.config.registry_url);
        match strategy {
            // Whatever is already there is used as-is.
            AuthStrategy::CredentialsFile => Ok(()),
            AuthStrategy::StaticToken => {
                ensure_credentials_file(workspace_root, host, STATIC_TOKEN_ENV)
            }
            AuthStrategy::TrustedPublishing => {
                ensure_credentials_file(workspace_root, host, EXCHANGED_TOKEN_ENV)
            }
        }
    }

    /// Publish the bumped package. The version bump leaves the working
    /// tree dirty, hence `--no-git-checks`.
    #[instrument(skip(self, pkg), fields(package = %pkg.name, tag = %tag))]
    async fn publish(
        &self,
        pkg: &Package,
        tag: &PublishTag,
        strategy: AuthStrategy,
    ) -> Result<(), RegistryError> {
        let tag_arg = format!("--tag={}", tag);
        let args = [
            "publish",
            tag_arg.as_str(),
            "--no-git-checks",
            "--provenance",
        ];

        match strategy {
            AuthStrategy::CredentialsFile | AuthStrategy::StaticToken => {
                run_pnpm(&pkg.path, &args, &[]).await?;
            }
            AuthStrategy::TrustedPublishing => {
                // Tokens are package-scoped; mint a fresh one and hand it
                // to pnpm through the environment only.
                let token = self.oidc_exchange()?.mint_for(&pkg.name).await?;
                run_pnpm(&pkg.path, &args, &[(EXCHANGED_TOKEN_ENV, token.as_str())]).await?;
            }
        }

        debug!(package = %pkg.name, "published");
        Ok(())
    }
}

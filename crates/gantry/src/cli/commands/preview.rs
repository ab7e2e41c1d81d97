//! Preview release command

use std::path::PathBuf;

use clap::Args;
use console::style;
use tracing::debug;

use gantry_core::context::{RepoSlug, RunContext};
use gantry_core::traits::Scm;
use gantry_core::{GantryError, PreviewRun};
use gantry_git::GitScm;
use gantry_github::{render_preview_comment, GithubClient};
use gantry_registry::{NpmRegistry, OidcConfig, PnpmInventory, RegistryConfig};

/// Publish preview builds of changed packages for a pull request
#[derive(Debug, Args)]
pub struct PreviewCommand {
    /// Repository in owner/name form
    #[arg(long, env = "GITHUB_REPOSITORY")]
    pub repo: RepoSlug,

    /// Pull request number; scopes the dist-tag
    #[arg(long, env = "PR_NUMBER")]
    pub pr_number: u64,

    /// Head commit SHA; resolved from the repository when omitted
    #[arg(long, env = "COMMIT_SHA")]
    pub head_sha: Option<String>,

    /// Workspace root; defaults to the current directory
    #[arg(long, env = "GITHUB_WORKSPACE")]
    pub workspace: Option<PathBuf>,

    /// GitHub API token
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: String,

    /// Trunk branch used as the diff fallback baseline
    #[arg(long, default_value = "main")]
    pub trunk_branch: String,

    /// Target registry base URL
    #[arg(long, default_value = "https://registry.npmjs.org")]
    pub registry: String,

    /// Skip the pull-request comment
    #[arg(long)]
    pub skip_comment: bool,
}

impl PreviewCommand {
    pub async fn execute(&self) -> anyhow::Result<()> {
        let workspace_root = match &self.workspace {
            Some(path) => path.clone(),
            None => std::env::current_dir()?,
        };

        // Auth inputs are resolved here, at the process boundary; the
        // run itself only sees their availability.
        let static_token_available = std::env::var_os("NODE_AUTH_TOKEN").is_some();
        let oidc = id_token_endpoint();

        let mut ctx = RunContext::new(workspace_root.clone(), self.repo.clone(), self.pr_number)
            .with_trunk_branch(self.trunk_branch.as_str())
            .with_registry_url(self.registry.as_str())
            .with_static_token(static_token_available)
            .with_trusted_publishing(oidc.is_some());
        if let Some(sha) = &self.head_sha {
            ctx = ctx.with_head_sha(sha.as_str());
        }

        let scm = GitScm::open(&workspace_root).map_err(GantryError::from)?;
        let inventory = PnpmInventory::new(workspace_root.clone());
        let github = GithubClient::new(self.github_token.as_str(), self.repo.clone());

        let mut registry_config = RegistryConfig::new().with_registry_url(self.registry.as_str());
        if let Some(oidc) = oidc {
            registry_config = registry_config.with_oidc(oidc);
        }
        let registry = NpmRegistry::new(registry_config);

        let mut run = PreviewRun::new(&ctx, &inventory, &scm, &github, &registry);
        let results = run.run().await?;

        if !self.skip_comment {
            let head_sha = match &ctx.head_sha {
                Some(sha) => sha.clone(),
                None => scm.head_sha().map_err(GantryError::from)?,
            };
            let body = render_preview_comment(&results, self.pr_number, &head_sha);
            github.upsert_preview_comment(self.pr_number, &body).await?;
        }

        if results.is_empty() {
            println!("No packages have changed");
            return Ok(());
        }

        println!(
            "{} {} package(s) under tag {}",
            style("Published").green().bold(),
            results.len(),
            style(format!("pr-{}", self.pr_number)).cyan()
        );
        for result in &results {
            println!("  {} {}", result.name, style(&result.version).dim());
        }

        Ok(())
    }
}

/// Identity-token endpoint from the CI environment, when present.
fn id_token_endpoint() -> Option<OidcConfig> {
    let url = std::env::var("ACTIONS_ID_TOKEN_REQUEST_URL").ok()?;
    let token = std::env::var("ACTIONS_ID_TOKEN_REQUEST_TOKEN").ok()?;
    debug!("trusted publishing endpoint available");
    Some(OidcConfig::new(url, token))
}

//! Run configuration

use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Repository identifier in `owner/name` form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoSlug {
    pub owner: String,
    pub name: String,
}

impl std::fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepoSlug {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() => Ok(Self {
                owner: owner.to_string(),
                name: name.to_string(),
            }),
            _ => Err(format!("expected owner/name, got '{}'", s)),
        }
    }
}

/// Explicit configuration for one preview-release run.
///
/// Components receive this instead of reading ambient process state, so
/// each one is independently testable with fixtures.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Workspace root; package paths are made relative to this
    pub workspace_root: PathBuf,
    /// Repository the run operates on
    pub repo: RepoSlug,
    /// Pull request this run publishes previews for
    pub pr_number: u64,
    /// Head commit SHA, if the caller already knows it
    pub head_sha: Option<String>,
    /// Remote name to fetch from
    pub remote: String,
    /// Trunk branch used as the diff fallback baseline
    pub trunk_branch: String,
    /// Token identifying release commits in the history search
    pub release_marker: String,
    /// Target registry base URL
    pub registry_url: String,
    /// A long-lived registry token is available out-of-band
    pub static_token_available: bool,
    /// An ambient identity-token audience is available for exchange
    pub trusted_publishing_available: bool,
}

impl RunContext {
    /// Create a context with the conventional defaults
    pub fn new(workspace_root: PathBuf, repo: RepoSlug, pr_number: u64) -> Self {
        Self {
            workspace_root,
            repo,
            pr_number,
            head_sha: None,
            remote: "origin".to_string(),
            trunk_branch: "main".to_string(),
            release_marker: "RELEASING:".to_string(),
            registry_url: "https://registry.npmjs.org".to_string(),
            static_token_available: false,
            trusted_publishing_available: false,
        }
    }

    /// Set the head commit SHA
    pub fn with_head_sha(mut self, sha: impl Into<String>) -> Self {
        self.head_sha = Some(sha.into());
        self
    }

    /// Set the trunk branch
    pub fn with_trunk_branch(mut self, branch: impl Into<String>) -> Self {
        self.trunk_branch = branch.into();
        self
    }

    /// Set the registry base URL
    pub fn with_registry_url(mut self, url: impl Into<String>) -> Self {
        self.registry_url = url.into();
        self
    }

    /// Mark a long-lived registry token as available
    pub fn with_static_token(mut self, available: bool) -> Self {
        self.static_token_available = available;
        self
    }

    /// Mark trusted publishing as available
    pub fn with_trusted_publishing(mut self, available: bool) -> Self {
        self.trusted_publishing_available = available;
        self
    }

    /// Remote trunk reference, e.g. `origin/main`
    pub fn trunk_ref(&self) -> String {
        format!("{}/{}", self.remote, self.trunk_branch)
    }
}

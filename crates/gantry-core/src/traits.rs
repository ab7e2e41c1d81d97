//! Collaborator traits
//!
//! The core drives external systems (package manager, source control,
//! commit search, package registry) through these seams so the pipeline
//! can be exercised against fixtures.

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{InventoryError, RegistryError, ScmError, SearchError};
use crate::package::Package;
use crate::version::{PrereleaseId, PublishTag};

/// Supplies the full workspace package snapshot.
#[async_trait]
pub trait PackageInventory: Send + Sync {
    /// All workspace packages, in the package manager's reporting order.
    async fn packages(&self) -> Result<Vec<Package>, InventoryError>;
}

/// Source-control operations against the working repository.
pub trait Scm: Send + Sync {
    /// Fetch the latest state of a branch from a remote.
    fn fetch(&self, remote: &str, branch: &str) -> Result<(), ScmError>;

    /// Repo-relative paths of files differing between `from_ref` and the
    /// working revision.
    fn diff_paths(&self, from_ref: &str) -> Result<Vec<std::path::PathBuf>, ScmError>;

    /// SHA of the current HEAD commit.
    fn head_sha(&self) -> Result<String, ScmError>;
}

/// Commit search used to anchor the change baseline.
#[async_trait]
pub trait CommitSearcher: Send + Sync {
    /// SHAs of commits matching `query`, in the requested order.
    async fn search_commits(
        &self,
        query: &str,
        sort: &str,
        order: &str,
        limit: u32,
    ) -> Result<Vec<String>, SearchError>;
}

/// Published package metadata, as far as the gate cares about it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageMetadata {
    /// Registry-side package name
    pub name: String,
    /// Version the `latest` dist-tag points at, when reported
    pub latest: Option<String>,
}

/// Outcome of a registry metadata lookup.
///
/// `NotFound` and `Failed` both collapse to "must publish" at the
/// decision point; they stay distinct here for logging.
#[derive(Debug, Clone)]
pub enum LookupOutcome {
    /// Definitive answer: the package exists in the registry
    Found(PackageMetadata),
    /// Definitive answer: the registry does not know the package
    NotFound,
    /// No definitive answer (network, auth, decode failure)
    Failed(String),
}

/// How publish calls authenticate against the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStrategy {
    /// A credentials file already exists in the workspace; use it as-is
    CredentialsFile,
    /// Long-lived token supplied out-of-band; a credentials file with a
    /// literal env placeholder is written once before the first publish
    StaticToken,
    /// Short-lived token exchanged per package via trusted publishing
    TrustedPublishing,
}

impl std::fmt::Display for AuthStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CredentialsFile => write!(f, "credentials file"),
            Self::StaticToken => write!(f, "static token"),
            Self::TrustedPublishing => write!(f, "trusted publishing"),
        }
    }
}

/// Package registry operations: metadata lookup, version bump, publish.
#[async_trait]
pub trait Registry: Send + Sync {
    /// Look up published metadata for a package by name.
    ///
    /// Never errors; failures are folded into [`LookupOutcome::Failed`].
    async fn view(&self, name: &str) -> LookupOutcome;

    /// Bump the package in place to a new prerelease version and return
    /// the version string written to its manifest.
    async fn version_prerelease(
        &self,
        pkg: &Package,
        preid: &PrereleaseId,
    ) -> Result<String, RegistryError>;

    /// Materialize authentication once per run, before the first publish.
    async fn prepare_auth(
        &self,
        workspace_root: &Path,
        strategy: AuthStrategy,
    ) -> Result<(), RegistryError>;

    /// Publish the already-bumped package under the given dist-tag.
    async fn publish(
        &self,
        pkg: &Package,
        tag: &PublishTag,
        strategy: AuthStrategy,
    ) -> Result<(), RegistryError>;
}

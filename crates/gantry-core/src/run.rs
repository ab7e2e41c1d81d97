//! Preview-release run orchestration
//!
//! Drives one run end to end: inventory, checkpoint, change detection,
//! publish-set resolution, then the bump and publish phases.

use tracing::{debug, info};

use crate::changes::ChangeDetector;
use crate::checkpoint::CheckpointLocator;
use crate::context::RunContext;
use crate::error::{GantryError, Result, RunError};
use crate::resolver::PublishSetResolver;
use crate::traits::{AuthStrategy, CommitSearcher, PackageInventory, Registry, Scm};
use crate::version::{PrereleaseId, PublishTag};

/// One published package in the run output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedPackage {
    pub name: String,
    pub version: String,
}

/// Run phases. `Failed` absorbs from `Bumping` and `Publishing`; there
/// is no retry-and-continue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Resolving,
    NothingToPublish,
    Bumping,
    Publishing,
    Done,
    Failed,
}

/// Orchestrates a single preview-release run.
pub struct PreviewRun<'a> {
    ctx: &'a RunContext,
    inventory: &'a dyn PackageInventory,
    scm: &'a dyn Scm,
    searcher: &'a dyn CommitSearcher,
    registry: &'a dyn Registry,
    state: RunState,
}

impl<'a> PreviewRun<'a> {
    pub fn new(
        ctx: &'a RunContext,
        inventory: &'a dyn PackageInventory,
        scm: &'a dyn Scm,
        searcher: &'a dyn CommitSearcher,
        registry: &'a dyn Registry,
    ) -> Self {
        Self {
            ctx,
            inventory,
            scm,
            searcher,
            registry,
            state: RunState::Idle,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Execute the run and return the `{name, version}` pairs that were
    /// published. An empty result means nothing changed.
    ///
    /// Packages are bumped and published in discovery order, not
    /// dependency order: a dependent can reach the registry before a
    /// dependency published in the same run becomes visible.
    pub async fn run(&mut self) -> Result<Vec<PublishedPackage>> {
        self.state = RunState::Resolving;
        info!(pr = self.ctx.pr_number, "resolving publish set");

        let packages = self.inventory.packages().await?;
        let checkpoint = CheckpointLocator::new(self.ctx, self.searcher)
            .locate()
            .await;
        let changed = ChangeDetector::new(self.ctx, self.scm).detect(&checkpoint, &packages)?;
        let publish_set = PublishSetResolver::new(self.registry)
            .resolve(&changed, &packages)
            .await;

        if publish_set.is_empty() {
            self.state = RunState::NothingToPublish;
            info!("no packages have changed");
            return Ok(Vec::new());
        }

        let strategy = match self.resolve_auth() {
            Ok(strategy) => strategy,
            Err(err) => {
                self.state = RunState::Failed;
                return Err(err.into());
            }
        };
        debug!(strategy = %strategy, "auth strategy resolved");

        let head_sha = match &self.ctx.head_sha {
            Some(sha) => sha.clone(),
            None => self.scm.head_sha()?,
        };
        let preid = PrereleaseId::from_commit(&head_sha);
        let tag = PublishTag::for_pull_request(self.ctx.pr_number);

        self.state = RunState::Bumping;
        info!(count = publish_set.len(), preid = %preid, "bumping packages");

        let mut results = Vec::new();
        for pkg in &publish_set {
            let output = match self.registry.version_prerelease(pkg, &preid).await {
                Ok(output) => output,
                Err(err) => {
                    self.state = RunState::Failed;
                    return Err(RunError::VersionBump {
                        package: pkg.name.clone(),
                        reason: err.to_string(),
                    }
                    .into());
                }
            };

            let Some(version) = normalize_version(&output) else {
                self.state = RunState::Failed;
                return Err(RunError::VersionBump {
                    package: pkg.name.clone(),
                    reason: format!("unparsable version output '{}'", output.trim()),
                }
                .into());
            };

            debug!(package = %pkg.name, version = %version, "bumped");
            results.push(PublishedPackage {
                name: pkg.name.clone(),
                version,
            });
        }

        self.state = RunState::Publishing;
        info!(tag = %tag, "publishing packages");

        if let Err(err) = self
            .registry
            .prepare_auth(&self.ctx.workspace_root, strategy)
            .await
        {
            self.state = RunState::Failed;
            return Err(GantryError::Registry(err));
        }

        for pkg in &publish_set {
            if let Err(err) = self.registry.publish(pkg, &tag, strategy).await {
                self.state = RunState::Failed;
                return Err(RunError::Publish {
                    package: pkg.name.clone(),
                    reason: err.to_string(),
                }
                .into());
            }
            debug!(package = %pkg.name, "published");
        }

        self.state = RunState::Done;
        info!(published = results.len(), "run complete");
        Ok(results)
    }

    /// Pick an auth strategy, in precedence order: an existing
    /// credentials file, a long-lived token, trusted publishing.
    fn resolve_auth(&self) -> std::result::Result<AuthStrategy, RunError> {
        if self.ctx.workspace_root.join(".npmrc").exists() {
            Ok(AuthStrategy::CredentialsFile)
        } else if self.ctx.static_token_available {
            Ok(AuthStrategy::StaticToken)
        } else if self.ctx.trusted_publishing_available {
            Ok(AuthStrategy::TrustedPublishing)
        } else {
            Err(RunError::MissingCredential)
        }
    }
}

/// Normalize the bump output to the version string written to the
/// manifest. pnpm prints a leading `v`; anything that does not parse as
/// semver after stripping it is rejected.
fn normalize_version(output: &str) -> Option<String> {
    let trimmed = output.trim();
    let stripped = trimmed.strip_prefix('v').unwrap_or(trimmed);
    semver::Version::parse(stripped).ok()?;
    Some(stripped.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{InventoryError, RegistryError, ScmError, SearchError};
    use crate::package::Package;
    use crate::traits::{LookupOutcome, PackageMetadata};
    use async_trait::async_trait;
    use std::path::{Path, PathBuf};
    use std::result::Result;
    use std::sync::Mutex;

    struct FixedInventory {
        packages: Vec<Package>,
    }

    #[async_trait]
    impl PackageInventory for FixedInventory {
        async fn packages(&self) -> Result<Vec<Package>, InventoryError> {
            Ok(self.packages.clone())
        }
    }

    struct FixedScm {
        changed: Vec<PathBuf>,
    }

    impl Scm for FixedScm {
        fn fetch(&self, _remote: &str, _branch: &str) -> Result<(), ScmError> {
            Ok(())
        }

        fn diff_paths(&self, _from_ref: &str) -> Result<Vec<PathBuf>, ScmError> {
            Ok(self.changed.clone())
        }

        fn head_sha(&self) -> Result<String, ScmError> {
            Ok("0123456789abcdef0123456789abcdef01234567".to_string())
        }
    }

    struct NoSearcher;

    #[async_trait]
    impl CommitSearcher for NoSearcher {
        async fn search_commits(
            &self,
            _query: &str,
            _sort: &str,
            _order: &str,
            _limit: u32,
        ) -> Result<Vec<String>, SearchError> {
            Ok(Vec::new())
        }
    }

    #[derive(Default)]
    struct ScriptedRegistry {
        published: Vec<String>,
        fail_bump_for: Option<String>,
        fail_publish_for: Option<String>,
        bump_output: Option<String>,
        bumps: Mutex<Vec<String>>,
        publishes: Mutex<Vec<(String, String)>>,
        prepares: Mutex<Vec<AuthStrategy>>,
    }

    #[async_trait]
    impl Registry for ScriptedRegistry {
        async fn view(&self, name: &str) -> LookupOutcome {
            if self.published.iter().any(|p| p == name) {
                LookupOutcome::Found(PackageMetadata {
                    name: name.to_string(),
                    latest: None,
                })
            } else {
                LookupOutcome::NotFound
            }
        }

        async fn version_prerelease(
            &self,
            pkg: &Package,
            preid: &PrereleaseId,
        ) -> Result<String, RegistryError> {
            if self.fail_bump_for.as_deref() == Some(pkg.name.as_str()) {
                return Err(RegistryError::CommandFailed {
                    command: "pnpm version".to_string(),
                    reason: "exit status 1".to_string(),
                });
            }
            self.bumps.lock().unwrap().push(pkg.name.clone());
            Ok(self
                .bump_output
                .clone()
                .unwrap_or_else(|| format!("v1.0.1-{}.0", preid)))
        }

        async fn prepare_auth(
            &self,
            _root: &Path,
            strategy: AuthStrategy,
        ) -> Result<(), RegistryError> {
            self.prepares.lock().unwrap().push(strategy);
            Ok(())
        }

        async fn publish(
            &self,
            pkg: &Package,
            tag: &PublishTag,
            _strategy: AuthStrategy,
        ) -> Result<(), RegistryError> {
            if self.fail_publish_for.as_deref() == Some(pkg.name.as_str()) {
                return Err(RegistryError::CommandFailed {
                    command: "pnpm publish".to_string(),
                    reason: "exit status 1".to_string(),
                });
            }
            self.publishes
                .lock()
                .unwrap()
                .push((pkg.name.clone(), tag.to_string()));
            Ok(())
        }
    }

    fn package(name: &str, root: &Path, linked: &[&str]) -> Package {
        Package {
            name: name.to_string(),
            version: "1.0.0".to_string(),
            path: root.join("packages").join(name),
            dependencies: linked
                .iter()
                .map(|dep| (dep.to_string(), format!("link:../{}", dep)))
                .collect(),
            dev_dependencies: Default::default(),
        }
    }

    fn ctx(root: &Path) -> RunContext {
        RunContext::new(root.to_path_buf(), "acme/widgets".parse().unwrap(), 42)
            .with_static_token(true)
    }

    #[tokio::test]
    async fn test_run_publishes_changed_and_unpublished_deps() {
        let temp = tempfile::TempDir::new().unwrap();
        let root = temp.path();
        let ctx = ctx(root);

        let inventory = FixedInventory {
            packages: vec![
                package("core", root, &[]),
                package("ui", root, &["core"]),
            ],
        };
        let scm = FixedScm {
            changed: vec![PathBuf::from("packages/ui/src/index.ts")],
        };
        let registry = ScriptedRegistry::default();

        let mut run = PreviewRun::new(&ctx, &inventory, &scm, &NoSearcher, &registry);
        let results = run.run().await.unwrap();

        assert_eq!(run.state(), RunState::Done);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].name, "ui");
        assert_eq!(results[1].name, "core");
        assert_eq!(results[0].version, "1.0.1-git-0123456.0");

        let publishes = registry.publishes.lock().unwrap();
        assert_eq!(publishes.len(), 2);
        assert!(publishes.iter().all(|(_, tag)| tag == "pr-42"));
    }

    #[tokio::test]
    async fn test_run_nothing_to_publish() {
        let temp = tempfile::TempDir::new().unwrap();
        let root = temp.path();
        let ctx = ctx(root);

        let inventory = FixedInventory {
            packages: vec![package("core", root, &[])],
        };
        let scm = FixedScm { changed: Vec::new() };
        let registry = ScriptedRegistry::default();

        let mut run = PreviewRun::new(&ctx, &inventory, &scm, &NoSearcher, &registry);
        let results = run.run().await.unwrap();

        assert_eq!(run.state(), RunState::NothingToPublish);
        assert!(results.is_empty());
        assert!(registry.bumps.lock().unwrap().is_empty());
        assert!(registry.publishes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_bump_failure_aborts_before_publishing() {
        let temp = tempfile::TempDir::new().unwrap();
        let root = temp.path();
        let ctx = ctx(root);

        let inventory = FixedInventory {
            packages: vec![
                package("core", root, &[]),
                package("ui", root, &[]),
            ],
        };
        let scm = FixedScm {
            changed: vec![
                PathBuf::from("packages/core/a.ts"),
                PathBuf::from("packages/ui/b.ts"),
            ],
        };
        let registry = ScriptedRegistry {
            fail_bump_for: Some("core".to_string()),
            ..Default::default()
        };

        let mut run = PreviewRun::new(&ctx, &inventory, &scm, &NoSearcher, &registry);
        let err = run.run().await.unwrap_err();

        assert_eq!(run.state(), RunState::Failed);
        assert!(err.to_string().contains("core"));
        assert!(registry.publishes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_publish_failure_aborts_remaining() {
        let temp = tempfile::TempDir::new().unwrap();
        let root = temp.path();
        let ctx = ctx(root);

        let inventory = FixedInventory {
            packages: vec![
                package("core", root, &[]),
                package("ui", root, &[]),
            ],
        };
        let scm = FixedScm {
            changed: vec![
                PathBuf::from("packages/core/a.ts"),
                PathBuf::from("packages/ui/b.ts"),
            ],
        };
        let registry = ScriptedRegistry {
            fail_publish_for: Some("core".to_string()),
            ..Default::default()
        };

        let mut run = PreviewRun::new(&ctx, &inventory, &scm, &NoSearcher, &registry);
        let err = run.run().await.unwrap_err();

        assert_eq!(run.state(), RunState::Failed);
        assert!(err.to_string().contains("Failed to publish core"));
        // core came first in discovery order, so ui was never attempted
        assert!(registry.publishes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_credentials_is_fatal() {
        let temp = tempfile::TempDir::new().unwrap();
        let root = temp.path();
        let ctx = RunContext::new(root.to_path_buf(), "acme/widgets".parse().unwrap(), 42);

        let inventory = FixedInventory {
            packages: vec![package("core", root, &[])],
        };
        let scm = FixedScm {
            changed: vec![PathBuf::from("packages/core/a.ts")],
        };
        let registry = ScriptedRegistry::default();

        let mut run = PreviewRun::new(&ctx, &inventory, &scm, &NoSearcher, &registry);
        let err = run.run().await.unwrap_err();

        assert_eq!(run.state(), RunState::Failed);
        assert!(matches!(
            err,
            GantryError::Run(RunError::MissingCredential)
        ));
        assert!(registry.bumps.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_existing_npmrc_wins_strategy_resolution() {
        let temp = tempfile::TempDir::new().unwrap();
        let root = temp.path();
        std::fs::write(root.join(".npmrc"), "//registry.npmjs.org/:_authToken=x").unwrap();
        let ctx = ctx(root);

        let inventory = FixedInventory {
            packages: vec![package("core", root, &[])],
        };
        let scm = FixedScm {
            changed: vec![PathBuf::from("packages/core/a.ts")],
        };
        let registry = ScriptedRegistry::default();

        let mut run = PreviewRun::new(&ctx, &inventory, &scm, &NoSearcher, &registry);
        run.run().await.unwrap();

        let prepares = registry.prepares.lock().unwrap();
        assert_eq!(prepares.as_slice(), &[AuthStrategy::CredentialsFile]);
    }

    #[tokio::test]
    async fn test_unparsable_bump_output_is_fatal() {
        let temp = tempfile::TempDir::new().unwrap();
        let root = temp.path();
        let ctx = ctx(root);

        let inventory = FixedInventory {
            packages: vec![package("core", root, &[])],
        };
        let scm = FixedScm {
            changed: vec![PathBuf::from("packages/core/a.ts")],
        };
        let registry = ScriptedRegistry {
            bump_output: Some("not a version".to_string()),
            ..Default::default()
        };

        let mut run = PreviewRun::new(&ctx, &inventory, &scm, &NoSearcher, &registry);
        let err = run.run().await.unwrap_err();

        assert_eq!(run.state(), RunState::Failed);
        assert!(err.to_string().contains("unparsable version output"));
    }

    #[test]
    fn test_normalize_version() {
        assert_eq!(
            normalize_version("v1.2.3-git-abcdef0.0\n"),
            Some("1.2.3-git-abcdef0.0".to_string())
        );
        assert_eq!(
            normalize_version("1.2.3"),
            Some("1.2.3".to_string())
        );
        assert_eq!(normalize_version("banana"), None);
        assert_eq!(normalize_version(""), None);
    }
}

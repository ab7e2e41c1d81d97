//! Publish gate

use tracing::{debug, warn};

use crate::package::Package;
use crate::traits::{LookupOutcome, Registry};

/// Decides whether a discovered dependency must be published itself.
///
/// Conservative on error: skipping a genuinely-unpublished dependency
/// would leave its dependent broken in the registry, so anything short
/// of a definitive "it exists" answer selects the package.
pub struct PublishGate<'a> {
    registry: &'a dyn Registry,
}

impl<'a> PublishGate<'a> {
    pub fn new(registry: &'a dyn Registry) -> Self {
        Self { registry }
    }

    pub async fn must_publish(&self, pkg: &Package) -> bool {
        match self.registry.view(&pkg.name).await {
            LookupOutcome::Found(meta) => {
                debug!(
                    package = %pkg.name,
                    latest = meta.latest.as_deref().unwrap_or("unknown"),
                    "already published"
                );
                false
            }
            LookupOutcome::NotFound => {
                debug!(package = %pkg.name, "not in registry");
                true
            }
            LookupOutcome::Failed(reason) => {
                warn!(
                    package = %pkg.name,
                    reason = %reason,
                    "registry lookup failed, treating as unpublished"
                );
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RegistryError;
    use crate::traits::{AuthStrategy, PackageMetadata};
    use crate::version::{PrereleaseId, PublishTag};
    use async_trait::async_trait;
    use std::path::{Path, PathBuf};

    struct FixedRegistry {
        outcome: fn() -> LookupOutcome,
    }

    #[async_trait]
    impl Registry for FixedRegistry {
        async fn view(&self, _name: &str) -> LookupOutcome {
            (self.outcome)()
        }

        async fn version_prerelease(
            &self,
            _pkg: &Package,
            _preid: &PrereleaseId,
        ) -> Result<String, RegistryError> {
            unreachable!("gate never bumps")
        }

        async fn prepare_auth(
            &self,
            _root: &Path,
            _strategy: AuthStrategy,
        ) -> Result<(), RegistryError> {
            Ok(())
        }

        async fn publish(
            &self,
            _pkg: &Package,
            _tag: &PublishTag,
            _strategy: AuthStrategy,
        ) -> Result<(), RegistryError> {
            unreachable!("gate never publishes")
        }
    }

    fn package(name: &str) -> Package {
        Package {
            name: name.to_string(),
            version: "1.0.0".to_string(),
            path: PathBuf::from("/repo/packages/pkg"),
            dependencies: Default::default(),
            dev_dependencies: Default::default(),
        }
    }

    #[tokio::test]
    async fn test_found_means_skip() {
        let registry = FixedRegistry {
            outcome: || {
                LookupOutcome::Found(PackageMetadata {
                    name: "core".to_string(),
                    latest: Some("1.0.0".to_string()),
                })
            },
        };

        let gate = PublishGate::new(&registry);
        assert!(!gate.must_publish(&package("core")).await);
    }

    #[tokio::test]
    async fn test_not_found_means_publish() {
        let registry = FixedRegistry {
            outcome: || LookupOutcome::NotFound,
        };

        let gate = PublishGate::new(&registry);
        assert!(gate.must_publish(&package("core")).await);
    }

    #[tokio::test]
    async fn test_lookup_failure_means_publish() {
        let registry = FixedRegistry {
            outcome: || LookupOutcome::Failed("connection reset".to_string()),
        };

        let gate = PublishGate::new(&registry);
        assert!(gate.must_publish(&package("core")).await);
    }
}

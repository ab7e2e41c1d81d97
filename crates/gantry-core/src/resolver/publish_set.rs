//! Publish-set resolution

use std::collections::{HashMap, HashSet};

use tracing::{debug, info};

use crate::package::Package;
use crate::resolver::closure::dependency_closure;
use crate::resolver::gate::PublishGate;
use crate::traits::Registry;

/// Composes change detection, closure walking, and the publish gate into
/// the final ordered, deduplicated publish set.
pub struct PublishSetResolver<'a> {
    gate: PublishGate<'a>,
}

impl<'a> PublishSetResolver<'a> {
    pub fn new(registry: &'a dyn Registry) -> Self {
        Self {
            gate: PublishGate::new(registry),
        }
    }

    /// Every changed package, plus every internal dependency in its
    /// closure that the gate marks unpublished. Deduplicated by name,
    /// in discovery order; the gate runs at most once per name per run.
    ///
    /// An empty changed set yields an empty publish set: the normal
    /// "nothing to release" outcome, not an error.
    pub async fn resolve(&self, changed: &[Package], all: &[Package]) -> Vec<Package> {
        let mut publish_set: Vec<Package> = Vec::new();
        let mut selected: HashSet<String> = HashSet::new();
        let mut decisions: HashMap<String, bool> = HashMap::new();

        for pkg in changed {
            if selected.insert(pkg.name.clone()) {
                publish_set.push(pkg.clone());
            }

            for dep in dependency_closure(pkg, all) {
                if selected.contains(&dep.name) {
                    continue;
                }

                let must_publish = match decisions.get(&dep.name) {
                    Some(decision) => *decision,
                    None => {
                        let decision = self.gate.must_publish(&dep).await;
                        decisions.insert(dep.name.clone(), decision);
                        decision
                    }
                };

                if must_publish {
                    debug!(package = %dep.name, "unpublished dependency selected");
                    selected.insert(dep.name.clone());
                    publish_set.push(dep);
                }
            }
        }

        info!(count = publish_set.len(), "publish set resolved");
        publish_set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RegistryError;
    use crate::traits::{AuthStrategy, LookupOutcome, PackageMetadata};
    use crate::version::{PrereleaseId, PublishTag};
    use async_trait::async_trait;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    /// Registry fixture: names in `published` resolve as Found, the
    /// rest as NotFound. Records every lookup.
    struct FixedRegistry {
        published: Vec<String>,
        lookups: Mutex<Vec<String>>,
    }

    impl FixedRegistry {
        fn with_published(published: &[&str]) -> Self {
            Self {
                published: published.iter().map(|s| s.to_string()).collect(),
                lookups: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Registry for FixedRegistry {
        async fn view(&self, name: &str) -> LookupOutcome {
            self.lookups.lock().unwrap().push(name.to_string());
            if self.published.iter().any(|p| p == name) {
                LookupOutcome::Found(PackageMetadata {
                    name: name.to_string(),
                    latest: Some("1.0.0".to_string()),
                })
            } else {
                LookupOutcome::NotFound
            }
        }

        async fn version_prerelease(
            &self,
            _pkg: &Package,
            _preid: &PrereleaseId,
        ) -> Result<String, RegistryError> {
            unreachable!("resolver never bumps")
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
            unreachable!("resolver never publishes")
        }
    }

    fn package(name: &str, linked: &[&str]) -> Package {
        Package {
            name: name.to_string(),
            version: "1.0.0".to_string(),
            path: PathBuf::from(format!("/repo/packages/{}", name)),
            dependencies: linked
                .iter()
                .map(|dep| (dep.to_string(), format!("link:../{}", dep)))
                .collect(),
            dev_dependencies: Default::default(),
        }
    }

    fn names(set: &[Package]) -> Vec<&str> {
        set.iter().map(|p| p.name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_changed_core_does_not_pull_in_dependent_ui() {
        // ui depends on core, core changed: the closure follows
        // dependencies of changed packages, not dependents, so ui stays
        // out even though it is unpublished.
        let all = vec![
            package("core", &[]),
            package("ui", &["core"]),
            package("leaf", &[]),
        ];
        let registry = FixedRegistry::with_published(&["core"]);
        let resolver = PublishSetResolver::new(&registry);

        let publish_set = resolver.resolve(&all[..1], &all).await;
        assert_eq!(names(&publish_set), vec!["core"]);
    }

    #[tokio::test]
    async fn test_changed_ui_pulls_in_unpublished_core() {
        let all = vec![package("core", &[]), package("ui", &["core"])];
        let registry = FixedRegistry::with_published(&[]);
        let resolver = PublishSetResolver::new(&registry);

        let changed = vec![all[1].clone()];
        let publish_set = resolver.resolve(&changed, &all).await;
        assert_eq!(names(&publish_set), vec!["ui", "core"]);
    }

    #[tokio::test]
    async fn test_published_dependency_not_republished() {
        let all = vec![package("core", &[]), package("ui", &["core"])];
        let registry = FixedRegistry::with_published(&["core"]);
        let resolver = PublishSetResolver::new(&registry);

        let changed = vec![all[1].clone()];
        let publish_set = resolver.resolve(&changed, &all).await;
        assert_eq!(names(&publish_set), vec!["ui"]);
    }

    #[tokio::test]
    async fn test_changed_packages_always_selected() {
        // A changed package goes in unconditionally, even when the
        // registry already has it.
        let all = vec![package("core", &[])];
        let registry = FixedRegistry::with_published(&["core"]);
        let resolver = PublishSetResolver::new(&registry);

        let publish_set = resolver.resolve(&all, &all).await;
        assert_eq!(names(&publish_set), vec!["core"]);
        // ...and the gate is never consulted for it
        assert!(registry.lookups.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_changed_set_is_empty_publish_set() {
        let all = vec![package("core", &[])];
        let registry = FixedRegistry::with_published(&[]);
        let resolver = PublishSetResolver::new(&registry);

        let publish_set = resolver.resolve(&[], &all).await;
        assert!(publish_set.is_empty());
        assert!(registry.lookups.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_shared_dependency_gated_once() {
        // base is reachable from both changed packages; one lookup total.
        let all = vec![
            package("left", &["base"]),
            package("right", &["base"]),
            package("base", &[]),
        ];
        let registry = FixedRegistry::with_published(&["base"]);
        let resolver = PublishSetResolver::new(&registry);

        let changed = vec![all[0].clone(), all[1].clone()];
        let publish_set = resolver.resolve(&changed, &all).await;

        assert_eq!(names(&publish_set), vec!["left", "right"]);
        assert_eq!(registry.lookups.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_resolve_is_repeatable() {
        let all = vec![package("core", &[]), package("ui", &["core"])];
        let registry = FixedRegistry::with_published(&[]);
        let resolver = PublishSetResolver::new(&registry);

        let changed = vec![all[1].clone()];
        let first = resolver.resolve(&changed, &all).await;
        let second = resolver.resolve(&changed, &all).await;
        assert_eq!(names(&first), names(&second));
    }

    #[tokio::test]
    async fn test_transitive_unpublished_chain() {
        let all = vec![
            package("app", &["ui"]),
            package("ui", &["core"]),
            package("core", &[]),
        ];
        let registry = FixedRegistry::with_published(&[]);
        let resolver = PublishSetResolver::new(&registry);

        let changed = vec![all[0].clone()];
        let publish_set = resolver.resolve(&changed, &all).await;
        assert_eq!(names(&publish_set), vec!["app", "ui", "core"]);
    }
}

//! Workspace inventory via pnpm

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

use gantry_core::error::InventoryError;
use gantry_core::package::Package;
use gantry_core::traits::PackageInventory;

/// Package inventory backed by `pnpm list -r --json`.
pub struct PnpmInventory {
    workspace_root: PathBuf,
}

impl PnpmInventory {
    pub fn new(workspace_root: PathBuf) -> Self {
        Self { workspace_root }
    }
}

#[async_trait]
impl PackageInventory for PnpmInventory {
    #[instrument(skip(self))]
    async fn packages(&self) -> Result<Vec<Package>, InventoryError> {
        let output = tokio::process::Command::new("pnpm")
            .args(["list", "-r", "--json"])
            .current_dir(&self.workspace_root)
            .output()
            .await
            .map_err(|e| InventoryError::ListFailed(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(InventoryError::ListFailed(stderr.to_string()));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let packages = parse_listing(&stdout)?;
        debug!(count = packages.len(), "workspace packages listed");
        Ok(packages)
    }
}

/// One entry of the pnpm recursive listing.
#[derive(Debug, Deserialize)]
struct PnpmPackage {
    name: Option<String>,
    version: Option<String>,
    path: PathBuf,
    #[serde(default)]
    dependencies: HashMap<String, PnpmDependency>,
    #[serde(default, rename = "devDependencies")]
    dev_dependencies: HashMap<String, PnpmDependency>,
}

/// Dependency entry; the version field carries the specifier, including
/// the `link:` marker for workspace-resident dependencies.
#[derive(Debug, Deserialize)]
struct PnpmDependency {
    version: String,
}

/// Parse the JSON listing into package records, preserving order.
///
/// Entries without a name or version (e.g. an unnamed workspace root)
/// are skipped. A duplicate name violates the snapshot invariant.
fn parse_listing(json: &str) -> Result<Vec<Package>, InventoryError> {
    let entries: Vec<PnpmPackage> =
        serde_json::from_str(json).map_err(|e| InventoryError::ParseFailed(e.to_string()))?;

    let mut seen: HashSet<String> = HashSet::new();
    let mut packages = Vec::new();

    for entry in entries {
        let (Some(name), Some(version)) = (entry.name, entry.version) else {
            continue;
        };

        if !seen.insert(name.clone()) {
            return Err(InventoryError::DuplicateName(name));
        }

        packages.push(Package {
            name,
            version,
            path: entry.path,
            dependencies: entry
                .dependencies
                .into_iter()
                .map(|(name, dep)| (name, dep.version))
                .collect(),
            dev_dependencies: entry
                .dev_dependencies
                .into_iter()
                .map(|(name, dep)| (name, dep.version))
                .collect(),
        });
    }

    Ok(packages)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"[
        {
            "name": "@acme/ui",
            "version": "1.2.0",
            "path": "/repo/packages/ui",
            "dependencies": {
                "@acme/core": {
                    "from": "@acme/core",
                    "version": "link:../core",
                    "path": "/repo/packages/core"
                },
                "react": {
                    "from": "react",
                    "version": "18.2.0",
                    "path": "/repo/node_modules/react"
                }
            },
            "devDependencies": {
                "@acme/test-kit": {
                    "from": "@acme/test-kit",
                    "version": "link:../test-kit",
                    "path": "/repo/packages/test-kit"
                }
            }
        },
        {
            "name": "@acme/core",
            "version": "0.9.1",
            "path": "/repo/packages/core"
        }
    ]"#;

    #[test]
    fn test_parse_listing() {
        let packages = parse_listing(LISTING).unwrap();
        assert_eq!(packages.len(), 2);

        let ui = &packages[0];
        assert_eq!(ui.name, "@acme/ui");
        assert_eq!(ui.version, "1.2.0");
        assert_eq!(ui.path, PathBuf::from("/repo/packages/ui"));
        assert_eq!(
            ui.dependencies.get("@acme/core").map(String::as_str),
            Some("link:../core")
        );
        assert_eq!(
            ui.dependencies.get("react").map(String::as_str),
            Some("18.2.0")
        );
        assert_eq!(
            ui.dev_dependencies.get("@acme/test-kit").map(String::as_str),
            Some("link:../test-kit")
        );
    }

    #[test]
    fn test_parse_listing_skips_unnamed_entries() {
        let json = r#"[{"path": "/repo"}, {"name": "a", "version": "1.0.0", "path": "/repo/a"}]"#;
        let packages = parse_listing(json).unwrap();
        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].name, "a");
    }

    #[test]
    fn test_parse_listing_rejects_duplicates() {
        let json = r#"[
            {"name": "a", "version": "1.0.0", "path": "/repo/a"},
            {"name": "a", "version": "2.0.0", "path": "/repo/other-a"}
        ]"#;
        assert!(matches!(
            parse_listing(json),
            Err(InventoryError::DuplicateName(_))
        ));
    }

    #[test]
    fn test_parse_listing_rejects_malformed_json() {
        assert!(matches!(
            parse_listing("not json"),
            Err(InventoryError::ParseFailed(_))
        ));
    }
}

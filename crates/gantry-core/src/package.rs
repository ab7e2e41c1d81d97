//! Workspace package records

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Specifier prefix marking a dependency as workspace-resident rather
/// than resolved from a remote registry.
pub const LINK_MARKER: &str = "link:";

/// One workspace member, as reported by the package inventory.
///
/// A read-only snapshot: version bumps happen against the filesystem and
/// registry, never against this record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Package {
    /// Package name, unique within one inventory snapshot
    pub name: String,
    /// On-disk version before any bump
    pub version: String,
    /// Absolute filesystem location
    pub path: PathBuf,
    /// Dependency name -> version specifier
    #[serde(default)]
    pub dependencies: HashMap<String, String>,
    /// Dev-dependency name -> version specifier
    #[serde(default)]
    pub dev_dependencies: HashMap<String, String>,
}

impl Package {
    /// Names of dependencies declared with the workspace link marker,
    /// regular dependencies first, then dev dependencies.
    pub fn linked_dependencies(&self) -> impl Iterator<Item = &str> {
        self.dependencies
            .iter()
            .chain(self.dev_dependencies.iter())
            .filter(|(_, spec)| spec.starts_with(LINK_MARKER))
            .map(|(name, _)| name.as_str())
    }

    /// Path of this package relative to the workspace root.
    ///
    /// Returns `None` when the package sits at the root itself or outside
    /// it; such packages are never matched by change detection.
    pub fn relative_path(&self, root: &Path) -> Option<PathBuf> {
        let relative = self.path.strip_prefix(root).ok()?;
        if relative.as_os_str().is_empty() {
            None
        } else {
            Some(relative.to_path_buf())
        }
    }
}

//! Change detection
//!
//! A package is changed when at least one file differing between the
//! checkpoint and the working revision lives inside its directory.
//! Matching is anchored on path components: `packages/foo` must not
//! claim `packages/foo-bar/src/x.ts`.

use tracing::{debug, info};

use crate::context::RunContext;
use crate::error::Result;
use crate::package::Package;
use crate::traits::Scm;

/// Detects which packages changed since the checkpoint.
pub struct ChangeDetector<'a> {
    ctx: &'a RunContext,
    scm: &'a dyn Scm,
}

impl<'a> ChangeDetector<'a> {
    pub fn new(ctx: &'a RunContext, scm: &'a dyn Scm) -> Self {
        Self { ctx, scm }
    }

    /// Fetch trunk, diff against `checkpoint`, and return the packages
    /// whose subtree contains a changed file, in snapshot order.
    pub fn detect(&self, checkpoint: &str, packages: &[Package]) -> Result<Vec<Package>> {
        self.scm
            .fetch(&self.ctx.remote, &self.ctx.trunk_branch)?;
        let changed_paths = self.scm.diff_paths(checkpoint)?;

        debug!(checkpoint, files = changed_paths.len(), "computed diff");

        let mut changed = Vec::new();
        for pkg in packages {
            let Some(relative) = pkg.relative_path(&self.ctx.workspace_root) else {
                continue;
            };

            if changed_paths.iter().any(|file| file.starts_with(&relative)) {
                debug!(package = %pkg.name, "package changed");
                changed.push(pkg.clone());
            }
        }

        info!(changed = changed.len(), "change detection complete");
        Ok(changed)
    }
}

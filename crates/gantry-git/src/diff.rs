//! Working-tree diffs

use std::path::PathBuf;

use git2::DiffOptions;
use tracing::{debug, instrument};

use crate::repository::{GitScm, Result};
use gantry_core::error::ScmError;

impl GitScm {
    /// Repo-relative paths of files differing between `from_ref` and the
    /// working revision (index included), name-only.
    ///
    /// `from_ref` may be a SHA or a symbolic reference like `origin/main`.
    #[instrument(skip(self), fields(from_ref))]
    pub fn changed_paths(&self, from_ref: &str) -> Result<Vec<PathBuf>> {
        let repo = self.repo.lock().expect("repository lock poisoned");

        let object = repo.revparse_single(from_ref).map_err(|e| ScmError::DiffFailed {
            reference: from_ref.to_string(),
            reason: e.message().to_string(),
        })?;
        let tree = object.peel_to_tree().map_err(|e| ScmError::DiffFailed {
            reference: from_ref.to_string(),
            reason: e.message().to_string(),
        })?;

        let mut opts = DiffOptions::new();
        opts.include_untracked(true).recurse_untracked_dirs(true);

        let diff = repo
            .diff_tree_to_workdir_with_index(Some(&tree), Some(&mut opts))
            .map_err(|e| ScmError::DiffFailed {
                reference: from_ref.to_string(),
                reason: e.message().to_string(),
            })?;

        let mut paths: Vec<PathBuf> = Vec::new();
        for delta in diff.deltas() {
            if let Some(path) = delta.new_file().path().or_else(|| delta.old_file().path()) {
                paths.push(path.to_path_buf());
            }
        }

        paths.sort();
        paths.dedup();

        debug!(reference = from_ref, files = paths.len(), "diff computed");
        Ok(paths)
    }
}

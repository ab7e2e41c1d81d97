//! Gantry Git - source-control operations for preview releases
//!
//! Implements the core SCM seam over git2: fetching the trunk branch,
//! diffing a reference against the working tree, and resolving HEAD.

mod diff;
mod remote;
mod repository;

pub use repository::GitScm;

use std::path::PathBuf;

use gantry_core::error::ScmError;
use gantry_core::traits::Scm;

impl Scm for GitScm {
    fn fetch(&self, remote: &str, branch: &str) -> Result<(), ScmError> {
        self.fetch_branch(remote, branch)
    }

    fn diff_paths(&self, from_ref: &str) -> Result<Vec<PathBuf>, ScmError> {
        self.changed_paths(from_ref)
    }

    fn head_sha(&self) -> Result<String, ScmError> {
        self.head_commit_sha()
    }
}

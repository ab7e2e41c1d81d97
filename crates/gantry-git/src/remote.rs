//! Remote operations

use tracing::{info, instrument};

use crate::repository::{GitScm, Result};
use gantry_core::error::ScmError;

impl GitScm {
    /// Fetch the latest state of a branch from a remote.
    ///
    /// Note: authenticated remotes require credentials to be configured
    /// in the environment; CI checkouts of public repositories fetch
    /// anonymously.
    #[instrument(skip(self), fields(remote_name, branch))]
    pub fn fetch_branch(&self, remote_name: &str, branch: &str) -> Result<()> {
        let start = std::time::Instant::now();
        let repo = self.repo.lock().expect("repository lock poisoned");

        let mut remote = repo.find_remote(remote_name).map_err(|e| ScmError::FetchFailed {
            remote: remote_name.to_string(),
            branch: branch.to_string(),
            reason: e.message().to_string(),
        })?;

        remote
            .fetch(&[branch], None, None)
            .map_err(|e| ScmError::FetchFailed {
                remote: remote_name.to_string(),
                branch: branch.to_string(),
                reason: e.message().to_string(),
            })?;

        info!(
            remote = remote_name,
            branch,
            duration_ms = start.elapsed().as_millis(),
            "fetched from remote"
        );
        Ok(())
    }
}

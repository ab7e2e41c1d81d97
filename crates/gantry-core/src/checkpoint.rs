//! Checkpoint location
//!
//! The checkpoint is the "before" side of the change diff: the most
//! recent commit carrying the release marker, or the remote trunk tip
//! when no such commit can be found.

use tracing::debug;

use crate::context::RunContext;
use crate::traits::CommitSearcher;

/// Locates the diff baseline for a run.
pub struct CheckpointLocator<'a> {
    ctx: &'a RunContext,
    searcher: &'a dyn CommitSearcher,
}

impl<'a> CheckpointLocator<'a> {
    pub fn new(ctx: &'a RunContext, searcher: &'a dyn CommitSearcher) -> Self {
        Self { ctx, searcher }
    }

    /// Resolve the checkpoint reference.
    ///
    /// Never fails: a missing release commit is the normal first-run
    /// condition, and any search failure degrades to the trunk baseline.
    pub async fn locate(&self) -> String {
        let fallback = self.ctx.trunk_ref();
        let query = format!(
            "repo:{} \"{}\"",
            self.ctx.repo, self.ctx.release_marker
        );

        match self
            .searcher
            .search_commits(&query, "committer-date", "desc", 1)
            .await
        {
            Ok(shas) => match shas.into_iter().next() {
                Some(sha) => {
                    debug!(checkpoint = %sha, "release commit found");
                    sha
                }
                None => {
                    debug!(fallback = %fallback, "no release commit in history");
                    fallback
                }
            },
            Err(err) => {
                debug!(error = %err, fallback = %fallback, "commit search failed");
                fallback
            }
        }
    }
}

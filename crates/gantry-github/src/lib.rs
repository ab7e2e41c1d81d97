//! Gantry GitHub - GitHub API adapters
//!
//! Commit search for the checkpoint anchor and the idempotent preview
//! comment on the pull request.

mod client;
mod comments;
mod error;
mod search;

pub use client::GithubClient;
pub use comments::render_preview_comment;
pub use error::GithubError;

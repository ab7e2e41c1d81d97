//! Pull-request preview comment
//!
//! One tagged comment per pull request: repeated runs update the
//! existing comment instead of stacking new ones.

use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, instrument};

use gantry_core::run::PublishedPackage;
use gantry_core::version::PublishTag;

use crate::client::GithubClient;
use crate::error::GithubError;

/// Hidden marker identifying the comment across runs.
const COMMENT_TAG: &str = "<!-- gantry-preview -->";

/// Render the comment body for a finished run.
pub fn render_preview_comment(
    results: &[PublishedPackage],
    pr_number: u64,
    head_sha: &str,
) -> String {
    let mut lines = vec![
        COMMENT_TAG.to_string(),
        "### Preview release".to_string(),
        String::new(),
        format!("Latest commit: {}", head_sha),
        String::new(),
    ];

    if results.is_empty() {
        lines.push("No packages have been released.".to_string());
        return lines.join("\n");
    }

    lines.push("Some packages have been released:".to_string());
    lines.push("| Package | Version | Install |".to_string());
    lines.push("| --- | --- | --- |".to_string());
    for result in results {
        lines.push(format!(
            "| {} | {} | `{}@{}` |",
            result.name, result.version, result.name, result.version
        ));
    }

    let tag = PublishTag::for_pull_request(pr_number);
    lines.push(String::new());
    lines.push("> [!NOTE]".to_string());
    lines.push("> Use the PR number as tag to install any package. For instance:".to_string());
    lines.push("> ```".to_string());
    lines.push(format!("> pnpm add {}@{}", results[0].name, tag));
    lines.push("> ```".to_string());

    lines.join("\n")
}

#[derive(Debug, Deserialize)]
struct IssueComment {
    id: u64,
    #[serde(default)]
    body: Option<String>,
}

impl GithubClient {
    /// Create or update the preview comment on a pull request.
    #[instrument(skip(self, body))]
    pub async fn upsert_preview_comment(
        &self,
        pr_number: u64,
        body: &str,
    ) -> Result<(), GithubError> {
        let payload = json!({ "body": body });

        match self.find_preview_comment(pr_number).await? {
            Some(comment_id) => {
                let url = format!(
                    "{}/repos/{}/{}/issues/comments/{}",
                    self.api_base, self.repo.owner, self.repo.name, comment_id
                );
                let response = self
                    .request(reqwest::Method::PATCH, &url)
                    .json(&payload)
                    .send()
                    .await
                    .map_err(|e| GithubError::RequestFailed(e.to_string()))?;
                GithubClient::read_body(response).await?;
                info!(pr_number, comment_id, "preview comment updated");
            }
            None => {
                let url = format!(
                    "{}/repos/{}/{}/issues/{}/comments",
                    self.api_base, self.repo.owner, self.repo.name, pr_number
                );
                let response = self
                    .request(reqwest::Method::POST, &url)
                    .json(&payload)
                    .send()
                    .await
                    .map_err(|e| GithubError::RequestFailed(e.to_string()))?;
                GithubClient::read_body(response).await?;
                info!(pr_number, "preview comment created");
            }
        }

        Ok(())
    }

    /// Find the id of an existing tagged comment, if any.
    async fn find_preview_comment(&self, pr_number: u64) -> Result<Option<u64>, GithubError> {
        let url = format!(
            "{}/repos/{}/{}/issues/{}/comments",
            self.api_base, self.repo.owner, self.repo.name, pr_number
        );

        let response = self
            .request(reqwest::Method::GET, &url)
            .send()
            .await
            .map_err(|e| GithubError::RequestFailed(e.to_string()))?;
        let body = GithubClient::read_body(response).await?;

        let comments: Vec<IssueComment> =
            serde_json::from_str(&body).map_err(|e| GithubError::Decode(e.to_string()))?;

        let existing = comments.iter().find(|comment| {
            comment
                .body
                .as_deref()
                .is_some_and(|body| body.contains(COMMENT_TAG))
        });

        debug!(pr_number, found = existing.is_some(), "looked up preview comment");
        Ok(existing.map(|comment| comment.id))
    }
}

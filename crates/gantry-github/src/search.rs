//! Commit search

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

use gantry_core::error::SearchError;
use gantry_core::traits::CommitSearcher;

use crate::client::GithubClient;
use crate::error::GithubError;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    sha: String,
}

#[async_trait]
impl CommitSearcher for GithubClient {
    #[instrument(skip(self))]
    async fn search_commits(
        &self,
        query: &str,
        sort: &str,
        order: &str,
        limit: u32,
    ) -> Result<Vec<String>, SearchError> {
        let url = format!("{}/search/commits", self.api_base);
        let per_page = limit.to_string();

        let response = self
            .request(reqwest::Method::GET, &url)
            .query(&[
                ("q", query),
                ("sort", sort),
                ("order", order),
                ("per_page", per_page.as_str()),
            ])
            .send()
            .await
            .map_err(|e| SearchError::RequestFailed(e.to_string()))?;

        let body = GithubClient::read_body(response)
            .await
            .map_err(|e| match e {
                GithubError::Api { status, message } => SearchError::Api { status, message },
                other => SearchError::RequestFailed(other.to_string()),
            })?;

        let parsed: SearchResponse =
            serde_json::from_str(&body).map_err(|e| SearchError::Decode(e.to_string()))?;

        let shas: Vec<String> = parsed.items.into_iter().map(|item| item.sha).collect();
        debug!(query, results = shas.len(), "commit search complete");
        Ok(shas)
    }
}

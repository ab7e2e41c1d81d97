//! Authenticated GitHub REST client

use gantry_core::context::RepoSlug;

use crate::error::GithubError;

/// GitHub API client scoped to one repository.
pub struct GithubClient {
    pub(crate) client: reqwest::Client,
    pub(crate) api_base: String,
    pub(crate) token: String,
    pub(crate) repo: RepoSlug,
}

impl GithubClient {
    pub fn new(token: impl Into<String>, repo: RepoSlug) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: "https://api.github.com".to_string(),
            token: token.into(),
            repo,
        }
    }

    /// Override the API base URL (for GitHub Enterprise or tests)
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub(crate) fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", "gantry")
    }

    /// Read the response body, mapping non-success statuses to errors.
    pub(crate) async fn read_body(
        response: reqwest::Response,
    ) -> Result<String, GithubError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GithubError::RequestFailed(e.to_string()))?;

        if !status.is_success() {
            return Err(GithubError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(body)
    }
}

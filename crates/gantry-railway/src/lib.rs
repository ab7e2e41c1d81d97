//! Gantry Railway - service redeploy adapter
//!
//! A point query for the most recent healthy deployment of a service,
//! followed by the redeploy mutation. No publish-set machinery is
//! involved; this workflow is independent of the preview release.

mod error;

use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, instrument};

pub use error::RailwayError;

/// Railway API configuration
#[derive(Debug, Clone)]
pub struct RailwayConfig {
    /// GraphQL endpoint
    pub api_url: String,
    /// API token
    pub token: String,
    /// Service whose deployment is redeployed
    pub service_id: String,
}

/// A deployment as reported by the API
#[derive(Debug, Clone, Deserialize)]
pub struct Deployment {
    pub id: String,
    #[serde(rename = "projectId")]
    pub project_id: String,
    #[serde(rename = "canRedeploy")]
    pub can_redeploy: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct DeploymentsData {
    deployments: DeploymentConnection,
}

#[derive(Debug, Deserialize)]
struct DeploymentConnection {
    edges: Vec<DeploymentEdge>,
}

#[derive(Debug, Deserialize)]
struct DeploymentEdge {
    node: Deployment,
}

const LAST_DEPLOYMENT_QUERY: &str = r#"
    query getLastDeployment($serviceId: String!) {
        deployments(first: 1, input: {
            serviceId: $serviceId
            status: { in: [SUCCESS, SLEEPING] }
        }) {
            edges {
                node {
                    id
                    projectId
                    canRedeploy
                }
            }
        }
    }
"#;

const REDEPLOY_MUTATION: &str = r#"
    mutation redeploy($deploymentId: String!) {
        deploymentRedeploy(id: $deploymentId) {
            id
        }
    }
"#;

/// Railway GraphQL client
pub struct RailwayClient {
    config: RailwayConfig,
    client: reqwest::Client,
}

impl RailwayClient {
    pub fn new(config: RailwayConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Console URL for a deployment, for run logs.
    pub fn console_url(&self, deployment: &Deployment) -> String {
        format!(
            "https://railway.com/project/{}/service/{}?id={}",
            deployment.project_id, self.config.service_id, deployment.id
        )
    }

    /// Most recent deployment in SUCCESS or SLEEPING state.
    #[instrument(skip(self))]
    pub async fn last_healthy_deployment(&self) -> Result<Deployment, RailwayError> {
        let data: DeploymentsData = self
            .execute(
                LAST_DEPLOYMENT_QUERY,
                json!({ "serviceId": self.config.service_id }),
            )
            .await?;

        let deployment = data
            .deployments
            .edges
            .into_iter()
            .next()
            .map(|edge| edge.node)
            .ok_or(RailwayError::NoHealthyDeployment)?;

        debug!(deployment = %deployment.id, "found healthy deployment");
        Ok(deployment)
    }

    /// Trigger redeployment of a deployment by id.
    #[instrument(skip(self))]
    pub async fn redeploy(&self, deployment_id: &str) -> Result<(), RailwayError> {
        let _: serde_json::Value = self
            .execute(REDEPLOY_MUTATION, json!({ "deploymentId": deployment_id }))
            .await?;
        Ok(())
    }

    /// Redeploy the most recent healthy deployment and return it.
    pub async fn redeploy_latest(&self) -> Result<Deployment, RailwayError> {
        let deployment = self.last_healthy_deployment().await?;

        if deployment.can_redeploy == Some(false) {
            return Err(RailwayError::NotRedeployable(deployment.id));
        }

        self.redeploy(&deployment.id).await?;
        info!(
            deployment = %deployment.id,
            url = %self.console_url(&deployment),
            "redeploy started"
        );
        Ok(deployment)
    }

    async fn execute<T: serde::de::DeserializeOwned>(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<T, RailwayError> {
        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.token)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await
            .map_err(|e| RailwayError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(RailwayError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: GraphqlResponse<T> = response
            .json()
            .await
            .map_err(|e| RailwayError::RequestFailed(e.to_string()))?;

        if let Some(error) = body.errors.first() {
            return Err(RailwayError::Graphql(error.message.clone()));
        }

        body.data
            .ok_or_else(|| RailwayError::Graphql("response carried no data".to_string()))
    }
}

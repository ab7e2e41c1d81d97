//! Railway error types

use thiserror::Error;

/// Railway API errors
#[derive(Debug, Error)]
pub enum RailwayError {
    /// Request could not be sent
    #[error("Railway request failed: {0}")]
    RequestFailed(String),

    /// API returned a non-success status
    #[error("Railway API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// GraphQL-level errors in an otherwise successful response
    #[error("Railway GraphQL error: {0}")]
    Graphql(String),

    /// No deployment in a redeployable state
    #[error("No active or sleeping deployments found")]
    NoHealthyDeployment,

    /// The latest healthy deployment refuses redeployment
    #[error("Deployment {0} cannot be redeployed")]
    NotRedeployable(String),
}

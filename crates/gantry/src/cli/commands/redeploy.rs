//! Service redeploy command

use clap::Args;
use console::style;

use gantry_railway::{RailwayClient, RailwayConfig};

/// Redeploy the most recent healthy deployment of a service
#[derive(Debug, Args)]
pub struct RedeployCommand {
    /// Railway GraphQL endpoint
    #[arg(
        long,
        env = "RAILWAY_API",
        default_value = "https://backboard.railway.com/graphql/v2"
    )]
    pub api_url: String,

    /// Railway API token
    #[arg(long, env = "RAILWAY_TOKEN", hide_env_values = true)]
    pub token: String,

    /// Service whose deployment is redeployed
    #[arg(long, env = "SERVICE_ID")]
    pub service_id: String,
}

impl RedeployCommand {
    pub async fn execute(&self) -> anyhow::Result<()> {
        let client = RailwayClient::new(RailwayConfig {
            api_url: self.api_url.clone(),
            token: self.token.clone(),
            service_id: self.service_id.clone(),
        });

        let deployment = client.redeploy_latest().await?;

        println!(
            "{} deployment {}: {}",
            style("Redeploying").green().bold(),
            deployment.id,
            style(client.console_url(&deployment)).dim()
        );

        Ok(())
    }
}

//! CLI command implementations

mod preview;
mod redeploy;

pub use preview::PreviewCommand;
pub use redeploy::RedeployCommand;

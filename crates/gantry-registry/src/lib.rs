//! Gantry Registry - npm registry and package-manager adapters
//!
//! Implements the core registry and inventory seams: metadata lookup
//! over the registry HTTP API, version bumps and publishes through the
//! pnpm CLI, workspace enumeration via `pnpm list`, write-once
//! credentials materialization, and trusted-publishing token exchange.

mod credentials;
mod inventory;
mod oidc;
mod pnpm;
mod registry;

pub use inventory::PnpmInventory;
pub use oidc::OidcConfig;
pub use registry::{NpmRegistry, RegistryConfig};

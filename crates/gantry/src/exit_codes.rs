//! Exit codes for the CLI

use gantry_core::GantryError;

/// General error
pub const ERROR: i32 = 1;

/// Workspace inventory error
pub const INVENTORY_ERROR: i32 = 2;

/// Source-control error
pub const SCM_ERROR: i32 = 3;

/// Registry error
pub const REGISTRY_ERROR: i32 = 4;

/// Bump/publish run error
pub const RUN_ERROR: i32 = 5;

/// Map an error to its exit code
pub fn for_error(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<GantryError>() {
        Some(GantryError::Inventory(_)) => INVENTORY_ERROR,
        Some(GantryError::Scm(_)) => SCM_ERROR,
        Some(GantryError::Registry(_)) => REGISTRY_ERROR,
        Some(GantryError::Run(_)) => RUN_ERROR,
        Some(_) | None => ERROR,
    }
}

//! Registry credentials file
//!
//! The credentials file is written at most once per run and only when
//! missing. It carries a literal `${...}` placeholder that pnpm expands
//! from the environment at call time, so the secret value itself never
//! reaches disk.

use std::path::Path;

use tracing::{debug, info};

use gantry_core::error::RegistryError;

/// File name pnpm reads registry credentials from.
const CREDENTIALS_FILE: &str = ".npmrc";

/// Ensure a credentials file referencing `env_var` exists at the
/// workspace root. An existing file is left untouched.
pub(crate) fn ensure_credentials_file(
    workspace_root: &Path,
    registry_host: &str,
    env_var: &str,
) -> Result<(), RegistryError> {
    let path = workspace_root.join(CREDENTIALS_FILE);

    if path.exists() {
        debug!(path = %path.display(), "credentials file already present");
        return Ok(());
    }

    let line = format!("//{}/:_authToken=${{{}}}", registry_host, env_var);
    std::fs::write(&path, line).map_err(|e| {
        RegistryError::AuthenticationFailed(format!(
            "failed to write {}: {}",
            path.display(),
            e
        ))
    })?;

    info!(path = %path.display(), env_var, "credentials file written");
    Ok(())
}

/// Host portion of a registry URL, e.g.
/// `https://registry.npmjs.org` -> `registry.npmjs.org`.
pub(crate) fn registry_host(registry_url: &str) -> &str {
    let stripped = registry_url
        .strip_prefix("https://")
        .or_else(|| registry_url.strip_prefix("http://"))
        .unwrap_or(registry_url);
    stripped.trim_end_matches('/')
}

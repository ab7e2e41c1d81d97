//! pnpm invocations

use std::path::Path;

use tracing::debug;

use gantry_core::error::RegistryError;

/// Run pnpm in `dir` with the given arguments and extra environment,
/// returning stdout on success.
pub(crate) async fn run_pnpm(
    dir: &Path,
    args: &[&str],
    envs: &[(&str, &str)],
) -> Result<String, RegistryError> {
    let mut cmd = tokio::process::Command::new("pnpm");
    cmd.args(args).current_dir(dir);
    for (key, value) in envs {
        cmd.env(key, value);
    }

    let command_line = format!("pnpm {}", args.join(" "));
    debug!(command = %command_line, dir = %dir.display(), "running pnpm");

    let output = cmd.output().await.map_err(|e| RegistryError::CommandFailed {
        command: command_line.clone(),
        reason: e.to_string(),
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(RegistryError::CommandFailed {
            command: command_line,
            reason: stderr.trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

//! `qpm delete` command implementation.

use std::io::{self, BufRead, Write};

use qpm_core::error::{QpmError, QpmResult};
use qpm_core::types::{PackageName, Version};

use super::{CommandContext, CommandOutcome};

/// Delete one published version after confirmation
pub async fn execute(
    package: &str,
    version: &str,
    yes: bool,
    ctx: &CommandContext,
) -> QpmResult<CommandOutcome> {
    let name = PackageName::parse(package).map_err(|e| QpmError::ConfigValidation {
        field: "package".to_string(),
        reason: e.to_string(),
    })?;
    let version = Version::parse(version)?;

    if ctx.settings.token.is_none() {
        return Err(QpmError::Authentication {
            message: "deleting a version requires a registry token".to_string(),
        });
    }

    let colors = ctx.output.colors();
    let display = format!("{} {}", colors.bold(&name.to_string()), colors.cyan(&version.to_string()));
    if !yes && !confirm(&format!("Delete {}? This cannot be undone. (y/N): ", display))? {
        ctx.output.info("Deletion cancelled.");
        return Ok(CommandOutcome::Success);
    }

    let client = ctx.registry_client()?;
    let response = client.delete_package_version(&name, &version).await?;
    if !response.success {
        ctx.output.error("Deletion failed");
        return Ok(CommandOutcome::Failure);
    }

    ctx.output.success(&format!("Deleted {}", display));
    if let Some(warning) = &response.warning {
        ctx.output.warn(&warning.message);
        if !warning.dependents.is_empty() {
            ctx.output.line("Affected packages:");
            for dependent in &warning.dependents {
                ctx.output.line(&format!("  - {}", colors.cyan(dependent)));
            }
        }
    }
    Ok(CommandOutcome::Success)
}

fn confirm(prompt: &str) -> QpmResult<bool> {
    let mut stdout = io::stdout();
    write!(stdout, "{}", prompt)
        .and_then(|_| stdout.flush())
        .map_err(|e| QpmError::io("Failed to write prompt", e))?;

    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .map_err(|e| QpmError::io("Failed to read confirmation", e))?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

//! `qpm lock` command implementation.

use qpm_core::error::QpmResult;

use super::{resolve_and_lock, CommandContext, CommandOutcome};

/// Resolve the manifest and rewrite qilletni.lock without installing
pub async fn execute(ctx: &CommandContext) -> QpmResult<CommandOutcome> {
    let project = ctx.project()?;
    let manifest = project.manifest().await?;
    let client = ctx.registry_client()?;

    let resolution = resolve_and_lock(&manifest, &project, &client, ctx).await?;
    for package in &resolution.lock_set {
        ctx.output.line(&format!("  {}", package.key()));
    }
    Ok(CommandOutcome::Success)
}

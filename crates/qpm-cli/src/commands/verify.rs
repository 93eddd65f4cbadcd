//! `qpm verify` command implementation.
//!
//! Checks every locked package in the store against its integrity string.

use qpm_core::error::{QpmError, QpmResult};
use qpm_store::PackageStatus;

use super::{CommandContext, CommandOutcome};

/// Execute the `qpm verify` command
pub async fn execute(ctx: &CommandContext) -> QpmResult<CommandOutcome> {
    let project = ctx.project()?;
    let lock = project.lock().await?.ok_or_else(|| QpmError::ConfigValidation {
        field: "lockfile".to_string(),
        reason: "qilletni.lock not found; run 'qpm install' first".to_string(),
    })?;

    if lock.is_empty() {
        ctx.output.info("No packages to verify.");
        return Ok(CommandOutcome::Success);
    }

    ctx.output
        .info(&format!("Verifying {} package(s)...", lock.len()));

    let store = ctx.store()?;
    let reports = tokio::task::spawn_blocking(move || store.verify_all(&lock))
        .await
        .map_err(|e| QpmError::io("Verification task failed", std::io::Error::other(e)))??;

    let mut failed = 0;
    for report in &reports {
        match &report.status {
            PackageStatus::Verified => ctx.output.success(&report.key),
            PackageStatus::Missing => {
                failed += 1;
                ctx.output
                    .error(&format!("{} - not installed ({})", report.key, report.path));
            },
            PackageStatus::Corrupt { expected, actual } => {
                failed += 1;
                ctx.output.error(&format!("{} - integrity mismatch", report.key));
                ctx.output.error(&format!("  Expected: {}", expected));
                ctx.output.error(&format!("  Actual:   {}", actual));
            },
        }
    }

    if failed == 0 {
        ctx.output
            .success(&format!("All {} package(s) verified", reports.len()));
        Ok(CommandOutcome::Success)
    } else {
        ctx.output.error(&format!(
            "Verification failed: {} verified, {} failed",
            reports.len() - failed,
            failed
        ));
        Ok(CommandOutcome::Failure)
    }
}

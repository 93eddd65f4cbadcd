//! `qpm publish` command implementation.
//!
//! The package identity comes from the project manifest. Without an explicit
//! file the latest build output `build/ql-build/<name>-<version>.qll` is used.

use camino::Utf8PathBuf;
use qpm_config::manifest::validate_for_publish;
use qpm_core::error::{QpmError, QpmResult};
use qpm_core::utils::compute_integrity;
use qpm_store::ARTIFACT_EXTENSION;

use super::{CommandContext, CommandOutcome, Project};
use crate::output::format_bytes;

/// Execute the `qpm publish` command
pub async fn execute(file: Option<Utf8PathBuf>, ctx: &CommandContext) -> QpmResult<CommandOutcome> {
    if ctx.settings.token.is_none() {
        return Err(QpmError::Authentication {
            message: "publishing requires a registry token".to_string(),
        });
    }

    let project = ctx.project()?;
    let manifest = project.manifest().await?;
    let (name, version) = validate_for_publish(&manifest)?;

    let path = match file {
        Some(path) => {
            if path.extension() != Some(ARTIFACT_EXTENSION) {
                return Err(QpmError::ConfigValidation {
                    field: "file".to_string(),
                    reason: format!("package file must have a .{} extension", ARTIFACT_EXTENSION),
                });
            }
            if path.is_absolute() {
                path
            } else {
                ctx.cwd.join(path)
            }
        },
        None => default_artifact(&project, name.name(), &version.to_string()),
    };

    ctx.output.info(&format!("Reading package: {}", path));
    let archive = tokio::fs::read(&path)
        .await
        .map_err(|e| QpmError::io(format!("Failed to read package file {}", path), e))?;
    let integrity = compute_integrity(&archive);

    ctx.output
        .info(&format!("Uploading {}@{} ({})...", name, version, format_bytes(archive.len() as u64)));
    let client = ctx.registry_client()?;
    let response = client.upload_package(&name, &version, archive).await?;

    let info = &response.package_info;
    if info.integrity != integrity {
        return Err(QpmError::IntegrityMismatch {
            subject: format!("{}@{} (as stored by the registry)", name, version),
            expected: integrity,
            actual: info.integrity.clone(),
        });
    }

    ctx.output.success("Package published successfully!");
    ctx.output.info(&format!("Name: {}", info.name));
    ctx.output.info(&format!("Version: {}", info.version));
    ctx.output.info(&format!("Size: {}", format_bytes(info.size)));
    ctx.output.info(&format!("Integrity: {}", info.integrity));
    Ok(CommandOutcome::Success)
}

/// `<project>/build/ql-build/<name>-<version>.qll`
fn default_artifact(project: &Project, name: &str, version: &str) -> Utf8PathBuf {
    project
        .root
        .join("build")
        .join("ql-build")
        .join(format!("{}-{}.{}", name, version, ARTIFACT_EXTENSION))
}

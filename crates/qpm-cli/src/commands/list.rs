//! `qpm list` command implementation.

use qpm_core::error::QpmResult;
use qpm_registry::PackageSummary;

use super::{CommandContext, CommandOutcome};

/// List registry packages, optionally limited to one scope
pub async fn execute(scope: Option<String>, ctx: &CommandContext) -> QpmResult<CommandOutcome> {
    let client = ctx.registry_client()?;
    ctx.output.info("Fetching packages from registry...");
    let response = client.list_packages().await?;

    let scope = scope.map(|s| s.trim_start_matches('@').to_string());
    let packages = filter_by_scope(response.packages, scope.as_deref());

    if packages.is_empty() {
        match scope {
            Some(scope) => ctx.output.info(&format!("No packages found for scope: @{}", scope)),
            None => ctx.output.info("No packages found in registry."),
        }
        return Ok(CommandOutcome::Success);
    }

    let width = packages
        .iter()
        .map(|p| p.name.len())
        .max()
        .unwrap_or(0)
        .max("PACKAGE".len());
    let colors = ctx.output.colors();
    ctx.output.line(&colors.bold(&format!(
        "{:<width$}  {:<12}  {}",
        "PACKAGE", "LATEST", "VERSIONS"
    )));
    for package in &packages {
        ctx.output.line(&format!(
            "{:<width$}  {}  {}",
            package.name,
            colors.cyan(&format!("{:<12}", package.latest)),
            package.version_count
        ));
    }
    ctx.output
        .info(&format!("{} package(s)", packages.len()));
    Ok(CommandOutcome::Success)
}

fn filter_by_scope(packages: Vec<PackageSummary>, scope: Option<&str>) -> Vec<PackageSummary> {
    match scope {
        None => packages,
        Some(scope) => packages
            .into_iter()
            .filter(|p| {
                p.name
                    .trim_start_matches('@')
                    .split_once('/')
                    .is_some_and(|(s, _)| s == scope)
            })
            .collect(),
    }
}

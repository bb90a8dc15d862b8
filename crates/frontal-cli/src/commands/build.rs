//! `frontal build`: compile the site and write it to the build directory.

use std::path::Path;
use std::time::Instant;

use frontal_bundler::output::write_site;
use frontal_bundler::{AppContext, BuildReport, Mode, Pipeline, PluginFactory};
use frontal_config::ConfigDiscovery;

use crate::cli::BuildArgs;
use crate::commands::utils;
use crate::error::{CliError, Result};
use crate::ui;

/// Execute the build command.
///
/// 1. Load configuration from the project root
/// 2. Resolve bundles, match pages and compile
/// 3. Refuse to write anything if the build has errors
/// 4. Replace the build directory and print a summary
pub async fn execute(args: BuildArgs) -> Result<()> {
    let started = Instant::now();
    let root = utils::resolve_project_root(args.cwd.as_deref())?;

    let spinner = ui::Spinner::new("Building...");
    let (report, files) = match build(&root).await {
        Ok(result) => result,
        Err(err) => {
            spinner.fail("Build failed");
            return Err(err);
        }
    };
    spinner.clear();

    let stats = report.stats();
    for warning in &stats.warnings {
        ui::warning(warning);
    }
    if !stats.errors.is_empty() {
        for error in &stats.errors {
            ui::error(error);
        }
        return Err(CliError::BuildFailed {
            count: stats.errors.len(),
        });
    }

    ui::print_build_summary(&stats, started.elapsed());
    ui::success(&format!(
        "Wrote {} files in {}",
        files,
        ui::format_duration(started.elapsed())
    ));
    Ok(())
}

/// Build the project under `root` in production mode. The site is written
/// only when the build has no errors; the written file count is returned
/// with the report.
pub async fn build(root: &Path) -> Result<(BuildReport, usize)> {
    let config = ConfigDiscovery::new(root).load()?;
    let build_dir = config.build_dir();
    let public_dir = config.public_dir();

    let ctx = AppContext::new(config, Mode::Production);
    let pipeline = Pipeline::new(ctx, &PluginFactory::with_builtins());
    let report = pipeline.build().await;

    for err in pipeline.teardown().await {
        tracing::warn!(error = %err, "plugin teardown failed");
    }

    if report.has_errors() {
        return Ok((report, 0));
    }

    let files = write_site(&report.compilation, &build_dir, &public_dir)?;
    tracing::debug!(files, dir = %build_dir.display(), "site written");
    Ok((report, files))
}

use anyhow::{Context, Result};
use multilocale_core::BuildMode;
use multilocale_generator::{BuildReport, SiteBuilder};
use std::path::PathBuf;

use super::load_site;

/// Build the static site into the output directory
pub async fn run(path: PathBuf, output: Option<PathBuf>, dev: bool, strict: bool) -> Result<()> {
    let (root, mut config) = load_site(&path)?;
    if let Some(output) = output {
        config.paths.output = std::path::absolute(&output)
            .with_context(|| format!("Invalid output path {}", output.display()))?;
    }
    let mode = if dev {
        BuildMode::Development
    } else {
        BuildMode::Production
    };

    println!("🔨 Building site...");
    println!("   Source: {}", root.display());
    println!("   Output: {}", config.paths.output.display());
    println!(
        "   Locales: {} (default {})",
        config
            .locales
            .iter()
            .map(|l| l.as_str())
            .collect::<Vec<_>>()
            .join(", "),
        config.locales.default_locale()
    );
    println!("   Mode: {}", if mode.is_production() { "production" } else { "development" });
    println!();

    let report = tokio::task::spawn_blocking(move || SiteBuilder::new(config, mode).build_all())
        .await
        .context("Build task panicked")?
        .context("Build failed")?;

    print_report(&report);

    if strict && report.has_failures() {
        anyhow::bail!("{} page(s) failed", report.failed);
    }
    Ok(())
}

pub(crate) fn print_report(report: &BuildReport) {
    println!("✓ Wrote {} file(s)", report.written);
    if report.skipped > 0 {
        println!("   ⚠ Skipped {} page/locale pair(s) without a route or template", report.skipped);
    }
    if report.has_failures() {
        println!("   ✗ {} failure(s):", report.failed);
        for failure in &report.failures {
            println!("     - {}", failure);
        }
    }
}

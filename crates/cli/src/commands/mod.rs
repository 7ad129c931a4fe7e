pub mod build;
pub mod init;
pub mod preview;
pub mod validate;

use anyhow::{Context, Result};
use multilocale_core::{CONFIG_FILE, SiteConfig, parse_site_toml};
use std::path::{Path, PathBuf};

/// Canonicalize the site directory and load its `site.toml`.
pub(crate) fn load_site(path: &Path) -> Result<(PathBuf, SiteConfig)> {
    if !path.exists() {
        anyhow::bail!("Site directory does not exist: {}", path.display());
    }
    let root = path
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", path.display()))?;

    let config_path = root.join(CONFIG_FILE);
    if !config_path.exists() {
        anyhow::bail!(
            "{} not found in {}\nRun 'multilocale init {}' first",
            CONFIG_FILE,
            root.display(),
            path.display()
        );
    }

    let config = parse_site_toml(&config_path)
        .with_context(|| format!("Failed to parse {}", config_path.display()))?;
    Ok((root, config))
}

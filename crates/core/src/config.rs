use crate::error::{Error, Result};
use crate::types::*;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the configuration file at the site root
pub const CONFIG_FILE: &str = "site.toml";

const DEFAULT_RTL_LOCALES: &[&str] = &["ar", "fa", "he", "ur"];

/// Raw TOML configuration structure
/// This matches the site.toml file structure exactly
#[derive(Debug, Deserialize)]
struct RawConfig {
    site: RawSite,
    #[serde(default)]
    paths: RawPaths,
    #[serde(default)]
    build: RawBuild,
    #[serde(default)]
    assets: Vec<RawAsset>,
}

#[derive(Debug, Deserialize)]
struct RawSite {
    base_url: String,
    default_locale: String,
    locales: Vec<String>,
    rtl_locales: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct RawPaths {
    pages: Option<String>,
    layouts: Option<String>,
    partials: Option<String>,
    data: Option<String>,
    routes: Option<String>,
    output: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawBuild {
    template_extension: Option<String>,
    sitemap: Option<bool>,
    not_found: Option<bool>,
    link_rewrite: Option<LinkRewrite>,
}

#[derive(Debug, Deserialize)]
struct RawAsset {
    name: Option<String>,
    kind: AssetKind,
    source: String, // Convert to PathBuf
}

/// Parse site.toml from a file path. Relative paths resolve against the
/// directory containing the file.
pub fn parse_site_toml<P: AsRef<Path>>(path: P) -> Result<SiteConfig> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    let root = path.parent().unwrap_or_else(|| Path::new("."));
    parse_site_toml_str(&content, root)
}

/// Parse site.toml from a string (useful for testing)
pub fn parse_site_toml_str(content: &str, root: &Path) -> Result<SiteConfig> {
    let raw: RawConfig = toml::from_str(content)?;

    let base_url = raw.site.base_url.trim().trim_end_matches('/').to_string();
    if base_url.is_empty() {
        return Err(Error::ConfigParse("site.base_url must not be empty".into()));
    }

    let locales = parse_locales(&raw.site.locales, &raw.site.default_locale)?;

    let rtl_locales = raw.site.rtl_locales.unwrap_or_else(|| {
        DEFAULT_RTL_LOCALES
            .iter()
            .map(|code| code.to_string())
            .collect()
    });

    let resolve = |value: Option<String>, default: &str, field: &str| -> Result<PathBuf> {
        let value = value.unwrap_or_else(|| default.to_string());
        Ok(root.join(validate_path(&value, field)?))
    };

    let paths = SitePaths {
        root: root.to_path_buf(),
        pages: resolve(raw.paths.pages, "src/pages", "paths.pages")?,
        layouts: resolve(raw.paths.layouts, "src/layouts", "paths.layouts")?,
        partials: resolve(raw.paths.partials, "src/partials", "paths.partials")?,
        data: resolve(raw.paths.data, "src/data", "paths.data")?,
        routes: resolve(raw.paths.routes, "src/data/routes.json", "paths.routes")?,
        output: resolve(raw.paths.output, "dist", "paths.output")?,
    };

    let template_extension = raw
        .build
        .template_extension
        .unwrap_or_else(|| "njk".to_string())
        .trim_start_matches('.')
        .to_string();
    if template_extension.is_empty() || template_extension.contains(['/', '.']) {
        return Err(Error::ConfigParse(format!(
            "Invalid build.template_extension '{}'",
            template_extension
        )));
    }

    let build = BuildSettings {
        template_extension,
        sitemap: raw.build.sitemap.unwrap_or(true),
        not_found: raw.build.not_found.unwrap_or(true),
        link_rewrite: raw.build.link_rewrite.unwrap_or_default(),
    };

    let mut seen_names = HashSet::new();
    let mut assets = Vec::with_capacity(raw.assets.len());
    for asset in raw.assets {
        let name = asset
            .name
            .unwrap_or_else(|| asset.kind.as_str().to_string());
        if !seen_names.insert(name.clone()) {
            return Err(Error::ConfigParse(format!(
                "Duplicate asset name '{}'; give each [[assets]] entry a unique name",
                name
            )));
        }
        let source = root.join(validate_path(&asset.source, "assets.source")?);
        assets.push(AssetSpec {
            name,
            kind: asset.kind,
            source,
        });
    }

    Ok(SiteConfig {
        base_url,
        locales,
        rtl_locales,
        paths,
        build,
        assets,
    })
}

fn parse_locales(codes: &[String], default: &str) -> Result<LocaleSet> {
    if codes.is_empty() {
        return Err(Error::ConfigParse(
            "site.locales must list at least one locale".into(),
        ));
    }

    let mut locales: Vec<Locale> = Vec::with_capacity(codes.len());
    for code in codes {
        let locale = Locale::parse(code).ok_or_else(|| {
            Error::ConfigParse(format!(
                "Invalid locale code '{}' in site.locales: expected two lowercase letters",
                code
            ))
        })?;
        if locales.contains(&locale) {
            return Err(Error::ConfigParse(format!(
                "Locale '{}' listed twice in site.locales",
                code
            )));
        }
        locales.push(locale);
    }

    let default_locale = Locale::parse(default).ok_or_else(|| {
        Error::ConfigParse(format!("Invalid site.default_locale '{}'", default))
    })?;

    LocaleSet::new(locales, default_locale).ok_or_else(|| {
        Error::ConfigParse(format!(
            "site.default_locale '{}' is not one of site.locales",
            default
        ))
    })
}

/// Validate and convert a path string to PathBuf.
///
/// This function prevents path traversal by rejecting:
/// - Absolute paths (starting with `/` or Windows drive letters)
/// - Paths containing parent directory references (`..`)
///
/// Every source and output directory named in site.toml must stay inside the
/// site root, otherwise a build could overwrite unrelated files.
///
/// ```text
/// validate_path("src/pages", "paths.pages")  → Ok(PathBuf)
/// validate_path("/etc", "paths.output")  → Err("Absolute paths not allowed...")
/// validate_path("../other-site", "paths.output")  → Err("Parent directory references...")
/// ```
fn validate_path(path_str: &str, field_name: &str) -> Result<PathBuf> {
    let path = Path::new(path_str);

    // Reject absolute paths
    if path.is_absolute() {
        return Err(Error::ConfigParse(format!(
            "Absolute paths not allowed in '{}': '{}'. Use relative paths only.",
            field_name, path_str
        )));
    }

    for component in path.components() {
        if component == std::path::Component::ParentDir {
            return Err(Error::ConfigParse(format!(
                "Parent directory references (..) not allowed in '{}': '{}'",
                field_name, path_str
            )));
        }
    }

    if path_str.trim().is_empty() {
        return Err(Error::ConfigParse(format!(
            "Empty path in '{}' field",
            field_name
        )));
    }

    Ok(path.to_path_buf())
}

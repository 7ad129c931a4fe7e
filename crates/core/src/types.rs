use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A configured two-letter locale code such as `en` or `fr`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Locale(String);

impl Locale {
    /// Parse a locale code. Only two lowercase ASCII letters are accepted.
    pub fn parse(code: &str) -> Option<Self> {
        is_locale_code(code).then(|| Locale(code.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Locale {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Whether `s` has the shape of a locale code (two lowercase ASCII letters).
pub fn is_locale_code(s: &str) -> bool {
    s.len() == 2 && s.bytes().all(|b| b.is_ascii_lowercase())
}

/// Ordered set of configured locales with one distinguished default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleSet {
    locales: Vec<Locale>,
    default: Locale,
}

impl LocaleSet {
    /// Build a locale set. Returns `None` if `default` is not a member or the
    /// list is empty.
    pub fn new(locales: Vec<Locale>, default: Locale) -> Option<Self> {
        if locales.contains(&default) {
            Some(Self { locales, default })
        } else {
            None
        }
    }

    pub fn default_locale(&self) -> &Locale {
        &self.default
    }

    pub fn iter(&self) -> impl Iterator<Item = &Locale> {
        self.locales.iter()
    }

    pub fn as_slice(&self) -> &[Locale] {
        &self.locales
    }

    /// Look up a configured locale by its code.
    pub fn get(&self, code: &str) -> Option<&Locale> {
        self.locales.iter().find(|l| l.as_str() == code)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.get(code).is_some()
    }
}

/// Development or production output. Threaded explicitly through the build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    Development,
    Production,
}

impl BuildMode {
    pub fn is_production(self) -> bool {
        self == BuildMode::Production
    }
}

/// Policy for the root-relative link safety net.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinkRewrite {
    Off,
    #[default]
    SafetyNet,
}

/// Category of a shared asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Style,
    Script,
    Image,
}

impl AssetKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AssetKind::Style => "style",
            AssetKind::Script => "script",
            AssetKind::Image => "image",
        }
    }
}

/// One member of the fixed shared-asset set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetSpec {
    pub name: String,
    pub kind: AssetKind,
    /// Absolute path of the source file
    pub source: PathBuf,
}

/// Absolute source and output locations, resolved against the site root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitePaths {
    pub root: PathBuf,
    pub pages: PathBuf,
    pub layouts: PathBuf,
    pub partials: PathBuf,
    pub data: PathBuf,
    pub routes: PathBuf,
    pub output: PathBuf,
}

/// Output toggles from the `[build]` table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSettings {
    pub template_extension: String,
    pub sitemap: bool,
    pub not_found: bool,
    pub link_rewrite: LinkRewrite,
}

/// Complete site configuration
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// Public origin used for sitemap URLs, without trailing slash
    pub base_url: String,
    pub locales: LocaleSet,
    pub rtl_locales: Vec<String>,
    pub paths: SitePaths,
    pub build: BuildSettings,
    pub assets: Vec<AssetSpec>,
}

impl SiteConfig {
    /// Whether `locale` is written right-to-left according to configuration.
    pub fn is_rtl_locale(&self, locale: &Locale) -> bool {
        self.rtl_locales.iter().any(|code| code == locale.as_str())
    }
}

/// URL prefix under which shared assets are published
pub const ASSETS_URL_PREFIX: &str = "/assets/";

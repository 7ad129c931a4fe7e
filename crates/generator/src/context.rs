use crate::assets::AssetHashSet;
use multilocale_core::{Locale, PageKey, RouteTable, Translator};
use serde::Serialize;
use std::sync::Arc;

/// One locale in which the current page is available
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alternate {
    pub locale: Locale,
    pub url: String,
    pub current: bool,
}

/// One navigation link from the current locale's route list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavEntry {
    pub key: PageKey,
    pub title: String,
    pub url: String,
    pub active: bool,
}

/// Everything a template can see.
///
/// Template names: `t(key, params?)`, `data`, `locale`, `currentLocale`,
/// `defaultLocale`, `locales`, `isCurrentLocale(code)`, `alternates`, `isRtl`,
/// `dir`, `assetHashes`, `assets`, `navigation`, `pageKey`, `currentPage`,
/// `localizedUrl(keyOrPath, targetLocale?)`, `routeFor(key)`.
#[derive(Debug, Clone)]
pub struct RenderContext {
    pub page_key: PageKey,
    pub locale: Locale,
    pub default_locale: Locale,
    pub locales: Vec<Locale>,
    pub current_url: String,
    pub alternates: Vec<Alternate>,
    pub navigation: Vec<NavEntry>,
    pub rtl: bool,
    pub assets: Arc<AssetHashSet>,
    /// Raw locale-data tree of `locale`
    pub data: serde_json::Value,
    pub translator: Translator,
    pub urls: UrlHelper,
}

/// Route-aware URL helpers bound to one locale.
#[derive(Debug, Clone)]
pub struct UrlHelper {
    routes: Arc<RouteTable>,
    locale: Locale,
}

impl UrlHelper {
    pub fn new(routes: Arc<RouteTable>, locale: Locale) -> Self {
        Self { routes, locale }
    }

    /// URL of a page in `target` (default: the current locale).
    ///
    /// `key_or_path` is first tried as a page key. A root-relative path that
    /// is some locale's route maps to the same page in `target`; any other
    /// root-relative path is prefixed with `/<target>`. Unknown keys land on
    /// the target locale's home.
    pub fn localized_url(&self, key_or_path: &str, target: Option<&str>) -> String {
        let locales = self.routes.locales();
        let target = target
            .and_then(|code| locales.get(code))
            .unwrap_or(&self.locale);

        if let Some(path) = self.routes.resolve_path(&PageKey::new(key_or_path), target) {
            return path.to_string();
        }

        if key_or_path.starts_with('/') {
            if let Some(entry) = self.routes.find_by_url(key_or_path)
                && let Some(path) = self.routes.resolve_path(&entry.key, target)
            {
                return path.to_string();
            }
            return format!("/{}{}", target, key_or_path);
        }

        self.home(target)
    }

    /// Route of `key` in the current locale, or `#` when it has none.
    pub fn route_for(&self, key: &str) -> String {
        self.routes
            .resolve_path(&PageKey::new(key), &self.locale)
            .unwrap_or("#")
            .to_string()
    }

    fn home(&self, locale: &Locale) -> String {
        self.routes
            .resolve_path(&PageKey::index(), locale)
            .map(str::to_string)
            .unwrap_or_else(|| format!("/{}/", locale))
    }
}

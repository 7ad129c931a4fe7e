// (page key, locale) -> public URL path, loaded from routes.json

use crate::error::{Error, Result};
use crate::page_key::PageKey;
use crate::types::{Locale, LocaleSet};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct RawRouteFile {
    #[serde(default)]
    routes: BTreeMap<String, Vec<RawRoute>>,
}

#[derive(Debug, Deserialize)]
struct RawRoute {
    key: String,
    path: String,
    #[serde(default)]
    title: String,
}

/// One localized route
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    pub locale: Locale,
    pub key: PageKey,
    pub path: String,
    pub title: String,
    /// Position in the locale's route list
    pub order: usize,
}

#[derive(Debug, Clone, Default)]
struct LocaleRoutes {
    entries: Vec<RouteEntry>,
    by_key: HashMap<PageKey, usize>,
}

#[derive(Debug, Clone)]
pub struct RouteTable {
    locales: LocaleSet,
    routes: HashMap<Locale, LocaleRoutes>,
}

impl RouteTable {
    /// An empty table for the given locales
    pub fn empty(locales: &LocaleSet) -> Self {
        Self {
            locales: locales.clone(),
            routes: HashMap::new(),
        }
    }

    /// Load the route document at `path`, degrading to an empty table when it
    /// is missing or malformed.
    pub fn load(path: &Path, locales: &LocaleSet) -> Self {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Route configuration unavailable; no pages will be emitted"
                );
                return Self::empty(locales);
            }
        };

        match Self::parse_str(&content, locales) {
            Ok(table) => table,
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Malformed route configuration; no pages will be emitted"
                );
                Self::empty(locales)
            }
        }
    }

    /// Parse a route document. Locales that are not configured are dropped
    /// with a warning; a repeated key within one locale keeps the first entry.
    pub fn parse_str(content: &str, locales: &LocaleSet) -> Result<Self> {
        let raw: RawRouteFile = serde_json::from_str(content).map_err(|e| Error::InvalidData {
            path: PathBuf::from("routes"),
            message: e.to_string(),
        })?;

        let mut routes = HashMap::new();
        for (code, list) in raw.routes {
            let Some(locale) = locales.get(&code) else {
                tracing::warn!(locale = %code, "Ignoring routes for unconfigured locale");
                continue;
            };

            let mut table = LocaleRoutes::default();
            for route in list {
                let key = PageKey::new(route.key);
                if table.by_key.contains_key(&key) {
                    tracing::warn!(locale = %locale, page = %key, "Duplicate route key; keeping the first");
                    continue;
                }
                let order = table.entries.len();
                table.by_key.insert(key.clone(), order);
                table.entries.push(RouteEntry {
                    locale: locale.clone(),
                    key,
                    path: route.path,
                    title: route.title,
                    order,
                });
            }
            routes.insert(locale.clone(), table);
        }

        Ok(Self {
            locales: locales.clone(),
            routes,
        })
    }

    pub fn locales(&self) -> &LocaleSet {
        &self.locales
    }

    /// Exact (key, locale) lookup. There is no fallback to the default locale.
    pub fn resolve_path(&self, key: &PageKey, locale: &Locale) -> Option<&str> {
        self.entry(key, locale).map(|entry| entry.path.as_str())
    }

    pub fn entry(&self, key: &PageKey, locale: &Locale) -> Option<&RouteEntry> {
        let table = self.routes.get(locale)?;
        table.by_key.get(key).map(|&i| &table.entries[i])
    }

    /// Every route of `locale`, in configured order
    pub fn all_routes_for(&self, locale: &Locale) -> &[RouteEntry] {
        self.routes
            .get(locale)
            .map(|table| table.entries.as_slice())
            .unwrap_or(&[])
    }

    /// The URL of `key` in every locale that routes it, in configured locale order
    pub fn all_paths_for(&self, key: &PageKey) -> Vec<(Locale, String)> {
        self.locales
            .iter()
            .filter_map(|locale| {
                self.resolve_path(key, locale)
                    .map(|path| (locale.clone(), path.to_string()))
            })
            .collect()
    }

    /// Find the route whose path equals `url`, ignoring trailing slashes.
    pub fn find_by_url(&self, url: &str) -> Option<&RouteEntry> {
        let wanted = url.trim_end_matches('/');
        self.locales
            .iter()
            .flat_map(|locale| self.all_routes_for(locale))
            .find(|entry| entry.path.trim_end_matches('/') == wanted)
    }

    /// Output file (relative to the output directory) for a route path.
    pub fn output_file(&self, url: &str) -> PathBuf {
        url_to_output_file(url, &self.locales)
    }
}

/// Convert a URL path into an output file path relative to the output root.
///
/// Leading and trailing slashes are stripped and an empty path becomes
/// `index`. A bare locale code gains `/index` so locale roots keep an index
/// page. `.html` is appended unless already present.
pub fn url_to_output_file(url: &str, locales: &LocaleSet) -> PathBuf {
    let mut trimmed = url.trim_start_matches('/').trim_end_matches('/').to_string();
    if trimmed.is_empty() {
        trimmed.push_str("index");
    } else if locales.contains(&trimmed) {
        trimmed.push_str("/index");
    }
    if !trimmed.ends_with(".html") {
        trimmed.push_str(".html");
    }
    PathBuf::from(trimmed)
}

use crate::types::{LocaleSet, Locale, is_locale_code};
use serde::Serialize;
use std::fmt;
use std::path::{Component, Path};

/// Logical page identifier shared by the page graph and the route table.
///
/// Uses `/` separators relative to the pages root, e.g. `index` or
/// `blog/first-post`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct PageKey(String);

impl PageKey {
    pub fn new(key: impl Into<String>) -> Self {
        PageKey(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The page key of the locale root page
    pub fn index() -> Self {
        PageKey("index".to_string())
    }

    /// The reserved key of 404 templates
    pub fn not_found() -> Self {
        PageKey("404".to_string())
    }

    pub fn is_not_found(&self) -> bool {
        self.0 == "404"
    }
}

impl fmt::Display for PageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PageKey {
    fn from(key: &str) -> Self {
        PageKey(key.to_string())
    }
}

/// Structured form of a template path relative to the pages root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateName {
    /// `<base>.<ext>`: the locale-agnostic template of a page
    Default(PageKey),
    /// `<base>.<locale>.<ext>` with a configured locale
    Override(PageKey, Locale),
    /// `<base>.<xx>.<ext>` where `xx` looks like a locale but is not configured
    UnsupportedLocale(PageKey, String),
}

impl TemplateName {
    /// Parse a path relative to the pages root.
    ///
    /// Returns `None` when the file does not carry `extension` or the path
    /// cannot be expressed as a page key (non-UTF-8, `..`, empty stem).
    pub fn parse(relative: &Path, extension: &str, locales: &LocaleSet) -> Option<Self> {
        let mut segments = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(part) => segments.push(part.to_str()?),
                Component::CurDir => {}
                _ => return None,
            }
        }
        let file_name = segments.pop()?;
        let stem = file_name.strip_suffix(extension)?.strip_suffix('.')?;
        if stem.is_empty() {
            return None;
        }

        let join = |base: &str| {
            let mut key = segments.join("/");
            if !key.is_empty() {
                key.push('/');
            }
            key.push_str(base);
            PageKey(key)
        };

        if let Some((base, suffix)) = stem.rsplit_once('.')
            && !base.is_empty()
            && is_locale_code(suffix)
        {
            return Some(match locales.get(suffix) {
                Some(locale) => TemplateName::Override(join(base), locale.clone()),
                None => TemplateName::UnsupportedLocale(join(base), suffix.to_string()),
            });
        }

        Some(TemplateName::Default(join(stem)))
    }

    pub fn page_key(&self) -> &PageKey {
        match self {
            TemplateName::Default(key)
            | TemplateName::Override(key, _)
            | TemplateName::UnsupportedLocale(key, _) => key,
        }
    }
}

use multilocale_core::{Locale, LocaleSet, PageKey, TemplateName};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A template file on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateRef {
    /// Template name relative to the pages root, `/`-separated
    pub id: String,
    pub path: PathBuf,
}

/// All templates that can serve one page key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageVariantSet {
    pub key: PageKey,
    pub default: Option<TemplateRef>,
    pub overrides: BTreeMap<Locale, TemplateRef>,
}

impl PageVariantSet {
    pub fn new(key: PageKey) -> Self {
        Self {
            key,
            default: None,
            overrides: BTreeMap::new(),
        }
    }

    /// The locale override if present, else the default template
    pub fn template_for(&self, locale: &Locale) -> Option<&TemplateRef> {
        self.overrides.get(locale).or(self.default.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.default.is_none() && self.overrides.is_empty()
    }
}

/// Discovered pages, keyed and ordered by page key
#[derive(Debug, Clone, Default)]
pub struct PageGraph {
    pages: BTreeMap<PageKey, PageVariantSet>,
}

impl PageGraph {
    /// Scan `root` recursively for templates with `extension`.
    pub fn discover(root: &Path, extension: &str, locales: &LocaleSet) -> Self {
        Self::scan(root, extension, locales, |_| true)
    }

    /// Scan `root` but keep only the templates of `key`.
    pub fn discover_key(root: &Path, extension: &str, locales: &LocaleSet, key: &PageKey) -> Self {
        Self::scan(root, extension, locales, |candidate| candidate == key)
    }

    fn scan(
        root: &Path,
        extension: &str,
        locales: &LocaleSet,
        keep: impl Fn(&PageKey) -> bool,
    ) -> Self {
        let mut graph = PageGraph::default();
        if !root.is_dir() {
            tracing::warn!(path = %root.display(), "Pages directory does not exist");
            return graph;
        }

        for entry in WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(root) else {
                continue;
            };
            let Some(name) = TemplateName::parse(relative, extension, locales) else {
                continue;
            };
            if !keep(name.page_key()) {
                continue;
            }
            graph.insert(name, relative, entry.path());
        }

        graph
    }

    fn insert(&mut self, name: TemplateName, relative: &Path, path: &Path) {
        let template = TemplateRef {
            id: template_id(relative),
            path: path.to_path_buf(),
        };
        match name {
            TemplateName::Default(key) => {
                let set = self
                    .pages
                    .entry(key.clone())
                    .or_insert_with(|| PageVariantSet::new(key));
                set.default = Some(template);
            }
            TemplateName::Override(key, locale) => {
                let set = self
                    .pages
                    .entry(key.clone())
                    .or_insert_with(|| PageVariantSet::new(key));
                set.overrides.insert(locale, template);
            }
            TemplateName::UnsupportedLocale(key, code) => {
                tracing::warn!(
                    page = %key,
                    locale = %code,
                    path = %path.display(),
                    "Ignoring override for a locale that is not configured"
                );
            }
        }
    }

    pub fn get(&self, key: &PageKey) -> Option<&PageVariantSet> {
        self.pages.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PageVariantSet> {
        self.pages.values()
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

fn template_id(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

use crate::types::{Locale, LocaleSet};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Per-locale translation trees, read from `<data>/<locale>.json`.
#[derive(Debug, Clone, Default)]
pub struct LocaleDataStore {
    trees: HashMap<Locale, Value>,
}

impl LocaleDataStore {
    /// Read one document per configured locale. A missing or malformed
    /// document leaves that locale with an empty tree.
    pub fn load(dir: &Path, locales: &LocaleSet) -> Self {
        let mut trees = HashMap::new();
        for locale in locales.iter() {
            let path = dir.join(format!("{}.json", locale));
            let tree = match fs::read_to_string(&path) {
                Ok(content) => match serde_json::from_str::<Value>(&content) {
                    Ok(value) if value.is_object() => value,
                    Ok(_) => {
                        tracing::warn!(locale = %locale, path = %path.display(), "Locale data is not an object; using empty dictionary");
                        empty_tree()
                    }
                    Err(e) => {
                        tracing::warn!(locale = %locale, path = %path.display(), error = %e, "Malformed locale data; using empty dictionary");
                        empty_tree()
                    }
                },
                Err(e) => {
                    tracing::warn!(locale = %locale, path = %path.display(), error = %e, "Could not load locale data; using empty dictionary");
                    empty_tree()
                }
            };
            trees.insert(locale.clone(), tree);
        }
        Self { trees }
    }

    /// Build a store from in-memory trees (useful for testing)
    pub fn from_trees(trees: impl IntoIterator<Item = (Locale, Value)>) -> Self {
        Self {
            trees: trees.into_iter().collect(),
        }
    }

    /// The raw tree of `locale`; unknown locales get an empty object.
    pub fn tree(&self, locale: &Locale) -> &Value {
        static EMPTY: std::sync::LazyLock<Value> = std::sync::LazyLock::new(empty_tree);
        self.trees.get(locale).unwrap_or(&*EMPTY)
    }

    /// Walk a dotted key through the tree of `locale`. Only scalar leaves
    /// resolve; objects and arrays count as absent.
    pub fn lookup(&self, locale: &Locale, dotted_key: &str) -> Option<String> {
        let mut node = self.trees.get(locale)?;
        for segment in dotted_key.split('.') {
            node = node.as_object()?.get(segment)?;
        }
        match node {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Whether locale data declares right-to-left direction (`meta.dir = "rtl"`).
    pub fn declares_rtl(&self, locale: &Locale) -> bool {
        self.lookup(locale, "meta.dir").as_deref() == Some("rtl")
    }

    pub fn is_empty(&self, locale: &Locale) -> bool {
        self.trees
            .get(locale)
            .and_then(Value::as_object)
            .is_none_or(|map| map.is_empty())
    }
}

fn empty_tree() -> Value {
    Value::Object(serde_json::Map::new())
}

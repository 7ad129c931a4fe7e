use crate::locale_data::LocaleDataStore;
use crate::types::Locale;
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::fmt::Display;
use std::sync::{Arc, LazyLock};

#[derive(Debug, Clone)]
pub struct Translator {
    store: Arc<LocaleDataStore>,
    locale: Locale,
    default_locale: Locale,
}

impl Translator {
    pub fn new(store: Arc<LocaleDataStore>, locale: Locale, default_locale: Locale) -> Self {
        Self {
            store,
            locale,
            default_locale,
        }
    }

    pub fn locale(&self) -> &Locale {
        &self.locale
    }

    /// Resolve `key` in the current locale, then the default locale.
    pub fn lookup(&self, key: &str) -> Option<String> {
        self.store
            .lookup(&self.locale, key)
            .or_else(|| self.store.lookup(&self.default_locale, key))
    }

    /// Resolve `key`, falling back to the key itself when nothing matches.
    pub fn translate(&self, key: &str) -> String {
        self.lookup(key).unwrap_or_else(|| key.to_string())
    }

    /// Resolve `key` and replace each `{{name}}` placeholder with its parameter.
    /// Placeholders without a parameter stay as written.
    pub fn translate_with<I, K, V>(&self, key: &str, params: I) -> String
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Display,
    {
        interpolate(self.translate(key), params)
    }
}

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([^{}]+)\}\}").unwrap());

/// Replace every `{{name}}` in `template` with the matching parameter, in a
/// single pass. Text coming from a parameter value is never expanded again.
pub fn interpolate<I, K, V>(template: String, params: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Display,
{
    let params: HashMap<String, String> = params
        .into_iter()
        .map(|(name, value)| (name.as_ref().to_string(), value.to_string()))
        .collect();
    if params.is_empty() {
        return template;
    }
    PLACEHOLDER
        .replace_all(&template, |caps: &Captures| match params.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

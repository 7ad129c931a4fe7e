use crate::context::RenderContext;
use crate::html::html_escape;
use minijinja::value::{Value, ValueKind};
use minijinja::{AutoEscape, Environment, ErrorKind, Output, State, escape_formatter};
use std::fmt::Write as _;
use multilocale_core::SiteConfig;
use std::fs;
use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("template '{id}' failed: {message}")]
    Template { id: String, message: String },

    #[error("minification failed: {0}")]
    Minify(String),
}

/// Renders a named template against a [`RenderContext`].
pub trait TemplateEngine {
    fn render(&self, template_id: &str, context: &RenderContext) -> Result<String, RenderError>;

    /// Forget cached templates so edits on disk are picked up.
    fn reset(&mut self) {}
}

/// Jinja-style templates loaded from the pages, layouts and partials
/// directories, in that order. Output is always HTML-escaped.
pub struct MinijinjaEngine {
    env: Environment<'static>,
}

impl MinijinjaEngine {
    pub fn new(search_roots: Vec<PathBuf>) -> Self {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::Html);
        env.set_formatter(format_value);
        env.set_loader(move |name: &str| {
            if name.split('/').any(|segment| segment == "..") {
                return Ok(None);
            }
            for root in &search_roots {
                let path = root.join(name);
                match fs::read_to_string(&path) {
                    Ok(source) => return Ok(Some(source)),
                    Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                    Err(e) => {
                        return Err(minijinja::Error::new(
                            ErrorKind::InvalidOperation,
                            format!("could not read template {}", path.display()),
                        )
                        .with_source(e));
                    }
                }
            }
            Ok(None)
        });
        Self { env }
    }

    pub fn for_site(config: &SiteConfig) -> Self {
        Self::new(vec![
            config.paths.pages.clone(),
            config.paths.layouts.clone(),
            config.paths.partials.clone(),
        ])
    }
}

impl TemplateEngine for MinijinjaEngine {
    fn render(&self, template_id: &str, context: &RenderContext) -> Result<String, RenderError> {
        let failed = |e: minijinja::Error| RenderError::Template {
            id: template_id.to_string(),
            message: e.to_string(),
        };
        let template = self.env.get_template(template_id).map_err(failed)?;
        template.render(context_value(context)).map_err(failed)
    }

    fn reset(&mut self) {
        self.env.clear_templates();
    }
}

/// Auto-escaping that leaves `/` alone so printed URLs stay literal.
fn format_value(out: &mut Output, state: &State, value: &Value) -> Result<(), minijinja::Error> {
    if matches!(state.auto_escape(), AutoEscape::Html)
        && !value.is_safe()
        && let Some(text) = value.as_str()
    {
        return out
            .write_str(&html_escape(text))
            .map_err(|_| minijinja::Error::from(ErrorKind::WriteFailure));
    }
    escape_formatter(out, state, value)
}

fn context_value(ctx: &RenderContext) -> Value {
    let translator = ctx.translator.clone();
    let t = Value::from_function(move |key: String, params: Option<Value>| -> String {
        match params {
            Some(params) => translator.translate_with(&key, string_params(&params)),
            None => translator.translate(&key),
        }
    });

    let urls = ctx.urls.clone();
    let localized_url = Value::from_function(move |target: String, locale: Option<String>| -> String {
        urls.localized_url(&target, locale.as_deref())
    });

    let urls = ctx.urls.clone();
    let route_for = Value::from_function(move |key: String| -> String { urls.route_for(&key) });

    let current = ctx.locale.clone();
    let is_current_locale =
        Value::from_function(move |code: String| -> bool { code == current.as_str() });

    let dir = if ctx.rtl { "rtl" } else { "ltr" };

    Value::from_iter([
        ("t", t),
        ("localizedUrl", localized_url),
        ("routeFor", route_for),
        ("isCurrentLocale", is_current_locale),
        ("data", Value::from_serialize(&ctx.data)),
        ("locale", Value::from(ctx.locale.as_str())),
        ("currentLocale", Value::from(ctx.locale.as_str())),
        ("defaultLocale", Value::from(ctx.default_locale.as_str())),
        ("locales", Value::from_serialize(&ctx.locales)),
        ("alternates", Value::from_serialize(&ctx.alternates)),
        ("navigation", Value::from_serialize(&ctx.navigation)),
        ("isRtl", Value::from(ctx.rtl)),
        ("dir", Value::from(dir)),
        ("assetHashes", Value::from_serialize(ctx.assets.hashes())),
        ("assets", Value::from_serialize(ctx.assets.urls())),
        ("pageKey", Value::from(ctx.page_key.as_str())),
        ("currentPage", Value::from(ctx.current_url.as_str())),
    ])
}

/// Flatten a template-side map into string parameters.
fn string_params(params: &Value) -> Vec<(String, String)> {
    if params.kind() != ValueKind::Map {
        return Vec::new();
    }
    let Ok(keys) = params.try_iter() else {
        return Vec::new();
    };
    keys.filter_map(|key| {
        let value = params.get_item(&key).ok()?;
        Some((key.to_string(), value.to_string()))
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetHashSet;
    use crate::context::{Alternate, UrlHelper};
    use multilocale_core::{Locale, LocaleDataStore, LocaleSet, PageKey, RouteTable, Translator};
    use serde_json::json;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn loc(code: &str) -> Locale {
        Locale::parse(code).unwrap()
    }

    fn context(locale: &str) -> RenderContext {
        let set = LocaleSet::new(vec![loc("en"), loc("fr")], loc("en")).unwrap();
        let routes = Arc::new(
            RouteTable::parse_str(
                r#"{"routes": {
                    "en": [{"key": "about", "path": "/en/about/", "title": "About"}],
                    "fr": [{"key": "about", "path": "/fr/a-propos/", "title": "À propos"}]
                }}"#,
                &set,
            )
            .unwrap(),
        );
        let store = Arc::new(LocaleDataStore::from_trees([
            (loc("en"), json!({"greet": "Hi {{name}}", "site": {"name": "Atlas & Co"}})),
            (loc("fr"), json!({"greet": "Salut {{name}}"})),
        ]));
        RenderContext {
            page_key: PageKey::new("about"),
            locale: loc(locale),
            default_locale: loc("en"),
            locales: set.as_slice().to_vec(),
            current_url: routes.resolve_path(&"about".into(), &loc(locale)).unwrap().to_string(),
            alternates: vec![Alternate {
                locale: loc("fr"),
                url: "/fr/a-propos/".into(),
                current: locale == "fr",
            }],
            navigation: vec![],
            rtl: false,
            assets: Arc::new(AssetHashSet::default()),
            data: store.tree(&loc(locale)).clone(),
            translator: Translator::new(store, loc(locale), loc("en")),
            urls: UrlHelper::new(routes, loc(locale)),
        }
    }

    fn engine_with(files: &[(&str, &str)]) -> (TempDir, MinijinjaEngine) {
        let dir = TempDir::new().unwrap();
        let pages = dir.path().join("pages");
        let layouts = dir.path().join("layouts");
        fs::create_dir_all(&pages).unwrap();
        fs::create_dir_all(&layouts).unwrap();
        for (name, body) in files {
            let root = if name.starts_with("layout") { &layouts } else { &pages };
            fs::write(root.join(name), body).unwrap();
        }
        let engine = MinijinjaEngine::new(vec![pages, layouts]);
        (dir, engine)
    }

    #[test]
    fn test_translator_and_params() {
        let (_dir, engine) = engine_with(&[(
            "about.njk",
            r#"{{ t("greet", {"name": "Ada"}) }}|{{ t("site.name") }}|{{ t("missing.key") }}"#,
        )]);
        assert_eq!(
            engine.render("about.njk", &context("fr")).unwrap(),
            "Salut Ada|Atlas &amp; Co|missing.key"
        );
    }

    #[test]
    fn test_route_helpers() {
        let (_dir, engine) = engine_with(&[(
            "about.njk",
            r#"{{ routeFor("about") }} {{ routeFor("nope") }} {{ localizedUrl("about", "en") }}"#,
        )]);
        assert_eq!(
            engine.render("about.njk", &context("fr")).unwrap(),
            "/fr/a-propos/ # /en/about/"
        );
    }

    #[test]
    fn test_context_fields() {
        let (_dir, engine) = engine_with(&[(
            "about.njk",
            "{{ locale }} {{ defaultLocale }} {{ dir }} {{ locales|join(',') }} {{ currentPage }} \
             {% for alt in alternates %}{{ alt.locale }}={{ alt.current }}{% endfor %} {{ isCurrentLocale('fr') }}",
        )]);
        assert_eq!(
            engine.render("about.njk", &context("fr")).unwrap(),
            "fr en ltr en,fr /fr/a-propos/ fr=true true"
        );
    }

    #[test]
    fn test_layouts_resolve_through_search_roots() {
        let (_dir, mut engine) = engine_with(&[
            ("layout.njk", "<main>{% block body %}{% endblock %}</main>"),
            ("about.njk", "{% extends \"layout.njk\" %}{% block body %}{{ data.greet }}{% endblock %}"),
        ]);
        engine.reset();
        assert_eq!(
            engine.render("about.njk", &context("en")).unwrap(),
            "<main>Hi {{name}}</main>"
        );
    }

    #[test]
    fn test_escaping_keeps_urls_literal() {
        let (_dir, engine) = engine_with(&[(
            "about.njk",
            r#"<a href="{{ routeFor('about') }}">{{ "<b>" }}</a>{{ "<i>"|safe }}"#,
        )]);
        assert_eq!(
            engine.render("about.njk", &context("en")).unwrap(),
            r#"<a href="/en/about/">&lt;b&gt;</a><i>"#
        );
    }

    #[test]
    fn test_missing_template_is_an_error() {
        let (_dir, engine) = engine_with(&[]);
        let err = engine.render("nope.njk", &context("en")).unwrap_err();
        assert!(err.to_string().contains("nope.njk"));
    }

    #[test]
    fn test_syntax_error_is_an_error() {
        let (_dir, engine) = engine_with(&[("about.njk", "{% if %}")]);
        assert!(matches!(
            engine.render("about.njk", &context("en")),
            Err(RenderError::Template { .. })
        ));
    }
}

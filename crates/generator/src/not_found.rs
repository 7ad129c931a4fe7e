use crate::html::html_escape;
use multilocale_core::{Locale, PageKey, RouteTable, Translator};
use std::path::{Path, PathBuf};

/// Where the 404 page of `locale` goes: next to the locale's index output,
/// or `<locale>/404.html` when the locale has no index route.
pub fn not_found_file(routes: &RouteTable, locale: &Locale) -> PathBuf {
    routes
        .resolve_path(&PageKey::index(), locale)
        .map(|home| routes.output_file(home))
        .and_then(|index| index.parent().map(|dir| dir.join("404.html")))
        .unwrap_or_else(|| PathBuf::from(locale.as_str()).join("404.html"))
}

/// Public URL of a 404 output file
pub fn not_found_url(file: &Path) -> String {
    let segments: Vec<String> = file
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    format!("/{}", segments.join("/"))
}

/// Minimal page used when the site has no 404 template.
pub fn fallback_page(translator: &Translator, home: &str, rtl: bool) -> String {
    let text = |key: &str, default: &str| html_escape(&translator.lookup(key).unwrap_or_else(|| default.to_string()));
    format!(
        r#"<!DOCTYPE html>
<html lang="{lang}" dir="{dir}">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{title}</title>
</head>
<body>
  <main>
    <h1>{title}</h1>
    <p>{message}</p>
    <p><a href="{home}">{link}</a></p>
  </main>
</body>
</html>
"#,
        lang = translator.locale(),
        dir = if rtl { "rtl" } else { "ltr" },
        title = text("notFound.title", "Page not found"),
        message = text("notFound.message", "The page you are looking for does not exist."),
        link = text("notFound.home", "Go to the home page"),
        home = html_escape(home),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use multilocale_core::{LocaleDataStore, LocaleSet};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;

    fn loc(code: &str) -> Locale {
        Locale::parse(code).unwrap()
    }

    fn routes() -> RouteTable {
        let set = LocaleSet::new(vec![loc("en"), loc("fr"), loc("de")], loc("en")).unwrap();
        RouteTable::parse_str(
            r#"{"routes": {
                "en": [{"key": "index", "path": "/en/", "title": "Home"}],
                "fr": [{"key": "index", "path": "/fr/accueil/", "title": "Accueil"}]
            }}"#,
            &set,
        )
        .unwrap()
    }

    #[test]
    fn test_not_found_file_follows_index_route() {
        let routes = routes();
        assert_eq!(not_found_file(&routes, &loc("en")), PathBuf::from("en/404.html"));
        assert_eq!(not_found_file(&routes, &loc("fr")), PathBuf::from("fr/404.html"));
        assert_eq!(not_found_file(&routes, &loc("de")), PathBuf::from("de/404.html"));
    }

    #[test]
    fn test_not_found_url() {
        assert_eq!(not_found_url(Path::new("fr/404.html")), "/fr/404.html");
    }

    #[test]
    fn test_fallback_uses_translations_with_defaults() {
        let store = Arc::new(LocaleDataStore::from_trees([
            (loc("en"), json!({})),
            (loc("fr"), json!({"notFound": {"title": "Page introuvable"}})),
        ]));
        let fr = Translator::new(store, loc("fr"), loc("en"));
        let html = fallback_page(&fr, "/fr/accueil/", false);
        assert!(html.contains("<title>Page introuvable</title>"));
        assert!(html.contains(r#"<a href="/fr/accueil/">Go to the home page</a>"#));
        assert!(html.contains(r#"<html lang="fr" dir="ltr">"#));
    }
}

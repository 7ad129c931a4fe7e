// Locale safety net for root-relative links

use multilocale_core::{ASSETS_URL_PREFIX, Locale, PageKey, RouteTable, is_locale_code};
use regex::{Captures, Regex};
use std::sync::LazyLock;

/// An opening tag; quoted values may contain `>`
static TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<[a-zA-Z][^\s/>]*(?:[^>"']|"[^"]*"|'[^']*')*>"#).unwrap()
});

/// One quoted attribute inside a tag, so values are consumed whole
static ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(\s)([^\s"'=<>/]+)(\s*=\s*)(?:"([^"]*)"|'([^']*)')"#).unwrap()
});

/// Rewrite `href` and `src` attributes of every tag in `html`. Text outside
/// tags is left alone.
pub fn rewrite_links(html: &str, routes: &RouteTable, locale: &Locale) -> String {
    TAG.replace_all(html, |tag: &Captures| rewrite_tag(&tag[0], routes, locale))
        .into_owned()
}

fn rewrite_tag(tag: &str, routes: &RouteTable, locale: &Locale) -> String {
    ATTR.replace_all(tag, |caps: &Captures| {
        let name = &caps[2];
        if !name.eq_ignore_ascii_case("href") && !name.eq_ignore_ascii_case("src") {
            return caps[0].to_string();
        }
        let (value, quote) = match (caps.get(4), caps.get(5)) {
            (Some(v), _) => (v.as_str(), '"'),
            (None, Some(v)) => (v.as_str(), '\''),
            (None, None) => return caps[0].to_string(),
        };
        match rewrite_url(value, routes, locale) {
            Some(url) => format!("{}{name}{}{quote}{url}{quote}", &caps[1], &caps[3]),
            None => caps[0].to_string(),
        }
    })
    .into_owned()
}

/// The localized form of `url`, or `None` when it must stay as written.
pub fn rewrite_url(url: &str, routes: &RouteTable, locale: &Locale) -> Option<String> {
    if !url.starts_with('/') || url.starts_with("//") || url.starts_with(ASSETS_URL_PREFIX) {
        return None;
    }

    let split = url.find(['?', '#']).unwrap_or(url.len());
    let (path, suffix) = url.split_at(split);

    let first_segment = path[1..].split('/').next().unwrap_or("");
    if is_locale_code(first_segment) && routes.locales().contains(first_segment) {
        return None;
    }

    let trimmed = path.trim_matches('/');
    let key = trimmed.strip_suffix(".html").unwrap_or(trimmed);
    let key = if key.is_empty() || key == "index" {
        PageKey::index()
    } else {
        PageKey::new(key)
    };

    Some(match routes.resolve_path(&key, locale) {
        Some(route) => format!("{route}{suffix}"),
        None => format!("/{locale}{path}{suffix}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use multilocale_core::LocaleSet;
    use pretty_assertions::assert_eq;

    fn loc(code: &str) -> Locale {
        Locale::parse(code).unwrap()
    }

    fn routes() -> RouteTable {
        let set = LocaleSet::new(vec![loc("en"), loc("fr")], loc("en")).unwrap();
        RouteTable::parse_str(
            r#"{"routes": {
                "en": [{"key": "index", "path": "/en/", "title": "Home"},
                       {"key": "about", "path": "/en/about/", "title": "About"}],
                "fr": [{"key": "index", "path": "/fr/", "title": "Accueil"},
                       {"key": "about", "path": "/fr/a-propos/", "title": "À propos"}]
            }}"#,
            &set,
        )
        .unwrap()
    }

    #[test]
    fn test_rewrites_page_keys_through_routes() {
        let routes = routes();
        let fr = loc("fr");
        assert_eq!(rewrite_url("/about", &routes, &fr).unwrap(), "/fr/a-propos/");
        assert_eq!(rewrite_url("/about.html", &routes, &fr).unwrap(), "/fr/a-propos/");
        assert_eq!(rewrite_url("/about/#team", &routes, &fr).unwrap(), "/fr/a-propos/#team");
        assert_eq!(rewrite_url("/", &routes, &fr).unwrap(), "/fr/");
    }

    #[test]
    fn test_prefixes_unknown_paths() {
        let routes = routes();
        assert_eq!(
            rewrite_url("/gallery/?page=2", &routes, &loc("fr")).unwrap(),
            "/fr/gallery/?page=2"
        );
    }

    #[test]
    fn test_leaves_other_urls_alone() {
        let routes = routes();
        let fr = loc("fr");
        for url in [
            "/en/about/",
            "/fr",
            "/assets/main.css",
            "//cdn.example.com/x.js",
            "https://example.com/",
            "about/",
            "#top",
            "mailto:hi@example.com",
        ] {
            assert_eq!(rewrite_url(url, &routes, &fr), None, "{url}");
        }
    }

    #[test]
    fn test_only_real_link_attributes_are_rewritten() {
        let html = r#"<img data-src="/lazy/x.png" src="/x.png"><p>Use href="/about" in templates</p><code>&lt;a href="/about"&gt;</code>"#;
        assert_eq!(
            rewrite_links(html, &routes(), &loc("fr")),
            r#"<img data-src="/lazy/x.png" src="/fr/x.png"><p>Use href="/about" in templates</p><code>&lt;a href="/about"&gt;</code>"#
        );
    }

    #[test]
    fn test_quoted_values_are_not_scanned() {
        let html = r#"<a title='see href="/about"' href="/about">A</a>"#;
        assert_eq!(
            rewrite_links(html, &routes(), &loc("fr")),
            r#"<a title='see href="/about"' href="/fr/a-propos/">A</a>"#
        );
    }

    #[test]
    fn test_rewrite_links_in_markup() {
        let html = r#"<a href="/about">A</a><img src='/img/x.png'><a HREF = "/en/">E</a><link href="/assets/a.css">"#;
        assert_eq!(
            rewrite_links(html, &routes(), &loc("fr")),
            r#"<a href="/fr/a-propos/">A</a><img src='/fr/img/x.png'><a HREF = "/en/">E</a><link href="/assets/a.css">"#
        );
    }
}

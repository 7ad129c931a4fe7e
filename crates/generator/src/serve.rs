// Dev server request routing

use multilocale_core::{ASSETS_URL_PREFIX, RouteTable};
use std::path::PathBuf;

/// Resolved target of a dev request. Paths are relative to the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DevRequest {
    Asset(PathBuf),
    RootRedirect,
    Page(PathBuf),
    Legacy(PathBuf),
    PassThrough,
}

pub fn route_request(path: &str, routes: &RouteTable) -> DevRequest {
    let path = path.split(['?', '#']).next().unwrap_or_default();

    if path.starts_with(ASSETS_URL_PREFIX) {
        return match safe_relative(path) {
            Some(file) => DevRequest::Asset(file),
            None => DevRequest::PassThrough,
        };
    }

    if path == "/" || path == "/index.html" {
        return DevRequest::RootRedirect;
    }

    if let Some(entry) = routes.find_by_url(path) {
        return DevRequest::Page(routes.output_file(&entry.path));
    }

    if let Some(file) = legacy_file(path, routes) {
        return DevRequest::Legacy(file);
    }

    DevRequest::PassThrough
}

/// `/xx/rest` → `xx/rest`, and `/xx` or `/xx/` → `xx/index.html`, for a
/// configured locale `xx`.
fn legacy_file(path: &str, routes: &RouteTable) -> Option<PathBuf> {
    let trimmed = path.trim_start_matches('/');
    let (code, rest) = trimmed.split_once('/').unwrap_or((trimmed, ""));
    if !routes.locales().contains(code) {
        return None;
    }
    let rest = rest.trim_end_matches('/');
    if rest.is_empty() {
        return Some(PathBuf::from(code).join("index.html"));
    }
    safe_relative(&format!("/{code}/{rest}"))
}

fn safe_relative(path: &str) -> Option<PathBuf> {
    let mut file = PathBuf::new();
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        if segment == ".." || segment == "." {
            return None;
        }
        file.push(segment);
    }
    Some(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use multilocale_core::{Locale, LocaleSet};
    use pretty_assertions::assert_eq;

    fn routes() -> RouteTable {
        let en = Locale::parse("en").unwrap();
        let fr = Locale::parse("fr").unwrap();
        let set = LocaleSet::new(vec![en.clone(), fr], en).unwrap();
        RouteTable::parse_str(
            r#"{"routes": {
                "en": [{"key": "index", "path": "/en/", "title": "Home"},
                       {"key": "about", "path": "/en/about/", "title": "About"}],
                "fr": [{"key": "about", "path": "/fr/a-propos/", "title": "À propos"}]
            }}"#,
            &set,
        )
        .unwrap()
    }

    #[test]
    fn test_assets_first() {
        assert_eq!(
            route_request("/assets/main.1a2b3c4d.css", &routes()),
            DevRequest::Asset(PathBuf::from("assets/main.1a2b3c4d.css"))
        );
        assert_eq!(route_request("/assets/../secret", &routes()), DevRequest::PassThrough);
    }

    #[test]
    fn test_root_redirect() {
        assert_eq!(route_request("/", &routes()), DevRequest::RootRedirect);
        assert_eq!(route_request("/index.html", &routes()), DevRequest::RootRedirect);
        assert_eq!(route_request("/?lang=fr", &routes()), DevRequest::RootRedirect);
    }

    #[test]
    fn test_routes_ignore_trailing_slash() {
        let routes = routes();
        assert_eq!(
            route_request("/fr/a-propos", &routes),
            DevRequest::Page(PathBuf::from("fr/a-propos.html"))
        );
        assert_eq!(
            route_request("/en/", &routes),
            DevRequest::Page(PathBuf::from("en/index.html"))
        );
    }

    #[test]
    fn test_legacy_locale_paths() {
        let routes = routes();
        assert_eq!(
            route_request("/fr/", &routes),
            DevRequest::Legacy(PathBuf::from("fr/index.html"))
        );
        assert_eq!(
            route_request("/fr/404.html", &routes),
            DevRequest::Legacy(PathBuf::from("fr/404.html"))
        );
        assert_eq!(route_request("/fr/../../etc", &routes), DevRequest::PassThrough);
    }

    #[test]
    fn test_everything_else_passes_through() {
        let routes = routes();
        assert_eq!(route_request("/sitemap-en.xml", &routes), DevRequest::PassThrough);
        assert_eq!(route_request("/de/about/", &routes), DevRequest::PassThrough);
    }
}

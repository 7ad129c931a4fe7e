use multilocale_core::{Locale, RouteEntry};
use std::borrow::Cow;

const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

pub const SITEMAP_INDEX_FILE: &str = "sitemap-index.xml";

pub fn sitemap_file_name(locale: &Locale) -> String {
    format!("sitemap-{locale}.xml")
}

/// One `<url>` per route of a locale, sorted by path.
pub fn locale_sitemap(base_url: &str, routes: &[RouteEntry]) -> String {
    let base_url = base_url.trim_end_matches('/');
    let mut paths: Vec<&str> = routes.iter().map(|entry| entry.path.as_str()).collect();
    paths.sort_unstable();
    paths.dedup();

    let mut xml = String::with_capacity(128 + paths.len() * 64);
    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str("<urlset xmlns=\"");
    xml.push_str(SITEMAP_NS);
    xml.push_str("\">\n");
    for path in paths {
        xml.push_str("  <url><loc>");
        xml.push_str(&escape_xml(&format!("{base_url}{path}")));
        xml.push_str("</loc></url>\n");
    }
    xml.push_str("</urlset>\n");
    xml
}

/// Index pointing at every locale sitemap, in configured locale order.
pub fn sitemap_index<'a>(base_url: &str, locales: impl IntoIterator<Item = &'a Locale>) -> String {
    let base_url = base_url.trim_end_matches('/');
    let mut xml = String::with_capacity(512);
    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str("<sitemapindex xmlns=\"");
    xml.push_str(SITEMAP_NS);
    xml.push_str("\">\n");
    for locale in locales {
        xml.push_str("  <sitemap><loc>");
        xml.push_str(&escape_xml(&format!("{base_url}/{}", sitemap_file_name(locale))));
        xml.push_str("</loc></sitemap>\n");
    }
    xml.push_str("</sitemapindex>\n");
    xml
}

fn escape_xml(s: &str) -> Cow<'_, str> {
    if !s.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(s);
    }

    Cow::Owned(
        s.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;")
            .replace('\'', "&apos;"),
    )
}

use anyhow::Result;
use multilocale_core::{LocaleDataStore, PageKey, RouteTable, SiteConfig};
use multilocale_generator::PageGraph;
use std::path::PathBuf;

use super::load_site;

/// Problems found while cross-checking pages, routes and locale data
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct Findings {
    /// (page, locale) pairs with a template but no route
    pub unrouted: Vec<(String, String)>,
    /// (page, locale) pairs with a route but no template
    pub untemplated: Vec<(String, String)>,
    /// Locales whose data file is missing or empty
    pub empty_locales: Vec<String>,
}

impl Findings {
    pub fn is_clean(&self) -> bool {
        self.unrouted.is_empty() && self.untemplated.is_empty() && self.empty_locales.is_empty()
    }
}

pub async fn run(path: PathBuf) -> Result<()> {
    println!("Validating site at: {}", path.display());

    let (_, config) = load_site(&path)?;
    println!("✓ site.toml valid");
    println!(
        "  Locales: {}",
        config
            .locales
            .iter()
            .map(|l| l.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let findings = check(&config);

    for (page, locale) in &findings.unrouted {
        println!("  ⚠ Page '{}' has no route for {}", page, locale);
    }
    for (page, locale) in &findings.untemplated {
        println!("  ⚠ Route '{}' in {} has no template", page, locale);
    }
    for locale in &findings.empty_locales {
        println!("  ⚠ No locale data for {}", locale);
    }

    if findings.is_clean() {
        println!("✓ Pages, routes and locale data are consistent");
    }

    Ok(())
}

pub(crate) fn check(config: &SiteConfig) -> Findings {
    let routes = RouteTable::load(&config.paths.routes, &config.locales);
    let data = LocaleDataStore::load(&config.paths.data, &config.locales);
    let graph = PageGraph::discover(
        &config.paths.pages,
        &config.build.template_extension,
        &config.locales,
    );

    let mut findings = Findings::default();
    for page in graph.iter().filter(|page| !page.key.is_not_found()) {
        for locale in config.locales.iter() {
            if page.template_for(locale).is_some() && routes.resolve_path(&page.key, locale).is_none() {
                findings
                    .unrouted
                    .push((page.key.to_string(), locale.to_string()));
            }
        }
    }

    for locale in config.locales.iter() {
        for entry in routes.all_routes_for(locale) {
            let renderable = graph
                .get(&entry.key)
                .is_some_and(|page| page.template_for(locale).is_some());
            if !renderable && entry.key != PageKey::not_found() {
                findings
                    .untemplated
                    .push((entry.key.to_string(), locale.to_string()));
            }
        }
        if data.is_empty(locale) {
            findings.empty_locales.push(locale.to_string());
        }
    }

    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use multilocale_core::config::parse_site_toml_str;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_check_reports_mismatches() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(src.join("pages")).unwrap();
        fs::create_dir_all(src.join("data")).unwrap();
        fs::write(src.join("pages/index.njk"), "home").unwrap();
        fs::write(src.join("pages/about.fr.njk"), "à propos").unwrap();
        fs::write(src.join("pages/404.njk"), "missing").unwrap();
        fs::write(src.join("data/en.json"), r#"{"title": "Hi"}"#).unwrap();
        fs::write(
            src.join("data/routes.json"),
            r#"{"routes": {
                "en": [{"key": "index", "path": "/en/", "title": "Home"},
                       {"key": "about", "path": "/en/about/", "title": "About"}],
                "fr": [{"key": "about", "path": "/fr/a-propos/", "title": "À propos"}]
            }}"#,
        )
        .unwrap();
        let config = parse_site_toml_str(
            r#"
[site]
base_url = "https://example.com"
default_locale = "en"
locales = ["en", "fr"]
"#,
            dir.path(),
        )
        .unwrap();

        let findings = check(&config);
        assert_eq!(
            findings,
            Findings {
                unrouted: vec![("index".into(), "fr".into())],
                untemplated: vec![("about".into(), "en".into())],
                empty_locales: vec!["fr".into()],
            }
        );
        assert!(!findings.is_clean());
    }
}

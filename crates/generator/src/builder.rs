use crate::assets::AssetPipeline;
use crate::engine::{MinijinjaEngine, TemplateEngine};
use crate::error::{Error, Result};
use crate::minify::{HtmlMinifier, Minifier};
use crate::not_found::{fallback_page, not_found_file, not_found_url};
use crate::pages::PageGraph;
use crate::redirect::root_redirect_page;
use crate::renderer::{BuildCycle, PageRenderer, RenderOutcome};
use crate::sitemap::{SITEMAP_INDEX_FILE, locale_sitemap, sitemap_file_name, sitemap_index};
use multilocale_core::{BuildMode, PageKey, SiteConfig};
use std::fs;
use std::path::Path;

/// Counts of what a build pass produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub written: usize,
    pub skipped: usize,
    pub failed: usize,
    /// One line per failed unit
    pub failures: Vec<String>,
}

impl BuildReport {
    pub fn record(&mut self, outcome: RenderOutcome) {
        match outcome {
            RenderOutcome::Written(_) => self.written += 1,
            RenderOutcome::Skipped(_) => self.skipped += 1,
            RenderOutcome::Failed(reason) => {
                self.failed += 1;
                self.failures.push(reason);
            }
        }
    }

    pub fn merge(&mut self, other: BuildReport) {
        self.written += other.written;
        self.skipped += other.skipped;
        self.failed += other.failed;
        self.failures.extend(other.failures);
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

pub struct SiteBuilder {
    config: SiteConfig,
    mode: BuildMode,
    engine: Box<dyn TemplateEngine + Send>,
    minifier: Box<dyn Minifier + Send>,
}

impl SiteBuilder {
    pub fn new(config: SiteConfig, mode: BuildMode) -> Self {
        let engine = MinijinjaEngine::for_site(&config);
        Self {
            config,
            mode,
            engine: Box::new(engine),
            minifier: Box::new(HtmlMinifier),
        }
    }

    /// Replace the template engine.
    pub fn with_engine(mut self, engine: impl TemplateEngine + Send + 'static) -> Self {
        self.engine = Box::new(engine);
        self
    }

    /// Replace the minifier.
    pub fn with_minifier(mut self, minifier: impl Minifier + Send + 'static) -> Self {
        self.minifier = Box::new(minifier);
        self
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn mode(&self) -> BuildMode {
        self.mode
    }

    /// Render every discovered page in every configured locale, then emit
    /// the redirect index, sitemaps and 404 pages.
    ///
    /// Pages are rendered in page-key order and, per page, in configured
    /// locale order. Only failing to create the output directory is an
    /// error; everything else is recorded in the report.
    pub fn build_all(&mut self) -> Result<BuildReport> {
        self.ensure_output_dir()?;

        let assets = AssetPipeline::new(&self.config, self.mode).run();
        let mut cycle = BuildCycle::load(&self.config, assets);
        self.engine.reset();

        let graph = PageGraph::discover(
            &self.config.paths.pages,
            &self.config.build.template_extension,
            &self.config.locales,
        );
        tracing::info!(pages = graph.len(), "Discovered pages");

        let mut report = self.render_pages(&graph, &cycle);

        cycle.reload(&self.config);
        report.record(self.emit_redirect(&cycle));
        if self.config.build.sitemap {
            report.merge(self.emit_sitemaps(&cycle));
        }
        if self.config.build.not_found {
            report.merge(self.emit_not_found(&graph, &cycle));
        }

        tracing::info!(
            written = report.written,
            skipped = report.skipped,
            failed = report.failed,
            "Build complete"
        );
        Ok(report)
    }

    /// Re-render one page key in every locale. The reserved 404 key re-emits
    /// the 404 pages instead.
    pub fn rebuild_page(&mut self, key: &PageKey) -> Result<BuildReport> {
        self.ensure_output_dir()?;

        let assets = AssetPipeline::new(&self.config, self.mode).plan();
        let cycle = BuildCycle::load(&self.config, assets);
        self.engine.reset();

        let graph = PageGraph::discover_key(
            &self.config.paths.pages,
            &self.config.build.template_extension,
            &self.config.locales,
            key,
        );

        let report = if key.is_not_found() {
            if self.config.build.not_found {
                self.emit_not_found(&graph, &cycle)
            } else {
                BuildReport::default()
            }
        } else {
            self.render_pages(&graph, &cycle)
        };

        tracing::info!(
            page = %key,
            written = report.written,
            skipped = report.skipped,
            failed = report.failed,
            "Rebuilt page"
        );
        Ok(report)
    }

    fn ensure_output_dir(&self) -> Result<()> {
        let output = &self.config.paths.output;
        fs::create_dir_all(output).map_err(|source| Error::OutputDir {
            path: output.clone(),
            source,
        })
    }

    fn renderer<'a>(&'a self, cycle: &'a BuildCycle) -> PageRenderer<'a> {
        PageRenderer::new(
            &self.config,
            self.mode,
            cycle,
            self.engine.as_ref(),
            self.minifier.as_ref(),
        )
    }

    fn render_pages(&self, graph: &PageGraph, cycle: &BuildCycle) -> BuildReport {
        let renderer = self.renderer(cycle);
        let mut report = BuildReport::default();
        for page in graph.iter().filter(|page| !page.key.is_not_found()) {
            for locale in self.config.locales.iter() {
                report.record(renderer.render_one(page, locale));
            }
        }
        report
    }

    fn emit_redirect(&self, cycle: &BuildCycle) -> RenderOutcome {
        let renderer = self.renderer(cycle);
        let html = root_redirect_page(&self.config.locales, &cycle.routes);
        match renderer.minify_if_production(html) {
            Ok(html) => renderer.write(Path::new("index.html"), &html),
            Err(e) => RenderOutcome::Failed(format!("index.html: {e}")),
        }
    }

    fn emit_sitemaps(&self, cycle: &BuildCycle) -> BuildReport {
        let renderer = self.renderer(cycle);
        let mut report = BuildReport::default();
        for locale in self.config.locales.iter() {
            let xml = locale_sitemap(&self.config.base_url, cycle.routes.all_routes_for(locale));
            report.record(renderer.write(Path::new(&sitemap_file_name(locale)), &xml));
        }
        let index = sitemap_index(&self.config.base_url, self.config.locales.iter());
        report.record(renderer.write(Path::new(SITEMAP_INDEX_FILE), &index));
        report
    }

    fn emit_not_found(&self, graph: &PageGraph, cycle: &BuildCycle) -> BuildReport {
        let renderer = self.renderer(cycle);
        let key = PageKey::not_found();
        let templates = graph.get(&key);
        let mut report = BuildReport::default();

        for locale in self.config.locales.iter() {
            let file = not_found_file(&cycle.routes, locale);
            let url = not_found_url(&file);
            let outcome = match templates.and_then(|set| set.template_for(locale)) {
                Some(template) => renderer.render_to(template, &key, locale, &url, &file),
                None => {
                    let context = renderer.context_for(&key, locale, &url);
                    let home = context.urls.localized_url(PageKey::index().as_str(), None);
                    let html = fallback_page(&context.translator, &home, context.rtl);
                    match renderer.minify_if_production(html) {
                        Ok(html) => renderer.write(&file, &html),
                        Err(e) => RenderOutcome::Failed(format!("{} [{locale}]: {e}", key)),
                    }
                }
            };
            report.record(outcome);
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::SkipReason;
    use multilocale_core::config::parse_site_toml_str;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;
    use std::path::PathBuf;
    use tempfile::TempDir;
    use walkdir::WalkDir;

    /// A site on disk with the given locales, routes and page templates.
    fn site(dir: &Path, locales: &[&str], routes: &str, pages: &[(&str, &str)]) -> SiteConfig {
        let list = locales
            .iter()
            .map(|l| format!("\"{l}\""))
            .collect::<Vec<_>>()
            .join(", ");
        let toml = format!(
            r#"
[site]
base_url = "https://example.com"
default_locale = "{}"
locales = [{list}]

[[assets]]
kind = "style"
source = "src/assets/main.css"
"#,
            locales[0]
        );
        let src = dir.join("src");
        for sub in ["pages", "layouts", "partials", "data", "assets"] {
            fs::create_dir_all(src.join(sub)).unwrap();
        }
        fs::write(src.join("assets/main.css"), "body { margin: 0 }").unwrap();
        fs::write(src.join("data/routes.json"), routes).unwrap();
        fs::write(src.join("data/en.json"), r#"{"greeting": "Hello"}"#).unwrap();
        fs::write(src.join("data/fr.json"), r#"{"greeting": "Bonjour"}"#).unwrap();
        for (name, body) in pages {
            let path = src.join("pages").join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, body).unwrap();
        }
        parse_site_toml_str(&toml, dir).unwrap()
    }

    const EN_FR_INDEX: &str = r#"{"routes": {
        "en": [{"key": "index", "path": "/en/", "title": "Home"}],
        "fr": [{"key": "index", "path": "/fr/", "title": "Accueil"}]
    }}"#;

    fn read(config: &SiteConfig, file: &str) -> String {
        fs::read_to_string(config.paths.output.join(file)).unwrap()
    }

    fn snapshot(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
        WalkDir::new(root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| {
                let relative = e.path().strip_prefix(root).unwrap().to_path_buf();
                (relative, fs::read(e.path()).unwrap())
            })
            .collect()
    }

    #[test]
    fn test_two_locale_site() {
        let dir = TempDir::new().unwrap();
        let config = site(
            dir.path(),
            &["en", "fr"],
            EN_FR_INDEX,
            &[("index.njk", "<h1>{{ t('greeting') }}</h1>")],
        );
        let mut builder = SiteBuilder::new(config.clone(), BuildMode::Development);
        let report = builder.build_all().unwrap();

        assert_eq!(read(&config, "en/index.html"), "<h1>Hello</h1>");
        assert_eq!(read(&config, "fr/index.html"), "<h1>Bonjour</h1>");

        for locale in ["en", "fr"] {
            let xml = read(&config, &format!("sitemap-{locale}.xml"));
            assert_eq!(xml.matches("<url>").count(), 1);
            assert!(xml.contains(&format!(
                "<url><loc>https://example.com/{locale}/</loc></url>"
            )));
        }
        assert!(read(&config, "sitemap-index.xml").contains("sitemap-fr.xml"));
        assert!(read(&config, "index.html").contains(r#"<a href="/en/">Continue to site</a>"#));
        assert!(read(&config, "fr/404.html").contains(r#"<a href="/fr/">"#));
        assert!(config.paths.output.join("assets/main.css").is_file());

        // 2 pages + redirect + 3 sitemap files + 2 404 pages
        assert_eq!(report.written, 8);
        assert_eq!(report.failed, 0);
    }

    #[test]
    fn test_override_only_page() {
        let dir = TempDir::new().unwrap();
        let routes = r#"{"routes": {
            "en": [{"key": "about", "path": "/en/about/", "title": "About"}],
            "fr": [{"key": "about", "path": "/fr/a-propos/", "title": "À propos"}]
        }}"#;
        let config = site(dir.path(), &["en", "fr"], routes, &[("about.fr.njk", "fr only")]);
        let report = SiteBuilder::new(config.clone(), BuildMode::Development)
            .build_all()
            .unwrap();

        assert_eq!(read(&config, "fr/a-propos.html"), "fr only");
        assert!(!config.paths.output.join("en/about.html").exists());
        assert_eq!(report.skipped, 1);
        assert_eq!(report.failed, 0);
    }

    #[test]
    fn test_missing_route_skips_only_that_unit() {
        let dir = TempDir::new().unwrap();
        let routes = r#"{"routes": {
            "en": [{"key": "index", "path": "/en/", "title": "Home"},
                   {"key": "contact", "path": "/en/contact/", "title": "Contact"}],
            "de": [{"key": "index", "path": "/de/", "title": "Start"}]
        }}"#;
        let config = site(
            dir.path(),
            &["en", "de"],
            routes,
            &[("contact.njk", "contact {{ locale }}"), ("index.njk", "home {{ locale }}")],
        );
        let report = SiteBuilder::new(config.clone(), BuildMode::Development)
            .build_all()
            .unwrap();

        assert_eq!(read(&config, "en/contact.html"), "contact en");
        assert_eq!(read(&config, "de/index.html"), "home de");
        assert!(!config.paths.output.join("de/contact.html").exists());
        assert_eq!(report.skipped, 1);
    }

    #[test]
    fn test_override_takes_precedence() {
        let dir = TempDir::new().unwrap();
        let config = site(
            dir.path(),
            &["en", "fr", "de"],
            r#"{"routes": {
                "en": [{"key": "index", "path": "/en/", "title": "Home"}],
                "fr": [{"key": "index", "path": "/fr/", "title": "Accueil"}],
                "de": [{"key": "index", "path": "/de/", "title": "Start"}]
            }}"#,
            &[("index.njk", "default"), ("index.fr.njk", "override")],
        );
        SiteBuilder::new(config.clone(), BuildMode::Development)
            .build_all()
            .unwrap();

        assert_eq!(read(&config, "en/index.html"), "default");
        assert_eq!(read(&config, "fr/index.html"), "override");
        assert_eq!(read(&config, "de/index.html"), "default");
    }

    #[test]
    fn test_repeated_builds_are_identical() {
        let dir = TempDir::new().unwrap();
        let config = site(
            dir.path(),
            &["en", "fr"],
            EN_FR_INDEX,
            &[(
                "index.njk",
                "<html>\n  <head><link rel=\"stylesheet\" href=\"{{ assets.style }}\"></head>\n  <body>{{ t('greeting') }}</body>\n</html>",
            )],
        );
        let mut builder = SiteBuilder::new(config.clone(), BuildMode::Production);
        builder.build_all().unwrap();
        let first = snapshot(&config.paths.output);
        builder.build_all().unwrap();
        let second = snapshot(&config.paths.output);

        assert_eq!(first, second);
        let html = read(&config, "en/index.html");
        assert!(html.contains("/assets/main."));
        assert!(!html.contains('\n'));
    }

    #[test]
    fn test_rtl_locale() {
        let dir = TempDir::new().unwrap();
        let config = site(
            dir.path(),
            &["en", "ar"],
            r#"{"routes": {
                "en": [{"key": "index", "path": "/en/", "title": "Home"}],
                "ar": [{"key": "index", "path": "/ar/", "title": "Home"}]
            }}"#,
            &[("index.njk", "{{ dir }}")],
        );
        SiteBuilder::new(config.clone(), BuildMode::Development)
            .build_all()
            .unwrap();

        assert_eq!(read(&config, "en/index.html"), "ltr");
        assert_eq!(read(&config, "ar/index.html"), "rtl");
    }

    #[test]
    fn test_render_failure_does_not_abort() {
        let dir = TempDir::new().unwrap();
        let routes = r#"{"routes": {
            "en": [{"key": "index", "path": "/en/", "title": "Home"},
                   {"key": "broken", "path": "/en/broken/", "title": "Broken"}]
        }}"#;
        let config = site(
            dir.path(),
            &["en"],
            routes,
            &[("broken.njk", "{% if %}"), ("index.njk", "ok")],
        );
        let report = SiteBuilder::new(config.clone(), BuildMode::Development)
            .build_all()
            .unwrap();

        assert_eq!(read(&config, "en/index.html"), "ok");
        assert_eq!(report.failed, 1);
        assert!(report.failures[0].contains("broken"));
        assert!(report.has_failures());
    }

    #[test]
    fn test_not_found_templates() {
        let dir = TempDir::new().unwrap();
        let config = site(
            dir.path(),
            &["en", "fr"],
            EN_FR_INDEX,
            &[
                ("index.njk", "home"),
                ("404.njk", "missing {{ locale }} {{ routeFor('index') }}"),
                ("404.fr.njk", "introuvable"),
            ],
        );
        SiteBuilder::new(config.clone(), BuildMode::Development)
            .build_all()
            .unwrap();

        assert_eq!(read(&config, "en/404.html"), "missing en /en/");
        assert_eq!(read(&config, "fr/404.html"), "introuvable");
        // the reserved key is not a regular page
        assert!(!config.paths.output.join("404.html").exists());
    }

    #[test]
    fn test_disabled_outputs() {
        let dir = TempDir::new().unwrap();
        let mut config = site(dir.path(), &["en", "fr"], EN_FR_INDEX, &[("index.njk", "home")]);
        config.build.sitemap = false;
        config.build.not_found = false;
        SiteBuilder::new(config.clone(), BuildMode::Development)
            .build_all()
            .unwrap();

        assert!(!config.paths.output.join("sitemap-en.xml").exists());
        assert!(!config.paths.output.join("en/404.html").exists());
        assert!(config.paths.output.join("index.html").exists());
    }

    #[test]
    fn test_missing_routes_file_skips_everything() {
        let dir = TempDir::new().unwrap();
        let config = site(dir.path(), &["en"], "not json", &[("index.njk", "home")]);
        let report = SiteBuilder::new(config.clone(), BuildMode::Development)
            .build_all()
            .unwrap();

        assert_eq!(report.failed, 0);
        assert!(!config.paths.output.join("en/index.html").exists());
        assert!(config.paths.output.join("index.html").exists());
    }

    #[test]
    fn test_unwritable_output_dir_is_fatal() {
        let dir = TempDir::new().unwrap();
        let mut config = site(dir.path(), &["en"], EN_FR_INDEX, &[]);
        fs::write(dir.path().join("blocker"), "").unwrap();
        config.paths.output = dir.path().join("blocker/dist");

        let err = SiteBuilder::new(config, BuildMode::Development)
            .build_all()
            .unwrap_err();
        assert!(matches!(err, Error::OutputDir { .. }));
    }

    #[test]
    fn test_rebuild_page_is_scoped() {
        let dir = TempDir::new().unwrap();
        let routes = r#"{"routes": {
            "en": [{"key": "index", "path": "/en/", "title": "Home"},
                   {"key": "about", "path": "/en/about/", "title": "About"}]
        }}"#;
        let config = site(
            dir.path(),
            &["en"],
            routes,
            &[("index.njk", "home v1"), ("about.njk", "about v1")],
        );
        let mut builder = SiteBuilder::new(config.clone(), BuildMode::Development);
        builder.build_all().unwrap();

        fs::write(config.paths.pages.join("index.njk"), "home v2").unwrap();
        fs::write(config.paths.pages.join("about.njk"), "about v2").unwrap();
        let report = builder.rebuild_page(&PageKey::new("about")).unwrap();

        assert_eq!(report.written, 1);
        assert_eq!(read(&config, "en/about.html"), "about v2");
        assert_eq!(read(&config, "en/index.html"), "home v1");
    }

    #[test]
    fn test_report_merge() {
        let mut a = BuildReport::default();
        a.record(RenderOutcome::Written(PathBuf::from("a.html")));
        let mut b = BuildReport::default();
        b.record(RenderOutcome::Skipped(SkipReason::NoRoute));
        b.record(RenderOutcome::Failed("x".into()));
        a.merge(b);
        assert_eq!(
            a,
            BuildReport {
                written: 1,
                skipped: 1,
                failed: 1,
                failures: vec!["x".into()],
            }
        );
    }
}

use crate::assets::AssetHashSet;
use crate::context::{Alternate, NavEntry, RenderContext, UrlHelper};
use crate::engine::{RenderError, TemplateEngine};
use crate::links::rewrite_links;
use crate::minify::{Minifier, MinifyOptions};
use crate::pages::{PageVariantSet, TemplateRef};
use multilocale_core::{
    BuildMode, LinkRewrite, Locale, LocaleDataStore, PageKey, RouteTable, SiteConfig, Translator,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Inputs loaded once per build cycle and shared by every render.
#[derive(Debug, Clone)]
pub struct BuildCycle {
    pub routes: Arc<RouteTable>,
    pub locale_data: Arc<LocaleDataStore>,
    pub assets: Arc<AssetHashSet>,
}

impl BuildCycle {
    pub fn load(config: &SiteConfig, assets: AssetHashSet) -> Self {
        Self {
            routes: Arc::new(RouteTable::load(&config.paths.routes, &config.locales)),
            locale_data: Arc::new(LocaleDataStore::load(&config.paths.data, &config.locales)),
            assets: Arc::new(assets),
        }
    }

    /// Re-read routes and locale data from disk, keeping the asset hashes.
    pub fn reload(&mut self, config: &SiteConfig) {
        self.routes = Arc::new(RouteTable::load(&config.paths.routes, &config.locales));
        self.locale_data = Arc::new(LocaleDataStore::load(&config.paths.data, &config.locales));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoRoute,
    NoTemplate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    /// Output file, relative to the output directory
    Written(PathBuf),
    Skipped(SkipReason),
    Failed(String),
}

pub struct PageRenderer<'a> {
    config: &'a SiteConfig,
    mode: BuildMode,
    cycle: &'a BuildCycle,
    engine: &'a dyn TemplateEngine,
    minifier: &'a dyn Minifier,
}

impl<'a> PageRenderer<'a> {
    pub fn new(
        config: &'a SiteConfig,
        mode: BuildMode,
        cycle: &'a BuildCycle,
        engine: &'a dyn TemplateEngine,
        minifier: &'a dyn Minifier,
    ) -> Self {
        Self {
            config,
            mode,
            cycle,
            engine,
            minifier,
        }
    }

    /// Render `page` for `locale` and write it to its routed output file.
    pub fn render_one(&self, page: &PageVariantSet, locale: &Locale) -> RenderOutcome {
        let Some(url) = self.cycle.routes.resolve_path(&page.key, locale) else {
            tracing::warn!(page = %page.key, locale = %locale, "No route; skipping");
            return RenderOutcome::Skipped(SkipReason::NoRoute);
        };
        let Some(template) = page.template_for(locale) else {
            tracing::warn!(page = %page.key, locale = %locale, "No template; skipping");
            return RenderOutcome::Skipped(SkipReason::NoTemplate);
        };

        let relative = self.cycle.routes.output_file(url);
        self.render_to(template, &page.key, locale, url, &relative)
    }

    /// Render `template` as `key` in `locale` and write it to `relative`.
    pub fn render_to(
        &self,
        template: &TemplateRef,
        key: &PageKey,
        locale: &Locale,
        url: &str,
        relative: &Path,
    ) -> RenderOutcome {
        let context = self.context_for(key, locale, url);
        match self.render_markup(&template.id, &context) {
            Ok(html) => self.write(relative, &html),
            Err(e) => {
                tracing::error!(page = %key, locale = %locale, template = %template.id, error = %e, "Render failed");
                RenderOutcome::Failed(format!("{key} [{locale}]: {e}"))
            }
        }
    }

    pub fn context_for(&self, key: &PageKey, locale: &Locale, url: &str) -> RenderContext {
        let routes = &self.cycle.routes;
        let store = &self.cycle.locale_data;
        let default_locale = self.config.locales.default_locale().clone();

        let alternates = routes
            .all_paths_for(key)
            .into_iter()
            .map(|(alt, url)| Alternate {
                current: &alt == locale,
                locale: alt,
                url,
            })
            .collect();

        let navigation = routes
            .all_routes_for(locale)
            .iter()
            .map(|entry| NavEntry {
                key: entry.key.clone(),
                title: entry.title.clone(),
                url: entry.path.clone(),
                active: &entry.key == key,
            })
            .collect();

        RenderContext {
            page_key: key.clone(),
            locale: locale.clone(),
            default_locale: default_locale.clone(),
            locales: self.config.locales.as_slice().to_vec(),
            current_url: url.to_string(),
            alternates,
            navigation,
            rtl: self.config.is_rtl_locale(locale) || store.declares_rtl(locale),
            assets: Arc::clone(&self.cycle.assets),
            data: store.tree(locale).clone(),
            translator: Translator::new(Arc::clone(store), locale.clone(), default_locale),
            urls: UrlHelper::new(Arc::clone(routes), locale.clone()),
        }
    }

    /// Render, apply the link safety net, then minify in production.
    pub fn render_markup(&self, template_id: &str, context: &RenderContext) -> Result<String, RenderError> {
        let mut html = self.engine.render(template_id, context)?;
        if self.config.build.link_rewrite == LinkRewrite::SafetyNet {
            html = rewrite_links(&html, &self.cycle.routes, &context.locale);
        }
        self.minify_if_production(html)
    }

    pub fn minify_if_production(&self, html: String) -> Result<String, RenderError> {
        if self.mode.is_production() {
            self.minifier.minify(&html, &MinifyOptions::default())
        } else {
            Ok(html)
        }
    }

    /// Write `html` under the output directory, creating parent directories.
    pub fn write(&self, relative: &Path, html: &str) -> RenderOutcome {
        let target = self.config.paths.output.join(relative);
        let result = match target.parent() {
            Some(parent) => fs::create_dir_all(parent).and_then(|_| fs::write(&target, html)),
            None => fs::write(&target, html),
        };
        match result {
            Ok(()) => {
                tracing::debug!(path = %target.display(), "Wrote page");
                RenderOutcome::Written(relative.to_path_buf())
            }
            Err(e) => {
                tracing::error!(path = %target.display(), error = %e, "Failed to write output");
                RenderOutcome::Failed(format!("{}: {e}", target.display()))
            }
        }
    }
}

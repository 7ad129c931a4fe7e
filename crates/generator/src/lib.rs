// Localized static site generation: page discovery, rendering, sitemaps,
// 404 pages and incremental rebuilds.

pub mod assets;
pub mod builder;
pub mod context;
pub mod engine;
pub mod error;
mod html;
pub mod incremental;
pub mod links;
pub mod minify;
pub mod not_found;
pub mod pages;
pub mod redirect;
pub mod renderer;
pub mod serve;
pub mod sitemap;

pub use assets::{AssetHashSet, AssetPipeline};
pub use builder::{BuildReport, SiteBuilder};
pub use context::{Alternate, NavEntry, RenderContext, UrlHelper};
pub use engine::{MinijinjaEngine, RenderError, TemplateEngine};
pub use error::{Error, Result};
pub use incremental::{
    ChangeKind, IncrementalRebuilder, RebuildAction, RebuildScope, ReloadSignal, SourceChange,
    StalenessLedger, watched_roots,
};
pub use minify::{HtmlMinifier, MinifyOptions, Minifier};
pub use pages::{PageGraph, PageVariantSet, TemplateRef};
pub use redirect::PREFERENCE_KEY;
pub use renderer::{BuildCycle, PageRenderer, RenderOutcome, SkipReason};
pub use serve::{DevRequest, route_request};

// Page template edits rebuild one key; shared sources rebuild the site

use crate::builder::{BuildReport, SiteBuilder};
use crate::error::Result;
use multilocale_core::{PageKey, SiteConfig, TemplateName};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Modified,
    Removed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceChange {
    pub path: PathBuf,
    pub kind: ChangeKind,
}

impl SourceChange {
    pub fn new(path: impl Into<PathBuf>, kind: ChangeKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RebuildScope {
    Page(PageKey),
    Full,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RebuildAction {
    /// Not a source file of the site
    Ignored,
    /// Modification time matches what was last recorded
    Unchanged,
    Rebuilt(RebuildScope, BuildReport),
}

/// Tells connected dev clients to reload.
pub trait ReloadSignal {
    fn full_reload(&self);
}

/// Last seen modification time per source file, kept for the whole session.
#[derive(Debug, Clone, Default)]
pub struct StalenessLedger {
    seen: HashMap<PathBuf, SystemTime>,
}

impl StalenessLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record every file that already exists under `roots` (files or directories).
    pub fn prime(&mut self, roots: &[PathBuf]) {
        for root in roots {
            for entry in WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
                if !entry.file_type().is_file() {
                    continue;
                }
                if let Some(modified) = get_mtime(entry.path()) {
                    self.seen.insert(entry.path().to_path_buf(), modified);
                }
            }
        }
        tracing::debug!(files = self.seen.len(), "Primed staleness ledger");
    }

    /// Record `modified` for `path` and report whether it differs from the
    /// previous record. The first observation of a path is never stale.
    pub fn observe(&mut self, path: &Path, modified: SystemTime) -> bool {
        match self.seen.insert(path.to_path_buf(), modified) {
            Some(previous) => previous != modified,
            None => false,
        }
    }

    pub fn forget(&mut self, path: &Path) {
        self.seen.remove(path);
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    Page(PageKey),
    Shared,
    Ignored,
}

pub struct IncrementalRebuilder<S> {
    builder: SiteBuilder,
    ledger: StalenessLedger,
    signal: S,
}

impl<S: ReloadSignal> IncrementalRebuilder<S> {
    pub fn new(builder: SiteBuilder, signal: S) -> Self {
        let mut ledger = StalenessLedger::new();
        ledger.prime(&watched_roots(builder.config()));
        Self {
            builder,
            ledger,
            signal,
        }
    }

    pub fn builder(&self) -> &SiteBuilder {
        &self.builder
    }

    pub fn ledger(&self) -> &StalenessLedger {
        &self.ledger
    }

    pub fn on_change(&mut self, change: &SourceChange) -> Result<RebuildAction> {
        let target = classify(self.builder.config(), &change.path);
        if target == Target::Ignored {
            return Ok(RebuildAction::Ignored);
        }

        let scope = match change.kind {
            ChangeKind::Removed => {
                self.ledger.forget(&change.path);
                RebuildScope::Full
            }
            ChangeKind::Added => {
                if let Some(modified) = get_mtime(&change.path) {
                    self.ledger.observe(&change.path, modified);
                }
                RebuildScope::Full
            }
            ChangeKind::Modified => {
                let Some(modified) = get_mtime(&change.path) else {
                    return Ok(RebuildAction::Unchanged);
                };
                if !self.ledger.observe(&change.path, modified) {
                    return Ok(RebuildAction::Unchanged);
                }
                match target {
                    Target::Page(key) => RebuildScope::Page(key),
                    _ => RebuildScope::Full,
                }
            }
        };

        tracing::info!(path = %change.path.display(), kind = ?change.kind, scope = ?scope, "Rebuilding");
        let report = match &scope {
            RebuildScope::Page(key) => self.builder.rebuild_page(key)?,
            RebuildScope::Full => self.builder.build_all()?,
        };
        self.signal.full_reload();
        Ok(RebuildAction::Rebuilt(scope, report))
    }
}

/// Source locations whose changes affect the output
pub fn watched_roots(config: &SiteConfig) -> Vec<PathBuf> {
    let paths = &config.paths;
    let mut roots = vec![
        paths.pages.clone(),
        paths.layouts.clone(),
        paths.partials.clone(),
        paths.data.clone(),
    ];
    if !paths.routes.starts_with(&paths.data) {
        roots.push(paths.routes.clone());
    }
    roots.extend(config.assets.iter().map(|asset| asset.source.clone()));
    roots
}

fn classify(config: &SiteConfig, path: &Path) -> Target {
    let paths = &config.paths;
    if let Ok(relative) = path.strip_prefix(&paths.pages) {
        return match TemplateName::parse(relative, &config.build.template_extension, &config.locales) {
            Some(name) => Target::Page(name.page_key().clone()),
            None => Target::Ignored,
        };
    }

    let shared = path == paths.routes
        || path.starts_with(&paths.layouts)
        || path.starts_with(&paths.partials)
        || path.starts_with(&paths.data)
        || config.assets.iter().any(|asset| asset.source == path);
    if shared { Target::Shared } else { Target::Ignored }
}

fn get_mtime(path: &Path) -> Option<SystemTime> {
    path.metadata().and_then(|m| m.modified()).ok()
}

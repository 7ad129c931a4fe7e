// Production assets are published as assets/<stem>.<hash>.<ext>

use multilocale_core::{ASSETS_URL_PREFIX, AssetSpec, BuildMode, SiteConfig};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

const HASH_LEN: usize = 8;

/// Content hashes and public URLs of the shared assets, computed once per build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AssetHashSet {
    hashes: BTreeMap<String, String>,
    urls: BTreeMap<String, String>,
}

impl AssetHashSet {
    pub fn hash(&self, name: &str) -> Option<&str> {
        self.hashes.get(name).map(String::as_str)
    }

    pub fn url(&self, name: &str) -> Option<&str> {
        self.urls.get(name).map(String::as_str)
    }

    /// Asset name → content hash. Empty in development.
    pub fn hashes(&self) -> &BTreeMap<String, String> {
        &self.hashes
    }

    /// Asset name → public URL.
    pub fn urls(&self) -> &BTreeMap<String, String> {
        &self.urls
    }
}

pub struct AssetPipeline<'a> {
    assets: &'a [AssetSpec],
    output: &'a Path,
    mode: BuildMode,
}

impl<'a> AssetPipeline<'a> {
    pub fn new(config: &'a SiteConfig, mode: BuildMode) -> Self {
        Self {
            assets: &config.assets,
            output: &config.paths.output,
            mode,
        }
    }

    /// Compute names and hashes without touching the output directory.
    pub fn plan(&self) -> AssetHashSet {
        self.process(false)
    }

    /// Copy every asset into `<output>/assets/` and return the hash set.
    pub fn run(&self) -> AssetHashSet {
        self.process(true)
    }

    fn process(&self, copy: bool) -> AssetHashSet {
        let mut set = AssetHashSet::default();
        let assets_dir = self.output.join(ASSETS_URL_PREFIX.trim_matches('/'));

        for asset in self.assets {
            let content = match fs::read(&asset.source) {
                Ok(content) => content,
                Err(e) => {
                    tracing::warn!(
                        asset = %asset.name,
                        path = %asset.source.display(),
                        error = %e,
                        "Asset not found; skipping"
                    );
                    continue;
                }
            };

            let hash = self.mode.is_production().then(|| content_hash(&content));
            let Some(file_name) = published_name(&asset.source, hash.as_deref()) else {
                tracing::warn!(asset = %asset.name, path = %asset.source.display(), "Asset has no file name; skipping");
                continue;
            };

            if copy {
                let target = assets_dir.join(&file_name);
                if let Err(e) = fs::create_dir_all(&assets_dir).and_then(|_| fs::write(&target, &content)) {
                    tracing::error!(
                        asset = %asset.name,
                        path = %target.display(),
                        error = %e,
                        "Failed to copy asset"
                    );
                    continue;
                }
                remove_stale_copies(&assets_dir, &asset.source, &file_name);
                tracing::debug!(asset = %asset.name, kind = asset.kind.as_str(), file = %file_name, "Copied asset");
            }

            set.urls
                .insert(asset.name.clone(), format!("{}{}", ASSETS_URL_PREFIX, file_name));
            if let Some(hash) = hash {
                set.hashes.insert(asset.name.clone(), hash);
            }
        }

        set
    }
}

/// First 8 hex characters of the SHA-256 of `content`
pub fn content_hash(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    let mut hex = hex::encode(hasher.finalize());
    hex.truncate(HASH_LEN);
    hex
}

/// `main.css` → `main.<hash>.css`; unchanged without a hash.
fn published_name(source: &Path, hash: Option<&str>) -> Option<String> {
    let file_name = source.file_name()?.to_str()?;
    let Some(hash) = hash else {
        return Some(file_name.to_string());
    };
    Some(match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem}.{hash}.{ext}"),
        _ => format!("{file_name}.{hash}"),
    })
}

/// Delete hashed copies of `source` left by earlier builds, keeping `current`.
fn remove_stale_copies(assets_dir: &Path, source: &Path, current: &str) {
    let Some(file_name) = source.file_name().and_then(|n| n.to_str()) else {
        return;
    };
    let Ok(entries) = fs::read_dir(assets_dir) else {
        return;
    };
    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if name == current || !is_hashed_copy(name, file_name) {
            continue;
        }
        match fs::remove_file(entry.path()) {
            Ok(()) => tracing::debug!(file = %name, "Removed stale asset"),
            Err(e) => tracing::warn!(file = %name, error = %e, "Failed to remove stale asset"),
        }
    }
}

/// Whether `candidate` is `file_name` with some content hash infixed.
fn is_hashed_copy(candidate: &str, file_name: &str) -> bool {
    let (prefix, suffix) = match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (format!("{stem}."), format!(".{ext}")),
        _ => (format!("{file_name}."), String::new()),
    };
    candidate
        .strip_prefix(&prefix)
        .and_then(|rest| rest.strip_suffix(&suffix))
        .is_some_and(|hash| hash.len() == HASH_LEN && hash.bytes().all(|b| b.is_ascii_hexdigit()))
}

use std::path::PathBuf;

/// Error returned by the site builder. Per-page problems are not errors; they
/// are reported through [`crate::RenderOutcome`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to create output directory {}: {source}", path.display())]
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] multilocale_core::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

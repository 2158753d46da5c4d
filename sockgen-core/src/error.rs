//! Error types for sockgen-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from publish operations.
#[derive(Debug, Error)]
pub enum PublishError {
    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience constructor for [`PublishError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> PublishError {
    PublishError::Io {
        path: path.into(),
        source,
    }
}

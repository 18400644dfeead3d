use std::path::PathBuf;

use thiserror::Error;

/// Failures of the report pipeline.
///
/// A missing per-series CSV is deliberately *not* represented here: the
/// loader reports it as `Ok(None)` and the affected panel stays sparse.
/// Everything below aborts the report kind that hit it.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("no benchmark runs for `{category}` under {path}")]
    MissingRunDirectory {
        category: &'static str,
        path: PathBuf,
    },

    #[error("malformed result file {path}: {reason}")]
    MalformedResult { path: PathBuf, reason: String },

    #[error("failed to render {path}: {reason}")]
    Render { path: PathBuf, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = ReportError> = std::result::Result<T, E>;

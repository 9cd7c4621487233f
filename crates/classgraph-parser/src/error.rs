//! Per-file failures. None of these abort a run; callers log and skip the file.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no supported language for {0}")]
    Unsupported(PathBuf),

    #[error("extractor panicked on {path}: {message}")]
    Panicked { path: PathBuf, message: String },
}

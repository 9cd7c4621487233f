//! Pattern-based structural extraction for Java, C++, C# and Kotlin.
//!
//! A file is comment-stripped ([`comments`]), scanned for class headers whose
//! bodies are delimited by the [`boundary`] matcher, and its members are split
//! with the [`params`] and [`types`] helpers. [`analyze`] fans this out over a
//! directory with rayon; a file that fails is logged and skipped.

pub mod boundary;
pub mod comments;
pub mod error;
pub mod extract;
pub mod params;
pub mod scan;
pub mod types;

pub use classgraph_core::language::{Language, default_language_tiebreak};
pub use error::ParseError;
pub use types::TypeFilter;

use classgraph_core::config::AnalysisConfig;
use classgraph_core::model::{ClassArena, ClassRecord};
use rayon::prelude::*;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Name of the per-project ignore file honored while walking a tree.
pub const IGNORE_FILE_NAME: &str = ".classgraphignore";

/// Extract every class of a source text.
pub fn parse_source(path: &Path, source: &str, language: Language, filter: &TypeFilter) -> ClassArena {
    let cleaned = comments::strip_comments(source, language);
    extract::extract_file(path, &cleaned, language, filter)
}

/// Read and extract one file. Invalid UTF-8 is replaced rather than
/// rejected; a panic inside an extractor is reported as an error.
pub fn parse_file(path: &Path, filter: &TypeFilter) -> Result<ClassArena, ParseError> {
    let language =
        Language::from_path(path).ok_or_else(|| ParseError::Unsupported(path.to_path_buf()))?;
    let bytes = std::fs::read(path).map_err(|source| ParseError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let source = String::from_utf8_lossy(&bytes);
    panic::catch_unwind(AssertUnwindSafe(|| parse_source(path, &source, language, filter)))
        .map_err(|payload| ParseError::Panicked {
            path: path.to_path_buf(),
            message: panic_message(payload.as_ref()),
        })
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

/// Extract every file in parallel and merge the results in input order.
/// Files that fail are logged and contribute nothing.
pub fn analyze_files(files: &[PathBuf], filter: &TypeFilter) -> ClassArena {
    let results: Vec<(&PathBuf, Result<ClassArena, ParseError>)> = files
        .par_iter()
        .map(|path| (path, parse_file(path, filter)))
        .collect();

    let mut arena = ClassArena::new();
    let mut failed = 0usize;
    for (path, result) in results {
        match result {
            Ok(classes) => {
                debug!("{}: {} classes", path.display(), classes.len());
                arena.append(classes);
            }
            Err(e) => {
                failed += 1;
                warn!("skipping {}: {e}", path.display());
            }
        }
    }
    info!(
        "extracted {} classes from {} files ({} skipped)",
        arena.len(),
        files.len() - failed,
        failed
    );
    arena
}

/// Source files under `root` with a supported extension, sorted.
///
/// Hidden files are skipped, `.gitignore` is honored when configured and a
/// `.classgraphignore` file always is. Files over `max_file_bytes` are left
/// out with a warning.
pub fn collect_sources(root: &Path, config: &AnalysisConfig) -> Vec<PathBuf> {
    let walker = ignore::WalkBuilder::new(root)
        .hidden(true)
        .git_ignore(config.respect_gitignore)
        .add_custom_ignore_filename(IGNORE_FILE_NAME)
        .build();

    let mut files = Vec::new();
    for entry in walker.flatten() {
        let path = entry.path();
        if !path.is_file() || Language::from_path(path).is_none() {
            continue;
        }
        let size = entry.metadata().map_or(0, |m| m.len());
        if size > config.max_file_bytes {
            warn!(
                "skipping {}: {} bytes exceeds max_file_bytes ({})",
                path.display(),
                size,
                config.max_file_bytes
            );
            continue;
        }
        files.push(path.to_path_buf());
    }
    files.sort();
    files
}

/// Every class declared under `root`, nested classes flattened alongside
/// their parents.
pub fn analyze(root: &Path, filter: &TypeFilter) -> Vec<ClassRecord> {
    analyze_with(root, filter, &AnalysisConfig::default()).into_records()
}

/// [`analyze`] with explicit walk settings, keeping the arena links.
pub fn analyze_with(root: &Path, filter: &TypeFilter, config: &AnalysisConfig) -> ClassArena {
    let files = collect_sources(root, config);
    info!("analyzing {} source files under {}", files.len(), root.display());
    analyze_files(&files, filter)
}

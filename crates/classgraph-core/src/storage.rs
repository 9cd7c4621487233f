//! Read/write graph documents on disk.
//!
//! Each run writes a new `graph-<timestamp>.json` so earlier results stay
//! around for diffing.

use crate::graph::GraphDocument;
use crate::schema;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

const FILE_PREFIX: &str = "graph-";
const FILE_SUFFIX: &str = ".json";

/// File name for a graph written at the given local time.
pub fn graph_file_name(at: chrono::DateTime<chrono::Local>) -> String {
    format!(
        "{}{}{}",
        FILE_PREFIX,
        at.format("%Y%m%d-%H%M%S"),
        FILE_SUFFIX
    )
}

/// Load a graph document from a JSON file.
pub fn load(path: &Path) -> Result<GraphDocument> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read graph from {}", path.display()))?;
    schema::from_json(&json).with_context(|| format!("invalid graph file {}", path.display()))
}

/// Save a graph document into `out_dir`, creating it if needed.
/// Returns the path of the written file.
pub fn save(out_dir: &Path, doc: &GraphDocument) -> Result<PathBuf> {
    save_as(out_dir, &graph_file_name(chrono::Local::now()), doc)
}

/// Save a graph document under an explicit file name.
pub fn save_as(out_dir: &Path, file_name: &str, doc: &GraphDocument) -> Result<PathBuf> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create output directory {}", out_dir.display()))?;

    let path = out_dir.join(file_name);
    let json = schema::to_json(doc)?;
    fs::write(&path, json)
        .with_context(|| format!("failed to write graph to {}", path.display()))?;
    Ok(path)
}

/// Write a rendered diagram next to its graph file, swapping the extension.
pub fn save_sidecar(graph_path: &Path, extension: &str, contents: &str) -> Result<PathBuf> {
    let path = graph_path.with_extension(extension);
    fs::write(&path, contents)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

/// Most recent graph file in `out_dir`, by file name (timestamps sort lexically).
pub fn latest(out_dir: &Path) -> Result<Option<PathBuf>> {
    if !out_dir.exists() {
        return Ok(None);
    }
    let entries = fs::read_dir(out_dir)
        .with_context(|| format!("failed to list {}", out_dir.display()))?;

    let mut newest: Option<PathBuf> = None;
    for entry in entries {
        let path = entry
            .with_context(|| format!("failed to list {}", out_dir.display()))?
            .path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !(name.starts_with(FILE_PREFIX) && name.ends_with(FILE_SUFFIX)) {
            continue;
        }
        if newest.as_ref().is_none_or(|best| path > *best) {
            newest = Some(path);
        }
    }
    Ok(newest)
}

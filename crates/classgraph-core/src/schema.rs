//! JSON encoding and version handling for graph documents.

use crate::graph::{GRAPH_VERSION, GraphDocument};
use anyhow::{Context, Result};

/// Validate a document's format version.
pub fn validate_version(doc: &GraphDocument) -> Result<()> {
    if doc.version != GRAPH_VERSION {
        anyhow::bail!(
            "graph version mismatch: expected {}, found {}",
            GRAPH_VERSION,
            doc.version
        );
    }
    Ok(())
}

/// Serialize a document to a pretty-printed JSON string.
pub fn to_json(doc: &GraphDocument) -> Result<String> {
    serde_json::to_string_pretty(doc).context("failed to serialize graph to JSON")
}

/// Deserialize a document from a JSON string.
pub fn from_json(json: &str) -> Result<GraphDocument> {
    let doc: GraphDocument =
        serde_json::from_str(json).context("failed to deserialize graph from JSON")?;
    validate_version(&doc)?;
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_other_version() {
        let mut doc = GraphDocument::new("/src");
        doc.version = "0.1.0".to_string();
        let json = serde_json::to_string(&doc).unwrap();
        let err = from_json(&json).unwrap_err();
        assert!(err.to_string().contains("version mismatch"));
    }

    #[test]
    fn test_top_level_field_names() {
        let doc = GraphDocument::new("/src/project");
        let value: serde_json::Value = serde_json::from_str(&to_json(&doc).unwrap()).unwrap();
        assert_eq!(value["analysisSourcePath"], "/src/project");
        assert!(value["nodes"].is_array());
        assert!(value["links"].is_array());
    }
}

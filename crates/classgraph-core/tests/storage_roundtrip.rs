use classgraph_core::graph::*;
use classgraph_core::language::Language;
use classgraph_core::model::RelationKind;
use classgraph_core::storage;
use tempfile::TempDir;

fn sample_document() -> GraphDocument {
    let mut doc = GraphDocument::new("/repo/src");
    doc.language = Some(Language::Java);
    let mut node = GraphNode::placeholder("com.acme.Order", Some(Language::Java));
    node.placeholder = false;
    node.language = Some(Language::Java);
    node.attributes = vec!["private Customer customer".to_string()];
    node.methods = vec!["public total(): double".to_string()];
    node.lines_of_code = Some(42);
    doc.nodes.push(node);
    doc.links.push(GraphEdge {
        source: "com.acme.Order".to_string(),
        target: "com.acme.Customer".to_string(),
        relation: RelationKind::Depended,
    });
    doc.finalize();
    doc
}

#[test]
fn test_save_and_load_roundtrip() {
    let tmp = TempDir::new().unwrap();
    let doc = sample_document();

    let path = storage::save(tmp.path(), &doc).unwrap();
    assert!(path.exists());
    let name = path.file_name().unwrap().to_str().unwrap();
    assert!(name.starts_with("graph-") && name.ends_with(".json"));

    let loaded = storage::load(&path).unwrap();
    assert_eq!(loaded, doc);
    assert_eq!(loaded.placeholder_count(), 1);
}

#[test]
fn test_load_nonexistent() {
    let tmp = TempDir::new().unwrap();
    assert!(storage::load(&tmp.path().join("missing.json")).is_err());
}

#[test]
fn test_latest_picks_newest_timestamp() {
    let tmp = TempDir::new().unwrap();
    let doc = sample_document();
    storage::save_as(tmp.path(), "graph-20240101-000000.json", &doc).unwrap();
    storage::save_as(tmp.path(), "graph-20250101-000000.json", &doc).unwrap();
    std::fs::write(tmp.path().join("notes.txt"), "not a graph").unwrap();

    let latest = storage::latest(tmp.path()).unwrap().unwrap();
    assert_eq!(
        latest.file_name().unwrap().to_str().unwrap(),
        "graph-20250101-000000.json"
    );
}

#[test]
fn test_latest_on_missing_dir() {
    let tmp = TempDir::new().unwrap();
    assert!(storage::latest(&tmp.path().join("nope")).unwrap().is_none());
}

#[test]
fn test_sidecar_swaps_extension() {
    let tmp = TempDir::new().unwrap();
    let path = storage::save_as(tmp.path(), "graph-1.json", &sample_document()).unwrap();
    let puml = storage::save_sidecar(&path, "puml", "@startuml\n@enduml\n").unwrap();
    assert_eq!(puml, tmp.path().join("graph-1.puml"));
    assert_eq!(std::fs::read_to_string(puml).unwrap(), "@startuml\n@enduml\n");
}

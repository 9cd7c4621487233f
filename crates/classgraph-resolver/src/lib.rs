//! Reference resolution and graph construction.
//!
//! Runs once, after every file has been extracted: relation targets as
//! written are resolved against all declared types ([`index`]), then one
//! node per record and one edge per surviving relation are emitted and the
//! document is closed over placeholders, deduplicated and sorted.

pub mod index;

pub use index::{Resolution, TypeIndex};

use classgraph_core::graph::{GraphDocument, GraphEdge, GraphNode, NodeKind};
use classgraph_core::language::default_language_tiebreak;
use classgraph_core::model::{ClassRecord, RelationKind};
use classgraph_parser::TypeFilter;
use std::collections::HashSet;
use tracing::{debug, info};

/// Build the dependency graph of a set of records.
pub fn build_graph(records: &[ClassRecord], filter: &TypeFilter) -> GraphDocument {
    GraphBuilder::new(filter).build(records)
}

/// Graph construction settings.
#[derive(Debug, Clone)]
pub struct GraphBuilder<'a> {
    filter: &'a TypeFilter,
    source_path: String,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(filter: &'a TypeFilter) -> Self {
        Self {
            filter,
            source_path: String::new(),
        }
    }

    /// Record the scanned root in the document.
    pub fn source_path(mut self, path: impl Into<String>) -> Self {
        self.source_path = path.into();
        self
    }

    pub fn build(&self, records: &[ClassRecord]) -> GraphDocument {
        let index = TypeIndex::new(records);
        let languages: Vec<_> = records.iter().map(|r| r.language).collect();

        let mut doc = GraphDocument::new(self.source_path.clone());
        doc.language = default_language_tiebreak(&languages);
        doc.nodes = records.iter().map(node_for).collect();

        let mut ambiguous = 0usize;
        for record in records {
            let source = record.qualified_name();
            for relation in &record.relations {
                if self.filter.is_ignorable(&relation.target, record.language) {
                    continue;
                }
                let resolution = index.resolve(&relation.target, record);
                if let Resolution::Ambiguous(name) = &resolution {
                    ambiguous += 1;
                    debug!("{source}: {name} is ambiguous, left unresolved");
                }
                let target = resolution.into_id();
                if target == source {
                    continue;
                }
                doc.links.push(GraphEdge {
                    source: source.clone(),
                    target,
                    relation: relation.kind,
                });
            }
        }
        drop_shadowed_dependencies(&mut doc.links);
        doc.finalize();

        info!(
            "graph: {} nodes ({} placeholders), {} edges, {} ambiguous references",
            doc.nodes.len(),
            doc.placeholder_count(),
            doc.links.len(),
            ambiguous
        );
        doc
    }
}

/// The node of a declared type.
pub fn node_for(record: &ClassRecord) -> GraphNode {
    GraphNode {
        id: record.qualified_name(),
        package: record.package.clone(),
        kind: if record.flags.is_interface {
            NodeKind::Interface
        } else {
            NodeKind::Class
        },
        flags: record.flags,
        language: Some(record.language),
        attributes: record.fields.iter().map(|f| f.signature()).collect(),
        methods: record.methods.iter().map(|m| m.signature()).collect(),
        lines_of_code: record.lines_of_code(),
        placeholder: false,
    }
}

/// Two targets written differently can resolve to the same type; an
/// inheritance edge then makes the `Depended` edge to it redundant.
fn drop_shadowed_dependencies(links: &mut Vec<GraphEdge>) {
    let inherited: HashSet<(String, String)> = links
        .iter()
        .filter(|e| e.relation != RelationKind::Depended)
        .map(|e| (e.source.clone(), e.target.clone()))
        .collect();
    links.retain(|e| {
        e.relation != RelationKind::Depended
            || !inherited.contains(&(e.source.clone(), e.target.clone()))
    });
}

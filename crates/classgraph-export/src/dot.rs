//! Graphviz DOT class diagrams with record-shaped nodes.

use crate::plantuml::stereotypes;
use crate::{sorted_edges, split_visibility, visibility_mark};
use classgraph_core::graph::{GraphDocument, GraphNode, NodeKind};
use classgraph_core::model::RelationKind;
use std::fmt::Write;

/// Render the document as a DOT digraph.
pub fn render(doc: &GraphDocument) -> String {
    let mut out = String::new();
    writeln!(out, "digraph classgraph {{").unwrap();
    writeln!(out, "  rankdir=BT;").unwrap();
    writeln!(out, "  node [shape=record, fontsize=10, fontname=\"Helvetica\"];").unwrap();
    writeln!(out).unwrap();

    for node in &doc.nodes {
        let style = if node.placeholder {
            ", style=dashed"
        } else {
            ""
        };
        writeln!(
            out,
            "  \"{}\" [label=\"{}\"{}];",
            escape_id(&node.id),
            record_label(node),
            style
        )
        .unwrap();
    }

    writeln!(out).unwrap();

    for edge in sorted_edges(doc) {
        let attrs = match edge.relation {
            RelationKind::Extended => "arrowhead=empty",
            RelationKind::Implemented => "arrowhead=empty, style=dashed",
            RelationKind::Depended => "arrowhead=open, style=dashed",
        };
        writeln!(
            out,
            "  \"{}\" -> \"{}\" [{}];",
            escape_id(&edge.source),
            escape_id(&edge.target),
            attrs
        )
        .unwrap();
    }

    writeln!(out, "}}").unwrap();
    out
}

/// `{«interface»\nName|attributes|methods}` with left-aligned members.
fn record_label(node: &GraphNode) -> String {
    let mut title = String::new();
    if node.kind == NodeKind::Interface {
        title.push_str("«interface»\\n");
    }
    for stereotype in stereotypes(node) {
        write!(title, "«{}»\\n", stereotype).unwrap();
    }
    title.push_str(&escape_record(&node.id));

    let section = |members: &[String]| {
        members
            .iter()
            .map(|m| {
                let (visibility, rest) = split_visibility(m);
                format!("{}{}\\l", visibility_mark(visibility), escape_record(rest))
            })
            .collect::<String>()
    };
    format!(
        "{{{}|{}|{}}}",
        title,
        section(&node.attributes),
        section(&node.methods)
    )
}

fn escape_id(id: &str) -> String {
    id.replace('"', "\\\"")
}

/// Escape the characters with meaning inside a record label.
fn escape_record(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '{' | '}' | '|' | '<' | '>' | '"' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

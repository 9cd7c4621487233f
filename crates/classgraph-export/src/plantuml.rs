//! PlantUML class diagrams.

use crate::{arrow, sorted_edges, split_visibility, visibility_mark};
use classgraph_core::graph::{GraphDocument, GraphNode, NodeKind};
use std::fmt::Write;

/// Render the document as a PlantUML class diagram.
pub fn render(doc: &GraphDocument) -> String {
    let mut out = String::new();
    writeln!(out, "@startuml").unwrap();
    writeln!(out, "hide empty members").unwrap();
    writeln!(out, "skinparam classAttributeIconSize 0").unwrap();
    writeln!(out).unwrap();

    for node in &doc.nodes {
        write_node(node, &mut out);
    }

    if !doc.links.is_empty() {
        writeln!(out).unwrap();
    }
    for edge in sorted_edges(doc) {
        writeln!(
            out,
            "\"{}\" {} \"{}\"",
            edge.source,
            arrow(edge.relation),
            edge.target
        )
        .unwrap();
    }

    writeln!(out, "@enduml").unwrap();
    out
}

fn write_node(node: &GraphNode, out: &mut String) {
    let keyword = match node.kind {
        NodeKind::Interface => "interface",
        NodeKind::Class => "class",
    };
    write!(out, "{} \"{}\"", keyword, node.id).unwrap();
    for stereotype in stereotypes(node) {
        write!(out, " <<{}>>", stereotype).unwrap();
    }
    if node.attributes.is_empty() && node.methods.is_empty() {
        writeln!(out).unwrap();
        return;
    }
    writeln!(out, " {{").unwrap();
    for member in node.attributes.iter().chain(&node.methods) {
        writeln!(out, "  {}", member_line(member)).unwrap();
    }
    writeln!(out, "}}").unwrap();
}

/// `<<abstract>>`, `<<final>>`, `<<static>>` from the node flags, or
/// `<<external>>` for a placeholder.
pub fn stereotypes(node: &GraphNode) -> Vec<&'static str> {
    if node.placeholder {
        return vec!["external"];
    }
    let mut out = Vec::new();
    if node.flags.is_abstract && node.kind != NodeKind::Interface {
        out.push("abstract");
    }
    if node.flags.is_final {
        out.push("final");
    }
    if node.flags.is_static {
        out.push("static");
    }
    out
}

/// `private static int count` → `- {static} int count`.
fn member_line(signature: &str) -> String {
    let (visibility, rest) = split_visibility(signature);
    let mut line = String::from(visibility_mark(visibility));
    if !line.is_empty() {
        line.push(' ');
    }
    match rest.strip_prefix("static ") {
        Some(rest) => {
            line.push_str("{static} ");
            line.push_str(rest);
        }
        None => line.push_str(rest),
    }
    line
}

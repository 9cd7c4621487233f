//! Mermaid class diagrams.

use crate::plantuml::stereotypes;
use crate::{arrow, sorted_edges, split_visibility, visibility_mark};
use classgraph_core::graph::{GraphDocument, GraphNode, NodeKind};
use std::fmt::Write;

/// Render the document as a Mermaid `classDiagram`.
pub fn render(doc: &GraphDocument) -> String {
    let mut out = String::new();
    writeln!(out, "classDiagram").unwrap();

    for node in &doc.nodes {
        write_node(node, &mut out);
    }

    for edge in sorted_edges(doc) {
        writeln!(
            out,
            "  {} {} {}",
            safe_id(&edge.source),
            arrow(edge.relation),
            safe_id(&edge.target)
        )
        .unwrap();
    }
    out
}

fn write_node(node: &GraphNode, out: &mut String) {
    let id = safe_id(&node.id);
    writeln!(out, "  class {}[\"{}\"]", id, node.id.replace('"', "'")).unwrap();
    // Mermaid shows one annotation per class
    let annotation = if node.kind == NodeKind::Interface {
        Some("interface")
    } else {
        stereotypes(node).first().copied()
    };
    if let Some(annotation) = annotation {
        writeln!(out, "  <<{}>> {}", annotation, id).unwrap();
    }
    for member in node.attributes.iter().chain(&node.methods) {
        let (visibility, rest) = split_visibility(member);
        writeln!(
            out,
            "  {} : {}{}",
            id,
            visibility_mark(visibility),
            generics(rest)
        )
        .unwrap();
    }
}

/// Make an ID safe for Mermaid (replace special characters).
fn safe_id(id: &str) -> String {
    id.replace([':', '/', '.', ' ', '-', '<', '>', ',', '"'], "_")
}

/// Mermaid writes generic arguments between tildes: `List~Order~`.
fn generics(text: &str) -> String {
    text.replace(['<', '>'], "~")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_id() {
        assert_eq!(safe_id("a::b::Foo"), "a__b__Foo");
        assert_eq!(safe_id("com.acme.Order"), "com_acme_Order");
    }

    #[test]
    fn test_generics() {
        assert_eq!(generics("List<Order> items"), "List~Order~ items");
    }
}

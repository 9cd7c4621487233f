//! Render a [`GraphDocument`] as a class diagram.
//!
//! PlantUML is the primary format; Graphviz DOT and Mermaid are offered for
//! tooling that cannot run PlantUML. Every renderer is a pure function of
//! the document and emits edges in sorted order, so output is stable across
//! runs.

pub mod dot;
pub mod mermaid;
pub mod plantuml;

use classgraph_core::graph::{GraphDocument, GraphEdge};
use classgraph_core::model::RelationKind;
use std::fmt;
use std::str::FromStr;

/// Diagram format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagramFormat {
    PlantUml,
    Dot,
    Mermaid,
}

impl DiagramFormat {
    pub const ALL: [Self; 3] = [Self::PlantUml, Self::Dot, Self::Mermaid];

    pub fn name(self) -> &'static str {
        match self {
            Self::PlantUml => "plantuml",
            Self::Dot => "dot",
            Self::Mermaid => "mermaid",
        }
    }

    /// File extension of a diagram written next to a graph file.
    pub fn extension(self) -> &'static str {
        match self {
            Self::PlantUml => "puml",
            Self::Dot => "dot",
            Self::Mermaid => "mmd",
        }
    }

    /// Format named by the `output.diagram` setting; `none` disables diagrams.
    pub fn from_setting(value: &str) -> anyhow::Result<Option<Self>> {
        if value.eq_ignore_ascii_case("none") {
            return Ok(None);
        }
        value.parse().map(Some)
    }
}

impl fmt::Display for DiagramFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DiagramFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "plantuml" | "puml" | "uml" => Ok(Self::PlantUml),
            "dot" | "graphviz" => Ok(Self::Dot),
            "mermaid" | "mmd" => Ok(Self::Mermaid),
            other => anyhow::bail!("unknown diagram format '{other}': expected plantuml, dot or mermaid"),
        }
    }
}

/// Render the document in the given format.
pub fn render(doc: &GraphDocument, format: DiagramFormat) -> String {
    match format {
        DiagramFormat::PlantUml => plantuml::render(doc),
        DiagramFormat::Dot => dot::render(doc),
        DiagramFormat::Mermaid => mermaid::render(doc),
    }
}

/// UML arrow token of a relation, shared by PlantUML and Mermaid.
pub fn arrow(relation: RelationKind) -> &'static str {
    match relation {
        RelationKind::Depended => "..>",
        RelationKind::Implemented => "..|>",
        RelationKind::Extended => "--|>",
    }
}

/// Edges ordered by source, target and relation.
fn sorted_edges(doc: &GraphDocument) -> Vec<&GraphEdge> {
    let mut edges: Vec<&GraphEdge> = doc.links.iter().collect();
    edges.sort();
    edges
}

/// Split a member signature into its visibility keyword and the rest.
fn split_visibility(signature: &str) -> (&str, &str) {
    for keyword in ["public", "protected", "private"] {
        if let Some(rest) = signature.strip_prefix(keyword)
            && (rest.is_empty() || rest.starts_with(' '))
        {
            return (keyword, rest.trim_start());
        }
    }
    ("", signature)
}

/// UML visibility mark: `+`, `#` or `-`.
fn visibility_mark(keyword: &str) -> &'static str {
    match keyword {
        "public" => "+",
        "protected" => "#",
        "private" => "-",
        _ => "",
    }
}

//! Resolved dependency graph: one node per type, one edge per distinct relation.

use crate::language::Language;
use crate::model::{ClassFlags, RelationKind};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Current on-disk format version of [`GraphDocument`].
pub const GRAPH_VERSION: &str = "1.0.0";

/// Node shape in the rendered diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    #[default]
    Class,
    Interface,
}

/// A type in the graph, either declared in the analyzed sources or
/// synthesized as a placeholder for a referenced external type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub id: String,
    pub package: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(flatten)]
    pub flags: ClassFlags,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
    pub attributes: Vec<String>,
    pub methods: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lines_of_code: Option<usize>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub placeholder: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl GraphNode {
    /// Synthesize a node for a referenced type that was never declared.
    pub fn placeholder(id: &str, primary: Option<Language>) -> Self {
        Self {
            id: id.to_string(),
            package: guess_package(id, primary),
            kind: NodeKind::Class,
            flags: ClassFlags::default(),
            language: None,
            attributes: Vec::new(),
            methods: Vec::new(),
            lines_of_code: None,
            placeholder: true,
        }
    }

    /// Simple name: the id without its package prefix.
    pub fn simple_name(&self) -> &str {
        if self.package.is_empty() {
            return &self.id;
        }
        self.id
            .strip_prefix(self.package.as_str())
            .map(|rest| rest.trim_start_matches("::").trim_start_matches('.'))
            .filter(|rest| !rest.is_empty())
            .unwrap_or(self.id.as_str())
    }
}

/// Best-effort package for an id: everything before the last scope separator.
///
/// The primary language's separator is tried first so a Java-only graph
/// splits `a.b.C` on dots even when a nested C++-style id sneaks in.
pub fn guess_package(id: &str, primary: Option<Language>) -> String {
    let first = primary.map_or("::", Language::scope_separator);
    let second = if first == "::" { "." } else { "::" };
    for sep in [first, second] {
        if let Some((package, name)) = id.rsplit_once(sep)
            && !name.is_empty()
        {
            return package.to_string();
        }
    }
    String::new()
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    pub relation: RelationKind,
}

/// An integrity problem found by [`GraphDocument::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphIssue {
    DanglingSource(GraphEdge),
    DanglingTarget(GraphEdge),
    DuplicateNode(String),
    DuplicateEdge(GraphEdge),
    SelfLoop(GraphEdge),
}

impl std::fmt::Display for GraphIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DanglingSource(e) => write!(f, "dangling edge source: {}", e.source),
            Self::DanglingTarget(e) => write!(f, "dangling edge target: {}", e.target),
            Self::DuplicateNode(id) => write!(f, "duplicate node id: {}", id),
            Self::DuplicateEdge(e) => write!(
                f,
                "duplicate edge: {} -> {} ({})",
                e.source, e.target, e.relation
            ),
            Self::SelfLoop(e) => write!(f, "self loop on {} ({})", e.source, e.relation),
        }
    }
}

/// The serialized result of one analysis run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphDocument {
    pub version: String,
    /// Language standing for the whole run, see `default_language_tiebreak`.
    #[serde(default)]
    pub language: Option<Language>,
    pub analysis_source_path: String,
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphEdge>,
}

impl GraphDocument {
    pub fn new(analysis_source_path: impl Into<String>) -> Self {
        Self {
            version: GRAPH_VERSION.to_string(),
            language: None,
            analysis_source_path: analysis_source_path.into(),
            nodes: Vec::new(),
            links: Vec::new(),
        }
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn has_edge(&self, source: &str, target: &str, relation: RelationKind) -> bool {
        self.links
            .iter()
            .any(|e| e.source == source && e.target == target && e.relation == relation)
    }

    pub fn count_edges(&self, relation: RelationKind) -> usize {
        self.links.iter().filter(|e| e.relation == relation).count()
    }

    pub fn placeholder_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.placeholder).count()
    }

    /// Add a placeholder node for every edge endpoint that has no node.
    pub fn close_dangling(&mut self) {
        let mut known: HashSet<String> = self.nodes.iter().map(|n| n.id.clone()).collect();
        let mut missing = Vec::new();
        for edge in &self.links {
            for endpoint in [&edge.source, &edge.target] {
                if known.insert(endpoint.clone()) {
                    missing.push(endpoint.clone());
                }
            }
        }
        for id in missing {
            self.nodes.push(GraphNode::placeholder(&id, self.language));
        }
    }

    /// Keep the first node per id and the first edge per (source, target, relation).
    pub fn dedup(&mut self) {
        let mut seen_ids = HashSet::new();
        self.nodes.retain(|n| seen_ids.insert(n.id.clone()));
        let mut seen_edges = HashSet::new();
        self.links.retain(|e| seen_edges.insert(e.clone()));
    }

    /// Sort nodes by id and edges by their triple.
    pub fn sort(&mut self) {
        self.nodes.sort_by(|a, b| a.id.cmp(&b.id));
        self.links.sort();
    }

    /// Close, deduplicate and sort: the state every emitted document is in.
    pub fn finalize(&mut self) {
        self.close_dangling();
        self.dedup();
        self.sort();
    }

    /// Check the closure, uniqueness and no-self-loop invariants.
    pub fn validate(&self) -> Vec<GraphIssue> {
        let mut issues = Vec::new();
        let mut ids = HashSet::new();
        for node in &self.nodes {
            if !ids.insert(node.id.as_str()) {
                issues.push(GraphIssue::DuplicateNode(node.id.clone()));
            }
        }
        let mut edges = HashSet::new();
        for edge in &self.links {
            if !ids.contains(edge.source.as_str()) {
                issues.push(GraphIssue::DanglingSource(edge.clone()));
            }
            if !ids.contains(edge.target.as_str()) {
                issues.push(GraphIssue::DanglingTarget(edge.clone()));
            }
            if edge.source == edge.target {
                issues.push(GraphIssue::SelfLoop(edge.clone()));
            }
            if !edges.insert(edge) {
                issues.push(GraphIssue::DuplicateEdge(edge.clone()));
            }
        }
        issues
    }
}

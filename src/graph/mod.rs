//! Stage graph description
//!
//! The graph is built in three steps, each in its own module:
//!
//! 1. [`builder`]: fixed nodes for every stage at their layout positions
//! 2. [`annotate`]: labels, status classes and links from component counts
//! 3. [`edges`]: one directed edge per component pair
//!
//! [`build_report_graph`] runs all three. The result is plain data that the
//! report writers serialize; nothing here knows about HTML or the diagram
//! library.

pub mod annotate;
pub mod builder;
pub mod edges;

pub use annotate::annotate_components;
pub use builder::build_base_graph;
pub use edges::synthesize_edges;

use crate::config::{ReportConfig, ReportKind};
use crate::error::{Error, Result};
use crate::stage::Position;
use crate::summary::{StatusClass, ValidationSummary};
use serde::Serialize;
use tracing::debug;

/// Style class for the result node inside each stage box
pub const RESULT_CLASS: &str = "result";
/// Style class for the synthetic external nodes
pub const EXTERNAL_CLASS: &str = "external";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeRole {
    /// Compound container for a stage
    Box,
    /// Labelled node inside a box
    Result,
    /// Stand-in for producers and consumers outside the pipeline
    External,
}

impl NodeRole {
    pub fn class(self) -> Option<&'static str> {
        match self {
            NodeRole::Box => None,
            NodeRole::Result => Some(RESULT_CLASS),
            NodeRole::External => Some(EXTERNAL_CLASS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub id: String,
    pub role: NodeRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<StatusClass>,
    /// Detail page opened when the node is tapped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    pub position: Position,
    pub hidden: bool,
}

impl Node {
    /// Space separated style classes, role first
    pub fn classes(&self) -> String {
        self.role
            .class()
            .into_iter()
            .chain(self.status.map(StatusClass::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub text: String,
    pub status: StatusClass,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
}

impl Edge {
    pub fn classes(&self) -> String {
        self.status.as_str().to_string()
    }
}

/// What the viewer may do with the diagram. Only taps stay enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Viewport {
    pub fit: bool,
    pub zooming_enabled: bool,
    pub panning_enabled: bool,
    pub box_selection_enabled: bool,
    pub elements_locked: bool,
    pub elements_selectable: bool,
}

impl Viewport {
    pub fn locked() -> Self {
        Self {
            fit: true,
            zooming_enabled: false,
            panning_enabled: false,
            box_selection_enabled: false,
            elements_locked: true,
            elements_selectable: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportGraph {
    pub kind: ReportKind,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub viewport: Viewport,
}

/// Reference to either kind of graph element
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Element<'a> {
    Node(&'a Node),
    Edge(&'a Edge),
}

impl<'a> Element<'a> {
    pub fn html(&self) -> Option<&'a str> {
        match self {
            Element::Node(node) => node.html.as_deref(),
            Element::Edge(edge) => edge.html.as_deref(),
        }
    }
}

impl ReportGraph {
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edges.iter().find(|e| e.id == id)
    }

    pub fn element(&self, id: &str) -> Option<Element<'_>> {
        self.node(id)
            .map(Element::Node)
            .or_else(|| self.edge(id).map(Element::Edge))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.element(id).is_some()
    }

    /// Insert a node, rejecting an id that is already taken
    pub fn add_node(&mut self, node: Node) -> Result<()> {
        if self.contains(&node.id) {
            return Err(Error::DuplicateElement { id: node.id });
        }
        self.nodes.push(node);
        Ok(())
    }

    /// Insert an edge between existing nodes, rejecting an id that is already taken
    pub fn add_edge(&mut self, edge: Edge) -> Result<()> {
        if self.contains(&edge.id) {
            return Err(Error::DuplicateElement { id: edge.id });
        }
        for end in [&edge.source, &edge.target] {
            if self.node(end).is_none() {
                return Err(Error::DanglingEdge {
                    edge: edge.id.clone(),
                    node: end.clone(),
                });
            }
        }
        debug!(id = %edge.id, source = %edge.source, target = %edge.target, "add edge");
        self.edges.push(edge);
        Ok(())
    }

    /// Make a hidden node visible; returns false when no such node exists
    pub fn reveal(&mut self, id: &str) -> bool {
        match self.node_mut(id) {
            Some(node) => {
                node.hidden = false;
                true
            }
            None => false,
        }
    }

    pub fn visible_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| !n.hidden)
    }
}

/// Build the finished graph for one summary
pub fn build_report_graph(summary: &ValidationSummary, config: &ReportConfig) -> Result<ReportGraph> {
    let mut graph = build_base_graph(config.kind);
    annotate_components(&mut graph, summary, config)?;
    synthesize_edges(&mut graph, summary, config)?;
    debug!(
        nodes = graph.nodes.len(),
        edges = graph.edges.len(),
        kind = %config.kind,
        "report graph built"
    );
    Ok(graph)
}

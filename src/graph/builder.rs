//! Fixed node set for the stage graph

use super::{Node, NodeRole, ReportGraph, Viewport};
use crate::config::ReportKind;
use crate::stage::StageLayout;

/// Label of every external node
pub const EXTERNAL_LABEL: &str = "External";

/// Build the node set for a report kind, with no edges yet.
///
/// Nodes are emitted boxes first, then result nodes, then external nodes,
/// each group in layout-table order. Compound parents have to precede their
/// children for the diagram library to nest them.
pub fn build_base_graph(kind: ReportKind) -> ReportGraph {
    let layout = kind.layout();
    let mut nodes = Vec::with_capacity(layout.len() * 3);

    nodes.extend(layout.iter().map(box_node));
    nodes.extend(layout.iter().map(result_node));
    nodes.extend(layout.iter().map(external_node));

    ReportGraph {
        kind,
        nodes,
        edges: Vec::new(),
        viewport: Viewport::locked(),
    }
}

fn box_node(row: &StageLayout) -> Node {
    Node {
        id: row.stage.box_id(),
        role: NodeRole::Box,
        parent: None,
        text: None,
        status: None,
        html: None,
        position: row.box_position(),
        hidden: false,
    }
}

fn result_node(row: &StageLayout) -> Node {
    Node {
        id: row.stage.result_id(),
        role: NodeRole::Result,
        parent: Some(row.stage.box_id()),
        text: Some(format!("{}\n0/0", row.stage.name())),
        status: None,
        html: None,
        position: row.result,
        hidden: false,
    }
}

fn external_node(row: &StageLayout) -> Node {
    Node {
        id: row.stage.external_id(),
        role: NodeRole::External,
        parent: None,
        text: Some(EXTERNAL_LABEL.to_string()),
        status: None,
        html: None,
        position: row.external_position(),
        hidden: true,
    }
}

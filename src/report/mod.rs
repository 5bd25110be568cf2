//! Report generation for stage graphs
//!
//! - **HTML**: the stage diagram page, drawn with Cytoscape.js
//! - **JSON**: the graph description, for other tools to render
//!
//! # Usage
//!
//! ```ignore
//! use stagegraph::report;
//!
//! // Automatically picks format based on extension
//! report::generate("index.html", &graph, &config)?;  // HTML
//! report::generate("graph.json", &graph, &config)?;  // JSON
//! ```

pub mod html;
pub mod json;

use crate::config::ReportConfig;
use crate::error::Result;
use crate::graph::{NodeRole, ReportGraph};
use crate::summary::StatusClass;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// Generate a report in the appropriate format based on file extension
pub fn generate<P: AsRef<Path>>(path: P, graph: &ReportGraph, config: &ReportConfig) -> Result<()> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let mut file = std::io::BufWriter::new(std::fs::File::create(path)?);

    match ext.as_str() {
        "json" => json::write(&mut file, graph)?,
        _ => html::write(&mut file, graph, config)?,
    }
    file.flush()?;
    Ok(())
}

/// Count of annotated result nodes and edges per status class
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub pass: usize,
    pub failed: usize,
    pub not_measured: usize,
}

impl Tally {
    /// Boxes repeat their result node's class and are not counted
    pub fn from_graph(graph: &ReportGraph) -> Self {
        let mut tally = Self::default();

        let node_classes = graph
            .nodes
            .iter()
            .filter(|n| n.role == NodeRole::Result)
            .filter_map(|n| n.status);
        let edge_classes = graph.edges.iter().map(|e| e.status);

        for status in node_classes.chain(edge_classes) {
            match status {
                StatusClass::Pass => tally.pass += 1,
                StatusClass::Failed => tally.failed += 1,
                StatusClass::NotMeasured => tally.not_measured += 1,
            }
        }

        tally
    }

    pub fn total(&self) -> usize {
        self.pass + self.failed + self.not_measured
    }

    /// Worst class present, failed first
    pub fn worst(&self) -> Option<StatusClass> {
        if self.failed > 0 {
            Some(StatusClass::Failed)
        } else if self.not_measured > 0 {
            Some(StatusClass::NotMeasured)
        } else if self.pass > 0 {
            Some(StatusClass::Pass)
        } else {
            None
        }
    }
}

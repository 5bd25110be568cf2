//! JSON export of the graph description

use crate::graph::ReportGraph;
use crate::report::Tally;
use serde::Serialize;
use std::io::{self, Write};

#[derive(Serialize)]
struct GraphExport<'a> {
    generated: String,
    tally: Tally,
    graph: &'a ReportGraph,
}

pub fn write<W: Write>(writer: &mut W, graph: &ReportGraph) -> io::Result<()> {
    let export = GraphExport {
        generated: chrono::Local::now().to_rfc3339(),
        tally: Tally::from_graph(graph),
        graph,
    };
    serde_json::to_writer_pretty(&mut *writer, &export)?;
    writeln!(writer)
}

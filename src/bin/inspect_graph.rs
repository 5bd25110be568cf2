//! Element table for a summary, for checking a report without a browser

use stagegraph::{build_report_graph, tap, ReportConfig, ReportKind, TapAction, ValidationSummary};
use std::env;

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: inspect_graph <summary.json> [validation|legacy]");
        std::process::exit(1);
    }

    let kind = match args.get(2).map(|k| k.parse::<ReportKind>()) {
        Some(Ok(kind)) => kind,
        Some(Err(e)) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
        None => ReportKind::default(),
    };

    let summary = match ValidationSummary::load(&args[1]) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to load {}: {}", args[1], e);
            std::process::exit(1);
        }
    };

    let config = ReportConfig::new(kind);
    let graph = match build_report_graph(&summary, &config) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("Failed to build graph: {}", e);
            std::process::exit(1);
        }
    };

    println!("\n{}", "=".repeat(78));
    println!("NODES ({} report)", kind);
    println!("{}", "=".repeat(78));
    println!("{:<20} {:<24} {:<8} {:<9} {}", "ID", "CLASSES", "HIDDEN", "POSITION", "TEXT");
    for node in &graph.nodes {
        println!(
            "{:<20} {:<24} {:<8} {:<9} {}",
            node.id,
            node.classes(),
            node.hidden,
            format!("{},{}", node.position.x, node.position.y),
            node.text.as_deref().unwrap_or("").replace('\n', " ")
        );
    }

    println!("\n{}", "=".repeat(78));
    println!("EDGES");
    println!("{}", "=".repeat(78));
    println!("{:<28} {:<20} {:<20} {:<13} {}", "ID", "SOURCE", "TARGET", "CLASS", "TEXT");
    for edge in &graph.edges {
        println!(
            "{:<28} {:<20} {:<20} {:<13} {}",
            edge.id, edge.source, edge.target, edge.status, edge.text
        );
    }

    println!("\n{}", "=".repeat(78));
    println!("TAP TARGETS");
    println!("{}", "=".repeat(78));
    let ids = graph
        .nodes
        .iter()
        .map(|n| n.id.as_str())
        .chain(graph.edges.iter().map(|e| e.id.as_str()));
    for id in ids {
        if let TapAction::Open { url } = tap(&graph, id) {
            println!("{:<28} -> {}", id, url);
        }
    }
}

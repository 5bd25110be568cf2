//! Edge synthesis from component pair counts

use super::{Edge, ReportGraph};
use crate::config::ReportConfig;
use crate::error::{Error, Result};
use crate::stage::Endpoint;
use crate::summary::{rendered_counts, PairKey, ValidationSummary};

/// Add one directed edge per pair key, in input order.
///
/// A pair with an `external` side is drawn to or from that stage's external
/// node, which becomes visible. Pair keys are unique by construction of
/// the summary; an edge id that already exists is an error.
pub fn synthesize_edges(
    graph: &mut ReportGraph,
    summary: &ValidationSummary,
    config: &ReportConfig,
) -> Result<()> {
    for (key, table) in &summary.pairs {
        let pair = PairKey::parse(key)?;
        let counts = rendered_counts("component pair", key, table)?;

        let (source, target) = endpoints(graph, &pair)?;
        graph.add_edge(Edge {
            id: pair.key.clone(),
            source,
            target,
            text: counts.ratio_label(),
            status: config.status_rule.classify(counts),
            html: Some(config.kind.pair_link(&pair.key)),
        })?;
    }
    Ok(())
}

/// Source and target node ids, revealing any external node used
fn endpoints(graph: &mut ReportGraph, pair: &PairKey) -> Result<(String, String)> {
    let ends = match (pair.producer, pair.consumer) {
        (Endpoint::Stage(producer), Endpoint::Stage(consumer)) => {
            (producer.box_id(), consumer.box_id())
        }
        (Endpoint::External, Endpoint::Stage(consumer)) => {
            let ext = consumer.external_id();
            graph.reveal(&ext);
            (ext, consumer.box_id())
        }
        (Endpoint::Stage(producer), Endpoint::External) => {
            let ext = producer.external_id();
            graph.reveal(&ext);
            (producer.box_id(), ext)
        }
        (Endpoint::External, Endpoint::External) => {
            return Err(Error::invalid_pair(&pair.key, "both sides are external"));
        }
    };
    Ok(ends)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReportKind;
    use crate::graph::build_base_graph;
    use crate::summary::{MetricCounts, MetricTable, StatusClass};

    fn pairs(entries: &[(&str, MetricCounts)]) -> ValidationSummary {
        let mut summary = ValidationSummary::default();
        for (key, counts) in entries {
            let mut table = MetricTable::new();
            table.insert("FREQUENCY".to_string(), *counts);
            summary.pairs.insert(key.to_string(), table);
        }
        summary
    }

    fn hidden_externals(graph: &ReportGraph) -> Vec<String> {
        graph
            .nodes
            .iter()
            .filter(|n| n.id.ends_with("_ext") && n.hidden)
            .map(|n| n.id.clone())
            .collect()
    }

    #[test]
    fn test_external_producer() {
        let mut graph = build_base_graph(ReportKind::Validation);
        let input = pairs(&[("external-sensing", MetricCounts::new(5, 0, 0))]);
        synthesize_edges(&mut graph, &input, &ReportConfig::default()).unwrap();

        let edge = graph.edge("external-sensing").unwrap();
        assert_eq!(edge.source, "sensing_ext");
        assert_eq!(edge.target, "sensing_box");
        assert_eq!(edge.text, "5/5");
        assert_eq!(edge.status, StatusClass::Pass);
        assert_eq!(edge.html.as_deref(), Some("validate_topic/external-sensing/index.html"));

        assert!(!graph.node("sensing_ext").unwrap().hidden);
        assert_eq!(hidden_externals(&graph).len(), 6);
    }

    #[test]
    fn test_external_consumer() {
        let mut graph = build_base_graph(ReportKind::Validation);
        let input = pairs(&[("control-external", MetricCounts::new(1, 1, 0))]);
        synthesize_edges(&mut graph, &input, &ReportConfig::default()).unwrap();

        let edge = graph.edge("control-external").unwrap();
        assert_eq!(edge.source, "control_box");
        assert_eq!(edge.target, "control_ext");
        assert_eq!(edge.status, StatusClass::Failed);
        assert!(!hidden_externals(&graph).contains(&"control_ext".to_string()));
    }

    #[test]
    fn test_internal_pair_reveals_nothing() {
        let mut graph = build_base_graph(ReportKind::Validation);
        let input = pairs(&[
            ("sensing-perception", MetricCounts::new(2, 0, 0)),
            ("planning-control", MetricCounts::new(0, 0, 4)),
        ]);
        synthesize_edges(&mut graph, &input, &ReportConfig::default()).unwrap();

        assert_eq!(hidden_externals(&graph).len(), 7);
        let edge = graph.edge("planning-control").unwrap();
        assert_eq!(edge.source, "planning_box");
        assert_eq!(edge.target, "control_box");
        assert_eq!(edge.text, "0/0");
        assert_eq!(edge.status, StatusClass::NotMeasured);
    }

    #[test]
    fn test_only_referenced_externals_revealed() {
        let mut graph = build_base_graph(ReportKind::Validation);
        let input = pairs(&[
            ("external-sensing", MetricCounts::new(1, 0, 0)),
            ("vehicle-external", MetricCounts::new(1, 0, 0)),
            ("external-vehicle", MetricCounts::new(1, 0, 0)),
        ]);
        synthesize_edges(&mut graph, &input, &ReportConfig::default()).unwrap();

        let mut visible: Vec<&str> = graph
            .visible_nodes()
            .filter(|n| n.id.ends_with("_ext"))
            .map(|n| n.id.as_str())
            .collect();
        visible.sort();
        assert_eq!(visible, vec!["sensing_ext", "vehicle_ext"]);
    }

    #[test]
    fn test_edges_follow_input_order() {
        let mut graph = build_base_graph(ReportKind::Validation);
        let input = pairs(&[
            ("vehicle-control", MetricCounts::new(1, 0, 0)),
            ("control-vehicle", MetricCounts::new(1, 0, 0)),
            ("localization-system", MetricCounts::new(1, 0, 0)),
        ]);
        synthesize_edges(&mut graph, &input, &ReportConfig::default()).unwrap();

        let ids: Vec<&str> = graph.edges.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["vehicle-control", "control-vehicle", "localization-system"]);
    }

    #[test]
    fn test_running_twice_rejects_duplicates() {
        let mut graph = build_base_graph(ReportKind::Validation);
        let input = pairs(&[("sensing-planning", MetricCounts::new(1, 0, 0))]);
        synthesize_edges(&mut graph, &input, &ReportConfig::default()).unwrap();

        let err = synthesize_edges(&mut graph, &input, &ReportConfig::default()).unwrap_err();
        assert!(matches!(err, Error::DuplicateElement { .. }));
        assert_eq!(graph.edges.len(), 1);
    }

    #[test]
    fn test_legacy_links_and_rule() {
        let mut graph = build_base_graph(ReportKind::Legacy);
        let input = pairs(&[("sensing-localization", MetricCounts::new(0, 3, 0))]);
        let config = ReportConfig::new(ReportKind::Legacy)
            .with_status_rule(crate::summary::StatusRule::LegacyAlwaysPass);
        synthesize_edges(&mut graph, &input, &config).unwrap();

        let edge = graph.edge("sensing-localization").unwrap();
        assert_eq!(edge.status, StatusClass::Pass);
        assert_eq!(edge.html.as_deref(), Some("topic/sensing-localization/index.html"));
    }

    #[test]
    fn test_invalid_key_in_unvalidated_summary() {
        let mut graph = build_base_graph(ReportKind::Validation);
        let input = pairs(&[("external-external", MetricCounts::new(1, 0, 0))]);
        let err = synthesize_edges(&mut graph, &input, &ReportConfig::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidPairKey { .. }));
        assert!(graph.edges.is_empty());
    }
}

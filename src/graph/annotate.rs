//! Component status annotation

use super::ReportGraph;
use crate::config::{ReportConfig, ReportKind};
use crate::error::Result;
use crate::stage::Stage;
use crate::summary::{rendered_counts, MetricCounts, StatusRule, ValidationSummary};
use tracing::{debug, warn};

/// Apply every component's counts to its result node and box.
///
/// Components that are not pipeline stages have nothing to draw on and are
/// skipped with a warning.
pub fn annotate_components(
    graph: &mut ReportGraph,
    summary: &ValidationSummary,
    config: &ReportConfig,
) -> Result<()> {
    for (name, table) in &summary.components {
        let counts = rendered_counts("component", name, table)?;
        match name.parse::<Stage>() {
            Ok(stage) => apply_component(graph, stage, counts, config.status_rule, config.kind),
            Err(e) => warn!(component = %name, "skipping component: {}", e),
        }
    }
    Ok(())
}

/// Label, class and link one stage
pub fn apply_component(
    graph: &mut ReportGraph,
    stage: Stage,
    counts: &MetricCounts,
    rule: StatusRule,
    kind: ReportKind,
) {
    let status = rule.classify(counts);
    let link = kind.component_link(stage.name());
    debug!(stage = %stage, %status, pass = counts.cnt_pass, total = counts.total(), "annotate");

    if let Some(result) = graph.node_mut(&stage.result_id()) {
        result.text = Some(format!("{}\n{}", stage.name(), counts.ratio_label()));
        result.status = Some(status);
        result.html = Some(link.clone());
    }
    if let Some(stage_box) = graph.node_mut(&stage.box_id()) {
        stage_box.status = Some(status);
        stage_box.html = Some(link);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::build_base_graph;
    use crate::summary::StatusClass;

    fn summary(json: &str) -> ValidationSummary {
        ValidationSummary::from_json_str(json).unwrap()
    }

    #[test]
    fn test_failed_component() {
        let mut graph = build_base_graph(ReportKind::Validation);
        let input = summary(
            r#"{"summary_callback_dict_component_metrics": {
                "sensing": {"FREQUENCY": {"cnt_pass": 8, "cnt_failed": 2, "cnt_not_measured": 0}}
            }}"#,
        );
        annotate_components(&mut graph, &input, &ReportConfig::default()).unwrap();

        let result = graph.node("sensing").unwrap();
        assert_eq!(result.text.as_deref(), Some("sensing\n8/10"));
        assert_eq!(result.status, Some(StatusClass::Failed));
        assert_eq!(result.html.as_deref(), Some("validate_callback/sensing/index.html"));

        let stage_box = graph.node("sensing_box").unwrap();
        assert_eq!(stage_box.status, Some(StatusClass::Failed));
        assert_eq!(stage_box.html.as_deref(), Some("validate_callback/sensing/index.html"));
    }

    #[test]
    fn test_labels_match_counts_for_every_stage() {
        let mut graph = build_base_graph(ReportKind::Validation);
        let mut input = ValidationSummary::default();
        for (i, stage) in Stage::ALL.iter().enumerate() {
            let mut table = crate::summary::MetricTable::new();
            table.insert(
                "FREQUENCY".to_string(),
                MetricCounts::new(i as u64 * 3, i as u64, 0),
            );
            input.components.insert(stage.name().to_string(), table);
        }
        annotate_components(&mut graph, &input, &ReportConfig::default()).unwrap();

        for (i, stage) in Stage::ALL.iter().enumerate() {
            let pass = i as u64 * 3;
            let total = pass + i as u64;
            let expected = format!("{}\n{}/{}", stage.name(), pass, total);
            assert_eq!(graph.node(stage.name()).unwrap().text.as_deref(), Some(expected.as_str()));
        }
    }

    #[test]
    fn test_not_measured_takes_precedence() {
        let mut graph = build_base_graph(ReportKind::Validation);
        let input = summary(
            r#"{"summary_callback_dict_component_metrics": {
                "planning": {"FREQUENCY": {"cnt_pass": 3, "cnt_failed": 4, "cnt_not_measured": 1}}
            }}"#,
        );
        annotate_components(&mut graph, &input, &ReportConfig::default()).unwrap();
        assert_eq!(graph.node("planning").unwrap().status, Some(StatusClass::NotMeasured));
        assert_eq!(graph.node("planning").unwrap().text.as_deref(), Some("planning\n3/7"));
    }

    #[test]
    fn test_legacy_rule_reproduces_always_pass() {
        let mut graph = build_base_graph(ReportKind::Legacy);
        let input = summary(
            r#"{"summary_callback_dict_component_metrics": {
                "planning": {"FREQUENCY": {"cnt_pass": 3, "cnt_failed": 4, "cnt_not_measured": 1}}
            }}"#,
        );
        let config = ReportConfig::new(ReportKind::Legacy).with_status_rule(StatusRule::LegacyAlwaysPass);
        annotate_components(&mut graph, &input, &config).unwrap();

        let planning = graph.node("planning").unwrap();
        assert_eq!(planning.status, Some(StatusClass::Pass));
        assert_eq!(planning.html.as_deref(), Some("callback/planning/index.html"));
    }

    #[test]
    fn test_unknown_component_skipped() {
        let mut graph = build_base_graph(ReportKind::Validation);
        let before = graph.clone();
        let input = summary(
            r#"{"summary_callback_dict_component_metrics": {
                "other": {"FREQUENCY": {"cnt_pass": 1, "cnt_failed": 1, "cnt_not_measured": 0}}
            }}"#,
        );
        annotate_components(&mut graph, &input, &ReportConfig::default()).unwrap();
        assert_eq!(graph, before);
    }

    #[test]
    fn test_untouched_stages_keep_placeholders() {
        let mut graph = build_base_graph(ReportKind::Validation);
        let input = summary(
            r#"{"summary_callback_dict_component_metrics": {
                "control": {"FREQUENCY": {"cnt_pass": 1, "cnt_failed": 0, "cnt_not_measured": 0}}
            }}"#,
        );
        annotate_components(&mut graph, &input, &ReportConfig::default()).unwrap();

        let vehicle = graph.node("vehicle").unwrap();
        assert_eq!(vehicle.text.as_deref(), Some("vehicle\n0/0"));
        assert!(vehicle.status.is_none());
        assert!(vehicle.html.is_none());
    }
}

//! HTML report page with a Cytoscape.js stage diagram

use crate::config::{html_escape, ReportConfig};
use crate::graph::{Node, ReportGraph, Viewport};
use crate::interaction::tap_handler_script;
use crate::report::Tally;
use serde_json::{json, Value};
use std::io::{self, Write};

pub const CYTOSCAPE_SRC: &str = "https://unpkg.com/cytoscape@3.28.1/dist/cytoscape.min.js";

pub fn write<W: Write>(writer: &mut W, graph: &ReportGraph, config: &ReportConfig) -> io::Result<()> {
    let tally = Tally::from_graph(graph);
    let style_json = script_json(&stylesheet());
    let elements_json = script_json(&elements(graph));
    let viewport_js = viewport_script(&graph.viewport);
    let tap_js = tap_handler_script();

    write!(writer, r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <script src="{cytoscape_src}"></script>
    <style>
        :root {{
            --bg: #0d1117;
            --card: #161b22;
            --border: #30363d;
            --text: #e6edf3;
            --dim: #7d8590;
            --pass: #3fb950;
            --failed: #f85149;
            --not-measured: #d29922;
            --accent: #58a6ff;
        }}
        * {{ box-sizing: border-box; margin: 0; padding: 0; }}
        body {{
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', 'Noto Sans', Helvetica, Arial, sans-serif;
            background: var(--bg);
            color: var(--text);
            line-height: 1.5;
        }}
        .container {{ max-width: 1600px; margin: 0 auto; padding: 2rem; }}

        /* Header */
        .header {{
            display: flex;
            align-items: center;
            justify-content: space-between;
            margin-bottom: 1.5rem;
            padding-bottom: 1rem;
            border-bottom: 1px solid var(--border);
        }}
        .title {{ font-size: 2rem; font-weight: 800; }}
        .back {{ color: var(--accent); text-decoration: none; }}
        .back:hover {{ text-decoration: underline; }}
        .note {{ color: var(--dim); margin-bottom: 1.5rem; }}
        .note ul {{ margin-left: 1.5rem; }}

        /* Stats Row */
        .stats {{
            display: grid;
            grid-template-columns: repeat(3, 1fr);
            gap: 1rem;
            margin-bottom: 1.5rem;
        }}
        .stat {{
            background: var(--card);
            border: 1px solid var(--border);
            border-radius: 12px;
            padding: 1rem;
            text-align: center;
        }}
        .stat-value {{ font-size: 2.5rem; font-weight: 700; line-height: 1; }}
        .stat-label {{ color: var(--dim); font-size: 0.875rem; text-transform: uppercase; letter-spacing: 0.05em; margin-top: 0.5rem; }}
        .stat.pass .stat-value {{ color: var(--pass); }}
        .stat.failed .stat-value {{ color: var(--failed); }}
        .stat.not-measured .stat-value {{ color: var(--not-measured); }}

        /* Diagram */
        #cy {{
            width: 100%;
            height: 70vh;
            background: #fff;
            border: 1px solid var(--border);
            border-radius: 12px;
        }}

        /* Footer */
        .footer {{
            margin-top: 2rem;
            padding-top: 1rem;
            border-top: 1px solid var(--border);
            color: var(--dim);
            font-size: 0.875rem;
            text-align: center;
        }}
    </style>
</head>
<body>
    <div class="container">
        <div class="header">
            <div class="title">{title}</div>
            <a class="back" href="../index.html">{link_back}</a>
        </div>

        <div class="note">{note_top}</div>

        <div class="stats">
            <div class="stat pass">
                <div class="stat-value">{pass}</div>
                <div class="stat-label">Pass</div>
            </div>
            <div class="stat failed">
                <div class="stat-value">{failed}</div>
                <div class="stat-label">Failed</div>
            </div>
            <div class="stat not-measured">
                <div class="stat-value">{not_measured}</div>
                <div class="stat-label">Not Measured</div>
            </div>
        </div>

        <div id="cy"></div>

        <div class="note">{note_bottom}</div>

        <div class="footer">
            Generated by stagegraph v{version} &middot; {kind} report
        </div>
    </div>

    <script>
var cy = (window.cy = cytoscape({{
  container: document.getElementById("cy"),
  style: {style_json},
  elements: {elements_json},
  layout: {{ name: "preset" }},
}}));

{viewport_js}
{tap_js}
    </script>
</body>
</html>
"#,
        title = html_escape(&config.title),
        cytoscape_src = CYTOSCAPE_SRC,
        link_back = html_escape(&config.link_back),
        note_top = config.note_top_with_trace_info(),
        note_bottom = config.note_bottom.as_deref().unwrap_or(""),
        pass = tally.pass,
        failed = tally.failed,
        not_measured = tally.not_measured,
        version = env!("CARGO_PKG_VERSION"),
        kind = graph.kind,
        style_json = style_json,
        elements_json = elements_json,
        viewport_js = viewport_js,
        tap_js = tap_js,
    )?;

    Ok(())
}

/// Diagram stylesheet in Cytoscape's selector/style form
pub fn stylesheet() -> Value {
    json!([
        {
            "selector": "node",
            "style": {
                "label": "data(text)",
                "font-size": "10",
                "text-wrap": "wrap",
                "width": "20",
                "height": "20"
            }
        },
        {
            "selector": ":parent",
            "style": {
                "label": "",
                "shape": "round-rectangle"
            }
        },
        {
            "selector": ".result",
            "style": {
                "text-valign": "center",
                "text-halign": "right"
            }
        },
        {
            "selector": ".external",
            "style": {
                "text-valign": "top",
                "text-halign": "center",
                "shape": "round-rectangle",
                "width": "10",
                "height": "10",
                "background-color": "#333"
            }
        },
        {
            "selector": "edge",
            "style": {
                "source-label": "data(text)",
                "source-text-offset": 25,
                "font-size": "10",
                "curve-style": "bezier",
                "target-arrow-shape": "triangle",
                "text-background-color": "#FFF",
                "text-background-opacity": "0.8"
            }
        },
        status_rule(".pass", "#0F0", "#0F0"),
        status_rule(".failed", "#F00", "#F00"),
        status_rule(".not_measured", "#FF0", "#EE0"),
    ])
}

fn status_rule(selector: &str, fill: &str, line: &str) -> Value {
    json!({
        "selector": selector,
        "style": {
            "background-color": fill,
            "line-color": line,
            "target-arrow-color": line
        }
    })
}

/// Graph elements in Cytoscape's element form, with preset positions
pub fn elements(graph: &ReportGraph) -> Value {
    let nodes = graph.nodes.iter().map(node_element);
    let edges = graph.edges.iter().map(|edge| {
        let mut data = json!({
            "id": edge.id,
            "source": edge.source,
            "target": edge.target,
            "text": edge.text,
        });
        if let Some(ref html) = edge.html {
            data["html"] = json!(html);
        }
        json!({
            "group": "edges",
            "data": data,
            "classes": edge.classes(),
        })
    });
    Value::Array(nodes.chain(edges).collect())
}

fn node_element(node: &Node) -> Value {
    let mut data = json!({ "id": node.id });
    if let Some(ref parent) = node.parent {
        data["parent"] = json!(parent);
    }
    if let Some(ref text) = node.text {
        data["text"] = json!(text);
    }
    if let Some(ref html) = node.html {
        data["html"] = json!(html);
    }

    let mut element = json!({
        "group": "nodes",
        "data": data,
        "classes": node.classes(),
        "position": { "x": node.position.x, "y": node.position.y },
    });
    if node.hidden {
        element["style"] = json!({ "visibility": "hidden" });
    }
    element
}

fn viewport_script(viewport: &Viewport) -> String {
    let mut lines = Vec::new();
    if viewport.fit {
        lines.push("cy.fit();");
    }
    lines.push(if viewport.zooming_enabled {
        "cy.zoomingEnabled(true);"
    } else {
        "cy.zoomingEnabled(false);"
    });
    lines.push(if viewport.panning_enabled {
        "cy.panningEnabled(true);"
    } else {
        "cy.panningEnabled(false);"
    });
    lines.push(if viewport.box_selection_enabled {
        "cy.boxSelectionEnabled(true);"
    } else {
        "cy.boxSelectionEnabled(false);"
    });
    if viewport.elements_locked {
        lines.push("cy.elements().lock();");
    }
    if !viewport.elements_selectable {
        lines.push("cy.elements().unselectify();");
    }
    lines.join("\n")
}

/// JSON that is safe to inline in a `<script>` element
fn script_json(value: &Value) -> String {
    // '<' only occurs inside strings, where the escape is equivalent
    value.to_string().replace('<', "\\u003c")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReportKind;
    use crate::graph::build_report_graph;
    use crate::summary::ValidationSummary;

    fn render(summary: &str, config: &ReportConfig) -> String {
        let summary = ValidationSummary::from_json_str(summary).unwrap();
        let graph = build_report_graph(&summary, config).unwrap();
        let mut out = Vec::new();
        write(&mut out, &graph, config).unwrap();
        String::from_utf8(out).unwrap()
    }

    const SUMMARY: &str = r#"{
        "summary_callback_dict_component_metrics": {
            "sensing": {"FREQUENCY": {"cnt_pass": 8, "cnt_failed": 2, "cnt_not_measured": 0}}
        },
        "summary_topic_dict_component_pair_metrics": {
            "external-sensing": {"FREQUENCY": {"cnt_pass": 5, "cnt_failed": 0, "cnt_not_measured": 0}}
        }
    }"#;

    #[test]
    fn test_page_structure() {
        let html = render(SUMMARY, &ReportConfig::default());
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains(r#"<div id="cy"></div>"#));
        assert!(html.contains(CYTOSCAPE_SRC));
        assert!(html.contains("<title>Validation report</title>"));
        assert!(html.contains(r#"<a class="back" href="../index.html">Back</a>"#));
    }

    #[test]
    fn test_page_embeds_elements_and_handlers() {
        let html = render(SUMMARY, &ReportConfig::default());
        assert!(html.contains(r#""text":"sensing\n8/10""#));
        assert!(html.contains(r#""html":"validate_callback/sensing/index.html""#));
        assert!(html.contains(r#""source":"sensing_ext""#));
        assert!(html.contains(r#"cy.on("tap", "edge", openDetail);"#));
        assert!(html.contains("cy.zoomingEnabled(false);"));
        assert!(html.contains("cy.panningEnabled(false);"));
        assert!(html.contains("cy.elements().unselectify();"));
    }

    #[test]
    fn test_hidden_externals_styled_hidden() {
        let summary = ValidationSummary::from_json_str(SUMMARY).unwrap();
        let graph = build_report_graph(&summary, &ReportConfig::default()).unwrap();
        let elements = elements(&graph);
        let items = elements.as_array().unwrap();

        let find = |id: &str| {
            items
                .iter()
                .find(|e| e["data"]["id"] == json!(id))
                .unwrap()
                .clone()
        };
        assert!(find("sensing_ext").get("style").is_none());
        assert_eq!(find("planning_ext")["style"]["visibility"], json!("hidden"));
        assert_eq!(find("sensing")["classes"], json!("result failed"));
        assert_eq!(find("external-sensing")["classes"], json!("pass"));
        assert_eq!(find("external-sensing")["group"], json!("edges"));
    }

    #[test]
    fn test_stylesheet_has_status_rules() {
        let sheet = stylesheet();
        let selectors: Vec<&str> = sheet
            .as_array()
            .unwrap()
            .iter()
            .map(|rule| rule["selector"].as_str().unwrap())
            .collect();
        assert_eq!(
            selectors,
            vec!["node", ":parent", ".result", ".external", "edge", ".pass", ".failed", ".not_measured"]
        );
    }

    #[test]
    fn test_title_escaped_and_script_safe() {
        let config = ReportConfig::new(ReportKind::Legacy).with_title("a <b> & c");
        let summary = ValidationSummary::from_json_str(SUMMARY).unwrap();
        let mut graph = build_report_graph(&summary, &config).unwrap();
        graph.node_mut("sensing").unwrap().text = Some("</script><script>alert(1)".to_string());

        let mut out = Vec::new();
        write(&mut out, &graph, &config).unwrap();
        let html = String::from_utf8(out).unwrap();

        assert!(html.contains("<title>a &lt;b&gt; &amp; c</title>"));
        // Only the page's own two script elements close
        assert_eq!(html.matches("</script>").count(), 2);
        assert!(html.contains(r#"\u003c/script>\u003cscript>alert(1)"#));
    }

    #[test]
    fn test_notes_rendered() {
        let mut config = ReportConfig::default().with_trace_name("drive_20230415123045");
        config.note_bottom = Some("<p>bottom note</p>".to_string());
        let html = render(SUMMARY, &config);
        assert!(html.contains("<li>trace_data: drive_20230415123045</li>"));
        assert!(html.contains("<p>bottom note</p>"));
    }

    #[test]
    fn test_script_json_escapes_angle_brackets() {
        assert_eq!(script_json(&json!("</script>")), r#""\u003c/script>""#);
    }
}

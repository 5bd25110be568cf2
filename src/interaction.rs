//! Tap handling
//!
//! The diagram is read-only; the one thing a viewer can do is tap a node
//! or edge to open its detail report in a new tab. This module holds that
//! decision as plain Rust, so it can be tested without a browser, and the
//! script fragment the HTML page installs to carry it out.

use crate::graph::ReportGraph;

/// Browsing context detail pages open in
pub const OPEN_TARGET: &str = "_blank";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TapAction {
    /// Open `url` in a new browsing context
    Open { url: String },
    /// Nothing to open
    Ignore,
}

/// Resolve a tap on the element with `id`.
///
/// Elements without a link, and ids that are not in the graph, are a no-op
/// for nodes and edges alike.
pub fn tap(graph: &ReportGraph, id: &str) -> TapAction {
    match graph.element(id).and_then(|element| element.html()) {
        Some(url) => TapAction::Open { url: url.to_string() },
        None => TapAction::Ignore,
    }
}

/// Script installing the tap handlers on the Cytoscape instance `cy`
pub fn tap_handler_script() -> String {
    format!(
        r#"function openDetail(evt) {{
  const html = evt.target.data("html");
  if (html != null) {{
    window.open(html, "{target}");
  }}
}}
cy.on("tap", "node", openDetail);
cy.on("tap", "edge", openDetail);
"#,
        target = OPEN_TARGET
    )
}

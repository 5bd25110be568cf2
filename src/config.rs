//! Report configuration
//!
//! Two generations of the stage graph page exist. They differ only in the
//! directory names of the linked detail reports and in a few layout
//! coordinates, so both are served by one renderer and selected with
//! [`ReportKind`].

use crate::stage::{StageLayout, LEGACY_LAYOUT, VALIDATION_LAYOUT};
use crate::summary::StatusRule;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

pub const DEFAULT_TITLE: &str = "Validation report";
pub const DEFAULT_LINK_BACK: &str = "Back";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    /// `validate_callback/` and `validate_topic/` detail directories
    #[default]
    Validation,
    /// `callback/` and `topic/` detail directories
    Legacy,
}

impl ReportKind {
    pub fn callback_dir(self) -> &'static str {
        match self {
            ReportKind::Validation => "validate_callback",
            ReportKind::Legacy => "callback",
        }
    }

    pub fn topic_dir(self) -> &'static str {
        match self {
            ReportKind::Validation => "validate_topic",
            ReportKind::Legacy => "topic",
        }
    }

    pub fn layout(self) -> &'static [StageLayout] {
        match self {
            ReportKind::Validation => &VALIDATION_LAYOUT,
            ReportKind::Legacy => &LEGACY_LAYOUT,
        }
    }

    /// Link to the detail page of one component
    pub fn component_link(self, component: &str) -> String {
        format!("{}/{}/index.html", self.callback_dir(), component)
    }

    /// Link to the detail page of one component pair
    pub fn pair_link(self, pair_key: &str) -> String {
        format!("{}/{}/index.html", self.topic_dir(), pair_key)
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportKind::Validation => f.write_str("validation"),
            ReportKind::Legacy => f.write_str("legacy"),
        }
    }
}

impl FromStr for ReportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "validation" => Ok(ReportKind::Validation),
            "legacy" => Ok(ReportKind::Legacy),
            other => Err(format!(
                "unknown report kind '{}' (expected 'validation' or 'legacy')",
                other
            )),
        }
    }
}

/// Everything besides the summary that shapes a rendered report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    pub kind: ReportKind,
    pub status_rule: StatusRule,
    pub title: String,
    pub trace_name: Option<String>,
    /// Raw HTML placed above the diagram
    pub note_top: Option<String>,
    /// Raw HTML placed below the diagram
    pub note_bottom: Option<String>,
    pub link_back: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            kind: ReportKind::default(),
            status_rule: StatusRule::default(),
            title: DEFAULT_TITLE.to_string(),
            trace_name: None,
            note_top: None,
            note_bottom: None,
            link_back: DEFAULT_LINK_BACK.to_string(),
        }
    }
}

impl ReportConfig {
    pub fn new(kind: ReportKind) -> Self {
        Self { kind, ..Self::default() }
    }

    pub fn with_status_rule(mut self, rule: StatusRule) -> Self {
        self.status_rule = rule;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_trace_name(mut self, name: impl Into<String>) -> Self {
        self.trace_name = Some(name.into());
        self
    }

    pub fn with_link_back(mut self, text: impl Into<String>) -> Self {
        self.link_back = text.into();
        self
    }

    /// Load note files; a path that does not exist is skipped
    pub fn with_note_files(mut self, top: Option<&Path>, bottom: Option<&Path>) -> std::io::Result<Self> {
        self.note_top = read_optional(top)?;
        self.note_bottom = read_optional(bottom)?;
        Ok(self)
    }

    /// Top note followed by the trace information list
    pub fn note_top_with_trace_info(&self) -> String {
        let mut html = self.note_top.clone().unwrap_or_default();
        if let Some(ref trace_name) = self.trace_name {
            let started = trace_start_datetime(trace_name)
                .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "unknown".to_string());
            html.push_str("<ul>\n");
            html.push_str(&format!("<li>trace_data: {}</li>\n", html_escape(trace_name)));
            html.push_str(&format!("<li>trace_start_datetime: {}</li>\n", started));
            html.push_str("</ul>\n");
        }
        html
    }
}

fn read_optional(path: Option<&Path>) -> std::io::Result<Option<String>> {
    match path {
        Some(p) if p.exists() => std::fs::read_to_string(p).map(Some),
        Some(p) => {
            debug!(path = %p.display(), "note file not found, skipping");
            Ok(None)
        }
        None => Ok(None),
    }
}

/// Trace recordings are named after their start time, either
/// `YYYYMMDDhhmmss` or `YYYYMMDD-hhmmss` somewhere in the name.
pub fn trace_start_datetime(trace_name: &str) -> Option<NaiveDateTime> {
    let bytes = trace_name.as_bytes();
    let digits_at = |start: usize, len: usize| {
        bytes
            .get(start..start + len)
            .map(|run| run.iter().all(u8::is_ascii_digit))
            .unwrap_or(false)
    };

    for start in 0..bytes.len() {
        if digits_at(start, 14) {
            let run = &trace_name[start..start + 14];
            if let Ok(dt) = NaiveDateTime::parse_from_str(run, "%Y%m%d%H%M%S") {
                return Some(dt);
            }
        }
    }
    for start in 0..bytes.len() {
        if digits_at(start, 8) && bytes.get(start + 8) == Some(&b'-') && digits_at(start + 9, 6) {
            let run = &trace_name[start..start + 15];
            if let Ok(dt) = NaiveDateTime::parse_from_str(run, "%Y%m%d-%H%M%S") {
                return Some(dt);
            }
        }
    }
    None
}

pub(crate) fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

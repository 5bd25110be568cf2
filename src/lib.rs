//! stagegraph - Pipeline validation results as a stage diagram
//!
//! stagegraph turns the summary written by an autonomous-driving validation
//! run into a static HTML page: one box per pipeline stage, one arrow per
//! producer/consumer pair, each colored by whether its checks passed.
//! Clicking a stage or arrow opens the detailed report for it.
//!
//! # Overview
//!
//! The pipeline is a fixed set of stages: sensing, localization,
//! perception, planning, control, vehicle and system. For each stage the
//! summary carries pass / failed / not-measured counts of its callback
//! checks, and for each stage pair the counts of the topic checks between
//! them. Pairs may name `external` as one side for traffic entering or
//! leaving the pipeline.
//!
//! # Quick Start
//!
//! ```no_run
//! use stagegraph::{build_report_graph, report, ReportConfig, ValidationSummary};
//!
//! let summary = ValidationSummary::load("report/summary.json")?;
//! let config = ReportConfig::default();
//! let graph = build_report_graph(&summary, &config)?;
//!
//! report::generate("report/index.html", &graph, &config)?;
//! # Ok::<(), stagegraph::Error>(())
//! ```
//!
//! # Status Classes
//!
//! | Counts | Class | Color |
//! |--------|-------|-------|
//! | any not measured | `not_measured` | yellow |
//! | any failed | `failed` | red |
//! | otherwise | `pass` | green |
//!
//! Labels show `pass/total`, where total is pass + failed.
//!
//! # Modules
//!
//! - [`summary`]: input document, counts and status rules
//! - [`stage`]: the stage set and its layout tables
//! - [`graph`]: building the diagram description
//! - [`interaction`]: what a tap on the diagram does
//! - [`report`]: output formatters (HTML, JSON)
//! - [`serve`]: local preview server

pub mod config;
pub mod error;
pub mod graph;
pub mod interaction;
pub mod report;
pub mod serve;
pub mod stage;
pub mod summary;

pub use config::{ReportConfig, ReportKind};
pub use error::{Error, Result};
pub use graph::{build_report_graph, Edge, Node, ReportGraph};
pub use interaction::{tap, TapAction};
pub use stage::Stage;
pub use summary::{MetricCounts, StatusClass, StatusRule, ValidationSummary};

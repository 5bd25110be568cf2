//! Pipeline stages and their fixed diagram layout
//!
//! The pipeline is a closed set of seven stages. Each stage is drawn as a
//! compound "box" node holding one "result" node, plus a hidden "external"
//! node placed beside the box for traffic that enters or leaves the modeled
//! pipeline.
//!
//! Coordinates are stored once per report layout in a table rather than
//! being repeated per element, so the external node offset is derived from
//! the side a stage faces instead of being hard-coded twice.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Horizontal distance between a stage box and its external node
pub const EXTERNAL_OFFSET: f64 = 100.0;

/// Token used in pair keys for an endpoint outside the pipeline
pub const EXTERNAL_TOKEN: &str = "external";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Sensing,
    Localization,
    Perception,
    Planning,
    Control,
    Vehicle,
    System,
}

impl Stage {
    pub const ALL: [Stage; 7] = [
        Stage::Sensing,
        Stage::Localization,
        Stage::Perception,
        Stage::Planning,
        Stage::Control,
        Stage::Vehicle,
        Stage::System,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Stage::Sensing => "sensing",
            Stage::Localization => "localization",
            Stage::Perception => "perception",
            Stage::Planning => "planning",
            Stage::Control => "control",
            Stage::Vehicle => "vehicle",
            Stage::System => "system",
        }
    }

    /// Id of the result node, which is the bare stage name
    pub fn result_id(self) -> String {
        self.name().to_string()
    }

    pub fn box_id(self) -> String {
        format!("{}_box", self.name())
    }

    pub fn external_id(self) -> String {
        format!("{}_ext", self.name())
    }

    /// Which side of the box the external node is drawn on
    pub fn external_side(self) -> Side {
        match self {
            Stage::Sensing | Stage::Localization | Stage::Vehicle | Stage::System => Side::Left,
            Stage::Perception | Stage::Planning | Stage::Control => Side::Right,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStage(pub String);

impl fmt::Display for UnknownStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown pipeline stage '{}'", self.0)
    }
}

impl std::error::Error for UnknownStage {}

impl FromStr for Stage {
    type Err = UnknownStage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stage::ALL
            .iter()
            .copied()
            .find(|stage| stage.name() == s)
            .ok_or_else(|| UnknownStage(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    fn sign(self) -> f64 {
        match self {
            Side::Left => -1.0,
            Side::Right => 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset_x(self, dx: f64) -> Self {
        Self { x: self.x + dx, y: self.y }
    }
}

/// One row of a layout table: where a stage's result node sits
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageLayout {
    pub stage: Stage,
    pub result: Position,
}

impl StageLayout {
    /// A compound node is centered on its only child
    pub fn box_position(&self) -> Position {
        self.result
    }

    pub fn external_position(&self) -> Position {
        self.box_position()
            .offset_x(self.stage.external_side().sign() * EXTERNAL_OFFSET)
    }
}

const fn row(stage: Stage, x: f64, y: f64) -> StageLayout {
    StageLayout { stage, result: Position::new(x, y) }
}

/// Layout used by the validation report page
pub const VALIDATION_LAYOUT: [StageLayout; 7] = [
    row(Stage::Sensing, -50.0, 0.0),
    row(Stage::Localization, 0.0, 100.0),
    row(Stage::Perception, 200.0, 100.0),
    row(Stage::Planning, 250.0, 0.0),
    row(Stage::Control, 250.0, -100.0),
    row(Stage::Vehicle, 50.0, -100.0),
    row(Stage::System, 150.0, -170.0),
];

/// Layout used by the older top-level result page
pub const LEGACY_LAYOUT: [StageLayout; 7] = [
    row(Stage::Sensing, 0.0, 0.0),
    row(Stage::Localization, 0.0, 100.0),
    row(Stage::Perception, 200.0, 100.0),
    row(Stage::Planning, 200.0, 0.0),
    row(Stage::Control, 250.0, -100.0),
    row(Stage::Vehicle, 50.0, -100.0),
    row(Stage::System, 150.0, -200.0),
];

/// One side of a `<producer>-<consumer>` pair key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Stage(Stage),
    External,
}

impl FromStr for Endpoint {
    type Err = UnknownStage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == EXTERNAL_TOKEN {
            Ok(Endpoint::External)
        } else {
            s.parse().map(Endpoint::Stage)
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Stage(stage) => stage.fmt(f),
            Endpoint::External => f.write_str(EXTERNAL_TOKEN),
        }
    }
}

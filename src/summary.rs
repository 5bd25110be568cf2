//! Validation summary input
//!
//! The upstream validation pipeline writes one JSON document per report
//! directory with two maps: per-component counts and per-component-pair
//! counts, each broken down by metric. This module loads that document,
//! checks its shape at the boundary and exposes the pieces the graph
//! needs.
//!
//! ```json
//! {
//!   "summary_callback_dict_component_metrics": {
//!     "sensing": { "FREQUENCY": { "cnt_pass": 8, "cnt_failed": 2, "cnt_not_measured": 0 } }
//!   },
//!   "summary_topic_dict_component_pair_metrics": {
//!     "external-sensing": { "FREQUENCY": { "cnt_pass": 5, "cnt_failed": 0, "cnt_not_measured": 0 } }
//!   }
//! }
//! ```

use crate::error::{Error, Result};
use crate::stage::{Endpoint, EXTERNAL_TOKEN};
use indexmap::IndexMap;
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use std::path::Path;

/// Metric drawn on the stage graph. Tables also carry `PERIOD` and
/// `LATENCY` records, which are loaded but not rendered.
pub const RENDERED_METRIC: &str = "FREQUENCY";

/// Result counts for one metric of one component or component pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MetricCounts {
    pub cnt_pass: u64,
    pub cnt_failed: u64,
    pub cnt_not_measured: u64,
    #[serde(default)]
    pub cnt_out_of_scope: u64,
    #[serde(default)]
    pub cnt_dont_care: u64,
}

impl MetricCounts {
    pub fn new(pass: u64, failed: u64, not_measured: u64) -> Self {
        Self {
            cnt_pass: pass,
            cnt_failed: failed,
            cnt_not_measured: not_measured,
            ..Self::default()
        }
    }

    /// Checks that produced a verdict; not-measured ones are excluded
    pub fn total(&self) -> u64 {
        self.cnt_pass.saturating_add(self.cnt_failed)
    }

    /// `"<pass>/<total>"`
    pub fn ratio_label(&self) -> String {
        format!("{}/{}", self.cnt_pass, self.total())
    }
}

/// Visual status class of a node or edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusClass {
    Pass,
    Failed,
    NotMeasured,
}

impl StatusClass {
    pub fn as_str(self) -> &'static str {
        match self {
            StatusClass::Pass => "pass",
            StatusClass::Failed => "failed",
            StatusClass::NotMeasured => "not_measured",
        }
    }
}

impl fmt::Display for StatusClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How counts map to a status class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusRule {
    /// not_measured > failed > pass
    #[default]
    Prioritized,
    /// Every element is classed `pass` regardless of counts.
    ///
    /// Reproduces the older top page, whose class assignment was shadowed
    /// inside its conditional blocks. Only used when asked for explicitly.
    LegacyAlwaysPass,
}

impl StatusRule {
    pub fn classify(self, counts: &MetricCounts) -> StatusClass {
        match self {
            StatusRule::LegacyAlwaysPass => StatusClass::Pass,
            StatusRule::Prioritized => {
                if counts.cnt_not_measured > 0 {
                    StatusClass::NotMeasured
                } else if counts.cnt_failed > 0 {
                    StatusClass::Failed
                } else {
                    StatusClass::Pass
                }
            }
        }
    }
}

/// Counts per metric name for one component or pair.
///
/// Keyed by the raw metric name so records for metrics this crate does not
/// know about are carried along instead of rejected.
pub type MetricTable = IndexMap<String, MetricCounts>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationSummary {
    #[serde(
        rename = "summary_callback_dict_component_metrics",
        default,
        deserialize_with = "unique_keys"
    )]
    pub components: IndexMap<String, MetricTable>,

    #[serde(
        rename = "summary_topic_dict_component_pair_metrics",
        alias = "summary_topic_dict_componentpair_metrics",
        default,
        deserialize_with = "unique_keys"
    )]
    pub pairs: IndexMap<String, MetricTable>,
}

impl ValidationSummary {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Parse and validate a summary document
    pub fn from_json_str(text: &str) -> Result<Self> {
        let summary: ValidationSummary =
            serde_json::from_str(text).map_err(|e| Error::malformed(e.to_string()))?;
        summary.validate()?;
        Ok(summary)
    }

    /// Every entry must carry the rendered metric and every pair key must parse
    pub fn validate(&self) -> Result<()> {
        for (name, table) in &self.components {
            rendered_counts("component", name, table)?;
        }
        for (key, table) in &self.pairs {
            PairKey::parse(key)?;
            rendered_counts("component pair", key, table)?;
        }
        Ok(())
    }

    pub fn component_counts(&self, name: &str) -> Result<&MetricCounts> {
        let table = self
            .components
            .get(name)
            .ok_or_else(|| Error::malformed(format!("no component named '{}'", name)))?;
        rendered_counts("component", name, table)
    }

    pub fn pair_counts(&self, key: &str) -> Result<&MetricCounts> {
        let table = self
            .pairs
            .get(key)
            .ok_or_else(|| Error::malformed(format!("no component pair '{}'", key)))?;
        rendered_counts("component pair", key, table)
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty() && self.pairs.is_empty()
    }
}

pub(crate) fn rendered_counts<'a>(
    what: &str,
    name: &str,
    table: &'a MetricTable,
) -> Result<&'a MetricCounts> {
    table.get(RENDERED_METRIC).ok_or_else(|| {
        Error::malformed(format!(
            "{} '{}' has no {} record",
            what,
            name,
            RENDERED_METRIC
        ))
    })
}

/// A parsed `<producer>-<consumer>` key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairKey {
    pub key: String,
    pub producer: Endpoint,
    pub consumer: Endpoint,
}

impl PairKey {
    pub fn parse(key: &str) -> Result<Self> {
        let (producer, consumer) = key
            .split_once('-')
            .ok_or_else(|| Error::invalid_pair(key, "missing '-' separator"))?;

        let producer: Endpoint = producer
            .parse()
            .map_err(|e: crate::stage::UnknownStage| Error::invalid_pair(key, e.to_string()))?;
        let consumer: Endpoint = consumer
            .parse()
            .map_err(|e: crate::stage::UnknownStage| Error::invalid_pair(key, e.to_string()))?;

        if producer == Endpoint::External && consumer == Endpoint::External {
            return Err(Error::invalid_pair(
                key,
                format!("both sides are '{}'", EXTERNAL_TOKEN),
            ));
        }

        Ok(Self {
            key: key.to_string(),
            producer,
            consumer,
        })
    }
}

/// Deserialize a JSON object into an ordered map, rejecting repeated keys.
///
/// serde_json keeps the last value of a repeated key; for component pairs
/// that would silently drop an edge.
fn unique_keys<'de, D, V>(deserializer: D) -> std::result::Result<IndexMap<String, V>, D::Error>
where
    D: Deserializer<'de>,
    V: Deserialize<'de>,
{
    struct UniqueKeys<V>(PhantomData<V>);

    impl<'de, V: Deserialize<'de>> Visitor<'de> for UniqueKeys<V> {
        type Value = IndexMap<String, V>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("an object with unique keys")
        }

        fn visit_map<A: MapAccess<'de>>(
            self,
            mut access: A,
        ) -> std::result::Result<Self::Value, A::Error> {
            let mut map = IndexMap::with_capacity(access.size_hint().unwrap_or(0));
            while let Some((key, value)) = access.next_entry::<String, V>()? {
                if map.contains_key(&key) {
                    return Err(de::Error::custom(format!("duplicate key '{}'", key)));
                }
                map.insert(key, value);
            }
            Ok(map)
        }
    }

    deserializer.deserialize_map(UniqueKeys(PhantomData))
}

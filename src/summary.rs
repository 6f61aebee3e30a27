//! Structured summary records
//!
//! A [`Summary`] bundles named values emitted by one logging call. Scalar
//! values are the only kind the hub interprets; histograms and text are
//! carried through for sinks that persist the full record.
//!
//! On the wire a summary is its JSON encoding.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::{MonitorError, Result};

/// Per-replica prefix added when the same metric is computed on several towers
static TOWER_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"tower[p0-9]+/").expect("Invalid tower prefix regex"));

const SUMMARY_SUFFIX: &str = "-summary";

/// Collapse a scalar summary tag to its logical metric name
///
/// Every `tower<N>/` (or `towerp<N>/`) segment is removed, then one trailing
/// `-summary` suffix.
///
/// ```
/// use entrenar_monitors::summary::normalize_tag;
///
/// assert_eq!(normalize_tag("tower0/loss-summary"), "loss");
/// assert_eq!(normalize_tag("raw_count"), "raw_count");
/// ```
pub fn normalize_tag(tag: &str) -> String {
    let stripped = TOWER_PREFIX.replace_all(tag, "");
    match stripped.strip_suffix(SUMMARY_SUFFIX) {
        Some(base) => base.to_string(),
        None => stripped.into_owned(),
    }
}

/// Histogram payload of a summary value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    pub min: f64,
    pub max: f64,
    pub num: u64,
    pub sum: f64,
    /// Right edges of the buckets
    pub bucket_limits: Vec<f64>,
    /// Count per bucket
    pub buckets: Vec<f64>,
}

/// Payload of a single summary value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryData {
    Scalar(#[serde(with = "scalar_repr")] f64),
    Histogram(Histogram),
    Text(String),
}

/// JSON value for a scalar
///
/// JSON has no NaN or infinity; those are written as the strings `"NaN"`,
/// `"Infinity"` and `"-Infinity"` so a diverged metric is kept instead of
/// turning into `null`.
pub fn scalar_to_json(value: f64) -> Value {
    match non_finite_label(value) {
        Some(label) => Value::from(label),
        None => Value::from(value),
    }
}

fn non_finite_label(value: f64) -> Option<&'static str> {
    if value.is_nan() {
        Some("NaN")
    } else if value == f64::INFINITY {
        Some("Infinity")
    } else if value == f64::NEG_INFINITY {
        Some("-Infinity")
    } else {
        None
    }
}

mod scalar_repr {
    use super::*;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Label(String),
    }

    pub fn serialize<S: Serializer>(
        value: &f64,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        match non_finite_label(*value) {
            Some(label) => serializer.serialize_str(label),
            None => serializer.serialize_f64(*value),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<f64, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Number(value) => Ok(value),
            Repr::Label(label) => match label.as_str() {
                "NaN" => Ok(f64::NAN),
                "Infinity" => Ok(f64::INFINITY),
                "-Infinity" => Ok(f64::NEG_INFINITY),
                other => Err(serde::de::Error::custom(format!("invalid scalar '{other}'"))),
            },
        }
    }
}

/// A tagged value inside a summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryValue {
    pub tag: String,
    pub data: SummaryData,
}

impl SummaryValue {
    /// Scalar value, if this is one
    pub fn as_scalar(&self) -> Option<f64> {
        match self.data {
            SummaryData::Scalar(v) => Some(v),
            _ => None,
        }
    }
}

/// A structured record of zero or more tagged values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    #[serde(default)]
    pub values: Vec<SummaryValue>,
}

impl Summary {
    /// Create an empty summary
    pub fn new() -> Self {
        Self::default()
    }

    /// Summary holding a single scalar
    pub fn scalar(tag: impl Into<String>, value: f64) -> Self {
        let mut summary = Self::new();
        summary.push_scalar(tag, value);
        summary
    }

    /// Append a value
    pub fn push(&mut self, tag: impl Into<String>, data: SummaryData) {
        self.values.push(SummaryValue {
            tag: tag.into(),
            data,
        });
    }

    /// Append a scalar value
    pub fn push_scalar(&mut self, tag: impl Into<String>, value: f64) {
        self.push(tag, SummaryData::Scalar(value));
    }

    /// Iterate over `(tag, value)` for every scalar in the record
    pub fn scalars(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.values.iter().filter_map(|v| v.as_scalar().map(|s| (v.tag.as_str(), s)))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Encode to the wire format
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decode from the wire format
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes)
            .map_err(|e| MonitorError::decode(bytes.len(), e.to_string()))
    }
}

/// A summary as handed to the hub: decoded or still serialized
#[derive(Debug, Clone, PartialEq)]
pub enum SummaryInput {
    Decoded(Summary),
    Encoded(Vec<u8>),
}

impl SummaryInput {
    /// Decode if needed
    pub fn into_summary(self) -> Result<Summary> {
        match self {
            Self::Decoded(summary) => Ok(summary),
            Self::Encoded(bytes) => Summary::from_bytes(&bytes),
        }
    }
}

impl From<Summary> for SummaryInput {
    fn from(summary: Summary) -> Self {
        Self::Decoded(summary)
    }
}

impl From<Vec<u8>> for SummaryInput {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Encoded(bytes)
    }
}

impl From<&[u8]> for SummaryInput {
    fn from(bytes: &[u8]) -> Self {
        Self::Encoded(bytes.to_vec())
    }
}

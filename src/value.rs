//! Tagged value types for node properties and metrics.
//!
//! `PropertyValue` is the heterogeneous value space for `properties`
//! (null, bool, integer, float, string, ordered sequence, nested mapping).
//! `MetricValue` is the numeric-only sibling used for `metrics`, kept on a
//! separate channel so compact numeric export never has to sniff types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A property value. `Map` uses `BTreeMap` so keys are lexicographically
/// ordered for free, satisfying the sorted-JSON-object invariant without a
/// separate sort pass at encode time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<PropertyValue>),
    Map(BTreeMap<String, PropertyValue>),
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        PropertyValue::Bool(v)
    }
}

impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self {
        PropertyValue::Int(v)
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        PropertyValue::Float(v)
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        PropertyValue::Str(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        PropertyValue::Str(v.to_string())
    }
}

/// A numeric metric value. Finite-ness is enforced at the write site
/// (`GraphNode::set_metric`), not here, so this type can stay a plain enum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Int(i64),
    Float(f64),
}

impl MetricValue {
    /// `true` if the value is finite (not NaN, not +/-infinity).
    pub fn is_finite(&self) -> bool {
        match self {
            MetricValue::Int(_) => true,
            MetricValue::Float(f) => f.is_finite(),
        }
    }

    pub fn as_f64(&self) -> f64 {
        match self {
            MetricValue::Int(i) => *i as f64,
            MetricValue::Float(f) => *f,
        }
    }
}

impl From<i64> for MetricValue {
    fn from(v: i64) -> Self {
        MetricValue::Int(v)
    }
}

impl From<f64> for MetricValue {
    fn from(v: f64) -> Self {
        MetricValue::Float(v)
    }
}

impl From<usize> for MetricValue {
    fn from(v: usize) -> Self {
        MetricValue::Int(v as i64)
    }
}

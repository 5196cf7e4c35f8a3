use crate::error::AggregateError;
use csv::StringRecord;
use geo::MultiPolygon;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Tabular records with their header row.
#[derive(Debug, Clone, Default)]
pub struct RecordTable {
    pub headers: StringRecord,
    pub rows: Vec<StringRecord>,
}

impl RecordTable {
    pub fn new(headers: StringRecord, rows: Vec<StringRecord>) -> Self {
        Self { headers, rows }
    }

    pub fn column(&self, name: &str) -> Result<usize, AggregateError> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| AggregateError::MissingColumn {
                column: name.to_string(),
            })
    }

    /// Values of one column, trimmed. Short rows yield "".
    pub fn values<'a>(&'a self, idx: usize) -> impl Iterator<Item = &'a str> + 'a {
        self.rows.iter().map(move |r| r.get(idx).unwrap_or("").trim())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct BoundaryFeature {
    /// Value of the key property, `None` when the feature lacks it.
    pub name: Option<String>,
    pub geometry: MultiPolygon<f64>,
    pub properties: Map<String, Value>,
}

impl BoundaryFeature {
    /// Name for logs and reports; keyless features are named by position.
    pub fn label(&self, position: usize) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("<feature #{position} without key>"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StatValue {
    Count(u64),
    Real(f64),
}

impl StatValue {
    pub fn as_f64(&self) -> f64 {
        match *self {
            StatValue::Count(n) => n as f64,
            StatValue::Real(x) => x,
        }
    }

    pub fn to_json(&self) -> Value {
        match *self {
            StatValue::Count(n) => Value::from(n),
            StatValue::Real(x) => serde_json::Number::from_f64(x)
                .map(Value::Number)
                .unwrap_or(Value::Null),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStat {
    pub area: String,
    pub values: BTreeMap<String, StatValue>,
}

impl SummaryStat {
    pub fn get(&self, stat: &str) -> Option<StatValue> {
        self.values.get(stat).copied()
    }
}

/// Aggregates of one run, keyed and iterated by area name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummaryTable {
    pub stats: BTreeMap<String, SummaryStat>,
}

impl SummaryTable {
    pub fn get(&self, area: &str) -> Option<&SummaryStat> {
        self.stats.get(area)
    }

    pub fn areas(&self) -> impl Iterator<Item = &str> {
        self.stats.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SummaryStat> {
        self.stats.values()
    }

    pub fn len(&self) -> usize {
        self.stats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }
}

//! Time-series points handed to sinks

use std::collections::BTreeMap;

use thiserror::Error;

/// Reasons a point cannot be constructed
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PointError {
    #[error("Point has an empty measurement name")]
    EmptyMeasurement,

    #[error("Point {measurement} has no fields")]
    NoFields { measurement: String },

    #[error("Point {measurement} has an empty tag key")]
    EmptyTagKey { measurement: String },

    #[error("Point {measurement:?} has a line break in {component}")]
    LineBreak {
        measurement: String,
        component: String,
    },

    #[error("Point {measurement} field {field} is not finite ({value})")]
    NonFiniteField {
        measurement: String,
        field: String,
        value: f64,
    },
}

/// A validated time-series point
///
/// Tags and fields are ordered maps so keys are unique and serialization is
/// deterministic. Construct through [`OutputPoint::new`].
#[derive(Debug, Clone, PartialEq)]
pub struct OutputPoint {
    measurement: String,
    tags: BTreeMap<String, String>,
    fields: BTreeMap<String, f64>,
    timestamp_ns: i64,
}

impl OutputPoint {
    pub fn new(
        measurement: impl Into<String>,
        tags: BTreeMap<String, String>,
        fields: BTreeMap<String, f64>,
        timestamp_ns: i64,
    ) -> Result<Self, PointError> {
        let measurement = measurement.into();
        if measurement.is_empty() {
            return Err(PointError::EmptyMeasurement);
        }
        if fields.is_empty() {
            return Err(PointError::NoFields { measurement });
        }
        if tags.keys().any(|k| k.is_empty()) {
            return Err(PointError::EmptyTagKey { measurement });
        }
        // Line protocol has no escape for line breaks
        let component = if has_line_break(&measurement) {
            Some("measurement".to_string())
        } else {
            tags.iter()
                .find(|(k, v)| has_line_break(k) || has_line_break(v))
                .map(|(k, _)| format!("tag {:?}", k))
                .or_else(|| {
                    fields
                        .keys()
                        .find(|k| has_line_break(k))
                        .map(|k| format!("field {:?}", k))
                })
        };
        if let Some(component) = component {
            return Err(PointError::LineBreak {
                measurement,
                component,
            });
        }
        if let Some((field, value)) = fields.iter().find(|(_, v)| !v.is_finite()) {
            return Err(PointError::NonFiniteField {
                field: field.clone(),
                value: *value,
                measurement,
            });
        }

        Ok(Self {
            measurement,
            tags,
            fields,
            timestamp_ns,
        })
    }

    pub fn measurement(&self) -> &str {
        &self.measurement
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    pub fn fields(&self) -> &BTreeMap<String, f64> {
        &self.fields
    }

    pub fn field(&self, key: &str) -> Option<f64> {
        self.fields.get(key).copied()
    }

    pub fn timestamp_ns(&self) -> i64 {
        self.timestamp_ns
    }
}

fn has_line_break(s: &str) -> bool {
    s.contains(['\n', '\r'])
}

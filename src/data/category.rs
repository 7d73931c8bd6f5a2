//! Category Module
//! Labeled bar values: a single scalar or an ordered stack of segments.

use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum CategoryError {
    #[error("Malformed category entry: {0}")]
    Malformed(String),
    #[error("Category '{label}' has an unsupported value ({found}); expected a number or a list of [label, number] pairs")]
    InvalidValue { label: String, found: String },
    #[error("Category '{0}' is segmented but has no segments")]
    EmptySegments(String),
    #[error("Category '{0}' has a non-finite value")]
    NonFinite(String),
}

/// One stacked sub-portion of a bar.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CategoryValue {
    Scalar(f64),
    Segmented(Vec<Segment>),
}

/// A top-level bar: its x-axis name and what to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub label: String,
    pub value: CategoryValue,
}

impl Category {
    pub fn scalar(label: impl Into<String>, value: f64) -> Result<Self, CategoryError> {
        let label = label.into();
        if !value.is_finite() {
            return Err(CategoryError::NonFinite(label));
        }
        Ok(Self {
            label,
            value: CategoryValue::Scalar(value),
        })
    }

    pub fn segmented<S: Into<String>>(
        label: impl Into<String>,
        parts: impl IntoIterator<Item = (S, f64)>,
    ) -> Result<Self, CategoryError> {
        let label = label.into();
        let segments: Vec<Segment> = parts
            .into_iter()
            .map(|(sub_label, value)| Segment {
                label: sub_label.into(),
                value,
            })
            .collect();

        if segments.is_empty() {
            return Err(CategoryError::EmptySegments(label));
        }
        if segments.iter().any(|s| !s.value.is_finite()) {
            return Err(CategoryError::NonFinite(label));
        }

        Ok(Self {
            label,
            value: CategoryValue::Segmented(segments),
        })
    }

    /// Total visual height of the bar.
    pub fn height(&self) -> f64 {
        match &self.value {
            CategoryValue::Scalar(v) => *v,
            CategoryValue::Segmented(segments) => segments.iter().map(|s| s.value).sum(),
        }
    }

    pub fn segment_count(&self) -> usize {
        match &self.value {
            CategoryValue::Scalar(_) => 0,
            CategoryValue::Segmented(segments) => segments.len(),
        }
    }
}

impl TryFrom<&Value> for Category {
    type Error = CategoryError;

    /// Parse a `[label, value]` entry where value is a number or a list of
    /// `[sub_label, number]` pairs.
    fn try_from(entry: &Value) -> Result<Self, Self::Error> {
        let (label, value) = match entry.as_array().map(Vec::as_slice) {
            Some([Value::String(label), value]) => (label.clone(), value),
            _ => return Err(CategoryError::Malformed(entry.to_string())),
        };

        match value {
            Value::Number(n) => {
                let v = n
                    .as_f64()
                    .ok_or_else(|| CategoryError::NonFinite(label.clone()))?;
                Self::scalar(label, v)
            }
            Value::Array(items) => {
                let mut parts = Vec::with_capacity(items.len());
                for item in items {
                    match item.as_array().map(Vec::as_slice) {
                        Some([Value::String(sub_label), Value::Number(n)]) => {
                            let v = n
                                .as_f64()
                                .ok_or_else(|| CategoryError::NonFinite(label.clone()))?;
                            parts.push((sub_label.clone(), v));
                        }
                        _ => {
                            return Err(CategoryError::InvalidValue {
                                label,
                                found: item.to_string(),
                            })
                        }
                    }
                }
                Self::segmented(label, parts)
            }
            other => Err(CategoryError::InvalidValue {
                label,
                found: value_kind(other).to_string(),
            }),
        }
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Parse every entry in order, stopping at the first invalid one.
pub fn parse_categories(entries: &[Value]) -> Result<Vec<Category>, CategoryError> {
    entries.iter().map(Category::try_from).collect()
}

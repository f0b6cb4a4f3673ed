//! Dynamically typed field values.
//!
//! # Responsibility
//! - Give the query engine a uniform view over typed record fields.
//! - Define strict equality, native ordering and textual forms.
//!
//! # Invariants
//! - Ints and floats are both numbers and compare numerically.
//! - Values of different kinds never compare equal and have no ordering.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

/// One field value as seen by filters and sort keys.
///
/// JSON `null` has no variant: an absent value is `Option::None` at call sites.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

/// Coarse value category used for type-mismatch diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Bool,
    Number,
    Text,
}

impl ValueKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Number => "number",
            Self::Text => "text",
        }
    }
}

impl Display for ValueKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FieldValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Bool(_) => ValueKind::Bool,
            Self::Int(_) | Self::Float(_) => ValueKind::Number,
            Self::Text(_) => ValueKind::Text,
        }
    }

    /// Strict equality: no coercion across kinds.
    pub fn strict_eq(&self, other: &FieldValue) -> bool {
        matches!(self.native_cmp(other), Some(Ordering::Equal))
    }

    /// Compares two values in the native order of their shared kind.
    ///
    /// Returns `None` when the kinds differ. Floats use total ordering, so
    /// `NaN` sorts after every other number instead of poisoning the sort.
    pub fn native_cmp(&self, other: &FieldValue) -> Option<Ordering> {
        match (self, other) {
            (Self::Bool(left), Self::Bool(right)) => Some(left.cmp(right)),
            (Self::Int(left), Self::Int(right)) => Some(left.cmp(right)),
            (Self::Float(left), Self::Float(right)) => Some(left.total_cmp(right)),
            (Self::Int(left), Self::Float(right)) => Some((*left as f64).total_cmp(right)),
            (Self::Float(left), Self::Int(right)) => Some(left.total_cmp(&(*right as f64))),
            (Self::Text(left), Self::Text(right)) => Some(left.cmp(right)),
            _ => None,
        }
    }

    /// Lowercased textual form used by the case-insensitive string operators.
    pub fn folded_text(&self) -> String {
        self.to_string().to_lowercase()
    }
}

impl Display for FieldValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
            // Integral floats print without a fraction, so `2.0` reads as `2`.
            Self::Float(value) if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 => {
                write!(f, "{}", *value as i64)
            }
            Self::Float(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

#[cfg(test)]
mod tests {
    use super::{FieldValue, ValueKind};
    use std::cmp::Ordering;

    #[test]
    fn numbers_compare_across_int_and_float() {
        let int = FieldValue::Int(2);
        let float = FieldValue::Float(2.5);
        assert_eq!(int.native_cmp(&float), Some(Ordering::Less));
        assert!(FieldValue::Int(3).strict_eq(&FieldValue::Float(3.0)));
    }

    #[test]
    fn mismatched_kinds_have_no_order() {
        let text = FieldValue::from("1");
        assert_eq!(text.native_cmp(&FieldValue::Int(1)), None);
        assert!(!text.strict_eq(&FieldValue::Int(1)));
        assert_eq!(text.kind(), ValueKind::Text);
    }

    #[test]
    fn display_matches_plain_text_forms() {
        assert_eq!(FieldValue::Float(2.0).to_string(), "2");
        assert_eq!(FieldValue::Float(1.5).to_string(), "1.5");
        assert_eq!(FieldValue::Bool(true).to_string(), "true");
        assert_eq!(FieldValue::from("Goal").folded_text(), "goal");
    }

    #[test]
    fn untagged_json_maps_to_expected_variants() {
        let values: Vec<FieldValue> =
            serde_json::from_str(r#"[true, 7, 7.25, "seven"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                FieldValue::Bool(true),
                FieldValue::Int(7),
                FieldValue::Float(7.25),
                FieldValue::from("seven"),
            ]
        );
    }
}

//! In-memory filter/sort/paginate engine.
//!
//! # Responsibility
//! - Turn `(records, ListQuery)` into one `Page` without touching the input.
//! - Report operator/type mismatches instead of coercing them.
//!
//! # Invariants
//! - Filter conditions combine with AND; output order follows input order.
//! - Sorting is stable: equal-key records keep their filtered order.
//! - `total_count` is the filtered size, independent of the page window.
//! - Out-of-range windows return an empty page, never an error.

use crate::model::record::Record;
use crate::model::value::{FieldValue, ValueKind};
use crate::query::types::{
    FilterCondition, FilterOperator, ListQuery, Page, PageRequest, SortDirection, SortKey,
};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type QueryResult<T> = Result<T, QueryError>;

/// Query-layer error for malformed descriptors and incomparable values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// An ordering comparison met two values of different kinds.
    DataTypeMismatch {
        field: String,
        left: ValueKind,
        right: ValueKind,
    },
    /// Strict mode only: a condition that lenient mode would ignore.
    InvalidFilter(String),
    /// Strict mode only: sort key naming a field outside the schema.
    InvalidSort(String),
    /// Textual filter/sort expression that cannot be parsed.
    InvalidExpression { expression: String, message: String },
}

impl Display for QueryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DataTypeMismatch { field, left, right } => write!(
                f,
                "cannot compare {left} with {right} on field `{field}`"
            ),
            Self::InvalidFilter(message) => write!(f, "invalid filter: {message}"),
            Self::InvalidSort(field) => write!(f, "invalid sort key: unknown field `{field}`"),
            Self::InvalidExpression {
                expression,
                message,
            } => write!(f, "invalid query expression `{expression}`: {message}"),
        }
    }
}

impl Error for QueryError {}

/// How malformed filter conditions are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    /// Malformed conditions and unknown operators match every record.
    #[default]
    Lenient,
    /// Malformed conditions, unknown fields and unknown operators are errors.
    Strict,
}

/// Stateless query executor.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryEngine {
    mode: FilterMode,
}

impl QueryEngine {
    pub fn new(mode: FilterMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> FilterMode {
        self.mode
    }

    /// Runs filter, sort and pagination and returns the requested page.
    ///
    /// # Errors
    /// - `DataTypeMismatch` when an ordering operator or a sort key compares
    ///   values of different kinds.
    /// - `InvalidFilter` / `InvalidSort` in strict mode only.
    pub fn run<R: Record>(&self, records: &[R], query: &ListQuery) -> QueryResult<Page<R>> {
        let mut rows = self.filter(records, &query.filter)?;
        self.sort(&mut rows, &query.sort)?;
        let total_count = rows.len();
        let items = paginate(&rows, query.page.normalized());
        Ok(Page { items, total_count })
    }

    /// Keeps records satisfying every condition, preserving input order.
    pub fn filter<'a, R: Record>(
        &self,
        records: &'a [R],
        conditions: &[FilterCondition],
    ) -> QueryResult<Vec<&'a R>> {
        let mut rows: Vec<&R> = records.iter().collect();
        for condition in conditions {
            if !self.is_active::<R>(condition)? {
                continue;
            }
            let mut kept = Vec::with_capacity(rows.len());
            for row in rows {
                if condition_matches(condition, row)? {
                    kept.push(row);
                }
            }
            rows = kept;
        }
        Ok(rows)
    }

    /// Stable multi-key sort. An empty key list leaves `rows` untouched.
    pub fn sort<R: Record>(&self, rows: &mut Vec<&R>, keys: &[SortKey]) -> QueryResult<()> {
        if self.mode == FilterMode::Strict {
            if let Some(key) = keys.iter().find(|key| !R::has_field(&key.field)) {
                return Err(QueryError::InvalidSort(key.field.clone()));
            }
        }

        if keys.is_empty() || rows.len() < 2 {
            return Ok(());
        }

        let mut decorated: Vec<(Vec<Option<FieldValue>>, &R)> = rows
            .iter()
            .map(|row| (keys.iter().map(|key| row.field(&key.field)).collect(), *row))
            .collect();
        ensure_comparable(keys, &decorated)?;

        decorated.sort_by(|(left, _), (right, _)| compare_keys(keys, left, right));
        *rows = decorated.into_iter().map(|(_, row)| row).collect();
        Ok(())
    }

    /// Returns whether a condition takes part in filtering.
    ///
    /// Lenient mode skips malformed conditions and unknown operators; strict
    /// mode rejects them together with unknown field names.
    fn is_active<R: Record>(&self, condition: &FilterCondition) -> QueryResult<bool> {
        let problem = if condition.field.is_empty() {
            Some("condition has no field".to_string())
        } else if condition.value.is_none() {
            Some(format!("condition on `{}` has no value", condition.field))
        } else if let FilterOperator::Unrecognized(name) = &condition.operator {
            Some(format!("unsupported operator `{name}` on `{}`", condition.field))
        } else if !R::has_field(&condition.field) {
            if self.mode == FilterMode::Strict {
                Some(format!("unknown field `{}`", condition.field))
            } else {
                None
            }
        } else {
            None
        };

        match (problem, self.mode) {
            (None, _) => Ok(true),
            (Some(_), FilterMode::Lenient) => Ok(false),
            (Some(message), FilterMode::Strict) => Err(QueryError::InvalidFilter(message)),
        }
    }
}

/// Clones the `[start, end)` window of `rows`, clipped to its length.
pub fn paginate<R: Clone>(rows: &[&R], page: PageRequest) -> Vec<R> {
    let (start, end) = page.window();
    if start >= rows.len() {
        return Vec::new();
    }
    let end = end.min(rows.len());
    rows[start..end].iter().map(|row| (*row).clone()).collect()
}

fn condition_matches<R: Record>(condition: &FilterCondition, record: &R) -> QueryResult<bool> {
    let Some(expected) = condition.value.as_ref() else {
        return Ok(true);
    };
    // Fields the record does not carry never match.
    let Some(actual) = record.field(&condition.field) else {
        return Ok(false);
    };

    let matched = match &condition.operator {
        FilterOperator::Contains => actual.folded_text().contains(&expected.folded_text()),
        FilterOperator::StartsWith => actual.folded_text().starts_with(&expected.folded_text()),
        FilterOperator::EndsWith => actual.folded_text().ends_with(&expected.folded_text()),
        FilterOperator::Equals => actual.strict_eq(expected),
        FilterOperator::GreaterThan => {
            compare_values(&condition.field, &actual, expected)? == Ordering::Greater
        }
        FilterOperator::LessThan => {
            compare_values(&condition.field, &actual, expected)? == Ordering::Less
        }
        FilterOperator::Unrecognized(_) => true,
    };
    Ok(matched)
}

fn compare_values(field: &str, left: &FieldValue, right: &FieldValue) -> QueryResult<Ordering> {
    left.native_cmp(right)
        .ok_or_else(|| QueryError::DataTypeMismatch {
            field: field.to_string(),
            left: left.kind(),
            right: right.kind(),
        })
}

/// Rejects sort columns mixing value kinds before any comparison runs, so the
/// comparator itself stays a total order.
fn ensure_comparable<R>(
    keys: &[SortKey],
    decorated: &[(Vec<Option<FieldValue>>, &R)],
) -> QueryResult<()> {
    for (index, key) in keys.iter().enumerate() {
        let mut seen: Option<ValueKind> = None;
        for (values, _) in decorated {
            let Some(value) = values[index].as_ref() else {
                continue;
            };
            match seen {
                None => seen = Some(value.kind()),
                Some(kind) if kind != value.kind() => {
                    return Err(QueryError::DataTypeMismatch {
                        field: key.field.clone(),
                        left: kind,
                        right: value.kind(),
                    });
                }
                Some(_) => {}
            }
        }
    }
    Ok(())
}

fn compare_keys(
    keys: &[SortKey],
    left: &[Option<FieldValue>],
    right: &[Option<FieldValue>],
) -> Ordering {
    for (index, key) in keys.iter().enumerate() {
        let ordering = match (&left[index], &right[index]) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(a), Some(b)) => a.native_cmp(b).unwrap_or(Ordering::Equal),
        };
        let ordering = match key.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

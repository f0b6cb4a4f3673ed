//! Textual filter and sort expressions.
//!
//! # Responsibility
//! - Parse `field:operator:value` filters and `field[:asc|desc]` sort keys.
//! - Infer scalar value kinds from text.
//!
//! # Invariants
//! - Quoted values (`"..."`) are always text.
//! - `null` parses to an absent value, producing a malformed condition.

use crate::model::value::FieldValue;
use crate::query::engine::{QueryError, QueryResult};
use crate::query::types::{FilterCondition, FilterOperator, SortDirection, SortKey};
use once_cell::sync::Lazy;
use regex::Regex;
use std::str::FromStr;

static FILTER_EXPR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<field>[A-Za-z_][A-Za-z0-9_]*):(?P<op>[A-Za-z]+|[<>=]):(?P<value>.*)$")
        .expect("valid filter expression regex")
});
static SORT_EXPR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<field>[A-Za-z_][A-Za-z0-9_]*)(?::(?P<dir>(?i:asc|desc)))?$")
        .expect("valid sort expression regex")
});
static NUMBER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^-?\d+(\.\d+)?([eE][+-]?\d+)?$").expect("valid number regex")
});

/// Parses one `field:operator:value` filter expression.
pub fn parse_filter(expression: &str) -> QueryResult<FilterCondition> {
    let trimmed = expression.trim();
    let caps = FILTER_EXPR_RE
        .captures(trimmed)
        .ok_or_else(|| invalid(expression, "expected `field:operator:value`"))?;

    let operator = FilterOperator::parse(&caps["op"]);
    if let FilterOperator::Unrecognized(name) = &operator {
        return Err(invalid(expression, &format!("unknown operator `{name}`")));
    }

    Ok(FilterCondition {
        field: caps["field"].to_string(),
        operator,
        value: parse_value(&caps["value"]),
    })
}

/// Parses one `field` / `field:asc` / `field:desc` sort expression.
pub fn parse_sort(expression: &str) -> QueryResult<SortKey> {
    let trimmed = expression.trim();
    let caps = SORT_EXPR_RE
        .captures(trimmed)
        .ok_or_else(|| invalid(expression, "expected `field` or `field:asc|desc`"))?;

    let direction = match caps.name("dir").map(|m| m.as_str().to_ascii_lowercase()) {
        Some(dir) if dir == "desc" => SortDirection::Desc,
        _ => SortDirection::Asc,
    };
    Ok(SortKey {
        field: caps["field"].to_string(),
        direction,
    })
}

/// Infers a value: `null`, bool, integer, float, quoted text, then plain text.
pub fn parse_value(raw: &str) -> Option<FieldValue> {
    if raw == "null" {
        return None;
    }
    if raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') {
        return Some(FieldValue::Text(raw[1..raw.len() - 1].to_string()));
    }
    match raw {
        "true" => return Some(FieldValue::Bool(true)),
        "false" => return Some(FieldValue::Bool(false)),
        _ => {}
    }
    if NUMBER_RE.is_match(raw) {
        if let Ok(value) = raw.parse::<i64>() {
            return Some(FieldValue::Int(value));
        }
        if let Ok(value) = raw.parse::<f64>() {
            return Some(FieldValue::Float(value));
        }
    }
    Some(FieldValue::Text(raw.to_string()))
}

fn invalid(expression: &str, message: &str) -> QueryError {
    QueryError::InvalidExpression {
        expression: expression.to_string(),
        message: message.to_string(),
    }
}

impl FromStr for FilterCondition {
    type Err = QueryError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        parse_filter(value)
    }
}

impl FromStr for SortKey {
    type Err = QueryError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        parse_sort(value)
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_filter, parse_sort, parse_value};
    use crate::model::value::FieldValue;
    use crate::query::engine::QueryError;
    use crate::query::types::{FilterOperator, SortDirection};

    #[test]
    fn filter_expression_splits_on_first_two_colons() {
        let condition = parse_filter("text:contains:note: buy milk").unwrap();
        assert_eq!(condition.field, "text");
        assert_eq!(condition.operator, FilterOperator::Contains);
        assert_eq!(condition.value, Some(FieldValue::from("note: buy milk")));
    }

    #[test]
    fn symbolic_operators_and_numbers_parse() {
        let condition = parse_filter("id:>:1").unwrap();
        assert_eq!(condition.operator, FilterOperator::GreaterThan);
        assert_eq!(condition.value, Some(FieldValue::Int(1)));
    }

    #[test]
    fn unknown_operator_is_rejected() {
        let err = parse_filter("title:like:x").unwrap_err();
        assert!(matches!(err, QueryError::InvalidExpression { .. }));
    }

    #[test]
    fn value_inference_prefers_quotes_over_numbers() {
        assert_eq!(parse_value("\"12\""), Some(FieldValue::from("12")));
        assert_eq!(parse_value("12"), Some(FieldValue::Int(12)));
        assert_eq!(parse_value("1.5"), Some(FieldValue::Float(1.5)));
        assert_eq!(parse_value("nan"), Some(FieldValue::from("nan")));
        assert_eq!(parse_value("null"), None);
    }

    #[test]
    fn sort_expression_defaults_to_ascending() {
        assert_eq!(parse_sort("title").unwrap().direction, SortDirection::Asc);
        assert_eq!(parse_sort("title:DESC").unwrap().direction, SortDirection::Desc);
        assert!(parse_sort("title:sideways").is_err());
    }
}

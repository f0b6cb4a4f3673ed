//! Query descriptor types: filter conditions, sort keys and page windows.

use crate::model::value::FieldValue;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::{Display, Formatter};

/// Page size used when a request carries `0` or omits the size.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Comparison applied by one filter condition.
///
/// Wire names follow the data-grid vocabulary (`contains`, `startsWith`, ...).
/// `>` and `<` are accepted as aliases. Unknown names are preserved so that
/// lenient filtering can ignore them and strict filtering can report them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FilterOperator {
    Contains,
    Equals,
    StartsWith,
    EndsWith,
    GreaterThan,
    LessThan,
    Unrecognized(String),
}

impl FilterOperator {
    pub fn parse(value: &str) -> Self {
        match value {
            "contains" => Self::Contains,
            "equals" | "=" => Self::Equals,
            "startsWith" => Self::StartsWith,
            "endsWith" => Self::EndsWith,
            "greaterThan" | ">" => Self::GreaterThan,
            "lessThan" | "<" => Self::LessThan,
            other => Self::Unrecognized(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Contains => "contains",
            Self::Equals => "equals",
            Self::StartsWith => "startsWith",
            Self::EndsWith => "endsWith",
            Self::GreaterThan => "greaterThan",
            Self::LessThan => "lessThan",
            Self::Unrecognized(name) => name.as_str(),
        }
    }

}

impl Default for FilterOperator {
    fn default() -> Self {
        Self::Unrecognized(String::new())
    }
}

impl From<String> for FilterOperator {
    fn from(value: String) -> Self {
        Self::parse(value.as_str())
    }
}

impl From<FilterOperator> for String {
    fn from(value: FilterOperator) -> Self {
        value.as_str().to_string()
    }
}

impl Display for FilterOperator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One declarative predicate over a single field.
///
/// An empty `field` or an absent `value` marks a malformed condition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterCondition {
    pub field: String,
    pub operator: FilterOperator,
    pub value: Option<FieldValue>,
}

impl FilterCondition {
    pub fn new(
        field: impl Into<String>,
        operator: FilterOperator,
        value: impl Into<FieldValue>,
    ) -> Self {
        Self {
            field: field.into(),
            operator,
            value: Some(value.into()),
        }
    }

    pub fn contains(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::new(field, FilterOperator::Contains, value)
    }

    pub fn equals(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::new(field, FilterOperator::Equals, value)
    }

    /// Returns whether the condition names a field and carries a value.
    pub fn is_well_formed(&self) -> bool {
        !self.field.is_empty() && self.value.is_some()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// One sort key; earlier keys take priority over later ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub field: String,
    /// The data grid sends `null` for an unsorted column; that reads as `asc`.
    #[serde(default, alias = "sort", deserialize_with = "direction_or_asc")]
    pub direction: SortDirection,
}

fn direction_or_asc<'de, D>(deserializer: D) -> Result<SortDirection, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<SortDirection>::deserialize(deserializer)?.unwrap_or_default())
}

impl SortKey {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// Zero-based page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    #[serde(default, alias = "page")]
    pub page_index: usize,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

impl PageRequest {
    pub fn new(page_index: usize, page_size: usize) -> Self {
        Self {
            page_index,
            page_size,
        }
    }

    /// Returns a copy with a zero page size replaced by the default.
    pub fn normalized(self) -> Self {
        Self {
            page_index: self.page_index,
            page_size: normalize_page_size(self.page_size),
        }
    }

    /// Half-open `[start, end)` window before clipping to the result length.
    pub fn window(&self) -> (usize, usize) {
        let start = self.page_index.saturating_mul(self.page_size);
        (start, start.saturating_add(self.page_size))
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(0, DEFAULT_PAGE_SIZE)
    }
}

/// Normalizes a requested page size: `0` falls back to the default.
pub fn normalize_page_size(page_size: usize) -> usize {
    if page_size == 0 {
        DEFAULT_PAGE_SIZE
    } else {
        page_size
    }
}

/// Full list query: AND-combined filters, prioritized sort keys and a window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListQuery {
    pub filter: Vec<FilterCondition>,
    pub sort: Vec<SortKey>,
    pub page: PageRequest,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, condition: FilterCondition) -> Self {
        self.filter.push(condition);
        self
    }

    pub fn sort(mut self, key: SortKey) -> Self {
        self.sort.push(key);
        self
    }

    pub fn page(mut self, page_index: usize, page_size: usize) -> Self {
        self.page = PageRequest::new(page_index, page_size);
        self
    }
}

/// One page of results plus the size of the full filtered set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<R> {
    pub items: Vec<R>,
    pub total_count: usize,
}

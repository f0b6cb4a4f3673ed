//! Generic record contract.
//!
//! # Responsibility
//! - Describe what the query engine and repository need from a stored type.
//! - Keep create/update/validate inputs typed per record schema.
//!
//! # Invariants
//! - `id()` is stable for the record lifetime and unique within one store.
//! - `field()` returns `None` for names outside the schema and for unset values.

use crate::model::value::FieldValue;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Integer identity assigned by the repository on create.
pub type RecordId = i64;

/// One structured validation problem, addressed by field path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Human-readable message suitable for inline display.
    pub message: String,
    /// Field path the issue belongs to, e.g. `["title"]`.
    pub path: Vec<String>,
}

impl ValidationIssue {
    /// Creates an issue attached to one top-level field.
    pub fn for_field(field: &str, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: vec![field.to_string()],
        }
    }
}

impl Display for ValidationIssue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path.join("."), self.message)
    }
}

/// Column metadata exposed to list/detail views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    pub field: &'static str,
    #[serde(rename = "headerName")]
    pub header_name: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flex: Option<u32>,
}

/// Contract implemented by every record type held in a repository.
pub trait Record: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// Field values supplied on create. Validated with [`Record::validate_draft`].
    type Draft;
    /// Field values shallow-merged on update. Unset fields keep their value.
    type Patch;

    /// Stable integer identity.
    fn id(&self) -> RecordId;

    /// Looks up one field by schema name.
    fn field(&self, name: &str) -> Option<FieldValue>;

    /// Returns whether `name` belongs to the compile-time schema.
    fn has_field(name: &str) -> bool;

    /// Column descriptors in display order.
    fn descriptors() -> &'static [FieldDescriptor];

    /// Builds a new record from a draft and a repository-assigned id.
    fn from_draft(id: RecordId, draft: Self::Draft) -> Self;

    /// Merges supplied patch fields into this record.
    fn apply_patch(&mut self, patch: Self::Patch);

    /// Returns validation issues for a draft; empty when valid.
    fn validate_draft(draft: &Self::Draft) -> Vec<ValidationIssue>;
}

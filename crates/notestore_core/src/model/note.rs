//! Note record model.
//!
//! # Responsibility
//! - Define the `Note` record and its create/update input shape.
//! - Own note field validation rules.
//!
//! # Invariants
//! - `title` must be present and at least `TITLE_MIN_CHARS` characters.
//! - `text` must be present and non-empty.
//! - Persisted notes missing `title`/`text` load with empty strings.

use crate::model::record::{FieldDescriptor, Record, RecordId, ValidationIssue};
use crate::model::value::FieldValue;
use serde::{Deserialize, Serialize};

/// Minimum title length, counted in Unicode scalar values.
pub const TITLE_MIN_CHARS: usize = 3;

const NOTE_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor {
        field: "id",
        header_name: "ID",
        flex: None,
    },
    FieldDescriptor {
        field: "title",
        header_name: "Title",
        flex: Some(1),
    },
    FieldDescriptor {
        field: "text",
        header_name: "Text",
        flex: Some(1),
    },
];

/// One notes entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: RecordId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
}

impl Note {
    pub fn new(id: RecordId, title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            text: text.into(),
        }
    }
}

/// Form values for note create (draft) and update (patch).
///
/// `None` means "not supplied": rejected by validation on create, left
/// untouched on update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoteFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl NoteFields {
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            text: Some(text.into()),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}

impl Record for Note {
    type Draft = NoteFields;
    type Patch = NoteFields;

    fn id(&self) -> RecordId {
        self.id
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "id" => Some(FieldValue::Int(self.id)),
            "title" => Some(FieldValue::Text(self.title.clone())),
            "text" => Some(FieldValue::Text(self.text.clone())),
            _ => None,
        }
    }

    fn has_field(name: &str) -> bool {
        NOTE_FIELDS.iter().any(|descriptor| descriptor.field == name)
    }

    fn descriptors() -> &'static [FieldDescriptor] {
        NOTE_FIELDS
    }

    fn from_draft(id: RecordId, draft: NoteFields) -> Self {
        Self {
            id,
            title: draft.title.unwrap_or_default(),
            text: draft.text.unwrap_or_default(),
        }
    }

    fn apply_patch(&mut self, patch: NoteFields) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(text) = patch.text {
            self.text = text;
        }
    }

    fn validate_draft(draft: &NoteFields) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();

        match draft.title.as_deref() {
            None | Some("") => issues.push(ValidationIssue::for_field("title", "Title is required")),
            Some(title) if title.chars().count() < TITLE_MIN_CHARS => {
                issues.push(ValidationIssue::for_field(
                    "title",
                    format!("Title must be at least {TITLE_MIN_CHARS} characters"),
                ));
            }
            Some(_) => {}
        }

        if draft.text.as_deref().is_none_or(str::is_empty) {
            issues.push(ValidationIssue::for_field("text", "Text is required"));
        }

        issues
    }
}

/// Notes seeded into an empty store on first start.
pub fn default_notes() -> Vec<Note> {
    vec![
        Note::new(1, "Grocery List Item", "Buy more coffee."),
        Note::new(2, "Personal Goal", "Finish reading the book."),
    ]
}

#[cfg(test)]
mod tests {
    use super::{default_notes, Note, NoteFields};
    use crate::model::record::Record;
    use crate::model::value::FieldValue;

    #[test]
    fn short_title_yields_single_title_issue() {
        let issues = Note::validate_draft(&NoteFields::new("ab", "x"));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].path, vec!["title".to_string()]);
        assert_eq!(issues[0].message, "Title must be at least 3 characters");
    }

    #[test]
    fn missing_fields_are_required() {
        let issues = Note::validate_draft(&NoteFields::default());
        let messages: Vec<_> = issues.iter().map(|issue| issue.message.as_str()).collect();
        assert_eq!(messages, vec!["Title is required", "Text is required"]);
    }

    #[test]
    fn title_length_counts_characters_not_bytes() {
        let issues = Note::validate_draft(&NoteFields::new("日本語", "body"));
        assert!(issues.is_empty());
    }

    #[test]
    fn patch_overwrites_only_supplied_fields() {
        let mut note = Note::new(5, "Old title", "Old text");
        note.apply_patch(NoteFields::default().with_text("New text"));
        assert_eq!(note, Note::new(5, "Old title", "New text"));
    }

    #[test]
    fn field_lookup_follows_schema() {
        let note = &default_notes()[0];
        assert_eq!(note.field("id"), Some(FieldValue::Int(1)));
        assert_eq!(note.field("title"), Some(FieldValue::from("Grocery List Item")));
        assert_eq!(note.field("missing"), None);
        assert!(Note::has_field("text"));
        assert!(!Note::has_field("body"));
    }

    #[test]
    fn persisted_note_without_text_loads_with_empty_text() {
        let note: Note = serde_json::from_str(r#"{"id":3,"title":"Only title"}"#).unwrap();
        assert_eq!(note, Note::new(3, "Only title", ""));
    }
}

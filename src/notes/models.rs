//! Note model and the add/edit form
//!
//! A note belongs to exactly one author. Ownership is never checked here:
//! the view layer only ever loads notes through author-scoped store queries.

use super::slug::{is_valid_slug, slugify, MAX_SLUG_LENGTH};
use crate::forms::{FormContext, FormErrors};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum title length
pub const MAX_TITLE_LENGTH: usize = 100;

/// Suffix of the error shown when a slug is already used by another note
pub const SLUG_WARNING: &str = " - this slug already exists, please choose a unique value!";

/// Field names of [`NoteForm`], in display order
pub const NOTE_FORM_FIELDS: [&str; 3] = ["title", "text", "slug"];

// ============================================================================
// Note
// ============================================================================

/// A user-owned text record with a unique slug
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Note {
    pub id: Uuid,
    pub title: String,
    pub text: String,
    pub slug: String,
    pub author: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Note {
    pub fn new(
        author: Uuid,
        title: impl Into<String>,
        text: impl Into<String>,
        slug: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            text: text.into(),
            slug: slug.into(),
            author,
            created_at: now,
            updated_at: now,
        }
    }
}

// ============================================================================
// Form
// ============================================================================

/// Urlencoded body of the add/edit pages
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct NoteForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub slug: String,
}

/// A validated [`NoteForm`] with its final slug
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanedNote {
    pub title: String,
    pub text: String,
    pub slug: String,
}

impl NoteForm {
    /// Pre-fill the form from an existing note
    pub fn from_note(note: &Note) -> Self {
        Self {
            title: note.title.clone(),
            text: note.text.clone(),
            slug: note.slug.clone(),
        }
    }

    /// Field-level validation.
    ///
    /// A blank slug is derived from the title. Slug uniqueness needs the
    /// store and is checked by the caller (see [`slug_taken_message`]).
    pub fn clean(&self) -> Result<CleanedNote, FormErrors> {
        let mut errors = FormErrors::new();

        let title = self.title.trim();
        if title.is_empty() {
            errors.add("title", "This field is required.");
        } else if title.chars().count() > MAX_TITLE_LENGTH {
            errors.add(
                "title",
                format!(
                    "Ensure this value has at most {} characters (it has {}).",
                    MAX_TITLE_LENGTH,
                    title.chars().count()
                ),
            );
        }

        let text = self.text.trim();
        if text.is_empty() {
            errors.add("text", "This field is required.");
        }

        let mut slug = self.slug.trim().to_string();
        if slug.is_empty() {
            slug = slugify(title);
        }
        if slug.is_empty() {
            // only reachable when the title itself is unusable
            if !errors.has("title") {
                errors.add(
                    "slug",
                    "Could not derive a slug from the title, please enter one.",
                );
            }
        } else if slug.chars().count() > MAX_SLUG_LENGTH {
            errors.add(
                "slug",
                format!(
                    "Ensure this value has at most {} characters.",
                    MAX_SLUG_LENGTH
                ),
            );
        } else if !is_valid_slug(&slug) {
            errors.add(
                "slug",
                "Enter a valid slug consisting of letters, numbers, underscores or hyphens.",
            );
        }

        if errors.is_empty() {
            Ok(CleanedNote {
                title: title.to_string(),
                text: text.to_string(),
                slug,
            })
        } else {
            Err(errors)
        }
    }

    /// Render-context view of this form after a submission
    pub fn to_bound_context(&self, errors: FormErrors) -> FormContext {
        FormContext::bound(self.field_values(), errors)
    }

    /// Render-context view of this form before any submission
    pub fn to_initial_context(&self) -> FormContext {
        FormContext::initial(self.field_values())
    }

    fn field_values(&self) -> [(&'static str, String); 3] {
        [
            (NOTE_FORM_FIELDS[0], self.title.clone()),
            (NOTE_FORM_FIELDS[1], self.text.clone()),
            (NOTE_FORM_FIELDS[2], self.slug.clone()),
        ]
    }
}

/// Error message for a slug already used by another note
pub fn slug_taken_message(slug: &str) -> String {
    format!("{}{}", slug, SLUG_WARNING)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(title: &str, text: &str, slug: &str) -> NoteForm {
        NoteForm {
            title: title.to_string(),
            text: text.to_string(),
            slug: slug.to_string(),
        }
    }

    #[test]
    fn test_clean_valid_form_keeps_slug() {
        let cleaned = form("My note", "Text", "custom-slug").clean().unwrap();
        assert_eq!(cleaned.title, "My note");
        assert_eq!(cleaned.text, "Text");
        assert_eq!(cleaned.slug, "custom-slug");
    }

    #[test]
    fn test_clean_blank_slug_derived_from_title() {
        let cleaned = form("My note", "Text", "  ").clean().unwrap();
        assert_eq!(cleaned.slug, "my-note");

        let cleaned = form("Новая заметка", "Текст", "").clean().unwrap();
        assert_eq!(cleaned.slug, "novaya-zametka");
    }

    #[test]
    fn test_clean_required_fields() {
        let errors = form("", "   ", "").clean().unwrap_err();
        assert!(errors.has("title"));
        assert!(errors.has("text"));
        // no extra slug noise when the title is already reported
        assert!(!errors.has("slug"));
    }

    #[test]
    fn test_clean_title_too_long() {
        let title = "t".repeat(MAX_TITLE_LENGTH + 1);
        let errors = form(&title, "Text", "ok").clean().unwrap_err();
        assert!(errors.has("title"));
    }

    #[test]
    fn test_clean_invalid_slug() {
        let errors = form("Title", "Text", "not a slug!").clean().unwrap_err();
        assert!(errors.has("slug"));
        assert!(!errors.has("title"));
    }

    #[test]
    fn test_clean_underivable_slug() {
        let errors = form("!!!", "Text", "").clean().unwrap_err();
        assert!(errors.has("slug"));
    }

    #[test]
    fn test_from_note_round_trips_fields() {
        let note = Note::new(Uuid::new_v4(), "A1", "t", "a1");
        let f = NoteForm::from_note(&note);
        let ctx = f.to_initial_context();
        assert!(!ctx.is_bound);
        assert_eq!(ctx.fields["title"], "A1");
        assert_eq!(ctx.fields["slug"], "a1");
    }

    #[test]
    fn test_slug_taken_message() {
        assert_eq!(slug_taken_message("a1"), format!("a1{}", SLUG_WARNING));
    }
}

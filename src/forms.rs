//! Form state shared by every page that accepts a submission
//!
//! Pages never render HTML; instead the bound form (values + errors) is
//! placed in the render context under the `form` key.

use serde::Serialize;
use std::collections::BTreeMap;

/// Validation errors keyed by field name.
///
/// Errors not tied to a single field go under [`FormErrors::NON_FIELD`].
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    pub const NON_FIELD: &'static str = "__all__";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }
}

/// Serializable form state for a render context.
#[derive(Debug, Clone, Serialize)]
pub struct FormContext {
    /// Whether the form was built from a submission
    pub is_bound: bool,
    /// Current field values; secrets (passwords) are never echoed back
    pub fields: BTreeMap<&'static str, String>,
    pub errors: FormErrors,
}

impl FormContext {
    /// An empty, unbound form with the given field names
    pub fn unbound(field_names: &[&'static str]) -> Self {
        Self {
            is_bound: false,
            fields: field_names.iter().map(|f| (*f, String::new())).collect(),
            errors: FormErrors::new(),
        }
    }

    /// A form pre-filled from existing values (e.g. an edit page)
    pub fn initial(fields: impl IntoIterator<Item = (&'static str, String)>) -> Self {
        Self {
            is_bound: false,
            fields: fields.into_iter().collect(),
            errors: FormErrors::new(),
        }
    }

    /// A submitted form, re-rendered with its errors
    pub fn bound(
        fields: impl IntoIterator<Item = (&'static str, String)>,
        errors: FormErrors,
    ) -> Self {
        Self {
            is_bound: true,
            fields: fields.into_iter().collect(),
            errors,
        }
    }
}

//! Notes module
//!
//! Provides the `Note` model, its add/edit form and slug handling.

pub mod models;
pub mod slug;

pub use models::*;
pub use slug::{is_valid_slug, slugify, MAX_SLUG_LENGTH};

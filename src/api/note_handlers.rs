//! Note pages: list, add, detail, edit, delete
//!
//! Every note is loaded through an author-scoped store query, so another
//! user's note is indistinguishable from a missing one (404).

use super::handlers::{AppError, SharedState};
use super::page::{found, Page};
use super::urls;
use crate::auth::extractor::AuthUser;
use crate::forms::{FormContext, FormErrors};
use crate::notes::{
    is_valid_slug, slug_taken_message, CleanedNote, Note, NoteForm, NOTE_FORM_FIELDS,
};
use crate::store::StoreError;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    Form,
};
use uuid::Uuid;

const FORM_TEMPLATE: &str = "notes/form.html";

// ============================================================================
// Helpers
// ============================================================================

/// Load a note owned by `user`, or 404
pub(crate) async fn load_author_note(
    state: &SharedState,
    user: &AuthUser,
    slug: &str,
) -> Result<Note, AppError> {
    if !is_valid_slug(slug) {
        return Err(AppError::NotFound(format!("No note found for '{}'", slug)));
    }
    state
        .store
        .get_author_note(user.user_id, slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No note found for '{}'", slug)))
}

/// Field validation plus the slug uniqueness check against the store.
///
/// `exclude` is the note being edited, which may keep its own slug.
async fn clean_note_form(
    state: &SharedState,
    form: &NoteForm,
    exclude: Option<Uuid>,
) -> Result<Result<CleanedNote, FormErrors>, AppError> {
    let cleaned = match form.clean() {
        Ok(cleaned) => cleaned,
        Err(errors) => return Ok(Err(errors)),
    };

    if state.store.slug_exists(&cleaned.slug, exclude).await? {
        return Ok(Err(slug_error(&cleaned.slug)));
    }
    Ok(Ok(cleaned))
}

fn slug_error(slug: &str) -> FormErrors {
    let mut errors = FormErrors::new();
    errors.add("slug", slug_taken_message(slug));
    errors
}

/// A slug taken between the check and the write surfaces as a form error
fn slug_race(err: &anyhow::Error) -> Option<FormErrors> {
    match err.downcast_ref::<StoreError>() {
        Some(StoreError::SlugTaken(slug)) => Some(slug_error(slug)),
        _ => None,
    }
}

fn form_page(user: &AuthUser, form: FormContext) -> Page {
    Page::new(FORM_TEMPLATE, Some(user)).with("form", form)
}

fn note_page(template: &'static str, user: &AuthUser, note: &Note) -> Page {
    Page::new(template, Some(user))
        .with("object", note)
        .with("note", note)
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /notes/
pub async fn list(State(state): State<SharedState>, user: AuthUser) -> Result<Page, AppError> {
    let notes = state.store.list_author_notes(user.user_id).await?;
    Ok(Page::new("notes/list.html", Some(&user)).with("object_list", notes))
}

/// GET /add/
pub async fn add_page(user: AuthUser) -> Page {
    form_page(&user, FormContext::unbound(&NOTE_FORM_FIELDS))
}

/// POST /add/
pub async fn add(
    State(state): State<SharedState>,
    user: AuthUser,
    Form(form): Form<NoteForm>,
) -> Result<Response, AppError> {
    let cleaned = match clean_note_form(&state, &form, None).await? {
        Ok(cleaned) => cleaned,
        Err(errors) => return Ok(form_page(&user, form.to_bound_context(errors)).into_response()),
    };

    let note = Note::new(user.user_id, cleaned.title, cleaned.text, cleaned.slug);
    if let Err(e) = state.store.create_note(&note).await {
        return match slug_race(&e) {
            Some(errors) => Ok(form_page(&user, form.to_bound_context(errors)).into_response()),
            None => Err(e.into()),
        };
    }

    tracing::info!("{} added note '{}'", user.username, note.slug);
    Ok(found(urls::SUCCESS))
}

/// GET /note/{slug}/
pub async fn detail(
    State(state): State<SharedState>,
    user: AuthUser,
    Path(slug): Path<String>,
) -> Result<Page, AppError> {
    let note = load_author_note(&state, &user, &slug).await?;
    Ok(note_page("notes/detail.html", &user, &note))
}

/// GET /edit/{slug}/
pub async fn edit_page(
    State(state): State<SharedState>,
    user: AuthUser,
    Path(slug): Path<String>,
) -> Result<Page, AppError> {
    let note = load_author_note(&state, &user, &slug).await?;
    let form = NoteForm::from_note(&note).to_initial_context();
    Ok(note_page(FORM_TEMPLATE, &user, &note).with("form", form))
}

/// POST /edit/{slug}/
pub async fn edit(
    State(state): State<SharedState>,
    user: AuthUser,
    Path(slug): Path<String>,
    Form(form): Form<NoteForm>,
) -> Result<Response, AppError> {
    let note = load_author_note(&state, &user, &slug).await?;

    let rerender = |errors: FormErrors| {
        note_page(FORM_TEMPLATE, &user, &note)
            .with("form", form.to_bound_context(errors))
            .into_response()
    };

    let cleaned = match clean_note_form(&state, &form, Some(note.id)).await? {
        Ok(cleaned) => cleaned,
        Err(errors) => return Ok(rerender(errors)),
    };

    let updated = match state
        .store
        .update_note(note.id, &cleaned.title, &cleaned.text, &cleaned.slug)
        .await
    {
        Ok(updated) => updated,
        Err(e) => {
            return match slug_race(&e) {
                Some(errors) => Ok(rerender(errors)),
                None => Err(e.into()),
            }
        }
    };
    let updated =
        updated.ok_or_else(|| AppError::NotFound(format!("No note found for '{}'", slug)))?;

    tracing::info!(
        "{} edited note '{}' (now '{}')",
        user.username,
        slug,
        updated.slug
    );
    Ok(found(urls::SUCCESS))
}

/// GET /delete/{slug}/
pub async fn delete_page(
    State(state): State<SharedState>,
    user: AuthUser,
    Path(slug): Path<String>,
) -> Result<Page, AppError> {
    let note = load_author_note(&state, &user, &slug).await?;
    Ok(note_page("notes/delete.html", &user, &note))
}

/// POST /delete/{slug}/
pub async fn delete(
    State(state): State<SharedState>,
    user: AuthUser,
    Path(slug): Path<String>,
) -> Result<Response, AppError> {
    let note = load_author_note(&state, &user, &slug).await?;
    if !state.store.delete_note(note.id).await? {
        return Err(AppError::NotFound(format!("No note found for '{}'", slug)));
    }

    tracing::info!("{} deleted note '{}'", user.username, slug);
    Ok(found(urls::SUCCESS))
}

// ============================================================================
// Tests
// ============================================================================

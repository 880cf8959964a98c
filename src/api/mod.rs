//! HTTP layer for the notes service

pub mod auth_handlers;
pub mod handlers;
pub mod note_handlers;
pub mod page;
pub mod routes;
pub mod urls;

pub use routes::create_router;

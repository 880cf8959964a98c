//! Authentication module: session cookies
//!
//! Provides:
//! - Session keys and cookies for browsers (`session` submodule)
//! - User resolution and extractors (`extractor` submodule)
//! - The login-required middleware (`middleware` submodule)

pub mod extractor;
pub mod middleware;
pub mod session;

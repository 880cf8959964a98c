//! Persistence for users, sessions and notes

pub mod client;
mod impl_note_store;
pub mod memory;
pub mod models;
pub mod traits;

pub use client::Neo4jClient;
pub use memory::MemoryStore;
pub use models::*;
pub use traits::NoteStore;

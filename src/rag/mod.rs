//! RAG (Retrieval-Augmented Generation) module.
//!
//! This module provides:
//! - `VectorStore`: abstract interface over the handbook chunk store
//! - `SqliteVectorStore`: persistent on-disk implementation
//! - `RagQueryService`: embed -> retrieve -> prompt -> generate pipeline

mod query;
mod sqlite;
mod store;

pub use query::{Answer, RagQueryService};
pub use sqlite::SqliteVectorStore;
pub use store::{DocumentChunk, ScoredChunk, VectorStore};

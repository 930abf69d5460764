//! VectorStore trait — abstract interface over the handbook chunk store.
//!
//! The store holds the indexed company handbook: (text chunk, embedding,
//! source id) triples. Indexing happens out of band; this system only
//! searches it, plus batch-inserts for tooling and tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::errors::ApiError;

/// A stored handbook chunk with its source identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// Unique chunk identifier.
    pub chunk_id: String,
    /// The text content of the chunk.
    pub content: String,
    /// Source identifier carried in chunk metadata (for attribution).
    pub source_id: String,
}

/// Result of a similarity search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: DocumentChunk,
    /// Distance to the query embedding (lower = more similar).
    pub distance: f32,
}

/// Abstract trait for the vector store backing retrieval.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert chunks with their embedding vectors in batch.
    async fn insert_batch(&self, items: Vec<(DocumentChunk, Vec<f32>)>) -> Result<(), ApiError>;

    /// Nearest-neighbor search, ordered by ascending distance. Returns at
    /// most `limit` results; fewer when the corpus is smaller.
    async fn search(
        &self,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<ScoredChunk>, ApiError>;

    /// Total chunk count in the collection.
    async fn count(&self) -> Result<usize, ApiError>;
}

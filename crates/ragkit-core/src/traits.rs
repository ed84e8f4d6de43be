use crate::error::Result;
use crate::types::SearchHit;

/// Black-box `content -> vector` function. Dimensionality is fixed per
/// implementation and the output must be deterministic for a given input.
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Sparse ranking over raw text.
pub trait TextIndexer: Send + Sync {
    /// Returns `false` when the text produced no tokens and nothing was indexed.
    fn add_text(&mut self, chunk_id: &str, text: &str) -> Result<bool>;
    fn search_text(&self, query: &str, k: usize) -> Result<Vec<SearchHit>>;
}

/// Dense similarity ranking over embeddings of one modality.
pub trait VectorIndexer: Send + Sync {
    fn dim(&self) -> usize;
    fn add_vector(&mut self, chunk_id: &str, embedding: &[f32]) -> Result<()>;
    fn search_vec(&self, query_vec: &[f32], k: usize) -> Result<Vec<SearchHit>>;
}

/// Read access to chunk text owned by the external chunk store.
///
/// Implementations must fail with `Error::NotFound` for unknown ids.
pub trait ChunkTextSource: Send + Sync {
    fn fetch_chunk_text(&self, chunk_id: &str) -> Result<String>;
}

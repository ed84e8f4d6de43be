use serde::{Deserialize, Serialize};

use ragkit_core::error::{Error, Result};
use ragkit_core::traits::{Embedder, TextIndexer, VectorIndexer};
use ragkit_core::types::{FusedHit, SearchHit, SourceKind};

use crate::fusion::{fuse_weighted, FusionWeights};

/// Dense side of a query. No embedding means no dense candidates.
pub fn dense_retrieve<VI: VectorIndexer + ?Sized>(query_embedding: Option<&[f32]>, index: &VI, top_k: usize) -> Result<Vec<SearchHit>> {
    let Some(q) = query_embedding else { return Ok(Vec::new()) };
    let mut hits = index.search_vec(q, top_k)?;
    for h in &mut hits { h.source = SourceKind::Vector; }
    Ok(hits)
}

pub fn sparse_retrieve<TI: TextIndexer + ?Sized>(query: &str, index: &TI, top_k: usize) -> Result<Vec<SearchHit>> {
    let mut hits = index.search_text(query, top_k)?;
    for h in &mut hits { h.source = SourceKind::Text; }
    Ok(hits)
}

/// Fused candidates for one query, plus the `top_k` that was asked for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Retrieval {
    pub query: String,
    pub top_k: usize,
    pub candidates: Vec<FusedHit>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    pub lexical_indexed: usize,
    pub lexical_skipped: usize,
    pub dense_indexed: usize,
    pub dense_skipped: usize,
}

/// Lexical index + text-modality vector index + the embedder feeding it.
///
/// All three are injected by the caller; the retriever owns them for the
/// lifetime of the session.
pub struct HybridRetriever<TI, VI> where TI: TextIndexer, VI: VectorIndexer {
    text: TI,
    vector: VI,
    embedder: Box<dyn Embedder>,
    weights: FusionWeights,
}

impl<TI, VI> HybridRetriever<TI, VI> where TI: TextIndexer, VI: VectorIndexer {
    pub fn new(text: TI, vector: VI, embedder: Box<dyn Embedder>) -> Result<Self> {
        if embedder.dim() != vector.dim() {
            return Err(Error::DimensionMismatch { expected: vector.dim(), actual: embedder.dim() });
        }
        Ok(Self { text, vector, embedder, weights: FusionWeights::default() })
    }

    pub fn with_weights(mut self, weights: FusionWeights) -> Self { self.weights = weights; self }

    pub fn text(&self) -> &TI { &self.text }

    pub fn vector(&self) -> &VI { &self.vector }

    pub fn into_parts(self) -> (TI, VI) { (self.text, self.vector) }

    /// Feed `(chunk_id, text)` pairs, in order, to both indexes.
    ///
    /// Chunks without tokens or without any embeddable word are skipped by
    /// the index concerned and counted in the report; every other failure
    /// aborts the ingest.
    pub fn index<'a, I>(&mut self, chunks: I) -> Result<IngestReport>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let chunks: Vec<(&str, &str)> = chunks.into_iter().collect();
        // 1) embed in one batch
        let texts: Vec<String> = chunks.iter().map(|(_, t)| t.to_string()).collect();
        let embeddings = self.embedder.embed_batch(&texts)?;
        if embeddings.len() != chunks.len() {
            return Err(Error::InvalidInput(format!("embedder returned {} vectors for {} chunks", embeddings.len(), chunks.len())));
        }

        let mut report = IngestReport::default();
        for ((chunk_id, text), embedding) in chunks.iter().zip(&embeddings) {
            // 2) vector index
            match self.vector.add_vector(chunk_id, embedding) {
                Ok(()) => report.dense_indexed += 1,
                Err(Error::DegenerateVector(reason)) => {
                    tracing::warn!(chunk_id, %reason, "no dense vector for chunk");
                    report.dense_skipped += 1;
                }
                Err(e) => return Err(e),
            }
            // 3) text index
            if self.text.add_text(chunk_id, text)? { report.lexical_indexed += 1 } else { report.lexical_skipped += 1 }
        }
        tracing::info!(?report, "ingest complete");
        Ok(report)
    }

    /// Query both indexes independently and fuse the two rankings.
    pub fn retrieve(&self, query: &str, top_k: usize) -> Result<Retrieval> {
        let q_vec = self.embedder.embed_batch(&[query.to_string()])?.pop();
        let q_vec = q_vec.filter(|v| v.iter().any(|&x| x != 0.0));
        if q_vec.is_none() { tracing::debug!(query, "query has no embeddable content, dense side skipped"); }

        let dense = dense_retrieve(q_vec.as_deref(), &self.vector, top_k)?;
        let sparse = sparse_retrieve(query, &self.text, top_k)?;
        let candidates = fuse_weighted(&dense, &sparse, top_k, self.weights);
        tracing::info!(query, dense = dense.len(), sparse = sparse.len(), candidates = candidates.len(), "retrieval complete");
        Ok(Retrieval { query: query.to_string(), top_k, candidates })
    }
}

//! Exact cosine-similarity index for a single modality.
//!
//! Vectors are L2-normalized on insert and stored row-major in one buffer;
//! row `i` belongs to `id_map[i]`. Both only ever grow together.

use std::collections::HashSet;

use ragkit_core::error::{Error, Result};
use ragkit_core::traits::VectorIndexer;
use ragkit_core::types::{ChunkId, SearchHit, SourceKind};

use crate::persist::{self, ArtifactPaths};

#[derive(Debug, Clone)]
pub struct VectorIndex {
    dim: usize,
    data: Vec<f32>,
    id_map: Vec<ChunkId>,
    ids: HashSet<ChunkId>,
}

impl VectorIndex {
    pub fn new(dim: usize) -> Result<Self> {
        if dim == 0 { return Err(Error::InvalidInput("vector dimension must be positive".to_string())); }
        Ok(Self { dim, data: Vec::new(), id_map: Vec::new(), ids: HashSet::new() })
    }

    pub(crate) fn from_parts(dim: usize, data: Vec<f32>, id_map: Vec<ChunkId>) -> Result<Self> {
        debug_assert_eq!(data.len(), id_map.len() * dim);
        let mut ids = HashSet::with_capacity(id_map.len());
        for id in &id_map {
            if !ids.insert(id.clone()) {
                return Err(Error::CorruptArtifact(format!("chunk id '{}' appears twice in id map", id)));
            }
        }
        Ok(Self { dim, data, id_map, ids })
    }

    pub fn dim(&self) -> usize { self.dim }

    pub fn len(&self) -> usize { self.id_map.len() }

    pub fn is_empty(&self) -> bool { self.id_map.is_empty() }

    /// Chunk ids in ordinal (insertion) order.
    pub fn chunk_ids(&self) -> &[ChunkId] { &self.id_map }

    pub fn all_chunk_ids(&self) -> HashSet<ChunkId> { self.ids.clone() }

    /// Normalized vector stored at `ordinal`.
    pub fn vector(&self, ordinal: usize) -> Option<&[f32]> {
        self.data.get(ordinal * self.dim..(ordinal + 1) * self.dim)
    }

    pub(crate) fn raw_data(&self) -> &[f32] { &self.data }

    /// Validate, normalize and append `embedding` under `chunk_id`.
    ///
    /// Every check runs before the first write, so a rejected call leaves
    /// the index untouched.
    pub fn add(&mut self, embedding: &[f32], chunk_id: &str) -> Result<()> {
        let unit = normalize(embedding, self.dim)?;
        if self.ids.contains(chunk_id) {
            return Err(Error::DuplicateChunk(chunk_id.to_string()));
        }
        self.data.extend_from_slice(&unit);
        self.id_map.push(chunk_id.to_string());
        self.ids.insert(chunk_id.to_string());
        tracing::debug!(chunk_id, ordinal = self.id_map.len() - 1, "vector added");
        Ok(())
    }

    /// Top `top_k` chunks by cosine similarity to `query`, best first.
    ///
    /// Equal similarities keep insertion order.
    pub fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<SearchHit>> {
        if self.is_empty() || top_k == 0 { return Ok(Vec::new()); }
        let q = normalize(query, self.dim)?;

        let mut scored: Vec<(usize, f64)> = self
            .data
            .chunks_exact(self.dim)
            .map(|row| dot(row, &q))
            .enumerate()
            .collect();
        let by_rank = |x: &(usize, f64), y: &(usize, f64)| y.1.total_cmp(&x.1).then(x.0.cmp(&y.0));
        if top_k < scored.len() {
            scored.select_nth_unstable_by(top_k - 1, by_rank);
            scored.truncate(top_k);
        }
        scored.sort_by(by_rank);

        Ok(scored
            .into_iter()
            .map(|(ord, score)| SearchHit { id: self.id_map[ord].clone(), score, source: SourceKind::Vector })
            .collect())
    }

    pub fn save(&self, paths: &ArtifactPaths) -> Result<()> { persist::save(self, paths) }

    pub fn load(paths: &ArtifactPaths, dim: usize) -> Result<Self> { persist::load(paths, dim) }
}

impl VectorIndexer for VectorIndex {
    fn dim(&self) -> usize { self.dim }
    fn add_vector(&mut self, chunk_id: &str, embedding: &[f32]) -> Result<()> { self.add(embedding, chunk_id) }
    fn search_vec(&self, query_vec: &[f32], k: usize) -> Result<Vec<SearchHit>> { self.search(query_vec, k) }
}

/// L2-normalize `v`, rejecting wrong dimensionality and zero or non-finite norms.
pub fn normalize(v: &[f32], dim: usize) -> Result<Vec<f32>> {
    if v.len() != dim {
        return Err(Error::DimensionMismatch { expected: dim, actual: v.len() });
    }
    let norm = v.iter().map(|&x| f64::from(x) * f64::from(x)).sum::<f64>().sqrt();
    if norm == 0.0 || !norm.is_finite() {
        return Err(Error::DegenerateVector(format!("norm is {}", norm)));
    }
    Ok(v.iter().map(|&x| (f64::from(x) / norm) as f32).collect())
}

fn dot(a: &[f32], b: &[f32]) -> f64 {
    a.iter().zip(b).map(|(&x, &y)| f64::from(x) * f64::from(y)).sum()
}

//! On-disk layout of a vector index.
//!
//! Two artifacts per index:
//! - `<name>.vectors`: bincode blob holding the dimension, the row count and
//!   the normalized vectors row-major
//! - `<name>.ids.json`: JSON array of chunk ids, one per row, same order
//!
//! Loading refuses any pair whose lengths or dimension disagree.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use ragkit_core::error::{Error, Result};
use ragkit_core::persist::write_atomic;
use ragkit_core::types::{ChunkId, Modality};

use crate::index::VectorIndex;

const FORMAT_VERSION: u32 = 1;
const UNIT_NORM_TOLERANCE: f64 = 1e-4;

#[derive(Serialize, Deserialize)]
struct VectorArtifact {
    format_version: u32,
    dim: u64,
    count: u64,
    data: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub vectors: PathBuf,
    pub ids: PathBuf,
}

impl ArtifactPaths {
    pub fn new(dir: &Path, name: &str) -> Self {
        Self { vectors: dir.join(format!("{}.vectors", name)), ids: dir.join(format!("{}.ids.json", name)) }
    }

    pub fn for_modality(dir: &Path, modality: Modality) -> Self { Self::new(dir, modality.as_str()) }

    /// `Some(true)` when both artifacts exist, `Some(false)` when neither does,
    /// `None` for a half-written pair.
    pub fn presence(&self) -> Option<bool> {
        match (self.vectors.exists(), self.ids.exists()) {
            (true, true) => Some(true),
            (false, false) => Some(false),
            _ => None,
        }
    }
}

pub(crate) fn save(index: &VectorIndex, paths: &ArtifactPaths) -> Result<()> {
    let artifact = VectorArtifact {
        format_version: FORMAT_VERSION,
        dim: index.dim() as u64,
        count: index.len() as u64,
        data: index.raw_data().to_vec(),
    };
    let blob = bincode::serialize(&artifact).map_err(|e| Error::Serialization(e.to_string()))?;
    write_atomic(&paths.vectors, &blob)?;
    write_atomic(&paths.ids, &serde_json::to_vec(index.chunk_ids())?)?;
    tracing::info!(vectors = %paths.vectors.display(), count = index.len(), dim = index.dim(), "vector index saved");
    Ok(())
}

pub(crate) fn load(paths: &ArtifactPaths, dim: usize) -> Result<VectorIndex> {
    if dim == 0 { return Err(Error::InvalidInput("vector dimension must be positive".to_string())); }
    let blob = fs::read(&paths.vectors)?;
    let artifact: VectorArtifact = bincode::deserialize(&blob)
        .map_err(|e| Error::CorruptArtifact(format!("{}: {}", paths.vectors.display(), e)))?;
    if artifact.format_version != FORMAT_VERSION {
        return Err(Error::CorruptArtifact(format!(
            "{}: unsupported format version {}",
            paths.vectors.display(),
            artifact.format_version
        )));
    }
    if artifact.dim != dim as u64 {
        return Err(Error::DimensionMismatch { expected: dim, actual: artifact.dim as usize });
    }
    let count = usize::try_from(artifact.count)
        .map_err(|_| Error::CorruptArtifact(format!("{}: row count overflows", paths.vectors.display())))?;
    if count.checked_mul(dim) != Some(artifact.data.len()) {
        return Err(Error::CorruptArtifact(format!(
            "{}: header says {} rows of {} but blob holds {} floats",
            paths.vectors.display(),
            count,
            dim,
            artifact.data.len()
        )));
    }

    if let Some(row) = artifact.data.chunks_exact(dim).position(|row| !is_unit_row(row)) {
        return Err(Error::CorruptArtifact(format!(
            "{}: row {} is not a finite unit vector",
            paths.vectors.display(),
            row
        )));
    }

    let ids_bytes = fs::read(&paths.ids)?;
    let id_map: Vec<ChunkId> = serde_json::from_slice(&ids_bytes)
        .map_err(|e| Error::CorruptArtifact(format!("{}: {}", paths.ids.display(), e)))?;
    if id_map.len() != count {
        return Err(Error::LengthMismatch { vectors: count, ids: id_map.len() });
    }

    let index = VectorIndex::from_parts(dim, artifact.data, id_map)?;
    tracing::info!(vectors = %paths.vectors.display(), count = index.len(), dim, "vector index loaded");
    Ok(index)
}

fn is_unit_row(row: &[f32]) -> bool {
    if !row.iter().all(|x| x.is_finite()) { return false; }
    let norm = row.iter().map(|&x| f64::from(x) * f64::from(x)).sum::<f64>().sqrt();
    (norm - 1.0).abs() <= UNIT_NORM_TOLERANCE
}

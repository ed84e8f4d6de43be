//! Domain types shared by the lexical, vector, fusion and validation stages.

use serde::{Deserialize, Serialize};
use std::fmt;

pub type ChunkId = String;

/// Indicates which engine produced a result.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SourceKind {
    Vector,
    Text,
}

/// The minimal surface returned by both engines.
///
/// `id` is the chunk id the engine was fed at ingestion. `score` is
/// engine-specific (cosine similarity for vectors, BM25 for text) but
/// higher is always better. `source` labels the origin engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: ChunkId,
    pub score: f64,
    pub source: SourceKind,
}

/// One entry of the fused candidate list.
///
/// `dense_score` and `sparse_score` are the summed contributions of each
/// engine (0.0 when the engine did not return the chunk).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedHit {
    pub chunk_id: ChunkId,
    pub dense_score: f64,
    pub sparse_score: f64,
    pub fused_score: f64,
}

/// Embedding modality. Each modality owns an independent vector index.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Text,
    Image,
}

impl Modality {
    pub const ALL: [Modality; 2] = [Modality::Text, Modality::Image];

    pub fn as_str(self) -> &'static str {
        match self {
            Modality::Text => "text",
            Modality::Image => "image",
        }
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// A corpus line as supplied by the caller at ingestion time.
///
/// Text feeds the lexical index and the text-modality vector index. An
/// image embedding, when present, is computed upstream and goes straight
/// into the image-modality index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusRecord {
    pub chunk_id: ChunkId,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_embedding: Option<Vec<f32>>,
}

//! ragkit-hybrid
//!
//! Dense + sparse retrieval and the fusion stage that merges them.
pub mod fusion;
pub mod pipeline;

pub use fusion::{fuse, fuse_weighted, FusionWeights};
pub use pipeline::{dense_retrieve, sparse_retrieve, HybridRetriever, IngestReport, Retrieval};

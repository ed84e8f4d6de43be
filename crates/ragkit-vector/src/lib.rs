//! ragkit-vector
//!
//! Dense similarity search: one exact cosine index per modality, persisted
//! as a vector blob plus an ordered id map.
pub mod index;
pub mod modality;
pub mod persist;

pub use index::{normalize, VectorIndex};
pub use modality::ModalityIndexes;
pub use persist::ArtifactPaths;

//! In-memory chunk-text store.
//!
//! Stands in for the relational chunk store: the retrieval core only ever
//! reads text by id through [`ChunkTextSource`].
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::persist::write_atomic;
use crate::traits::ChunkTextSource;
use crate::types::ChunkId;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryChunkStore {
    texts: HashMap<ChunkId, String>,
}

impl InMemoryChunkStore {
    pub fn new() -> Self { Self::default() }

    pub fn insert(&mut self, chunk_id: impl Into<ChunkId>, text: impl Into<String>) {
        self.texts.insert(chunk_id.into(), text.into());
    }

    pub fn len(&self) -> usize { self.texts.len() }

    pub fn is_empty(&self) -> bool { self.texts.is_empty() }

    pub fn save(&self, path: &Path) -> Result<()> {
        write_atomic(path, &serde_json::to_vec(self)?)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)?;
        serde_json::from_slice(&bytes)
            .map_err(|e| Error::CorruptArtifact(format!("{}: {}", path.display(), e)))
    }
}

impl ChunkTextSource for InMemoryChunkStore {
    fn fetch_chunk_text(&self, chunk_id: &str) -> Result<String> {
        self.texts
            .get(chunk_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("chunk {}", chunk_id)))
    }
}

impl<K: Into<ChunkId>, V: Into<String>> FromIterator<(K, V)> for InMemoryChunkStore {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self { texts: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect() }
    }
}

//! Side-by-side text and image indexes.
//!
//! Each modality sits behind its own lock: writers to one modality never
//! block readers or writers of the other, and `save` snapshots each index
//! under a read lock so no `add` can interleave with it.

use parking_lot::{RwLock, RwLockReadGuard};
use std::path::Path;

use ragkit_core::config::VectorSettings;
use ragkit_core::error::{Error, Result};
use ragkit_core::types::{Modality, SearchHit};

use crate::index::VectorIndex;
use crate::persist::ArtifactPaths;

pub struct ModalityIndexes {
    text: RwLock<VectorIndex>,
    image: RwLock<VectorIndex>,
}

impl ModalityIndexes {
    pub fn new(settings: VectorSettings) -> Result<Self> {
        Ok(Self {
            text: RwLock::new(VectorIndex::new(settings.text_dim)?),
            image: RwLock::new(VectorIndex::new(settings.image_dim)?),
        })
    }

    /// Wrap already-built indexes, e.g. after an ingest.
    pub fn from_parts(text: VectorIndex, image: VectorIndex) -> Self {
        Self { text: RwLock::new(text), image: RwLock::new(image) }
    }

    /// Load every modality that has artifacts under `dir`; modalities without
    /// any artifact start empty. A half-present artifact pair is an error.
    pub fn open(dir: &Path, settings: VectorSettings) -> Result<Self> {
        let open_one = |modality: Modality, dim: usize| -> Result<VectorIndex> {
            let paths = ArtifactPaths::for_modality(dir, modality);
            match paths.presence() {
                Some(true) => VectorIndex::load(&paths, dim),
                Some(false) => {
                    tracing::info!(%modality, "no vector artifacts, starting empty");
                    VectorIndex::new(dim)
                }
                None => Err(Error::CorruptArtifact(format!(
                    "incomplete {} artifacts: {} / {}",
                    modality,
                    paths.vectors.display(),
                    paths.ids.display()
                ))),
            }
        };
        Ok(Self {
            text: RwLock::new(open_one(Modality::Text, settings.text_dim)?),
            image: RwLock::new(open_one(Modality::Image, settings.image_dim)?),
        })
    }

    fn slot(&self, modality: Modality) -> &RwLock<VectorIndex> {
        match modality {
            Modality::Text => &self.text,
            Modality::Image => &self.image,
        }
    }

    pub fn add(&self, modality: Modality, chunk_id: &str, embedding: &[f32]) -> Result<()> {
        self.slot(modality).write().add(embedding, chunk_id)
    }

    pub fn search(&self, modality: Modality, query: &[f32], top_k: usize) -> Result<Vec<SearchHit>> {
        self.slot(modality).read().search(query, top_k)
    }

    pub fn len(&self, modality: Modality) -> usize { self.slot(modality).read().len() }

    pub fn dim(&self, modality: Modality) -> usize { self.slot(modality).read().dim() }

    pub fn read(&self, modality: Modality) -> RwLockReadGuard<'_, VectorIndex> { self.slot(modality).read() }

    /// Persist every modality under `dir`, one thread per modality.
    pub fn save(&self, dir: &Path) -> Result<()> {
        std::thread::scope(|s| {
            let handles: Vec<_> = Modality::ALL
                .iter()
                .map(|&modality| {
                    s.spawn(move || {
                        let index = self.slot(modality).read();
                        index.save(&ArtifactPaths::for_modality(dir, modality))
                    })
                })
                .collect();
            for handle in handles {
                handle
                    .join()
                    .map_err(|_| Error::Io(std::io::Error::other("vector save thread panicked")))??;
            }
            Ok(())
        })
    }

    pub fn into_inner(self) -> (VectorIndex, VectorIndex) { (self.text.into_inner(), self.image.into_inner()) }
}

//! ragkit-embed
//!
//! Deterministic feature-hashing embedder. It stands in for the real text
//! encoder during development and in tests: texts sharing words get
//! similar vectors, and the same text always gets the same vector.
use std::hash::{Hash, Hasher};
use twox_hash::XxHash64;

use ragkit_core::error::{Error, Result};
use ragkit_core::traits::Embedder;

pub struct HashEmbedder { dim: usize, seed: u64 }

impl HashEmbedder {
    pub fn new(dim: usize) -> Result<Self> {
        if dim == 0 { return Err(Error::InvalidInput("embedding dimension must be positive".to_string())); }
        Ok(Self { dim, seed: 0 })
    }

    pub fn with_seed(mut self, seed: u64) -> Self { self.seed = seed; self }

    /// L2-normalized bag-of-words vector. Text without any word maps to the zero vector.
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        for token in text.split_whitespace() {
            let word: String = token.chars().filter(|c| c.is_alphanumeric()).flat_map(char::to_lowercase).collect();
            if word.is_empty() { continue; }
            let mut hasher = XxHash64::with_seed(self.seed);
            word.hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h % self.dim as u64) as usize;
            let val = 0.5 + (((h >> 32) as u32) as f32) / (u32::MAX as f32);
            v[idx] += val;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 { for x in &mut v { *x /= norm; } }
        v
    }
}

impl Embedder for HashEmbedder {
    fn dim(&self) -> usize { self.dim }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        tracing::debug!(batch = texts.len(), dim = self.dim, "hash embedding batch");
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}

pub fn get_default_embedder(dim: usize) -> Result<Box<dyn Embedder>> {
    tracing::info!(dim, "using HashEmbedder");
    Ok(Box::new(HashEmbedder::new(dim)?))
}

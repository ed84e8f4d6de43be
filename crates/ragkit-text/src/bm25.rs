//! In-memory BM25 index.
//!
//! Postings are kept per term as `(ordinal, tf)` pairs in insertion order,
//! where the ordinal is the position of the chunk in `docs`. Ordinals never
//! change because the index is append-only.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use ragkit_core::error::{Error, Result};
use ragkit_core::persist::write_atomic;
use ragkit_core::traits::TextIndexer;
use ragkit_core::types::{ChunkId, SearchHit, SourceKind};
use tantivy::tokenizer::TextAnalyzer;

use crate::tokenizer::{build_analyzer, tokenize};

/// BM25 tunables, `[lexical]` in the configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Bm25Params {
    pub k1: f64,
    pub b: f64,
}

impl Default for Bm25Params {
    fn default() -> Self { Self { k1: 1.5, b: 0.75 } }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DocEntry {
    id: ChunkId,
    length: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct Posting {
    doc: u32,
    tf: u32,
}

#[derive(Serialize, Deserialize)]
struct Snapshot {
    params: Bm25Params,
    docs: Vec<DocEntry>,
    postings: Vec<(String, Vec<Posting>)>,
}

pub struct Bm25Index {
    params: Bm25Params,
    analyzer: TextAnalyzer,
    docs: Vec<DocEntry>,
    ordinals: HashMap<ChunkId, u32>,
    postings: HashMap<String, Vec<Posting>>,
    total_length: u64,
    avgdl: f64,
}

impl Default for Bm25Index {
    fn default() -> Self { Self::new(Bm25Params::default()) }
}

impl Bm25Index {
    pub fn new(params: Bm25Params) -> Self {
        Self {
            params,
            analyzer: build_analyzer(),
            docs: Vec::new(),
            ordinals: HashMap::new(),
            postings: HashMap::new(),
            total_length: 0,
            avgdl: 0.0,
        }
    }

    pub fn params(&self) -> Bm25Params { self.params }

    /// Number of indexed chunks (N).
    pub fn corpus_size(&self) -> usize { self.docs.len() }

    pub fn is_empty(&self) -> bool { self.docs.is_empty() }

    pub fn average_doc_length(&self) -> f64 { self.avgdl }

    pub fn contains(&self, chunk_id: &str) -> bool { self.ordinals.contains_key(chunk_id) }

    pub fn doc_length(&self, chunk_id: &str) -> Option<usize> {
        self.ordinals.get(chunk_id).map(|&o| self.docs[o as usize].length as usize)
    }

    pub fn doc_frequency(&self, term: &str) -> usize {
        self.postings.get(term).map_or(0, Vec::len)
    }

    pub fn term_frequency(&self, term: &str, chunk_id: &str) -> usize {
        let (Some(&ord), Some(list)) = (self.ordinals.get(chunk_id), self.postings.get(term)) else { return 0 };
        list.binary_search_by_key(&ord, |p| p.doc).map_or(0, |i| list[i].tf as usize)
    }

    /// Tokenize `text` and register it under `chunk_id`.
    ///
    /// Returns `Ok(false)` without touching any state when no token survives
    /// tokenization. A chunk id that is already indexed is rejected.
    pub fn add(&mut self, chunk_id: &str, text: &str) -> Result<bool> {
        if self.ordinals.contains_key(chunk_id) {
            return Err(Error::DuplicateChunk(chunk_id.to_string()));
        }
        let tokens = tokenize(&mut self.analyzer, text);
        if tokens.is_empty() {
            tracing::debug!(chunk_id, "no indexable tokens, skipping");
            return Ok(false);
        }
        let ordinal = u32::try_from(self.docs.len())
            .map_err(|_| Error::InvalidInput("lexical index is full".to_string()))?;
        let length = u32::try_from(tokens.len())
            .map_err(|_| Error::InvalidInput(format!("chunk {} has too many tokens", chunk_id)))?;

        let mut counts: HashMap<String, u32> = HashMap::new();
        for token in tokens { *counts.entry(token).or_insert(0) += 1; }
        for (term, tf) in counts {
            self.postings.entry(term).or_default().push(Posting { doc: ordinal, tf });
        }

        self.docs.push(DocEntry { id: chunk_id.to_string(), length });
        self.ordinals.insert(chunk_id.to_string(), ordinal);
        self.total_length += u64::from(length);
        self.avgdl = self.total_length as f64 / self.docs.len() as f64;
        tracing::debug!(chunk_id, length, corpus_size = self.docs.len(), "chunk indexed");
        Ok(true)
    }

    /// `ln(1 + (N - df + 0.5) / (df + 0.5))`
    pub fn idf(&self, term: &str) -> f64 {
        let n = self.docs.len() as f64;
        let df = self.doc_frequency(term) as f64;
        (1.0 + (n - df + 0.5) / (df + 0.5)).ln()
    }

    /// Rank every chunk against `query`, best first.
    ///
    /// Query terms are not deduplicated: a term repeated in the query
    /// contributes once per occurrence. Chunks scoring 0 are never returned.
    /// Equal scores keep insertion order.
    pub fn search(&self, query: &str, top_k: usize) -> Vec<SearchHit> {
        if top_k == 0 || self.docs.is_empty() { return Vec::new(); }
        let terms = tokenize(&mut self.analyzer.clone(), query);
        if terms.is_empty() { return Vec::new(); }

        let Bm25Params { k1, b } = self.params;
        let mut scores = vec![0.0f64; self.docs.len()];
        for term in &terms {
            let Some(list) = self.postings.get(term) else { continue };
            let idf = self.idf(term);
            for posting in list {
                let tf = f64::from(posting.tf);
                let dl = f64::from(self.docs[posting.doc as usize].length);
                let denom = tf + k1 * (1.0 - b + b * dl / self.avgdl);
                scores[posting.doc as usize] += idf * tf * (k1 + 1.0) / denom;
            }
        }

        let mut ranked: Vec<(usize, f64)> = scores.into_iter().enumerate().filter(|&(_, s)| s > 0.0).collect();
        ranked.sort_by(|x, y| y.1.total_cmp(&x.1).then(x.0.cmp(&y.0)));
        ranked.truncate(top_k);
        tracing::debug!(query, terms = terms.len(), hits = ranked.len(), "bm25 search");
        ranked
            .into_iter()
            .map(|(ord, score)| SearchHit { id: self.docs[ord].id.clone(), score, source: SourceKind::Text })
            .collect()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let mut postings: Vec<(String, Vec<Posting>)> = self.postings.iter().map(|(t, l)| (t.clone(), l.clone())).collect();
        postings.sort_by(|a, b| a.0.cmp(&b.0));
        let snapshot = Snapshot { params: self.params, docs: self.docs.clone(), postings };
        write_atomic(path, &serde_json::to_vec(&snapshot)?)?;
        tracing::info!(path = %path.display(), corpus_size = self.docs.len(), terms = self.postings.len(), "lexical index saved");
        Ok(())
    }

    /// Restore a snapshot written by [`Bm25Index::save`].
    ///
    /// The snapshot is checked for internal consistency; any disagreement
    /// between postings and document lengths is reported as corruption.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)?;
        let snapshot: Snapshot = serde_json::from_slice(&bytes)
            .map_err(|e| Error::CorruptArtifact(format!("{}: {}", path.display(), e)))?;
        let index = Self::from_snapshot(snapshot)
            .map_err(|msg| Error::CorruptArtifact(format!("{}: {}", path.display(), msg)))?;
        tracing::info!(path = %path.display(), corpus_size = index.corpus_size(), "lexical index loaded");
        Ok(index)
    }

    fn from_snapshot(snapshot: Snapshot) -> std::result::Result<Self, String> {
        let mut index = Self::new(snapshot.params);
        let n = snapshot.docs.len();
        let mut token_sums = vec![0u64; n];
        for (term, list) in snapshot.postings {
            if list.is_empty() { return Err(format!("term '{}' has no postings", term)); }
            let mut prev: Option<u32> = None;
            for p in &list {
                if p.doc as usize >= n { return Err(format!("term '{}' refers to unknown document {}", term, p.doc)); }
                if p.tf == 0 { return Err(format!("term '{}' has a zero frequency posting", term)); }
                if prev.is_some_and(|d| d >= p.doc) { return Err(format!("postings of '{}' are out of order", term)); }
                prev = Some(p.doc);
                token_sums[p.doc as usize] += u64::from(p.tf);
            }
            if index.postings.insert(term.clone(), list).is_some() { return Err(format!("term '{}' listed twice", term)); }
        }
        for (ord, doc) in snapshot.docs.iter().enumerate() {
            if doc.length == 0 || token_sums[ord] != u64::from(doc.length) {
                return Err(format!("document '{}' length {} disagrees with postings ({})", doc.id, doc.length, token_sums[ord]));
            }
            if index.ordinals.insert(doc.id.clone(), ord as u32).is_some() {
                return Err(format!("document '{}' listed twice", doc.id));
            }
            index.total_length += u64::from(doc.length);
        }
        index.docs = snapshot.docs;
        if n > 0 { index.avgdl = index.total_length as f64 / n as f64; }
        Ok(index)
    }
}

impl TextIndexer for Bm25Index {
    fn add_text(&mut self, chunk_id: &str, text: &str) -> Result<bool> { self.add(chunk_id, text) }
    fn search_text(&self, query: &str, k: usize) -> Result<Vec<SearchHit>> { Ok(self.search(query, k)) }
}

//! ragkit-text
//!
//! Sparse lexical ranking: a BM25 index over whitespace/alphanumeric tokens,
//! with JSON snapshot persistence.
pub mod bm25;
pub mod tokenizer;

pub use bm25::{Bm25Index, Bm25Params};

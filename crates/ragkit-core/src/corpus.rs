//! JSON-lines corpus reader.
//!
//! One `CorpusRecord` per line. The order of lines is the ingestion order and
//! therefore the ordinal order of every index built from the corpus.
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{Error, Result};
use crate::types::CorpusRecord;

pub fn read_corpus(path: &Path) -> Result<Vec<CorpusRecord>> {
    let file = fs::File::open(path)?;
    let records = parse_corpus(BufReader::new(file))?;
    tracing::info!(path = %path.display(), records = records.len(), "corpus loaded");
    Ok(records)
}

pub fn parse_corpus<R: BufRead>(reader: R) -> Result<Vec<CorpusRecord>> {
    let mut records = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        let record: CorpusRecord = serde_json::from_str(&line)
            .map_err(|e| Error::InvalidInput(format!("corpus line {}: {}", line_no + 1, e)))?;
        if record.chunk_id.is_empty() {
            return Err(Error::InvalidInput(format!("corpus line {}: empty chunk_id", line_no + 1)));
        }
        records.push(record);
    }
    Ok(records)
}

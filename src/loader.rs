//! Chunked JSONL ingestion.
//!
//! Streams a newline-delimited JSON file as fixed-size chunks of parsed
//! records. Lines parse through simd-json first, falling back to
//! serde_json when SIMD parsing rejects the buffer. Elasticsearch export
//! envelopes (`{"_source": {...}}`) unwrap transparently.

use anyhow::{Context, Result};
use serde_json::Value;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::info;

/// Default number of lines per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 10_000;

/// Streams a JSONL file as chunks of parsed records.
pub struct JsonlChunks {
    reader: BufReader<File>,
    path: PathBuf,
    chunk_size: usize,
    line_no: usize,
    chunks: usize,
    records: usize,
}

impl JsonlChunks {
    pub fn open(path: impl AsRef<Path>, chunk_size: usize) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)
            .with_context(|| format!("failed to open input file: {}", path.display()))?;
        Ok(JsonlChunks {
            reader: BufReader::new(file),
            path,
            chunk_size: chunk_size.max(1),
            line_no: 0,
            chunks: 0,
            records: 0,
        })
    }

    /// Next chunk of records, or `None` at end of input. Blank lines are
    /// skipped; an unparseable line is an error.
    pub fn next_chunk(&mut self) -> Result<Option<Vec<Value>>> {
        let mut records = Vec::new();
        let mut line = String::new();
        while records.len() < self.chunk_size {
            line.clear();
            let read = self
                .reader
                .read_line(&mut line)
                .with_context(|| format!("failed to read {}", self.path.display()))?;
            if read == 0 {
                break;
            }
            self.line_no += 1;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let value = parse_record(trimmed)
                .with_context(|| format!("invalid JSON at {}:{}", self.path.display(), self.line_no))?;
            records.push(unwrap_source(value));
        }

        if records.is_empty() {
            return Ok(None);
        }
        self.chunks += 1;
        self.records += records.len();
        if self.chunks % 10 == 0 {
            info!(chunks = self.chunks, records = self.records, "loading {}", self.path.display());
        }
        Ok(Some(records))
    }

    pub fn chunks_loaded(&self) -> usize {
        self.chunks
    }

    pub fn records_loaded(&self) -> usize {
        self.records
    }
}

/// SIMD parse fast path with a serde_json fallback.
fn parse_record(line: &str) -> Result<Value> {
    let mut bytes = line.as_bytes().to_vec();
    match simd_json::serde::from_slice::<Value>(&mut bytes) {
        Ok(value) => Ok(value),
        Err(_) => Ok(serde_json::from_str(line)?),
    }
}

/// Unwrap Elasticsearch export envelopes: a record whose `_source` is an
/// object becomes that object.
fn unwrap_source(mut value: Value) -> Value {
    let source = match &mut value {
        Value::Object(record) if matches!(record.get("_source"), Some(Value::Object(_))) => {
            record.remove("_source")
        }
        _ => None,
    };
    source.unwrap_or(value)
}

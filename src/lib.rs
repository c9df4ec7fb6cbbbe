//! # Laminoir - company dataset extraction
//!
//! Flattens nested company/article/signal JSONL exports into nine
//! analysis-ready tables keyed by company identity (name, SIREN, SIRET).
//!
//! ## Modules
//!
//! - **extract**: the record-to-table extraction core (field resolvers,
//!   identity keys, fan-out expanders, catalog assembly)
//! - **loader**: chunked JSONL ingestion
//! - **writer**: CSV / JSONL dataset persistence
//!
//! ## Quick Start
//!
//! ```rust
//! use laminoir::extract::{finalize, CompanyExtractor};
//! use serde_json::json;
//!
//! let records = vec![json!({
//!     "socialName": "Acme",
//!     "siren": "123456789",
//!     "siret": 12345678901234u64,
//! })];
//!
//! let mut extractor = CompanyExtractor::new();
//! extractor.extract_batch(&records);
//! let datasets = finalize(extractor.into_datasets());
//!
//! // One row per company table, all keyed by the same identity triple.
//! assert_eq!(datasets["01_company_basic_info"].len(), 1);
//! assert_eq!(
//!     datasets["02_financial_data"].rows[0]["siret"],
//!     json!("12345678901234")
//! );
//! ```

use anyhow::Result;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::info;

pub mod extract;
pub mod loader;
pub mod writer;

// Re-export commonly used types for convenience
pub use extract::{
    finalize, format_siret, merge, ArticleExtractor, CompanyExtractor, Datasets, IdentityKey,
    Row, SignalExtractor, Table, DATASET_NAMES,
};
pub use loader::{JsonlChunks, DEFAULT_CHUNK_SIZE};

/// Routing selector for input files: each file must be declared as one of
/// the three record kinds so its records reach the right extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Company,
    Article,
    Project,
}

/// Records routed to no known extractor - the one fatal condition in the
/// library.
#[derive(Debug, thiserror::Error)]
#[error("unknown record kind `{0}`; expected `company`, `article` or `project`")]
pub struct UnknownRecordKind(String);

impl FromStr for RecordKind {
    type Err = UnknownRecordKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "company" => Ok(RecordKind::Company),
            "article" => Ok(RecordKind::Article),
            "project" => Ok(RecordKind::Project),
            other => Err(UnknownRecordKind(other.to_string())),
        }
    }
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Company => "company",
            RecordKind::Article => "article",
            RecordKind::Project => "project",
        }
    }
}

/// Extraction options shared by the pipeline and the CLI.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Records per processing chunk.
    pub chunk_size: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        ExtractOptions {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

enum DatasetExtractor {
    Company(CompanyExtractor),
    Article(ArticleExtractor),
    Signal(SignalExtractor),
}

impl DatasetExtractor {
    fn for_kind(kind: RecordKind) -> Self {
        match kind {
            RecordKind::Company => DatasetExtractor::Company(CompanyExtractor::new()),
            RecordKind::Article => DatasetExtractor::Article(ArticleExtractor::new()),
            RecordKind::Project => DatasetExtractor::Signal(SignalExtractor::new()),
        }
    }

    fn extract_batch(&mut self, batch: &[serde_json::Value]) {
        match self {
            DatasetExtractor::Company(extractor) => extractor.extract_batch(batch),
            DatasetExtractor::Article(extractor) => extractor.extract_batch(batch),
            DatasetExtractor::Signal(extractor) => extractor.extract_batch(batch),
        }
    }

    fn into_datasets(self) -> Datasets {
        match self {
            DatasetExtractor::Company(extractor) => extractor.into_datasets(),
            DatasetExtractor::Article(extractor) => extractor.into_datasets(),
            DatasetExtractor::Signal(extractor) => extractor.into_datasets(),
        }
    }
}

/// Main entry point: stream each input file through the extractor for its
/// declared kind, merge the per-file dataset maps in input order, and
/// return the nine finalized datasets.
pub fn run_extraction(inputs: &[(RecordKind, PathBuf)], options: &ExtractOptions) -> Result<Datasets> {
    let mut per_file = Vec::new();
    for (kind, path) in inputs {
        let mut chunks = JsonlChunks::open(path, options.chunk_size)?;
        let mut extractor = DatasetExtractor::for_kind(*kind);
        while let Some(batch) = chunks.next_chunk()? {
            extractor.extract_batch(&batch);
        }
        info!(
            kind = kind.as_str(),
            chunks = chunks.chunks_loaded(),
            records = chunks.records_loaded(),
            "extracted {}",
            path.display()
        );
        per_file.push(extractor.into_datasets());
    }
    Ok(finalize(merge(per_file)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn test_record_kind_parsing() {
        assert_eq!("company".parse::<RecordKind>().unwrap(), RecordKind::Company);
        assert_eq!("project".parse::<RecordKind>().unwrap(), RecordKind::Project);
        assert!("invoice".parse::<RecordKind>().is_err());
    }

    #[test]
    fn test_company_record_end_to_end() {
        let records = vec![json!({
            "socialName": "Acme",
            "siren": "123456789",
            "siret": 12345678901234u64,
            "articles": [
                {"title": "tiers", "companies": [{"label": "Globex", "siren": "987654321"}]},
                {"title": "propre"}
            ]
        })];

        let mut extractor = CompanyExtractor::new();
        extractor.extract_batch(&records);
        let datasets = finalize(extractor.into_datasets());

        // One row in each of the seven company tables, same identity.
        for name in &DATASET_NAMES[..6] {
            let table = &datasets[*name];
            assert_eq!(table.len(), 1, "{name}");
            assert_eq!(table.rows[0]["company_name"], json!("Acme"));
            assert_eq!(table.rows[0]["siren"], json!("123456789"));
            assert_eq!(table.rows[0]["siret"], json!("12345678901234"));
        }
        assert!(datasets["07_kpi_data"].is_empty());

        // First article keeps its own reference, second inherits Acme.
        let articles = &datasets["09_articles"];
        assert_eq!(articles.len(), 2);
        assert_eq!(articles.rows[0]["company_name"], json!("Globex"));
        assert_eq!(articles.rows[1]["company_name"], json!("Acme"));
        assert_eq!(articles.rows[1]["siret"], json!("12345678901234"));

        // Identity columns lead every non-empty table; the rest is sorted;
        // every row carries the full identity column set.
        for table in datasets.values().filter(|table| !table.is_empty()) {
            assert_eq!(&table.columns[..3], IdentityKey::COLUMNS);
            let rest = &table.columns[3..];
            let mut sorted = rest.to_vec();
            sorted.sort();
            assert_eq!(rest, sorted.as_slice());
            for row in &table.rows {
                for column in IdentityKey::COLUMNS {
                    assert!(row.contains_key(column));
                }
            }
        }
    }

    #[test]
    fn test_run_extraction_merges_files() {
        let dir = std::env::temp_dir().join(format!("laminoir_pipeline_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let company_path = dir.join("companies.jsonl");
        let mut file = std::fs::File::create(&company_path).unwrap();
        writeln!(file, "{}", json!({"socialName": "Acme", "siren": "123456789"})).unwrap();
        writeln!(file, "{}", json!({"_source": {"socialName": "Globex", "siren": "987654321"}})).unwrap();

        let signal_path = dir.join("projects.jsonl");
        let mut file = std::fs::File::create(&signal_path).unwrap();
        writeln!(
            file,
            "{}",
            json!({"companies": [{"id": 1}], "sirets": ["12345678901234"]})
        )
        .unwrap();

        let datasets = run_extraction(
            &[
                (RecordKind::Company, company_path),
                (RecordKind::Project, signal_path),
            ],
            &ExtractOptions::default(),
        )
        .unwrap();

        assert_eq!(datasets["01_company_basic_info"].len(), 2);
        assert_eq!(datasets["01_company_basic_info"].rows[1]["company_name"], json!("Globex"));
        assert_eq!(datasets["08_signals"].len(), 2);
        assert_eq!(datasets.len(), DATASET_NAMES.len());

        std::fs::remove_dir_all(dir).ok();
    }
}

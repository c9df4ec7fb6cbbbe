//! Article fan-out: one output row per (article, referenced company) pair.

use serde_json::{Map, Value};

use crate::extract::catalog::{Datasets, Row, Table};
use crate::extract::identity::IdentityKey;
use crate::extract::value::{get_list, get_str, join_labels, nested_str, set_text};

/// Expands article-shaped rows into the `09_articles` dataset.
///
/// The company-reference list falls back from `companies` to
/// `all_companies`; an article with neither still emits one row carrying
/// the all-empty identity key.
#[derive(Debug, Default)]
pub struct ArticleExtractor {
    rows: Vec<Row>,
}

impl ArticleExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expand one batch of article rows, appending to the internal buffer.
    pub fn extract_batch(&mut self, batch: &[Value]) {
        for record in batch {
            if let Value::Object(row) = record {
                self.expand_row(row);
            }
        }
    }

    fn expand_row(&mut self, row: &Map<String, Value>) {
        let mut companies = get_list(row, "companies");
        if companies.is_empty() {
            companies = get_list(row, "all_companies");
        }

        if companies.is_empty() {
            let out = build_row(row, &IdentityKey::empty());
            self.rows.push(out);
            return;
        }

        for company in &companies {
            let identity = match company {
                Value::Object(reference) => IdentityKey::from_article_company(reference),
                _ => IdentityKey::empty(),
            };
            let out = build_row(row, &identity);
            self.rows.push(out);
        }
    }

    /// Drain the buffer into the dataset map.
    pub fn into_datasets(self) -> Datasets {
        let mut datasets = Datasets::new();
        datasets.insert("09_articles".to_string(), Table::from_rows(self.rows));
        datasets
    }
}

fn build_row(row: &Map<String, Value>, identity: &IdentityKey) -> Row {
    let mut out = Row::new();
    identity.apply_to(&mut out);
    set_text(&mut out, "title", get_str(row, "title"));
    set_text(&mut out, "publishedAt", get_str(row, "publishedAt"));
    set_text(&mut out, "author", nested_str(row, "author", "name"));
    set_text(&mut out, "signalsStatus", join_labels(&get_list(row, "signalsStatus")));
    set_text(&mut out, "signalsType", join_labels(&get_list(row, "signalsType")));
    set_text(&mut out, "country", nested_str(row, "country", "label"));
    set_text(&mut out, "sectors", join_labels(&get_list(row, "sectors")));
    set_text(&mut out, "cities", join_labels(&get_list(row, "cities")));
    set_text(&mut out, "sources", join_labels(&get_list(row, "sources")));
    set_text(&mut out, "departments", join_labels(&get_list(row, "departments")));
    // Counts reflect the original reference lists, not the fan-out.
    out.insert(
        "all_companies_count".to_string(),
        Value::from(get_list(row, "all_companies").len() as u64),
    );
    out.insert(
        "companies_count".to_string(),
        Value::from(get_list(row, "companies").len() as u64),
    );
    out
}

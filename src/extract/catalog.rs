//! Tables, dataset names and catalog assembly.
//!
//! Extractors accumulate rows per dataset; the catalog concatenates the
//! partial results in arrival order, fixes the column order (identity
//! columns first, remainder alphabetical) and pads every row to the full
//! column set.

use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};

use crate::extract::identity::IdentityKey;

/// One output row: column name to scalar value.
pub type Row = Map<String, Value>;

/// Dataset name to finalized table.
pub type Datasets = BTreeMap<String, Table>;

/// The nine dataset names, in catalog order.
pub const DATASET_NAMES: [&str; 9] = [
    "01_company_basic_info",
    "02_financial_data",
    "03_workforce_data",
    "04_company_structure",
    "05_classification_flags",
    "06_contact_metrics",
    "07_kpi_data",
    "08_signals",
    "09_articles",
];

/// A flat table: explicit column order plus rows sharing that schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Build a table from rows produced in order; columns keep first-seen
    /// order until the catalog sorts them.
    pub fn from_rows(rows: Vec<Row>) -> Self {
        let mut columns = Vec::new();
        let mut seen = HashSet::new();
        for row in &rows {
            for key in row.keys() {
                if seen.insert(key.clone()) {
                    columns.push(key.clone());
                }
            }
        }
        Table { columns, rows }
    }

    /// Append another table's rows, unioning columns in arrival order.
    pub fn append(&mut self, other: Table) {
        for column in other.columns {
            if !self.columns.contains(&column) {
                self.columns.push(column);
            }
        }
        self.rows.extend(other.rows);
    }
}

/// Merge per-file dataset maps, concatenating same-name tables in arrival
/// order.
pub fn merge(maps: Vec<Datasets>) -> Datasets {
    let mut merged = Datasets::new();
    for map in maps {
        for (name, table) in map {
            merged.entry(name).or_default().append(table);
        }
    }
    merged
}

/// Identity columns first in their fixed order, remaining columns in
/// ascending lexicographic order.
fn ordered_columns(columns: &[String]) -> Vec<String> {
    let mut ordered: Vec<String> = IdentityKey::COLUMNS
        .iter()
        .filter(|identity| columns.iter().any(|column| column == *identity))
        .map(|identity| identity.to_string())
        .collect();
    let mut rest: Vec<String> = columns
        .iter()
        .filter(|column| !IdentityKey::COLUMNS.contains(&column.as_str()))
        .cloned()
        .collect();
    rest.sort();
    ordered.extend(rest);
    ordered
}

/// Normalize the dataset map: every catalog name present, columns ordered,
/// rows padded to the full column set with empty strings. Idempotent;
/// cell content is never altered.
pub fn finalize(mut datasets: Datasets) -> Datasets {
    let mut result = Datasets::new();
    for name in DATASET_NAMES {
        let mut table = datasets.remove(name).unwrap_or_default();
        if !table.is_empty() {
            table.columns = ordered_columns(&table.columns);
            let Table { columns, rows } = &mut table;
            for row in rows.iter_mut() {
                for column in columns.iter() {
                    if !row.contains_key(column) {
                        row.insert(column.clone(), Value::String(String::new()));
                    }
                }
            }
        }
        result.insert(name.to_string(), table);
    }
    result
}

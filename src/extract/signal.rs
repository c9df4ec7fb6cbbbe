//! Signal/project fan-out: one output row per associated company or SIRET.

use serde_json::{Map, Value};

use crate::extract::catalog::{Datasets, Row, Table};
use crate::extract::identity::IdentityKey;
use crate::extract::value::{first_label, get_list, get_str, join_labels, nested_str, set_text};

/// Expands signal-shaped rows into the `08_signals` dataset.
///
/// Company references resolve through `companies`, `companiesmain`,
/// `allCompanies` (first non-empty wins). The `sirets` list is independent:
/// when both lists are present, both produce rows (an additive union, not a
/// fallback).
#[derive(Debug, Default)]
pub struct SignalExtractor {
    rows: Vec<Row>,
}

impl SignalExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expand one batch of signal rows, appending to the internal buffer.
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
            companies = get_list(row, "companiesmain");
        }
        if companies.is_empty() {
            companies = get_list(row, "allCompanies");
        }
        let sirets = get_list(row, "sirets");

        if companies.is_empty() && sirets.is_empty() {
            let out = build_row(row, &IdentityKey::empty());
            self.rows.push(out);
            return;
        }

        for company in &companies {
            let out = build_row(row, &IdentityKey::from_signal_company(company));
            self.rows.push(out);
        }
        for entry in &sirets {
            let out = build_row(row, &IdentityKey::from_bare_siret(entry));
            self.rows.push(out);
        }
    }

    /// Drain the buffer into the dataset map.
    pub fn into_datasets(self) -> Datasets {
        let mut datasets = Datasets::new();
        datasets.insert("08_signals".to_string(), Table::from_rows(self.rows));
        datasets
    }
}

fn build_row(row: &Map<String, Value>, identity: &IdentityKey) -> Row {
    let mut out = Row::new();
    identity.apply_to(&mut out);
    set_text(&mut out, "continent", join_labels(&get_list(row, "continent")));
    set_text(&mut out, "country", first_label(row.get("country")));
    set_text(&mut out, "departement", first_label(row.get("departement")));
    set_text(&mut out, "publishedAt", get_str(row, "publishedAt"));
    out.insert("isMain".to_string(), Value::Bool(true));
    set_text(&mut out, "type", nested_str(row, "type", "label"));
    set_text(&mut out, "type_id", nested_str(row, "type", "id"));
    set_text(&mut out, "createdAt", get_str(row, "createdAt"));
    set_text(&mut out, "statut", nested_str(row, "statut", "label"));
    set_text(&mut out, "city_label", get_str(row, "city_label"));
    set_text(&mut out, "city_zip_code", get_str(row, "city_zip_code"));
    set_text(&mut out, "natureOp", join_labels(&get_list(row, "natureOp")));
    // Counts reflect the original reference lists, not the fan-out.
    out.insert(
        "companies_count".to_string(),
        Value::from(get_list(row, "companies").len() as u64),
    );
    out.insert(
        "sirets_count".to_string(),
        Value::from(get_list(row, "sirets").len() as u64),
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn expand(rows: Vec<Value>) -> Vec<Row> {
        let mut extractor = SignalExtractor::new();
        extractor.extract_batch(&rows);
        let mut datasets = extractor.into_datasets();
        datasets.remove("08_signals").unwrap().rows
    }

    #[test]
    fn test_additive_union_of_companies_and_sirets() {
        let rows = expand(vec![json!({
            "companies": [{"id": 11}, {"id": 22}],
            "sirets": ["12345678901234", "98765432109876", "11111111111111"]
        })]);

        // 2 company rows followed by 3 siret rows, never a subset.
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0]["siren"], json!("11"));
        assert_eq!(rows[1]["siren"], json!("22"));
        assert_eq!(rows[2]["siret"], json!("12345678901234"));
        assert_eq!(rows[2]["siren"], json!("123456789"));
        assert_eq!(rows[4]["siret"], json!("11111111111111"));
        for row in &rows {
            assert_eq!(row["companies_count"], json!(2));
            assert_eq!(row["sirets_count"], json!(3));
        }
    }

    #[test]
    fn test_company_chain_first_non_empty_wins() {
        let rows = expand(vec![json!({
            "companies": [],
            "companiesmain": [{"id": 7}],
            "allCompanies": [{"id": 8}, {"id": 9}]
        })]);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["siren"], json!("7"));
    }

    #[test]
    fn test_no_associations_emits_single_empty_identity_row() {
        let rows = expand(vec![json!({"type": {"label": "implantation"}})]);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["company_name"], json!(""));
        assert_eq!(rows[0]["siren"], json!(""));
        assert_eq!(rows[0]["siret"], json!(""));
        assert_eq!(rows[0]["type"], json!("implantation"));
    }

    #[test]
    fn test_siret_entries_as_objects() {
        let rows = expand(vec![json!({
            "sirets": [{"siret": 12345678901234u64}]
        })]);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["siret"], json!("12345678901234"));
        assert_eq!(rows[0]["siren"], json!("123456789"));
    }

    #[test]
    fn test_shared_columns() {
        let rows = expand(vec![json!({
            "continent": [{"label": "Europe"}],
            "country": [{"label": "France"}],
            "departement": {"label": "Morbihan"},
            "publishedAt": "2024-05-01",
            "createdAt": "2024-04-28",
            "type": {"label": "extension", "id": "t-12"},
            "statut": {"label": "en cours"},
            "city_label": "Vannes",
            "city_zip_code": "56000",
            "natureOp": [{"label": "création"}, {"label": "reprise"}]
        })]);

        let row = &rows[0];
        assert_eq!(row["continent"], json!("Europe"));
        assert_eq!(row["country"], json!("France"));
        assert_eq!(row["departement"], json!("Morbihan"));
        assert_eq!(row["isMain"], json!(true));
        assert_eq!(row["type"], json!("extension"));
        assert_eq!(row["type_id"], json!("t-12"));
        assert_eq!(row["statut"], json!("en cours"));
        assert_eq!(row["natureOp"], json!("création, reprise"));
        assert_eq!(row["city_zip_code"], json!("56000"));
    }
}

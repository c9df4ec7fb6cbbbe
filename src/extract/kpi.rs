//! Year-keyed KPI expansion.
//!
//! The KPI mapping moved around across ingestion generations: it can sit at
//! the record top level, under a dotted flattened key, or inside the
//! `computed` / `v1legacy` containers (sometimes still serialized as a JSON
//! string). Candidates are tried in priority order and the first non-empty
//! mapping wins.

use serde_json::{Map, Value};

use crate::extract::catalog::Row;
use crate::extract::identity::IdentityKey;

/// Expand the record's KPI mapping into one row per year, each carrying the
/// record's identity, the year as a string, and that year's metric fields.
/// Records with no resolvable mapping contribute nothing.
pub fn expand(record: &Map<String, Value>, identity: &IdentityKey) -> Vec<Row> {
    let Some(mapping) = resolve_mapping(record) else {
        return Vec::new();
    };

    let mut rows = Vec::new();
    for (year, metrics) in &mapping {
        let Value::Object(metrics) = metrics else {
            continue;
        };
        let mut row = Row::new();
        identity.apply_to(&mut row);
        row.insert("year".to_string(), Value::String(year.clone()));
        for (key, value) in metrics {
            row.insert(key.clone(), value.clone());
        }
        rows.push(row);
    }
    rows
}

fn resolve_mapping(record: &Map<String, Value>) -> Option<Map<String, Value>> {
    direct_mapping(record.get("kpi"))
        .or_else(|| direct_mapping(record.get("computed.kpi")))
        .or_else(|| container_mapping(record.get("computed")))
        .or_else(|| direct_mapping(record.get("v1legacy.kpi")))
        .or_else(|| container_mapping(record.get("v1legacy")))
}

fn direct_mapping(value: Option<&Value>) -> Option<Map<String, Value>> {
    match value {
        Some(Value::Object(map)) if !map.is_empty() => Some(map.clone()),
        _ => None,
    }
}

/// `kpi` inside a container object, parsing the container from a serialized
/// JSON string when needed.
fn container_mapping(value: Option<&Value>) -> Option<Map<String, Value>> {
    match value {
        Some(Value::Object(container)) => direct_mapping(container.get("kpi")),
        Some(Value::String(raw)) if !raw.is_empty() => {
            match serde_json::from_str::<Value>(raw).ok()? {
                Value::Object(container) => direct_mapping(container.get("kpi")),
                _ => None,
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    fn identity() -> IdentityKey {
        IdentityKey {
            company_name: "Acme".to_string(),
            siren: "123456789".to_string(),
            siret: "12345678901234".to_string(),
        }
    }

    #[test]
    fn test_one_row_per_year() {
        let rec = record(json!({
            "kpi": {
                "2022": {"ca": 100, "marge": 0.2},
                "2023": {"ca": 120, "marge": 0.3}
            }
        }));

        let rows = expand(&rec, &identity());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["year"], json!("2022"));
        assert_eq!(rows[0]["ca"], json!(100));
        assert_eq!(rows[1]["year"], json!("2023"));
        assert_eq!(rows[1]["company_name"], json!("Acme"));
    }

    #[test]
    fn test_no_mapping_no_rows() {
        assert!(expand(&record(json!({"siren": "123"})), &identity()).is_empty());
        assert!(expand(&record(json!({"kpi": {}})), &identity()).is_empty());
        assert!(expand(&record(json!({"kpi": "not a mapping"})), &identity()).is_empty());
    }

    #[test]
    fn test_candidate_priority() {
        // Top-level `kpi` wins over the nested containers.
        let rec = record(json!({
            "kpi": {"2020": {"ca": 1}},
            "computed": {"kpi": {"2021": {"ca": 2}}}
        }));
        let rows = expand(&rec, &identity());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["year"], json!("2020"));

        // Empty top-level candidate falls through to `computed`.
        let rec = record(json!({
            "kpi": {},
            "computed": {"kpi": {"2021": {"ca": 2}}}
        }));
        let rows = expand(&rec, &identity());
        assert_eq!(rows[0]["year"], json!("2021"));
    }

    #[test]
    fn test_dotted_flattened_keys() {
        let rec = record(json!({"computed.kpi": {"2019": {"ca": 5}}}));
        assert_eq!(expand(&rec, &identity()).len(), 1);

        let rec = record(json!({"v1legacy.kpi": {"2018": {"ca": 5}}}));
        assert_eq!(expand(&rec, &identity()).len(), 1);
    }

    #[test]
    fn test_string_serialized_container() {
        let rec = record(json!({
            "computed": "{\"kpi\": {\"2022\": {\"ca\": 9}}}"
        }));
        let rows = expand(&rec, &identity());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["ca"], json!(9));

        // Broken serialized container falls through to the legacy one.
        let rec = record(json!({
            "computed": "{not json",
            "v1legacy": {"kpi": {"2017": {"ca": 3}}}
        }));
        let rows = expand(&rec, &identity());
        assert_eq!(rows[0]["year"], json!("2017"));
    }

    #[test]
    fn test_non_object_years_skipped() {
        let rec = record(json!({
            "kpi": {"2022": {"ca": 1}, "note": "partial year"}
        }));
        let rows = expand(&rec, &identity());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["year"], json!("2022"));
    }
}

//! SIRET canonicalization and identity key derivation.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::extract::catalog::Row;
use crate::extract::value::{display_string, first_str, get_str, truthy};

// Already-canonical SIRET: exactly 14 digits.
static SIRET_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{14}$").unwrap());

/// Canonicalize a SIRET-like value to a left-zero-padded 14-digit string.
///
/// Empty, null and the literal `"nan"` marker normalize to the empty
/// string; an already-14-digit string is returned as-is; unparseable
/// strings pass through trimmed; non-scalar values degrade to their compact
/// string form. Never fails.
pub fn format_siret(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Number(n) => match n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)) {
            Some(i) => format!("{:014}", i),
            None => n.to_string(),
        },
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() || trimmed == "nan" {
                return String::new();
            }
            if SIRET_DIGITS.is_match(trimmed) {
                return trimmed.to_string();
            }
            match trimmed
                .parse::<i64>()
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().map(|f| f as i64))
            {
                Some(i) => format!("{:014}", i),
                None => trimmed.to_string(),
            }
        }
        other => display_string(other),
    }
}

/// The (company_name, siren, siret) triple attached to every output row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityKey {
    pub company_name: String,
    pub siren: String,
    pub siret: String,
}

impl IdentityKey {
    /// Identity column names, in their fixed output order.
    pub const COLUMNS: [&'static str; 3] = ["company_name", "siren", "siret"];

    /// The all-empty key used when a row carries no identity information.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Identity of a full company record. The company name falls back
    /// through `label`, `name` and `raison_sociale`; first non-empty wins.
    pub fn from_company_record(record: &Map<String, Value>) -> Self {
        IdentityKey {
            company_name: first_str(record, &["socialName", "label", "name", "raison_sociale"]),
            siren: get_str(record, "siren"),
            siret: format_siret(record.get("siret").unwrap_or(&Value::Null)),
        }
    }

    /// Identity of a company reference embedded in an article row.
    pub fn from_article_company(reference: &Map<String, Value>) -> Self {
        IdentityKey {
            company_name: get_str(reference, "label"),
            siren: get_str(reference, "siren"),
            siret: format_siret(reference.get("siret").unwrap_or(&Value::Null)),
        }
    }

    /// Identity of a company association on a signal row. Object references
    /// carry the company id in `id`; bare values stringify directly.
    pub fn from_signal_company(reference: &Value) -> Self {
        let siren = match reference {
            Value::Object(map) => get_str(map, "id"),
            other if truthy(other) => display_string(other),
            _ => String::new(),
        };
        IdentityKey {
            company_name: String::new(),
            siren,
            siret: String::new(),
        }
    }

    /// Identity derived from a bare SIRET entry; the SIREN is the SIRET's
    /// 9-character prefix when available.
    pub fn from_bare_siret(entry: &Value) -> Self {
        let siret = match entry {
            Value::Object(map) => format_siret(map.get("siret").unwrap_or(&Value::Null)),
            other => format_siret(other),
        };
        let siren = if siret.chars().count() >= 9 {
            siret.chars().take(9).collect()
        } else {
            String::new()
        };
        IdentityKey {
            company_name: String::new(),
            siren,
            siret,
        }
    }

    /// Write the three identity columns into a row.
    pub fn apply_to(&self, row: &mut Row) {
        row.insert("company_name".to_string(), Value::String(self.company_name.clone()));
        row.insert("siren".to_string(), Value::String(self.siren.clone()));
        row.insert("siret".to_string(), Value::String(self.siret.clone()));
    }
}

//! Company record extraction: seven parallel tables per record, plus
//! forwarding of embedded article/signal references to their expanders.

use serde_json::{Map, Value};
use tracing::warn;

use crate::extract::article::ArticleExtractor;
use crate::extract::catalog::{Datasets, Row, Table};
use crate::extract::identity::IdentityKey;
use crate::extract::kpi;
use crate::extract::signal::SignalExtractor;
use crate::extract::value::{get_count, get_flag, get_str, nested_str, set_text, truthy};

/// Extracts company records into the seven company-keyed datasets and
/// forwards embedded article/signal references to the owned expanders.
#[derive(Debug, Default)]
pub struct CompanyExtractor {
    basic_info: Vec<Row>,
    financial: Vec<Row>,
    workforce: Vec<Row>,
    structure: Vec<Row>,
    flags: Vec<Row>,
    contacts: Vec<Row>,
    kpi: Vec<Row>,
    articles: ArticleExtractor,
    signals: SignalExtractor,
}

impl CompanyExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extract one batch of company records, appending to the internal
    /// buffers.
    pub fn extract_batch(&mut self, batch: &[Value]) {
        for record in batch {
            let Value::Object(record) = record else {
                warn!("skipping non-object company record");
                continue;
            };
            self.extract_record(record);
        }
    }

    fn extract_record(&mut self, record: &Map<String, Value>) {
        let identity = IdentityKey::from_company_record(record);

        self.basic_info.push(basic_info_row(record, &identity));
        self.financial.push(financial_row(record, &identity));
        self.workforce.push(workforce_row(record, &identity));
        self.structure.push(structure_row(record, &identity));
        self.flags.push(flags_row(record, &identity));
        self.contacts.push(contacts_row(record, &identity));
        self.kpi.extend(kpi::expand(record, &identity));

        let embedded = embedded_articles(record);
        if !embedded.is_empty() {
            self.articles.extract_batch(&embedded);
        }
        let embedded = embedded_signals(record);
        if !embedded.is_empty() {
            self.signals.extract_batch(&embedded);
        }
    }

    /// Drain all buffers into the dataset map, including the expanders'
    /// datasets.
    pub fn into_datasets(self) -> Datasets {
        let mut datasets = Datasets::new();
        datasets.insert("01_company_basic_info".to_string(), Table::from_rows(self.basic_info));
        datasets.insert("02_financial_data".to_string(), Table::from_rows(self.financial));
        datasets.insert("03_workforce_data".to_string(), Table::from_rows(self.workforce));
        datasets.insert("04_company_structure".to_string(), Table::from_rows(self.structure));
        datasets.insert("05_classification_flags".to_string(), Table::from_rows(self.flags));
        datasets.insert("06_contact_metrics".to_string(), Table::from_rows(self.contacts));
        datasets.insert("07_kpi_data".to_string(), Table::from_rows(self.kpi));
        datasets.extend(self.articles.into_datasets());
        datasets.extend(self.signals.into_datasets());
        datasets
    }
}

fn basic_info_row(record: &Map<String, Value>, identity: &IdentityKey) -> Row {
    let mut row = Row::new();
    identity.apply_to(&mut row);
    set_text(&mut row, "departement", nested_str(record, "department", "label"));
    set_text(&mut row, "departement_id", nested_str(record, "department", "id"));
    // Both halves joined by one space even when either side is empty.
    set_text(
        &mut row,
        "resume_activite",
        format!("{} {}", get_str(record, "activity"), get_str(record, "activityLight")),
    );
    set_text(&mut row, "raison_sociale", get_str(record, "socialName"));
    set_text(&mut row, "raison_sociale_keyword", get_str(record, "internalName"));
    set_text(&mut row, "last_modified", get_str(record, "updatedAt"));
    set_text(&mut row, "processedAt", get_str(record, "createdAt"));
    set_text(&mut row, "updatedAt", get_str(record, "updatedAt"));
    set_text(&mut row, "address", get_str(record, "address"));
    set_text(&mut row, "cp", get_str(record, "cp"));
    set_text(&mut row, "ville", get_str(record, "ville"));
    set_text(&mut row, "naf_code", nested_str(record, "naf", "code"));
    set_text(&mut row, "naf_label", nested_str(record, "naf", "label"));
    set_text(&mut row, "juridic_form", nested_str(record, "juridicForm", "label"));
    row
}

fn financial_row(record: &Map<String, Value>, identity: &IdentityKey) -> Row {
    let mut row = Row::new();
    identity.apply_to(&mut row);
    set_text(&mut row, "caConsolide", get_str(record, "caConsolide"));
    set_text(&mut row, "caGroupe", get_str(record, "caGroupe"));
    set_text(&mut row, "caBilan", get_str(record, "caBilan"));
    set_text(&mut row, "resultatExploitation", get_str(record, "resultatExploitation"));
    set_text(&mut row, "resultatNet", get_str(record, "resultatNet"));
    set_text(&mut row, "fondsPropres", get_str(record, "fondsPropres"));
    set_text(&mut row, "dateConsolide", get_str(record, "dateCloture"));
    set_text(&mut row, "trancheCaBilan", get_str(record, "trancheCaBilan"));
    set_text(&mut row, "trancheCaConsolide", get_str(record, "trancheCaConsolide"));
    row
}

fn workforce_row(record: &Map<String, Value>, identity: &IdentityKey) -> Row {
    let mut row = Row::new();
    identity.apply_to(&mut row);
    set_text(&mut row, "effectif", get_str(record, "effectif"));
    set_text(&mut row, "effectifConsolide", get_str(record, "effectifConsolide"));
    set_text(&mut row, "effectifGroupe", get_str(record, "effectifGroupe"));
    set_text(&mut row, "trancheEffectifConsolide", get_str(record, "trancheEffectifConsolide"));
    set_text(&mut row, "trancheEffectifPrecis", get_str(record, "trancheEffectifPrecis"));
    row
}

fn structure_row(record: &Map<String, Value>, identity: &IdentityKey) -> Row {
    let mut row = Row::new();
    identity.apply_to(&mut row);
    set_text(&mut row, "nbEtabSecondaire", get_str(record, "nbEtabSecondaire"));
    set_text(&mut row, "nbMarques", get_str(record, "nbMarques"));
    row.insert("hasGroupOwner".to_string(), Value::Bool(get_flag(record, "hasGroupOwner")));
    set_text(&mut row, "groupOwnerSiren", get_str(record, "groupOwnerSiren"));
    set_text(&mut row, "groupOwnerSocialName", get_str(record, "groupOwnerSocialName"));
    row.insert("hasEtabSecondaire".to_string(), Value::Bool(get_flag(record, "hasEtabSecondaire")));
    set_text(&mut row, "nbActionnaires", get_str(record, "nbActionnaires"));
    row
}

fn flags_row(record: &Map<String, Value>, identity: &IdentityKey) -> Row {
    let mut row = Row::new();
    identity.apply_to(&mut row);
    for (column, source) in [
        ("startup", "startup"),
        ("radiee", "radiate"),
        ("entreprise_b2b", "bToB"),
        ("entreprise_b2c", "bToC"),
        ("fintech", "entreprise_fintech"),
        ("cac40", "cac40"),
        ("entreprise_familiale", "entreprise_familiale"),
        ("entreprise_biotech_medtech", "entreprise_biotech_medtech"),
        ("hasMarques", "hasMarques"),
        ("hasESV1Contacts", "hasESV1Contacts"),
        ("hasBrevets", "hasBrevets"),
        ("hasBodacc", "hasBodacc"),
        ("site_ecommerce", "site_ecommerce"),
        ("risk", "risk"),
    ] {
        row.insert(column.to_string(), Value::Bool(get_flag(record, source)));
    }
    row
}

fn contacts_row(record: &Map<String, Value>, identity: &IdentityKey) -> Row {
    let mut row = Row::new();
    identity.apply_to(&mut row);
    row.insert("nbContacts".to_string(), Value::from(get_count(record, "nbContacts", 0)));
    set_text(&mut row, "emailContact", get_str(record, "emailContact"));
    set_text(&mut row, "telephoneNumber", get_str(record, "telephoneNumber"));
    set_text(&mut row, "webSite", get_str(record, "webSite"));
    set_text(&mut row, "urlLinkedin", get_str(record, "urlLinkedin"));
    set_text(&mut row, "urlFacebook", get_str(record, "urlFacebook"));
    set_text(&mut row, "urlTwitter", get_str(record, "urlTwitter"));
    row
}

/// Owner company reference attached to embedded articles so they inherit
/// their originating company when they don't list their own.
fn owner_reference(record: &Map<String, Value>) -> Map<String, Value> {
    let mut owner = Map::new();
    for (target, source) in [("label", "socialName"), ("siren", "siren"), ("siret", "siret")] {
        owner.insert(
            target.to_string(),
            record.get(source).cloned().unwrap_or_else(|| Value::String(String::new())),
        );
    }
    owner
}

/// Gather embedded article references from the record top level and the
/// `computed` / `v1legacy` namespaces, tagging each with the owner company.
fn embedded_articles(record: &Map<String, Value>) -> Vec<Value> {
    let owner = owner_reference(record);
    let mut found = Vec::new();
    collect_articles(record, &owner, &mut found);
    for namespace in ["computed", "v1legacy"] {
        if let Some(Value::Object(container)) = record.get(namespace) {
            collect_articles(container, &owner, &mut found);
        }
    }
    found
}

fn collect_articles(container: &Map<String, Value>, owner: &Map<String, Value>, found: &mut Vec<Value>) {
    for key in ["article", "articles"] {
        let Some(value) = container.get(key) else {
            continue;
        };
        if !truthy(value) {
            continue;
        }
        let entries: Vec<&Value> = match value {
            Value::Array(items) => items.iter().collect(),
            other => vec![other],
        };
        for entry in entries {
            if !truthy(entry) {
                continue;
            }
            let mut article = match entry {
                Value::Object(map) => map.clone(),
                Value::Array(_) => Map::new(),
                _ => {
                    warn!("skipping embedded article of unusable shape");
                    continue;
                }
            };
            attach_owner(&mut article, owner);
            found.push(Value::Object(article));
        }
    }
}

fn attach_owner(article: &mut Map<String, Value>, owner: &Map<String, Value>) {
    let companies = article
        .entry("companies")
        .or_insert_with(|| Value::Array(Vec::new()));
    if !matches!(companies, Value::Array(_)) {
        *companies = Value::Array(Vec::new());
    }
    if let Value::Array(list) = companies {
        if list.is_empty() {
            list.push(Value::Object(owner.clone()));
        }
    }
}

/// Gather embedded signal references; within each namespace `signals` wins
/// over `projects` (first non-empty), additively across namespaces.
fn embedded_signals(record: &Map<String, Value>) -> Vec<Value> {
    let mut found = Vec::new();
    collect_signals(record, &mut found);
    for namespace in ["computed", "v1legacy"] {
        if let Some(Value::Object(container)) = record.get(namespace) {
            collect_signals(container, &mut found);
        }
    }
    found
}

fn collect_signals(container: &Map<String, Value>, found: &mut Vec<Value>) {
    for key in ["signals", "projects"] {
        let Some(value) = container.get(key) else {
            continue;
        };
        if !truthy(value) {
            continue;
        }
        let entries: Vec<&Value> = match value {
            Value::Array(items) => items.iter().collect(),
            other => vec![other],
        };
        for entry in entries {
            if !truthy(entry) {
                continue;
            }
            match entry {
                Value::Object(map) => found.push(Value::Object(map.clone())),
                _ => found.push(Value::Object(Map::new())),
            }
        }
        return;
    }
}

//! Record-to-table extraction core.
//!
//! Walks heterogeneous, optionally-missing, optionally-malformed nested
//! fields and deterministically produces typed rows, including the
//! one-to-many expansion of records referencing several companies,
//! articles or signals. Missing fields resolve to defaults; malformed
//! values fall back locally; the per-record logic never fails.

pub mod article;
pub mod catalog;
pub mod company;
pub mod identity;
pub mod kpi;
pub mod signal;
pub mod value;

pub use article::ArticleExtractor;
pub use catalog::{finalize, merge, Datasets, Row, Table, DATASET_NAMES};
pub use company::CompanyExtractor;
pub use identity::{format_siret, IdentityKey};
pub use signal::SignalExtractor;

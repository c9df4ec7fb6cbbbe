//! Dataset persistence: one file per dataset, CSV or JSONL.

use anyhow::{Context, Result};
use serde_json::Value;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::extract::{Datasets, Table};

/// Write every dataset as `<name>.csv` under `output_dir` (created if
/// missing). The header row is the table's column order; empty tables
/// produce an empty file so all nine datasets always exist on disk.
pub fn write_datasets_csv(output_dir: impl AsRef<Path>, datasets: &Datasets) -> Result<()> {
    let output_dir = output_dir.as_ref();
    fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create output directory: {}", output_dir.display()))?;
    for (name, table) in datasets {
        let path = output_dir.join(format!("{name}.csv"));
        write_table_csv(&path, table)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }
    Ok(())
}

fn write_table_csv(path: &Path, table: &Table) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    if !table.columns.is_empty() {
        writer.write_record(&table.columns)?;
        for row in &table.rows {
            let cells: Vec<String> = table
                .columns
                .iter()
                .map(|column| cell_text(row.get(column)))
                .collect();
            writer.write_record(&cells)?;
        }
    }
    writer.flush()?;
    Ok(())
}

// Strings verbatim, numbers and booleans in display form, null and absent
// as empty, residual containers as compact JSON.
fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => serde_json::to_string(other).unwrap_or_default(),
    }
}

/// Write every dataset as `<name>.jsonl`, one JSON object per row.
pub fn write_datasets_jsonl(output_dir: impl AsRef<Path>, datasets: &Datasets) -> Result<()> {
    let output_dir = output_dir.as_ref();
    fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create output directory: {}", output_dir.display()))?;
    for (name, table) in datasets {
        let path = output_dir.join(format!("{name}.jsonl"));
        let file = File::create(&path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        for row in &table.rows {
            let line = serde_json::to_string(row)
                .with_context(|| format!("failed to serialize a row of {name}"))?;
            writeln!(writer, "{line}")
                .with_context(|| format!("failed to write {}", path.display()))?;
        }
        writer.flush()
            .with_context(|| format!("failed to flush {}", path.display()))?;
    }
    Ok(())
}

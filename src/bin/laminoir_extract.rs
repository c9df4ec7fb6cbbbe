//! laminoir-extract: flatten company/article/project JSONL exports into
//! nine analysis-ready datasets.
//!
//! Usage:
//!   # Companies only, CSV output
//!   laminoir-extract --company companies.jsonl -o datasets/
//!
//!   # All three sources, JSONL output, smaller chunks
//!   laminoir-extract --company c.jsonl --article a.jsonl --project p.jsonl \
//!       --format jsonl --chunk-size 2000 -o datasets/

// Use MiMalloc allocator for better performance (recommended by simd-json)
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{bail, Result};
use clap::{Parser, ValueEnum};
use laminoir::{run_extraction, writer, ExtractOptions, RecordKind};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "laminoir-extract")]
#[command(about = "Flatten company/article/project JSONL exports into analysis-ready datasets", long_about = None)]
struct Args {
    /// Company records file (JSONL)
    #[arg(long)]
    company: Option<PathBuf>,

    /// Article records file (JSONL)
    #[arg(long)]
    article: Option<PathBuf>,

    /// Project/signal records file (JSONL)
    #[arg(long)]
    project: Option<PathBuf>,

    /// Output directory for the nine datasets
    #[arg(long, short = 'o', default_value = "extracted_datasets")]
    output_dir: PathBuf,

    /// Output file format
    #[arg(long, value_enum, default_value_t = Format::Csv)]
    format: Format,

    /// Records per processing chunk
    #[arg(long, default_value_t = laminoir::DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Format {
    Csv,
    Jsonl,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "laminoir=info".into()),
        )
        .init();

    let args = Args::parse();

    let mut inputs = Vec::new();
    if let Some(path) = args.company {
        inputs.push((RecordKind::Company, path));
    }
    if let Some(path) = args.article {
        inputs.push((RecordKind::Article, path));
    }
    if let Some(path) = args.project {
        inputs.push((RecordKind::Project, path));
    }
    if inputs.is_empty() {
        bail!("no input files; pass at least one of --company, --article, --project");
    }

    let options = ExtractOptions {
        chunk_size: args.chunk_size,
    };
    let datasets = run_extraction(&inputs, &options)?;

    match args.format {
        Format::Csv => writer::write_datasets_csv(&args.output_dir, &datasets)?,
        Format::Jsonl => writer::write_datasets_jsonl(&args.output_dir, &datasets)?,
    }

    for (name, table) in &datasets {
        println!("  {name}: {} rows", table.len());
    }
    println!("datasets written to {}", args.output_dir.display());

    Ok(())
}

//! Command-line statistics for delimited text files.
//!
//! Reads a file into a [`TableSz`], prints its shape and storage use, and
//! optionally sorts it and writes it back out in another format.
//!
//! # Usage
//!
//! ```sh
//! cargo run --example dsv_stats -- data.csv
//! cargo run --example dsv_stats -- data.txt --separator auto --encoding UTF16LE
//! cargo run --example dsv_stats -- data.csv --sort-by 2 -o sorted.tsv --out-separator '\t'
//! RUST_LOG=delimtab=debug cargo run --example dsv_stats -- data.csv --threads 4
//! ```

use clap::{Parser, ValueEnum};
use delimtab::delimited::{EnclosementPolicy, FormatDefinition, ReadOptions, write_table};
#[cfg(feature = "parallel")]
use delimtab::delimited::read_parallel_into_table as read_into_table;
use delimtab::table::{TableConfig, TableSz};
#[cfg(not(feature = "parallel"))]
use delimtab::table::read_slice_into_table as read_into_table;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Print statistics about a delimited text file
#[derive(Parser, Debug)]
#[command(name = "dsv_stats", about = "Read a delimited text file into a columnar table and report on it", version)]
struct Args {
    /// Input file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Separator: a character, an escape such as '\t', or 'auto'
    #[arg(long, default_value = ",")]
    separator: String,

    /// Enclosing character; empty to disable, 'auto' to detect
    #[arg(long, default_value = "\"")]
    enclosing: String,

    /// Input encoding (unknown detects a BOM and falls back to UTF-8)
    #[arg(long, default_value = "unknown")]
    encoding: String,

    /// Drop leading whitespace of every cell
    #[arg(long)]
    trim: bool,

    /// Worker threads for formats without an enclosing character
    #[arg(long, default_value_t = 1)]
    threads: usize,

    /// Table block size in bytes
    #[arg(long, default_value_t = 2048)]
    block_size: usize,

    /// Reject cells larger than a block instead of giving them their own block
    #[arg(long)]
    fixed_blocks: bool,

    /// Sort rows by this column before writing
    #[arg(long, value_name = "COLUMN")]
    sort_by: Option<usize>,

    /// Write the table to this file
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Separator of the written file
    #[arg(long, default_value = ",")]
    out_separator: String,

    /// When written cells are enclosed
    #[arg(long, value_enum, default_value = "if-needed")]
    enclose: EncloseArg,
}

/// Enclosement policy options for CLI
#[derive(Debug, Clone, Copy, ValueEnum)]
enum EncloseArg {
    /// Never enclose
    Never,
    /// Enclose cells that need it
    IfNeeded,
    /// Enclose every cell
    Always,
}

impl From<EncloseArg> for EnclosementPolicy {
    fn from(arg: EncloseArg) -> Self {
        match arg {
            EncloseArg::Never => EnclosementPolicy::Never,
            EncloseArg::IfNeeded => EnclosementPolicy::IfNeeded,
            EncloseArg::Always => EnclosementPolicy::Always,
        }
    }
}

fn settings(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
    entries.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_target(true)
        .init();

    let args = Args::parse();

    let mut format = FormatDefinition::from_settings(&settings(&[
        ("separator_char", args.separator.as_str()),
        ("enclosing_char", args.enclosing.as_str()),
        ("encoding", args.encoding.as_str()),
    ]))?;
    format = format.with_skip_leading_whitespace(args.trim);

    let progress = Arc::new(AtomicU64::new(0));
    let options = ReadOptions::new()
        .with_thread_count(args.threads)
        .with_progress(progress.clone());
    let config = TableConfig::new()
        .with_block_size(args.block_size)
        .with_allow_oversized_strings(!args.fixed_blocks);

    let data = fs::read(&args.input)?;
    let mut table = TableSz::with_config(config);
    let started = Instant::now();

    let (summary, rejected) = read_into_table(&data, &format, &options, &mut table)?;
    let elapsed = started.elapsed();

    println!("File:           {}", args.input.display());
    println!("Encoding:       {}", summary.encoding);
    println!("Separator:      {:?}", summary.separator);
    println!("Parser:         {}", if summary.barebones { "barebones" } else { "generic" });
    println!("Rows:           {}", summary.rows);
    println!("Columns:        {}", table.col_count());
    println!("Non-empty:      {}", table.cell_count_non_empty());
    println!("Rejected cells: {}", rejected);
    println!("Storage:        {} bytes", table.content_storage_size());
    println!("Bytes read:     {} / {}", progress.load(Ordering::Relaxed), data.len());
    println!("Elapsed:        {:.2?}", elapsed);

    if let Some(col) = args.sort_by {
        table.sort_by_column_default(col);
    }

    if let Some(output) = &args.output {
        let mut out_format = FormatDefinition::csv().with_encoding(format.encoding);
        out_format.apply_settings(&settings(&[("separator_char", args.out_separator.as_str())]))?;
        let mut writer = BufWriter::new(File::create(output)?);
        write_table(&table, &mut writer, &out_format, args.enclose.into())?;
        println!("Written to:     {}", output.display());
    }

    Ok(())
}

//! IntervalJoin CLI entry point
//!
//! Positional join of two tab-separated genomic interval files.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use interval_join::core::{IoStrategy, DEFAULT_BUFFER_SIZE};
use interval_join::{join_files, ColumnSpec, JoinConfig, JoinOptions};
use std::path::PathBuf;
use std::time::Instant;

/// Input reading strategy (CLI enum)
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
enum IoArg {
    /// Pick buffered or memory-mapped reading from the file size
    #[default]
    #[value(name = "auto")]
    Auto,
    /// Always use buffered reads
    #[value(name = "buffered")]
    Buffered,
    /// Always memory map plain-text inputs
    #[value(name = "mmap")]
    Mmap,
}

impl From<IoArg> for IoStrategy {
    fn from(arg: IoArg) -> Self {
        match arg {
            IoArg::Auto => IoStrategy::Auto,
            IoArg::Buffered => IoStrategy::Buffered(DEFAULT_BUFFER_SIZE),
            IoArg::Mmap => IoStrategy::MemoryMapped,
        }
    }
}

#[derive(Parser)]
#[command(name = "interval-join")]
#[command(about = "Join two genomic interval files on overlapping positions")]
#[command(version)]
#[command(author = "IntervalJoin Contributors")]
#[command(after_help = "The secondary file must have a header line. \
If it is grouped by chromosome, joining will be a lot faster.")]
struct Cli {
    /// Primary file: every non-comment line is reported
    primary: PathBuf,
    /// Secondary file (with header) searched for overlaps
    secondary: PathBuf,
    /// Output file ('-' for stdout)
    output: PathBuf,
    /// Primary columns as chrom,start,end (0-based)
    #[arg(short = '1', long = "primary-columns", default_value = "0,1,2")]
    primary_columns: ColumnSpec,
    /// Secondary columns as chrom,start,end (0-based)
    #[arg(short = '2', long = "secondary-columns", default_value = "0,1,2")]
    secondary_columns: ColumnSpec,
    /// Only print out one match per primary record
    #[arg(short = 'e', long = "first-match")]
    first_match: bool,
    /// Number of threads (0 = all CPUs, 1 = sequential)
    #[arg(short = 't', long, default_value = "0")]
    threads: usize,
    /// Input reading strategy
    #[arg(long = "io", default_value = "auto")]
    io: IoArg,
    /// Only log errors
    #[arg(short = 'q', long)]
    quiet: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.quiet { "error" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let start = Instant::now();
    let config = JoinConfig {
        primary_columns: cli.primary_columns,
        secondary_columns: cli.secondary_columns,
        options: JoinOptions {
            first_match_only: cli.first_match,
            threads: cli.threads,
        },
        io_strategy: cli.io.into(),
    };

    if !cli.quiet {
        eprintln!(
            "Joining {:?} ({}) with {:?} ({}) -> {:?}",
            cli.primary, config.primary_columns, cli.secondary, config.secondary_columns, cli.output
        );
    }

    let stats = join_files(&cli.primary, &cli.secondary, &cli.output, &config)
        .with_context(|| format!("Failed to join {:?} with {:?}", cli.primary, cli.secondary))?;

    if !cli.quiet {
        eprintln!("\n=== Join Statistics ===");
        eprintln!("Primary records: {}", stats.primary_records);
        eprintln!("Matched:         {}", stats.matched_records);
        eprintln!("Placeholders:    {}", stats.placeholder_records);
        eprintln!("  - No chrom:    {}", stats.absent_chrom_records);
        eprintln!("Rows written:    {}", stats.rows_written());
        eprintln!("Time elapsed:    {:.2}s", start.elapsed().as_secs_f64());
    }

    Ok(())
}

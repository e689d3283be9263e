//! IntervalJoin - parallel positional join of genomic interval files
//!
//! For every record of a primary tab-separated file, report every record of a
//! secondary file that overlaps it on the same chromosome, or a row of `.`
//! placeholders when nothing does.
//!
//! # Features
//!
//! - Secondary file loaded once into a single buffer, parsed once
//! - Chromosome buckets when the secondary file is grouped by chromosome,
//!   full scans otherwise
//! - Parallel candidate scans with rayon
//! - Gzip and bzip2 inputs
//!
//! # Example
//!
//! ```ignore
//! use interval_join::{join_files, ColumnSpec, JoinConfig, JoinOptions};
//!
//! let config = JoinConfig {
//!     primary_columns: "0,1,2".parse()?,
//!     secondary_columns: "0,1,2".parse()?,
//!     options: JoinOptions { first_match_only: true, threads: 4 },
//!     ..Default::default()
//! };
//! let stats = join_files("peaks.bed", "genes.tsv", "joined.tsv", &config)?;
//! ```

pub mod core;
pub mod join;

// Re-export commonly used types
pub use core::{
    overlap, ChromosomeIndex, ColumnSpec, ColumnSpecError, InputRole, IntervalRecord, IoStrategy,
    JoinError, Placeholder, RecordError, Result, SecondaryTable,
};
pub use join::{join_files, JoinConfig, JoinEngine, JoinOptions, JoinStats, RecordOutcome, RowEmitter};

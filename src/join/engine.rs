//! Interval join engine
//!
//! For every primary record the engine routes to a candidate range through
//! the [`ChromosomeIndex`], scans it for overlaps (fanning out over a rayon
//! pool for large ranges) and emits either the joined rows or a single
//! placeholder row. Primary records are processed strictly in input order;
//! parallelism only exists inside one record's scan.
//!
//! # First-match mode
//!
//! With [`JoinOptions::first_match_only`] at most one joined row is written
//! per primary record. In a parallel scan the row written is whichever
//! overlapping candidate reaches the output lock first, so the choice is
//! non-deterministic between runs. The sequential scan reports the
//! lowest-index overlap.

use crate::core::io::{create_output, open_input, IoStrategy, LineReader};
use crate::core::{
    overlap, ChromosomeIndex, ColumnSpec, InputRole, IntervalRecord, JoinError, RecordError,
    Result, SecondaryTable,
};
use crate::join::emit::{write_joined_row, RowEmitter};
use rayon::prelude::*;
use std::io::{self, BufRead, Write};
use std::ops::Range;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Candidate ranges shorter than this are scanned on the calling thread
pub const MIN_PARALLEL_CANDIDATES: usize = 4096;

/// Prefix marking primary lines that are skipped
const COMMENT_PREFIX: u8 = b'#';

/// Fields a primary line must provide
const REQUIRED_FIELDS: usize = 3;

/// Scan behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinOptions {
    /// Emit at most one match per primary record
    pub first_match_only: bool,
    /// Worker threads: 0 = all cores, 1 = sequential
    pub threads: usize,
}

impl Default for JoinOptions {
    fn default() -> Self {
        Self {
            first_match_only: false,
            threads: 0,
        }
    }
}

/// Everything a file-to-file join needs besides the paths
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JoinConfig {
    pub primary_columns: ColumnSpec,
    pub secondary_columns: ColumnSpec,
    pub options: JoinOptions,
    pub io_strategy: IoStrategy,
}

/// What was emitted for one primary record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// `rows` joined rows were written
    Matched { rows: usize },
    /// Candidates were scanned but none overlapped; placeholder written
    NoOverlap,
    /// Chromosome has no bucket in a packed index; placeholder written
    AbsentChromosome,
}

impl RecordOutcome {
    pub fn is_match(&self) -> bool {
        matches!(self, RecordOutcome::Matched { .. })
    }
}

/// Join statistics
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct JoinStats {
    /// Non-comment primary lines processed
    pub primary_records: usize,
    /// Primary records with at least one joined row
    pub matched_records: usize,
    /// Primary records answered with a placeholder row
    pub placeholder_records: usize,
    /// Of those, records whose chromosome was absent from a packed index
    pub absent_chrom_records: usize,
    /// Joined rows written
    pub match_rows: usize,
    pub comment_lines: usize,
}

impl JoinStats {
    fn record(&mut self, outcome: RecordOutcome) {
        self.primary_records += 1;
        match outcome {
            RecordOutcome::Matched { rows } => {
                self.matched_records += 1;
                self.match_rows += rows;
            }
            RecordOutcome::NoOverlap => self.placeholder_records += 1,
            RecordOutcome::AbsentChromosome => {
                self.placeholder_records += 1;
                self.absent_chrom_records += 1;
            }
        }
    }

    /// Total rows written
    pub fn rows_written(&self) -> usize {
        self.match_rows + self.placeholder_records
    }
}

/// Positional join over one loaded secondary table
pub struct JoinEngine {
    table: SecondaryTable,
    index: ChromosomeIndex,
    primary_columns: ColumnSpec,
    options: JoinOptions,
    /// `None` when scanning sequentially
    pool: Option<rayon::ThreadPool>,
}

impl JoinEngine {
    /// Index `table` and set up the worker pool
    pub fn new(table: SecondaryTable, primary_columns: ColumnSpec, options: JoinOptions) -> Result<Self> {
        let index = ChromosomeIndex::build(&table);

        let pool = if options.threads == 1 {
            None
        } else {
            let mut builder = rayon::ThreadPoolBuilder::new();
            if options.threads > 1 {
                builder = builder.num_threads(options.threads);
            }
            Some(
                builder
                    .build()
                    .map_err(|e| JoinError::ThreadPool(e.to_string()))?,
            )
        };

        log::info!(
            "Indexed {} secondary records into {} chromosome buckets ({}), {} scan threads",
            table.len(),
            index.bucket_count(),
            if index.is_packed() { "packed" } else { "unpacked, full scans" },
            pool.as_ref().map_or(1, |p| p.current_num_threads())
        );

        Ok(Self {
            table,
            index,
            primary_columns,
            options,
            pool,
        })
    }

    pub fn index(&self) -> &ChromosomeIndex {
        &self.index
    }

    /// Join every primary line from `reader`, writing rows to `writer`
    ///
    /// Lines starting with `#` are skipped. A malformed primary line,
    /// including a blank one, aborts the run; rows already written are
    /// flushed and the malformed-record error is returned even if that
    /// flush fails too. Lines are handled as bytes and written back
    /// unchanged; only the three join fields must be UTF-8.
    pub fn join_reader<R, W>(&self, reader: R, writer: W) -> Result<JoinStats>
    where
        R: BufRead,
        W: Write + Send,
    {
        let emitter = RowEmitter::new(writer);
        let mut lines = LineReader::new(reader);
        let mut stats = JoinStats::default();

        let result = loop {
            let line = match lines.next_line() {
                None => break Ok(()),
                Some(Ok(line)) => line,
                Some(Err(e)) => break Err(JoinError::Io(e)),
            };

            if line.first() == Some(&COMMENT_PREFIX) {
                stats.comment_lines += 1;
                continue;
            }

            let parsed = if line.iter().all(u8::is_ascii_whitespace) {
                Err(RecordError::IncompleteFields {
                    expected: REQUIRED_FIELDS,
                    found: 0,
                })
            } else {
                IntervalRecord::parse_bytes(line, &self.primary_columns)
            };
            let record = match parsed {
                Ok(record) => record,
                Err(error) => {
                    break Err(JoinError::MalformedRecord {
                        role: InputRole::Primary,
                        line: lines.line_number(),
                        error,
                    })
                }
            };

            match self.join_record(line, &record, &emitter) {
                Ok(outcome) => stats.record(outcome),
                Err(e) => break Err(JoinError::Io(e)),
            }
        };

        let flushed = emitter.finish();
        result?;
        flushed?;

        log::info!(
            "Joined {} primary records: {} matched, {} placeholders, {} rows",
            stats.primary_records,
            stats.matched_records,
            stats.placeholder_records,
            stats.rows_written()
        );
        Ok(stats)
    }

    /// Route, scan and emit one primary record
    ///
    /// `primary_line` is the record's text without its line terminator.
    pub fn join_record<W: Write + Send>(
        &self,
        primary_line: &[u8],
        record: &IntervalRecord<'_>,
        emitter: &RowEmitter<W>,
    ) -> io::Result<RecordOutcome> {
        let outcome = match self.index.lookup(record.chrom) {
            Some(range) => match self.scan(primary_line, record, range, emitter)? {
                0 => RecordOutcome::NoOverlap,
                rows => RecordOutcome::Matched { rows },
            },
            None => RecordOutcome::AbsentChromosome,
        };

        if !outcome.is_match() {
            emitter.write_placeholder(primary_line, self.table.placeholder())?;
        }
        Ok(outcome)
    }

    /// Scan `range` for overlaps with `record`, returning the rows written
    fn scan<W: Write + Send>(
        &self,
        primary_line: &[u8],
        record: &IntervalRecord<'_>,
        range: Range<usize>,
        emitter: &RowEmitter<W>,
    ) -> io::Result<usize> {
        match &self.pool {
            Some(pool) if range.len() >= MIN_PARALLEL_CANDIDATES => {
                pool.install(|| self.scan_parallel(primary_line, record, range, emitter))
            }
            _ => self.scan_sequential(primary_line, record, range, emitter),
        }
    }

    fn scan_sequential<W: Write + Send>(
        &self,
        primary_line: &[u8],
        record: &IntervalRecord<'_>,
        range: Range<usize>,
        emitter: &RowEmitter<W>,
    ) -> io::Result<usize> {
        let mut rows = 0;
        for i in range {
            if overlap(record, &self.table.record(i)) > 0 {
                emitter.write_match(primary_line, self.table.line(i))?;
                rows += 1;
                if self.options.first_match_only {
                    break;
                }
            }
        }
        Ok(rows)
    }

    fn scan_parallel<W: Write + Send>(
        &self,
        primary_line: &[u8],
        record: &IntervalRecord<'_>,
        range: Range<usize>,
        emitter: &RowEmitter<W>,
    ) -> io::Result<usize> {
        let first_only = self.options.first_match_only;
        // only ever set while the output lock is held
        let done = AtomicBool::new(false);
        let rows = AtomicUsize::new(0);

        range.into_par_iter().try_for_each(|i| -> io::Result<()> {
            if first_only && done.load(Ordering::Acquire) {
                return Ok(());
            }
            if overlap(record, &self.table.record(i)) <= 0 {
                return Ok(());
            }

            let mut out = emitter.lock();
            if first_only && done.load(Ordering::Acquire) {
                return Ok(());
            }
            write_joined_row(&mut *out, primary_line, self.table.line(i))?;
            rows.fetch_add(1, Ordering::Relaxed);
            if first_only {
                done.store(true, Ordering::Release);
            }
            Ok(())
        })?;

        Ok(rows.into_inner())
    }
}

/// Join two files end to end
///
/// All three files are opened before any processing starts, so an unreadable
/// input or uncreatable output fails without writing rows.
pub fn join_files<P, Q, O>(primary: P, secondary: Q, output: O, config: &JoinConfig) -> Result<JoinStats>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
    O: AsRef<Path>,
{
    let primary_reader = open_input(primary, InputRole::Primary, config.io_strategy)?;
    let secondary_reader = open_input(secondary, InputRole::Secondary, config.io_strategy)?;
    let writer = create_output(output)?;

    let table = SecondaryTable::from_source(secondary_reader, &config.secondary_columns)?;
    let engine = JoinEngine::new(table, config.primary_columns, config.options)?;
    engine.join_reader(primary_reader, writer)
}

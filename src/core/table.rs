//! Secondary table
//!
//! The body of the secondary file is held as one byte buffer, either owned or
//! memory-mapped; each data line is parsed once and stored as a byte range
//! into that buffer plus its coordinates. Chromosome names are interned.
//! Lookups hand out borrowed [`IntervalRecord`] views.

use crate::core::columns::ColumnSpec;
use crate::core::error::{InputRole, JoinError, Result};
use crate::core::io::SmartReader;
use crate::core::record::{trim_line_end, IntervalRecord};
use memchr::memchr;
use memmap2::Mmap;
use std::collections::HashMap;
use std::io::Read;
use std::ops::{Deref, Range};

/// Missing-value marker written in place of secondary fields
pub const MISSING_MARKER: &str = ".";

/// Backing storage for the table text
enum TableBuffer {
    Owned(Vec<u8>),
    Mapped(Mmap),
}

impl Deref for TableBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            TableBuffer::Owned(bytes) => bytes,
            TableBuffer::Mapped(mmap) => mmap,
        }
    }
}

#[derive(Debug, Clone)]
struct Row {
    line: Range<usize>,
    chrom: u32,
    start: i64,
    end: i64,
}

/// Marker run emitted when a primary record has no match
///
/// One `.` per column of the secondary header, so placeholder rows are as
/// wide as joined rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    text: String,
    width: usize,
}

impl Placeholder {
    /// Derive the marker run from the secondary header line
    ///
    /// Empty fields (runs of consecutive tabs) are not counted. A header with
    /// no fields still yields a single marker.
    pub fn from_header(header: &[u8]) -> Self {
        let columns = trim_line_end(header)
            .split(|&b| b == b'\t')
            .filter(|f| !f.is_empty())
            .count();
        Self::with_width(columns.max(1))
    }

    /// Marker run of exactly `width` fields
    pub fn with_width(width: usize) -> Self {
        let width = width.max(1);
        let text = vec![MISSING_MARKER; width].join("\t");
        Self { text, width }
    }

    /// Number of marker fields
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

/// In-memory secondary dataset
pub struct SecondaryTable {
    buffer: TableBuffer,
    rows: Vec<Row>,
    chroms: Vec<String>,
    placeholder: Placeholder,
}

impl SecondaryTable {
    /// Parse a complete secondary file held in `text`
    pub fn from_text(text: String, columns: &ColumnSpec) -> Result<Self> {
        Self::from_bytes(text.into_bytes(), columns)
    }

    /// Parse a complete secondary file held in `bytes`
    ///
    /// The first line is the mandatory header; blank lines after it are
    /// skipped. Any data line missing one of the columns aborts the load.
    /// Only the chromosome, start and end fields need to be UTF-8.
    pub fn from_bytes(bytes: Vec<u8>, columns: &ColumnSpec) -> Result<Self> {
        Self::load(TableBuffer::Owned(bytes), columns)
    }

    /// Load the secondary file from an opened input
    ///
    /// A memory-mapped input becomes the table buffer directly; every other
    /// reader is drained into an owned buffer.
    pub fn from_source(source: SmartReader, columns: &ColumnSpec) -> Result<Self> {
        match source {
            SmartReader::Mapped(reader) => {
                log::debug!("Using memory-mapped secondary buffer");
                Self::load(TableBuffer::Mapped(reader.into_mmap()), columns)
            }
            mut reader => {
                let mut bytes = Vec::new();
                reader.read_to_end(&mut bytes)?;
                Self::from_bytes(bytes, columns)
            }
        }
    }

    fn load(buffer: TableBuffer, columns: &ColumnSpec) -> Result<Self> {
        if buffer.is_empty() {
            return Err(JoinError::MissingHeader);
        }

        let (header, mut pos) = next_line(&buffer, 0);
        let placeholder = Placeholder::from_header(&buffer[header]);

        let mut rows = Vec::new();
        let mut chroms: Vec<String> = Vec::new();
        let mut chrom_ids: HashMap<String, u32> = HashMap::new();
        let mut line_number = 1;
        while pos < buffer.len() {
            let (line, next) = next_line(&buffer, pos);
            pos = next;
            line_number += 1;

            if line.is_empty() {
                continue;
            }

            let record = IntervalRecord::parse_bytes(&buffer[line.clone()], columns).map_err(
                |error| JoinError::MalformedRecord {
                    role: InputRole::Secondary,
                    line: line_number,
                    error,
                },
            )?;

            // runs of one chromosome are the common case
            let chrom = match chroms.last() {
                Some(last) if last == record.chrom => (chroms.len() - 1) as u32,
                _ => match chrom_ids.get(record.chrom) {
                    Some(&id) => id,
                    None => {
                        let id = chroms.len() as u32;
                        chroms.push(record.chrom.to_string());
                        chrom_ids.insert(record.chrom.to_string(), id);
                        id
                    }
                },
            };

            rows.push(Row {
                line,
                chrom,
                start: record.start,
                end: record.end,
            });
        }

        log::info!(
            "Loaded {} secondary records on {} chromosomes ({} placeholder columns)",
            rows.len(),
            chroms.len(),
            placeholder.width()
        );

        Ok(Self {
            buffer,
            rows,
            chroms,
            placeholder,
        })
    }

    /// Number of data records
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Range covering every record
    pub fn full_range(&self) -> Range<usize> {
        0..self.rows.len()
    }

    /// Original bytes of record `i`, without its line terminator
    #[inline]
    pub fn line(&self, i: usize) -> &[u8] {
        &self.buffer[self.rows[i].line.clone()]
    }

    /// Chromosome name of record `i`
    #[inline]
    pub fn chrom(&self, i: usize) -> &str {
        &self.chroms[self.rows[i].chrom as usize]
    }

    /// Interval view of record `i`
    #[inline]
    pub fn record(&self, i: usize) -> IntervalRecord<'_> {
        let row = &self.rows[i];
        IntervalRecord {
            chrom: &self.chroms[row.chrom as usize],
            start: row.start,
            end: row.end,
        }
    }

    /// Iterate record views in file order
    pub fn records(&self) -> impl Iterator<Item = IntervalRecord<'_>> + '_ {
        (0..self.rows.len()).map(move |i| self.record(i))
    }

    /// Marker run for primary records without a match
    pub fn placeholder(&self) -> &Placeholder {
        &self.placeholder
    }
}

/// Range of the line starting at `pos` (terminator stripped) and the offset after it
fn next_line(buffer: &[u8], pos: usize) -> (Range<usize>, usize) {
    let (raw_end, next) = match memchr(b'\n', &buffer[pos..]) {
        Some(nl) => (pos + nl, pos + nl + 1),
        None => (buffer.len(), buffer.len()),
    };
    let end = pos + trim_line_end(&buffer[pos..raw_end]).len();
    (pos..end, next)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(text: &str) -> SecondaryTable {
        SecondaryTable::from_text(text.to_string(), &ColumnSpec::default()).unwrap()
    }

    #[test]
    fn test_load_basic() {
        let table = load("chr\tstart\tend\tval\nchr1\t150\t160\tA\nchr1\t500\t600\tB\n");
        assert_eq!(table.len(), 2);
        assert_eq!(table.placeholder().width(), 4);
        assert_eq!(table.line(0), b"chr1\t150\t160\tA");
        assert_eq!(table.line(1), b"chr1\t500\t600\tB");
        assert_eq!(table.record(1), IntervalRecord { chrom: "chr1", start: 500, end: 600 });
        assert_eq!(table.chrom(0), "chr1");
    }

    #[test]
    fn test_load_without_trailing_newline_and_crlf() {
        let table = load("a\tb\tc\r\nchr2\t1\t5\r\nchr3\t7\t9");
        assert_eq!(table.len(), 2);
        assert_eq!(table.line(0), b"chr2\t1\t5");
        assert_eq!(table.line(1), b"chr3\t7\t9");
    }

    #[test]
    fn test_blank_lines_skipped() {
        let table = load("h1\th2\th3\n\nchr1\t1\t2\n\n\nchr1\t3\t4\n");
        assert_eq!(table.len(), 2);
        assert_eq!(table.full_range(), 0..2);
    }

    #[test]
    fn test_header_only() {
        let table = load("chr\tstart\tend\n");
        assert!(table.is_empty());
        assert_eq!(table.placeholder().width(), 3);
    }

    #[test]
    fn test_empty_file_is_missing_header() {
        let result = SecondaryTable::from_text(String::new(), &ColumnSpec::default());
        assert!(matches!(result, Err(JoinError::MissingHeader)));
    }

    #[test]
    fn test_malformed_line_reports_line_number() {
        let result = SecondaryTable::from_text(
            "h\th\th\nchr1\t1\t2\nchr1\t5\n".to_string(),
            &ColumnSpec::default(),
        );
        match result {
            Err(JoinError::MalformedRecord { role, line, .. }) => {
                assert_eq!(role, InputRole::Secondary);
                assert_eq!(line, 3);
            }
            other => panic!("expected malformed record, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_inverted_interval_normalised_in_table() {
        let table = load("h\th\th\nchr1\t900\t100\n");
        assert_eq!(table.record(0).start, 100);
        assert_eq!(table.record(0).end, 900);
        assert_eq!(table.line(0), b"chr1\t900\t100", "line text is never reformatted");
    }

    #[test]
    fn test_placeholder_from_header() {
        assert_eq!(Placeholder::from_header(b"chr\tstart\tend\tval\n").as_str(), ".\t.\t.\t.");
        assert_eq!(Placeholder::from_header(b"a\t\tb").width(), 2);
        assert_eq!(Placeholder::from_header(b"").as_str(), ".");
        assert_eq!(Placeholder::with_width(2).as_str(), ".\t.");
    }

    #[test]
    fn test_records_iterator() {
        let table = load("h\th\th\nchr1\t1\t2\nchr2\t3\t4\n");
        let chroms: Vec<&str> = table.records().map(|r| r.chrom).collect();
        assert_eq!(chroms, vec!["chr1", "chr2"]);
    }

    #[test]
    fn test_non_utf8_extra_columns_kept_verbatim() {
        let bytes = b"chr\tstart\tend\tnote\nchr1\t1\t5\tcaf\xe9\n".to_vec();
        let table = SecondaryTable::from_bytes(bytes, &ColumnSpec::default()).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.line(0), b"chr1\t1\t5\tcaf\xe9");
        assert_eq!(table.chrom(0), "chr1");
    }

    #[test]
    fn test_chromosomes_interned() {
        let table = load("h\th\th\nchr1\t1\t2\nchr2\t3\t4\nchr1\t5\t6\n");
        assert_eq!(table.chroms, vec!["chr1".to_string(), "chr2".to_string()]);
        assert_eq!(table.chrom(2), "chr1");
        assert_eq!(table.record(2), IntervalRecord { chrom: "chr1", start: 5, end: 6 });
    }

    #[test]
    fn test_from_source_memory_mapped() -> Result<()> {
        use crate::core::io::IoStrategy;
        use std::io::Write;

        let mut temp = tempfile::NamedTempFile::new()?;
        temp.write_all(b"c\ts\te\nchr1\t10\t20\tx\xff\n")?;
        temp.flush()?;

        let source = SmartReader::open(temp.path(), IoStrategy::MemoryMapped)?;
        assert!(source.is_mapped());
        let table = SecondaryTable::from_source(source, &ColumnSpec::default())?;
        assert!(matches!(table.buffer, TableBuffer::Mapped(_)));
        assert_eq!(table.line(0), b"chr1\t10\t20\tx\xff");
        assert_eq!(table.record(0), IntervalRecord { chrom: "chr1", start: 10, end: 20 });
        Ok(())
    }

    #[test]
    fn test_from_source_buffered() -> Result<()> {
        use crate::core::io::IoStrategy;
        use std::io::Write;

        let mut temp = tempfile::NamedTempFile::new()?;
        temp.write_all(b"c\ts\te\nchr2\t1\t2\n")?;
        temp.flush()?;

        let source = SmartReader::open(temp.path(), IoStrategy::Buffered(64))?;
        let table = SecondaryTable::from_source(source, &ColumnSpec::default())?;
        assert!(matches!(table.buffer, TableBuffer::Owned(_)));
        assert_eq!(table.chrom(0), "chr2");
        Ok(())
    }
}

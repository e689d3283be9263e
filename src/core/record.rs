//! Interval records
//!
//! Zero-copy extraction of `(chrom, start, end)` from a tab-separated line,
//! plus the overlap measure used to decide a match.

use crate::core::columns::ColumnSpec;
use crate::core::error::{RecordError, RecordResult};
use memchr::memchr_iter;

/// Number of fields a [`ColumnSpec`] asks for
const REQUIRED_FIELDS: usize = 3;

/// One interval borrowed from its source line
///
/// `start <= end` always holds: inverted coordinates are swapped on
/// construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntervalRecord<'a> {
    pub chrom: &'a str,
    pub start: i64,
    pub end: i64,
}

impl<'a> IntervalRecord<'a> {
    /// Build a record, swapping `start` and `end` if they are inverted
    pub fn new(chrom: &'a str, start: i64, end: i64) -> Self {
        if start > end {
            log::warn!(
                "Wrong interval formation on {}: swapping start {} and end {}",
                chrom,
                start,
                end
            );
            Self { chrom, start: end, end: start }
        } else {
            Self { chrom, start, end }
        }
    }

    /// Parse a line using the column positions in `columns`
    ///
    /// See [`IntervalRecord::parse_bytes`].
    pub fn parse(line: &'a str, columns: &ColumnSpec) -> RecordResult<Self> {
        Self::parse_bytes(line.as_bytes(), columns)
    }

    /// Parse raw line bytes using the column positions in `columns`
    ///
    /// Only the three named fields are inspected and only they must be valid
    /// UTF-8; tokenizing stops as soon as all of them have been seen. Leading
    /// spaces in a field are ignored and a trailing `\n` / `\r\n` on the line
    /// is tolerated.
    pub fn parse_bytes(line: &'a [u8], columns: &ColumnSpec) -> RecordResult<Self> {
        let line = trim_line_end(line);

        let mut chrom: Option<&'a [u8]> = None;
        let mut start: Option<&'a [u8]> = None;
        let mut end: Option<&'a [u8]> = None;
        let mut found = 0;

        let mut field_start = 0;
        let tabs = memchr_iter(b'\t', line).chain(std::iter::once(line.len()));
        for (pos, field_end) in tabs.enumerate() {
            let field = trim_leading_spaces(&line[field_start..field_end]);
            if pos == columns.chrom {
                chrom = Some(field);
                found += 1;
            } else if pos == columns.start {
                start = Some(field);
                found += 1;
            } else if pos == columns.end {
                end = Some(field);
                found += 1;
            }
            if found == REQUIRED_FIELDS {
                break;
            }
            field_start = field_end + 1;
        }

        match (chrom, start, end) {
            (Some(chrom), Some(start), Some(end)) => {
                let chrom = std::str::from_utf8(chrom)
                    .map_err(|_| RecordError::InvalidUtf8 { field: "chrom" })?;
                Ok(Self::new(
                    chrom,
                    parse_coordinate("start", start)?,
                    parse_coordinate("end", end)?,
                ))
            }
            _ => Err(RecordError::IncompleteFields {
                expected: REQUIRED_FIELDS,
                found,
            }),
        }
    }

    /// Length of the interval
    #[inline]
    pub fn len(&self) -> i64 {
        self.end - self.start
    }

    /// True for zero-length intervals
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Overlap length with `other`, see [`overlap`]
    #[inline]
    pub fn overlap(&self, other: &IntervalRecord<'_>) -> i64 {
        overlap(self, other)
    }

    /// True when the two intervals share a positive-length stretch
    #[inline]
    pub fn overlaps(&self, other: &IntervalRecord<'_>) -> bool {
        overlap(self, other) > 0
    }
}

/// Number of positions shared by `a` and `b`
///
/// Returns 0 for different chromosomes and for intervals that only touch.
#[inline]
pub fn overlap(a: &IntervalRecord<'_>, b: &IntervalRecord<'_>) -> i64 {
    if a.chrom != b.chrom {
        return 0;
    }
    a.end
        .min(b.end)
        .saturating_sub(a.start.max(b.start))
        .max(0)
}

/// Strip one trailing `\n` and any `\r` before it
#[inline]
pub fn trim_line_end(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

#[inline]
fn trim_leading_spaces(field: &[u8]) -> &[u8] {
    let skip = field.iter().take_while(|&&b| b == b' ').count();
    &field[skip..]
}

fn parse_coordinate(field: &'static str, value: &[u8]) -> RecordResult<i64> {
    std::str::from_utf8(value)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .ok_or_else(|| RecordError::InvalidCoordinate {
            field,
            value: String::from_utf8_lossy(value).into_owned(),
        })
}

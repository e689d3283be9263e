//! Column descriptors
//!
//! Each input file names the zero-based tab-separated columns holding the
//! chromosome, start and end of its intervals.

use crate::core::error::ColumnSpecError;
use std::fmt;
use std::str::FromStr;

/// Zero-based positions of the chromosome, start and end fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColumnSpec {
    pub chrom: usize,
    pub start: usize,
    pub end: usize,
}

impl ColumnSpec {
    /// Create a descriptor, rejecting repeated column indices
    pub fn new(chrom: usize, start: usize, end: usize) -> Result<Self, ColumnSpecError> {
        if chrom == start || chrom == end {
            return Err(ColumnSpecError::DuplicateColumn(chrom));
        }
        if start == end {
            return Err(ColumnSpecError::DuplicateColumn(start));
        }
        Ok(Self { chrom, start, end })
    }

    /// Highest column index referenced
    pub fn max_column(&self) -> usize {
        self.chrom.max(self.start).max(self.end)
    }
}

impl Default for ColumnSpec {
    /// BED layout: `chrom`, `start`, `end` in the first three columns
    fn default() -> Self {
        Self { chrom: 0, start: 1, end: 2 }
    }
}

impl FromStr for ColumnSpec {
    type Err = ColumnSpecError;

    /// Parse the `N,N,N` command-line form
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 3 {
            return Err(ColumnSpecError::WrongArity(parts.len()));
        }

        let mut indices = [0usize; 3];
        for (slot, part) in indices.iter_mut().zip(&parts) {
            *slot = part
                .parse()
                .map_err(|_| ColumnSpecError::InvalidIndex(part.to_string()))?;
        }

        Self::new(indices[0], indices[1], indices[2])
    }
}

impl fmt::Display for ColumnSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.chrom, self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic() {
        let spec: ColumnSpec = "0,1,2".parse().unwrap();
        assert_eq!(spec, ColumnSpec::default());
    }

    #[test]
    fn test_parse_any_order() {
        let spec: ColumnSpec = "4, 0,2".parse().unwrap();
        assert_eq!(spec.chrom, 4);
        assert_eq!(spec.start, 0);
        assert_eq!(spec.end, 2);
        assert_eq!(spec.max_column(), 4);
    }

    #[test]
    fn test_parse_wrong_arity() {
        assert_eq!("0,1".parse::<ColumnSpec>(), Err(ColumnSpecError::WrongArity(2)));
        assert_eq!("0,1,2,3".parse::<ColumnSpec>(), Err(ColumnSpecError::WrongArity(4)));
    }

    #[test]
    fn test_parse_invalid_index() {
        assert_eq!(
            "0,x,2".parse::<ColumnSpec>(),
            Err(ColumnSpecError::InvalidIndex("x".to_string()))
        );
        assert!("0,-1,2".parse::<ColumnSpec>().is_err());
    }

    #[test]
    fn test_duplicate_column() {
        assert_eq!("1,1,2".parse::<ColumnSpec>(), Err(ColumnSpecError::DuplicateColumn(1)));
        assert_eq!(ColumnSpec::new(0, 2, 2), Err(ColumnSpecError::DuplicateColumn(2)));
    }

    #[test]
    fn test_display_round_trip() {
        let spec = ColumnSpec::new(3, 5, 6).unwrap();
        assert_eq!(spec.to_string(), "3,5,6");
    }
}

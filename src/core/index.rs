//! Chromosome bucket index over the secondary table
//!
//! A single pass groups consecutive records with the same chromosome into a
//! bucket. When every chromosome forms one contiguous run the index is
//! *packed* and a query only scans its bucket; otherwise every query falls
//! back to the full table.

use crate::core::table::SecondaryTable;
use std::collections::HashMap;
use std::ops::Range;

/// Chromosome name -> half-open range of secondary record positions
#[derive(Debug, Clone)]
pub struct ChromosomeIndex {
    /// Chromosome -> bucket (first run seen for that name)
    buckets: HashMap<String, Range<usize>>,
    /// True while chromosome names form contiguous runs
    packed: bool,
    /// Number of records covered
    len: usize,
    /// First chromosome found to reappear after another one
    repeated_chrom: Option<String>,
}

impl ChromosomeIndex {
    /// Build the index over a loaded secondary table
    pub fn build(table: &SecondaryTable) -> Self {
        Self::from_chroms((0..table.len()).map(|i| table.chrom(i)))
    }

    /// Build the index from chromosome names in file order
    pub fn from_chroms<'a, I>(chroms: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut index = Self {
            buckets: HashMap::new(),
            packed: true,
            len: 0,
            repeated_chrom: None,
        };

        let mut current: Option<&'a str> = None;
        let mut bucket_start = 0;

        for (i, chrom) in chroms.into_iter().enumerate() {
            index.len = i + 1;
            if current == Some(chrom) {
                continue;
            }
            if let Some(prev) = current {
                index.close_run(prev, bucket_start..i);
            }
            current = Some(chrom);
            bucket_start = i;
        }

        if let Some(prev) = current {
            let end = index.len;
            index.close_run(prev, bucket_start..end);
        }

        if let Some(chrom) = &index.repeated_chrom {
            log::warn!(
                "Secondary file is not grouped by chromosome ({} reappears); \
                 every query will scan all {} records. Consider sorting it by chromosome!",
                chrom,
                index.len
            );
        } else {
            log::debug!("Secondary file is packed into {} chromosome buckets", index.buckets.len());
        }

        index
    }

    fn close_run(&mut self, chrom: &str, run: Range<usize>) {
        if self.buckets.contains_key(chrom) {
            if self.packed {
                self.packed = false;
                self.repeated_chrom = Some(chrom.to_string());
            }
            return;
        }
        log::debug!("Bucket {} -> [{}, {})", chrom, run.start, run.end);
        self.buckets.insert(chrom.to_string(), run);
    }

    /// Candidate range for a query on `chrom`
    ///
    /// Packed: the chromosome's bucket, or `None` when the chromosome is absent
    /// from the secondary file. Unpacked: always the full range.
    pub fn lookup(&self, chrom: &str) -> Option<Range<usize>> {
        if self.packed {
            self.buckets.get(chrom).cloned()
        } else {
            Some(self.full_range())
        }
    }

    /// Whether chromosome names form contiguous runs
    pub fn is_packed(&self) -> bool {
        self.packed
    }

    /// Range over every record
    pub fn full_range(&self) -> Range<usize> {
        0..self.len
    }

    /// Raw bucket for `chrom`, regardless of packing
    pub fn bucket(&self, chrom: &str) -> Option<&Range<usize>> {
        self.buckets.get(chrom)
    }

    /// Check if a chromosome has a bucket
    pub fn has_chrom(&self, chrom: &str) -> bool {
        self.buckets.contains_key(chrom)
    }

    /// All chromosome names seen
    pub fn chromosomes(&self) -> impl Iterator<Item = &str> {
        self.buckets.keys().map(|s| s.as_str())
    }

    /// Number of distinct chromosome buckets
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Number of records covered
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// First chromosome that broke the packing, if any
    pub fn repeated_chrom(&self) -> Option<&str> {
        self.repeated_chrom.as_deref()
    }
}

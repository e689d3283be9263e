//! Property-based tests for IntervalRecord parsing and overlap
//!
//! **Property 1: 重叠对称性与正确性**

use interval_join::{overlap, ColumnSpec, IntervalRecord, RecordError};
use proptest::prelude::*;

/// Generate a random chromosome name
fn arb_chrom() -> impl Strategy<Value = String> {
    prop_oneof![
        (1u8..=22).prop_map(|n| format!("chr{}", n)),
        Just("chrX".to_string()),
        Just("chrY".to_string()),
    ]
}

fn arb_coord() -> impl Strategy<Value = i64> {
    -1_000i64..1_000_000
}

/// Column descriptor with three distinct indices below 6
fn arb_columns() -> impl Strategy<Value = ColumnSpec> {
    Just((0..6usize).collect::<Vec<_>>())
        .prop_shuffle()
        .prop_map(|v| ColumnSpec::new(v[0], v[1], v[2]).unwrap())
}

/// Lay out chrom/start/end at the positions named by `columns`
fn build_line(columns: &ColumnSpec, chrom: &str, start: i64, end: i64) -> String {
    let width = columns.max_column() + 2;
    let fields: Vec<String> = (0..width)
        .map(|i| {
            if i == columns.chrom {
                chrom.to_string()
            } else if i == columns.start {
                start.to_string()
            } else if i == columns.end {
                end.to_string()
            } else {
                format!("extra{}", i)
            }
        })
        .collect();
    fields.join("\t")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// overlap(a, b) == overlap(b, a)
    #[test]
    fn prop_overlap_symmetric(
        c1 in arb_chrom(), s1 in arb_coord(), e1 in arb_coord(),
        c2 in arb_chrom(), s2 in arb_coord(), e2 in arb_coord(),
    ) {
        let a = IntervalRecord::new(&c1, s1, e1);
        let b = IntervalRecord::new(&c2, s2, e2);
        prop_assert_eq!(overlap(&a, &b), overlap(&b, &a));
        prop_assert!(overlap(&a, &b) >= 0);
    }

    /// overlap > 0 iff same chromosome and a positive-length intersection
    #[test]
    fn prop_overlap_positive_iff_intersecting(
        same_chrom in any::<bool>(),
        s1 in arb_coord(), e1 in arb_coord(),
        s2 in arb_coord(), e2 in arb_coord(),
    ) {
        let a = IntervalRecord::new("chr1", s1, e1);
        let b = IntervalRecord::new(if same_chrom { "chr1" } else { "chr2" }, s2, e2);

        let intersects = same_chrom && a.end.min(b.end) > a.start.max(b.start);
        prop_assert_eq!(overlap(&a, &b) > 0, intersects);
    }

    /// Swapped coordinates parse to the same record as ordered ones
    #[test]
    fn prop_swap_normalisation(
        chrom in arb_chrom(),
        columns in arb_columns(),
        a in arb_coord(),
        b in arb_coord(),
    ) {
        let lo = a.min(b);
        let hi = a.max(b);
        let ordered_line = build_line(&columns, &chrom, lo, hi);
        let swapped_line = build_line(&columns, &chrom, hi, lo);

        let ordered = IntervalRecord::parse(&ordered_line, &columns).unwrap();
        let swapped = IntervalRecord::parse(&swapped_line, &columns).unwrap();

        prop_assert_eq!(ordered, swapped);
        prop_assert!(ordered.start <= ordered.end);
        prop_assert_eq!(ordered.chrom, chrom.as_str());
    }

    /// Truncating a line before the highest required column always fails
    #[test]
    fn prop_truncated_line_incomplete(
        chrom in arb_chrom(),
        columns in arb_columns(),
        start in arb_coord(),
        len in 0i64..1000,
    ) {
        let line = build_line(&columns, &chrom, start, start + len);
        let keep = columns.max_column();
        let truncated: Vec<&str> = line.split('\t').take(keep).collect();
        let truncated = truncated.join("\t");

        let result = IntervalRecord::parse(&truncated, &columns);
        let is_incomplete = matches!(result, Err(RecordError::IncompleteFields { expected: 3, .. }));
        prop_assert!(is_incomplete);
    }
}

#[test]
fn test_touching_intervals_do_not_match() {
    let a = IntervalRecord::new("chr1", 100, 200);
    let b = IntervalRecord::new("chr1", 200, 300);
    assert_eq!(overlap(&a, &b), 0);
}

//! Property tests for the normalization and derivation invariants.
//!
//! Uses proptest to verify:
//! 1. Normalization never panics and never adds rows or columns, for text-only
//!    and mixed numeric/text datasets
//! 2. Normalizing twice equals normalizing once
//! 3. A column is promoted only when strictly more than half its values parse
//! 4. Derived series are chronological and nets equal long minus short

use cotlab_core::domain::fields::{
    COMM_LONG, COMM_SHORT, MARKET, NONCOMM_LONG, NONCOMM_SHORT, NONREPT_LONG, NONREPT_SHORT,
    REPORT_DATE_DISPLAY,
};
use cotlab_core::domain::{numeric_column, present_cells, text_column, Dataset};
use cotlab_core::normalize::parse_numeric_cell;
use cotlab_core::{derive, normalize, DateParse};
use proptest::prelude::*;

// ── Strategies (proptest) ────────────────────────────────────────────

/// Cells a COT export actually contains: counts, formatted counts, text,
/// blanks and missing values.
fn arb_cell() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        3 => (0u32..2_000_000).prop_map(|n| Some(n.to_string())),
        1 => (1_000u32..999_999).prop_map(|n| Some(format!("{},{:03}", n / 1000, n % 1000))),
        1 => "[A-Z ]{1,12}".prop_map(Some),
        1 => Just(Some(String::new())),
        1 => Just(Some("  ".to_string())),
        1 => Just(None),
    ]
}

/// Column values before naming: text cells or already-typed numbers.
#[derive(Debug, Clone)]
enum ArbColumn {
    Text(Vec<Option<String>>),
    Numeric(Vec<Option<f64>>),
}

fn arb_column(rows: usize) -> impl Strategy<Value = ArbColumn> {
    prop_oneof![
        3 => proptest::collection::vec(arb_cell(), rows).prop_map(ArbColumn::Text),
        1 => proptest::collection::vec(
            proptest::option::of(-1_000_000.0f64..1_000_000.0),
            rows
        )
        .prop_map(ArbColumn::Numeric),
    ]
}

fn build(columns: Vec<ArbColumn>) -> Dataset {
    let columns = columns
        .into_iter()
        .enumerate()
        .map(|(i, column)| match column {
            ArbColumn::Text(values) => text_column(format!("c{i}"), values),
            ArbColumn::Numeric(values) => numeric_column(format!("c{i}"), values),
        })
        .collect();
    Dataset::new(columns).unwrap()
}

/// Text-only datasets, as a CSV or API payload arrives.
fn arb_dataset() -> impl Strategy<Value = Dataset> {
    (1usize..5, 0usize..12).prop_flat_map(|(cols, rows)| {
        proptest::collection::vec(
            proptest::collection::vec(arb_cell(), rows).prop_map(ArbColumn::Text),
            cols,
        )
        .prop_map(build)
    })
}

/// Numeric columns with missing cells next to text columns.
fn arb_mixed_dataset() -> impl Strategy<Value = Dataset> {
    (1usize..5, 0usize..12).prop_flat_map(|(cols, rows)| {
        proptest::collection::vec(arb_column(rows), cols).prop_map(build)
    })
}

fn arb_date() -> impl Strategy<Value = chrono::NaiveDate> {
    (0i64..3000).prop_map(|d| {
        chrono::NaiveDate::from_ymd_opt(2000, 1, 4).unwrap() + chrono::Duration::days(d)
    })
}

// ── 1-2. Normalization ───────────────────────────────────────────────

proptest! {
    #[test]
    fn normalize_never_grows(ds in arb_dataset()) {
        let out = normalize(ds.clone());
        prop_assert!(out.row_count() <= ds.row_count());
        prop_assert_eq!(out.column_count(), ds.column_count());
    }

    #[test]
    fn normalize_is_idempotent(ds in arb_dataset()) {
        let once = normalize(ds);
        let twice = normalize(once.clone());
        prop_assert_eq!(once, twice);
    }

    /// No surviving row is blank in every column.
    #[test]
    fn normalize_drops_all_blank_rows(ds in arb_mixed_dataset()) {
        let out = normalize(ds);
        let present: Vec<Vec<bool>> = out.columns().map(present_cells).collect();
        for row in 0..out.row_count() {
            prop_assert!(present.iter().any(|c| c[row]));
        }
    }

    #[test]
    fn normalize_mixed_is_total_and_idempotent(ds in arb_mixed_dataset()) {
        let once = normalize(ds.clone());
        prop_assert!(once.row_count() <= ds.row_count());
        prop_assert_eq!(once.column_count(), ds.column_count());
        let twice = normalize(once.clone());
        prop_assert_eq!(once, twice);
    }

    /// Columns that were numeric going in are numeric coming out.
    #[test]
    fn numeric_columns_stay_numeric(ds in arb_mixed_dataset()) {
        let numeric: Vec<String> = ds
            .columns()
            .filter(|c| ds.is_numeric(c.name()))
            .map(|c| c.name().to_string())
            .collect();
        let out = normalize(ds);
        for name in numeric {
            prop_assert!(out.is_numeric(&name));
        }
    }
}

// ── 3. Promotion threshold ───────────────────────────────────────────

proptest! {
    #[test]
    fn promotion_requires_strict_majority(numeric in 0usize..8, text in 0usize..8) {
        prop_assume!(numeric + text > 0);
        let mut values: Vec<Option<String>> =
            (0..numeric).map(|n| Some(format!("{}", n * 10))).collect();
        values.extend((0..text).map(|_| Some("n/a".to_string())));
        let ds = Dataset::new(vec![text_column("x", values)]).unwrap();

        let out = normalize(ds);
        let promoted = out.is_numeric("x");
        prop_assert_eq!(promoted, numeric * 2 > numeric + text);
    }

    #[test]
    fn formatted_counts_parse(n in 0u64..10_000_000_000) {
        let mut grouped = String::new();
        let digits = n.to_string();
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }
        prop_assert_eq!(parse_numeric_cell(&grouped), Some(n as f64));
        prop_assert_eq!(parse_numeric_cell(&format!(" ${grouped} ")), Some(n as f64));
    }
}

// ── 4. Derivation ────────────────────────────────────────────────────

proptest! {
    #[test]
    fn derived_series_is_sorted_with_exact_nets(
        rows in proptest::collection::vec((arb_date(), 0u32..100_000, 0u32..100_000), 1..20)
    ) {
        let n = rows.len();
        let text = |f: &dyn Fn(&(chrono::NaiveDate, u32, u32)) -> String| -> Vec<Option<String>> {
            rows.iter().map(|r| Some(f(r))).collect()
        };
        let ds = Dataset::new(vec![
            text_column(MARKET, vec![Some("GOLD"); n]),
            text_column(REPORT_DATE_DISPLAY, text(&|r| r.0.format("%m/%d/%Y").to_string())),
            text_column(COMM_LONG, text(&|r| r.1.to_string())),
            text_column(COMM_SHORT, text(&|r| r.2.to_string())),
            numeric_column(NONCOMM_LONG, vec![Some(1.0); n]),
            numeric_column(NONCOMM_SHORT, vec![Some(2.0); n]),
            numeric_column(NONREPT_LONG, vec![Some(3.0); n]),
            numeric_column(NONREPT_SHORT, vec![None; n]),
        ])
        .unwrap();

        let series = derive(&ds, "GOLD").unwrap();
        prop_assert_eq!(series.date_parse, DateParse::Exact);
        prop_assert_eq!(series.len(), n);
        for pair in series.points.windows(2) {
            prop_assert!(pair[0].date <= pair[1].date);
        }
        for p in &series.points {
            let (_, long, short) = rows[p.source_row];
            prop_assert_eq!(p.commercial, Some(long as f64 - short as f64));
            prop_assert_eq!(p.noncommercial, Some(-1.0));
            prop_assert_eq!(p.nonreportable, None);
        }
    }
}

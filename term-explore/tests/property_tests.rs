//! Property-based tests for the analysis building blocks.
//!
//! ## Properties
//!
//! - Classification partitions the columns: every column gets exactly one role
//! - The correlation matrix is symmetric with a unit diagonal for varying columns
//! - Outlier counts for a column do not depend on the other columns
//! - Top and bottom leaderboards never share a group once there are at least
//!   twice as many groups as entries, and every total is a real group sum
//! - Applying a filter selection twice gives the same rows as applying it once

use std::collections::HashMap;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray, TimestampNanosecondArray};
use chrono::NaiveDate;
use proptest::prelude::*;
use term_explore::analyzers::query::grouped_sums;
use term_explore::analyzers::{correlation_matrix, ColumnClassifier, RankOrder};
use term_explore::dataset::Dataset;
use term_explore::engine::InsightEngine;
use term_explore::filters::{FilterLayer, FilterSelection};
use term_explore::report::SectionKind;

const DAY_NANOS: i64 = 86_400_000_000_000;
const CATEGORIES: [&str; 4] = ["Casa", "Jogos", "Livros", "Moda"];

// ============================================================================
// Test Data Generation Utilities
// ============================================================================

fn column_for(kind: u8, values: &[i64]) -> ArrayRef {
    match kind % 5 {
        0 => Arc::new(Int64Array::from(values.to_vec())),
        1 => Arc::new(Float64Array::from(
            values.iter().map(|v| *v as f64 / 4.0).collect::<Vec<_>>(),
        )),
        2 => Arc::new(StringArray::from(
            values
                .iter()
                .map(|v| CATEGORIES[v.unsigned_abs() as usize % CATEGORIES.len()])
                .collect::<Vec<_>>(),
        )),
        3 => Arc::new(TimestampNanosecondArray::from(
            values.iter().map(|v| v * DAY_NANOS).collect::<Vec<_>>(),
        )),
        _ => Arc::new(StringArray::from(
            values
                .iter()
                .map(|v| format!("2024-01-{:02}", v.unsigned_abs() % 28 + 1))
                .collect::<Vec<_>>(),
        )),
    }
}

fn numeric_dataset(columns: &[Vec<Option<i64>>]) -> Dataset {
    Dataset::from_columns(
        columns
            .iter()
            .enumerate()
            .map(|(idx, values)| {
                (
                    format!("c{idx}"),
                    Arc::new(Int64Array::from(values.clone())) as ArrayRef,
                )
            })
            .collect::<Vec<_>>(),
    )
    .unwrap()
}

fn outlier_line(text: &str, column: &str) -> Option<String> {
    let marker = format!("**`{column}`**");
    text.lines()
        .find(|line| line.contains(&marker) && line.contains("atípico"))
        .map(str::to_string)
}

fn rows() -> impl Strategy<Value = usize> {
    2usize..40
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_classification_partitions_columns(
        (kinds, values) in (1usize..8, rows()).prop_flat_map(|(cols, n)| (
            prop::collection::vec(any::<u8>(), cols),
            prop::collection::vec(-500i64..500, n),
        ))
    ) {
        let dataset = Dataset::from_columns(
            kinds
                .iter()
                .enumerate()
                .map(|(idx, kind)| (format!("col_{idx}"), column_for(*kind, &values)))
                .collect::<Vec<_>>(),
        )
        .unwrap();

        let roles = ColumnClassifier::new().classify(&dataset);
        prop_assert_eq!(roles.len(), kinds.len());
        for name in dataset.column_names() {
            let hits = roles.numeric.iter().filter(|c| **c == name).count()
                + roles.categorical.iter().filter(|c| **c == name).count()
                + roles.temporal.iter().filter(|c| **c == name).count();
            prop_assert_eq!(hits, 1, "column {} classified {} times", name, hits);
        }
    }

    #[test]
    fn prop_correlation_matrix_symmetric(
        columns in (2usize..5, rows()).prop_flat_map(|(cols, n)| {
            prop::collection::vec(
                prop::collection::vec(prop::option::weighted(0.9, -100i64..100), n),
                cols,
            )
        })
    ) {
        let named: Vec<(String, Vec<Option<f64>>)> = columns
            .iter()
            .enumerate()
            .map(|(idx, values)| {
                (format!("c{idx}"), values.iter().map(|v| v.map(|v| v as f64)).collect())
            })
            .collect();
        let matrix = correlation_matrix(&named);

        for i in 0..matrix.len() {
            for j in 0..matrix.len() {
                let a = matrix.get(i, j).unwrap();
                let b = matrix.get(j, i).unwrap();
                prop_assert!(a == b || (a.is_nan() && b.is_nan()));
                prop_assert!(a.is_nan() || (-1.0..=1.0).contains(&a));
            }

            let present: Vec<i64> = columns[i].iter().flatten().copied().collect();
            let varies = present.windows(2).any(|w| w[0] != w[1]);
            if varies {
                prop_assert_eq!(matrix.get(i, i), Some(1.0));
            } else {
                prop_assert!(matrix.get(i, i).unwrap().is_nan());
            }
        }
    }

    #[test]
    fn prop_outlier_counts_are_column_independent(
        (first, others) in rows().prop_flat_map(|n| (
            prop::collection::vec(prop::option::weighted(0.9, -1000i64..1000), n),
            prop::collection::vec(
                prop::collection::vec(prop::option::weighted(0.9, -1000i64..1000), n),
                0..3,
            ),
        ))
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let alone = numeric_dataset(std::slice::from_ref(&first));
            let mut all = vec![first.clone()];
            all.extend(others.iter().cloned());
            let together = numeric_dataset(&all);

            let engine = InsightEngine::new();
            let alone_text = engine.run(&alone).await.unwrap().report.text();
            let together_output = engine.run(&together).await.unwrap();
            prop_assert!(together_output.report.contains(SectionKind::Outliers));

            prop_assert_eq!(
                outlier_line(&alone_text, "c0"),
                outlier_line(&together_output.report.text(), "c0")
            );
            Ok(())
        })?;
    }

    #[test]
    fn prop_top_and_bottom_disjoint(
        (groups, extra) in (10usize..20).prop_flat_map(|groups| (
            Just(groups),
            prop::collection::vec((0..groups, -50i64..50), 0..40),
        )),
        seed_amounts in prop::collection::vec(-50i64..50, 20)
    ) {
        let mut labels = Vec::new();
        let mut amounts = Vec::new();
        for g in 0..groups {
            labels.push(format!("G{g:02}"));
            amounts.push(seed_amounts[g]);
        }
        for (g, amount) in &extra {
            labels.push(format!("G{g:02}"));
            amounts.push(*amount);
        }

        let mut expected: HashMap<String, f64> = HashMap::new();
        for (label, amount) in labels.iter().zip(&amounts) {
            *expected.entry(label.clone()).or_default() += *amount as f64;
        }

        let dataset = Dataset::from_columns(vec![
            ("Produto", Arc::new(StringArray::from(labels)) as ArrayRef),
            ("Vendas", Arc::new(Int64Array::from(amounts)) as ArrayRef),
        ])
        .unwrap();

        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let ctx = dataset.session_context().unwrap();
            let top = grouped_sums(&ctx, "Produto", "Vendas", RankOrder::Descending, Some(5))
                .await
                .unwrap();
            let bottom = grouped_sums(&ctx, "Produto", "Vendas", RankOrder::Ascending, Some(5))
                .await
                .unwrap();

            prop_assert_eq!(top.len(), 5);
            prop_assert_eq!(bottom.len(), 5);
            for entry in &top {
                prop_assert!(bottom.iter().all(|b| b.label != entry.label));
            }
            for entry in top.iter().chain(&bottom) {
                prop_assert_eq!(expected.get(&entry.label).copied(), Some(entry.total));
            }
            Ok(())
        })?;
    }

    #[test]
    fn prop_filter_application_idempotent(
        rows in prop::collection::vec((0i64..60, 0usize..4), 1..40),
        start in 0u32..60,
        span in 0u32..30,
        picked in prop::collection::btree_set(0usize..4, 0..4)
    ) {
        let dataset = Dataset::from_columns(vec![
            (
                "Data",
                Arc::new(TimestampNanosecondArray::from(
                    rows.iter().map(|(d, _)| d * DAY_NANOS).collect::<Vec<_>>(),
                )) as ArrayRef,
            ),
            (
                "Categoria",
                Arc::new(StringArray::from(
                    rows.iter().map(|(_, c)| CATEGORIES[*c]).collect::<Vec<_>>(),
                )) as ArrayRef,
            ),
        ])
        .unwrap();

        // Day offsets count from the Unix epoch.
        let unix = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
        let from = unix + chrono::Days::new(u64::from(start));
        let to = from + chrono::Days::new(u64::from(span));

        let selection = FilterSelection::new()
            .with_date_range("Data", from, to)
            .with_values("Categoria", picked.iter().map(|c| CATEGORIES[*c]));

        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let layer = FilterLayer::new();
            let once = layer.apply(&dataset, &selection).await.unwrap();
            let twice = layer.apply(&once, &selection).await.unwrap();

            prop_assert_eq!(once.num_rows(), twice.num_rows());
            prop_assert_eq!(once.to_record_batch().unwrap(), twice.to_record_batch().unwrap());
            Ok(())
        })?;
    }
}

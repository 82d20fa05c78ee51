//! Pairwise correlation between numeric columns.
//!
//! The full Pearson matrix is stored in the bundle under
//! [`keys::CORR_MATRIX`]; the narrative lists every unordered pair whose
//! coefficient is strong in either direction.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::errors::AnalyzerResult;
use super::query;
use super::stats::pearson;
use super::traits::{AnalysisInput, Heuristic, HeuristicOutcome};
use crate::report::{keys, BundleValue, CorrelationMatrix, ReportSection, SectionKind};

/// Builds the correlation matrix for named columns of equal length.
///
/// The diagonal is 1.0 for a column with at least two values and nonzero
/// variance, `NaN` otherwise.
pub fn correlation_matrix(columns: &[(String, Vec<Option<f64>>)]) -> CorrelationMatrix {
    let labels = columns.iter().map(|(name, _)| name.clone()).collect();
    let mut matrix = CorrelationMatrix::new(labels);

    for (i, (_, xs)) in columns.iter().enumerate() {
        let self_r = pearson(xs, xs);
        matrix.set_symmetric(i, i, if self_r.is_nan() { f64::NAN } else { 1.0 });

        for (j, (_, ys)) in columns.iter().enumerate().skip(i + 1) {
            matrix.set_symmetric(i, j, pearson(xs, ys));
        }
    }
    matrix
}

/// An unordered pair of distinct columns and their coefficient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelatedPair {
    pub first: String,
    pub second: String,
    pub coefficient: f64,
}

impl CorrelatedPair {
    pub fn is_positive(&self) -> bool {
        self.coefficient > 0.0
    }
}

/// Pairs `(i, j)` with `i < j` whose |r| is strictly above `threshold`,
/// sorted by descending coefficient.
pub fn strong_pairs(matrix: &CorrelationMatrix, threshold: f64) -> Vec<CorrelatedPair> {
    let labels = matrix.labels();
    let mut pairs = Vec::new();

    for i in 0..labels.len() {
        for j in (i + 1)..labels.len() {
            let Some(r) = matrix.get(i, j) else { continue };
            if r.is_nan() || r.abs() <= threshold {
                continue;
            }
            pairs.push(CorrelatedPair {
                first: labels[i].clone(),
                second: labels[j].clone(),
                coefficient: r,
            });
        }
    }

    pairs.sort_by(|a, b| b.coefficient.total_cmp(&a.coefficient));
    pairs
}

/// Reports strongly correlated numeric column pairs.
#[derive(Debug, Clone, Default)]
pub struct CorrelationHeuristic;

impl CorrelationHeuristic {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Heuristic for CorrelationHeuristic {
    fn name(&self) -> &str {
        "correlation"
    }

    fn section(&self) -> SectionKind {
        SectionKind::Correlation
    }

    fn progress_message(&self) -> &str {
        "Analisando correlações entre colunas numéricas..."
    }

    fn is_applicable(&self, input: &AnalysisInput<'_>) -> bool {
        input.has_rows() && input.roles.numeric.len() >= 2
    }

    #[instrument(skip(self, input), fields(columns = input.roles.numeric.len()))]
    async fn analyze(&self, input: &AnalysisInput<'_>) -> AnalyzerResult<HeuristicOutcome> {
        let mut columns = Vec::with_capacity(input.roles.numeric.len());
        for name in &input.roles.numeric {
            let values = query::numeric_values(input.ctx, name).await?;
            columns.push((name.clone(), values));
        }

        let matrix = correlation_matrix(&columns);
        let threshold = input.config.correlation_threshold;
        let pairs = strong_pairs(&matrix, threshold);
        debug!(strong_pairs = pairs.len(), "Computed correlation matrix");

        let mut section = ReportSection::new(self.section());
        if pairs.is_empty() {
            section.push(format!(
                "- Nenhuma correlação forte (acima de {threshold} ou abaixo de -{threshold}) foi encontrada entre as colunas numéricas."
            ));
        } else {
            section.push("Foram encontradas as seguintes correlações fortes (positivas ou negativas):");
            for pair in &pairs {
                let kind = if pair.is_positive() { "positiva" } else { "negativa" };
                section.push(format!(
                    "  - **`{}`** e **`{}`**: Correlação {kind} de `{:.2}`. Isso sugere uma forte relação entre elas.",
                    pair.first, pair.second, pair.coefficient
                ));
            }
        }

        Ok(HeuristicOutcome::with_section(section)
            .result(keys::CORR_MATRIX, BundleValue::Matrix(matrix)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::test_support::{is_applicable, run_heuristic};
    use crate::dataset::Dataset;
    use arrow::array::{ArrayRef, Float64Array, Int64Array};
    use std::sync::Arc;

    fn column(name: &str, values: &[f64]) -> (String, Vec<Option<f64>>) {
        (name.to_string(), values.iter().copied().map(Some).collect())
    }

    #[test]
    fn test_matrix_symmetry_and_diagonal() {
        let matrix = correlation_matrix(&[
            column("A", &[1.0, 2.0, 3.0, 4.0]),
            column("B", &[4.0, 1.0, 3.0, 2.0]),
            column("C", &[5.0, 5.0, 5.0, 5.0]),
        ]);
        assert_eq!(matrix.get(0, 0), Some(1.0));
        assert_eq!(matrix.get(1, 1), Some(1.0));
        assert!(matrix.get(2, 2).unwrap().is_nan());
        assert_eq!(matrix.get(0, 1), matrix.get(1, 0));
        assert!(matrix.get(0, 2).unwrap().is_nan());
    }

    #[test]
    fn test_strong_pairs_excludes_self_and_sorts() {
        let matrix = correlation_matrix(&[
            column("A", &[1.0, 2.0, 3.0, 4.0, 5.0]),
            column("B", &[2.0, 4.0, 6.0, 8.0, 10.0]),
            column("C", &[5.0, 4.0, 3.0, 2.0, 1.0]),
        ]);
        let pairs = strong_pairs(&matrix, 0.7);
        assert_eq!(pairs.len(), 3);
        assert_eq!((pairs[0].first.as_str(), pairs[0].second.as_str()), ("A", "B"));
        assert_eq!(pairs[0].coefficient, 1.0);
        assert!(pairs.iter().all(|p| p.first != p.second));
        assert!(!pairs[2].is_positive());
    }

    #[tokio::test]
    async fn test_perfect_positive_correlation_narrative() {
        let dataset = Dataset::from_columns(vec![
            ("A", Arc::new(Int64Array::from(vec![1, 2, 3, 4, 5])) as ArrayRef),
            (
                "B",
                Arc::new(Float64Array::from(vec![2.0, 4.0, 6.0, 8.0, 10.0])) as ArrayRef,
            ),
        ])
        .unwrap();

        let outcome = run_heuristic(&CorrelationHeuristic::new(), &dataset)
            .await
            .unwrap();
        let section = outcome.section.unwrap();
        assert_eq!(
            section.lines[1],
            "  - **`A`** e **`B`**: Correlação positiva de `1.00`. Isso sugere uma forte relação entre elas."
        );

        let (key, value) = &outcome.results[0];
        assert_eq!(key, keys::CORR_MATRIX);
        let BundleValue::Matrix(matrix) = value else {
            panic!("expected a matrix");
        };
        assert_eq!(matrix.get_by_name("A", "B"), Some(1.0));
    }

    #[tokio::test]
    async fn test_perfect_negative_correlation_narrative() {
        let dataset = Dataset::from_columns(vec![
            ("A", Arc::new(Int64Array::from(vec![1, 2, 3, 4, 5])) as ArrayRef),
            ("B", Arc::new(Int64Array::from(vec![5, 4, 3, 2, 1])) as ArrayRef),
        ])
        .unwrap();

        let outcome = run_heuristic(&CorrelationHeuristic::new(), &dataset)
            .await
            .unwrap();
        let section = outcome.section.unwrap();
        assert_eq!(section.lines.len(), 2);
        assert_eq!(
            section.lines[1],
            "  - **`A`** e **`B`**: Correlação negativa de `-1.00`. Isso sugere uma forte relação entre elas."
        );
    }

    #[tokio::test]
    async fn test_no_strong_correlation_sentence() {
        let dataset = Dataset::from_columns(vec![
            ("A", Arc::new(Int64Array::from(vec![1, 2, 3, 4])) as ArrayRef),
            ("B", Arc::new(Int64Array::from(vec![4, 1, 3, 2])) as ArrayRef),
        ])
        .unwrap();

        let outcome = run_heuristic(&CorrelationHeuristic::new(), &dataset)
            .await
            .unwrap();
        let section = outcome.section.unwrap();
        assert_eq!(section.lines.len(), 1);
        assert!(section.lines[0].starts_with("- Nenhuma correlação forte (acima de 0.7"));
    }

    #[tokio::test]
    async fn test_requires_two_numeric_columns() {
        let dataset = Dataset::from_columns(vec![(
            "A",
            Arc::new(Int64Array::from(vec![1, 2, 3])) as ArrayRef,
        )])
        .unwrap();
        assert!(!is_applicable(&CorrelationHeuristic::new(), &dataset));
    }
}

//! Machine-usable results produced alongside the narrative report.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Well-known bundle keys read by the chart and export consumers.
pub mod keys {
    pub const ROW_COUNT: &str = "row_count";
    pub const COLUMN_COUNT: &str = "column_count";
    pub const NUMERIC_COLS: &str = "numeric_cols";
    pub const CATEGORICAL_COLS: &str = "categorical_cols";
    pub const DATETIME_COLS: &str = "datetime_cols";
    pub const CORR_MATRIX: &str = "corr_matrix";
    pub const TOP_SELLERS: &str = "top_sellers";
    pub const TOP_PRODUCTS: &str = "top_products";
    pub const BOTTOM_PRODUCTS: &str = "bottom_products";
    /// Cross-tab of the first two categorical columns
    pub const COMPOSITION: &str = "composition";
}

/// One `(label, total)` row of a ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub label: String,
    pub total: f64,
}

impl RankedEntry {
    pub fn new(label: impl Into<String>, total: f64) -> Self {
        Self {
            label: label.into(),
            total,
        }
    }
}

/// Square Pearson correlation matrix over the numeric columns.
///
/// Missing correlations (constant or under-populated columns) are `NaN` and
/// serialize as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    labels: Vec<String>,
    values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    /// Creates a matrix filled with `NaN`.
    pub fn new(labels: Vec<String>) -> Self {
        let n = labels.len();
        Self {
            labels,
            values: vec![vec![f64::NAN; n]; n],
        }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn values(&self) -> &[Vec<f64>] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Sets both `(i, j)` and `(j, i)`.
    pub fn set_symmetric(&mut self, i: usize, j: usize, value: f64) {
        if i < self.len() && j < self.len() {
            self.values[i][j] = value;
            self.values[j][i] = value;
        }
    }

    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        self.values.get(i).and_then(|row| row.get(j)).copied()
    }

    /// Looks a coefficient up by column names.
    pub fn get_by_name(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.labels.iter().position(|l| l == a)?;
        let j = self.labels.iter().position(|l| l == b)?;
        self.get(i, j)
    }
}

/// Frequency table over two categorical columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossTab {
    pub row_column: String,
    pub column_column: String,
    pub row_labels: Vec<String>,
    pub column_labels: Vec<String>,
    /// `counts[r][c]` is the number of rows with `row_labels[r]` and `column_labels[c]`.
    pub counts: Vec<Vec<u64>>,
}

impl CrossTab {
    pub fn count(&self, row_label: &str, column_label: &str) -> u64 {
        let Some(r) = self.row_labels.iter().position(|l| l == row_label) else {
            return 0;
        };
        let Some(c) = self.column_labels.iter().position(|l| l == column_label) else {
            return 0;
        };
        self.counts[r][c]
    }

    /// Sum of every cell.
    pub fn total(&self) -> u64 {
        self.counts.iter().flatten().sum()
    }
}

/// A single heuristic result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum BundleValue {
    Columns(Vec<String>),
    Matrix(CorrelationMatrix),
    Ranking(Vec<RankedEntry>),
    CrossTab(CrossTab),
    Count(u64),
}

/// Keyed results of one analysis run.
///
/// Keys iterate in sorted order so serialized bundles are stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultBundle {
    values: BTreeMap<String, BundleValue>,
}

impl ResultBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a result, replacing any previous value under the same key.
    pub fn insert(&mut self, key: impl Into<String>, value: BundleValue) {
        self.values.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&BundleValue> {
        self.values.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn columns(&self, key: &str) -> Option<&[String]> {
        match self.get(key)? {
            BundleValue::Columns(columns) => Some(columns),
            _ => None,
        }
    }

    pub fn matrix(&self, key: &str) -> Option<&CorrelationMatrix> {
        match self.get(key)? {
            BundleValue::Matrix(matrix) => Some(matrix),
            _ => None,
        }
    }

    pub fn ranking(&self, key: &str) -> Option<&[RankedEntry]> {
        match self.get(key)? {
            BundleValue::Ranking(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn crosstab(&self, key: &str) -> Option<&CrossTab> {
        match self.get(key)? {
            BundleValue::CrossTab(table) => Some(table),
            _ => None,
        }
    }

    pub fn count(&self, key: &str) -> Option<u64> {
        match self.get(key)? {
            BundleValue::Count(n) => Some(*n),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matrix_symmetric_set() {
        let mut matrix = CorrelationMatrix::new(vec!["A".into(), "B".into()]);
        matrix.set_symmetric(0, 1, 0.5);
        assert_eq!(matrix.get_by_name("A", "B"), Some(0.5));
        assert_eq!(matrix.get_by_name("B", "A"), Some(0.5));
        assert!(matrix.get(0, 0).unwrap().is_nan());
        assert_eq!(matrix.get_by_name("A", "C"), None);
    }

    #[test]
    fn test_typed_accessors() {
        let mut bundle = ResultBundle::new();
        bundle.insert(keys::NUMERIC_COLS, BundleValue::Columns(vec!["Vendas".into()]));
        bundle.insert(
            keys::TOP_SELLERS,
            BundleValue::Ranking(vec![RankedEntry::new("Ana", 10.0)]),
        );
        bundle.insert(keys::ROW_COUNT, BundleValue::Count(3));

        assert_eq!(bundle.columns(keys::NUMERIC_COLS), Some(&["Vendas".to_string()][..]));
        assert_eq!(bundle.ranking(keys::TOP_SELLERS).map(|r| r.len()), Some(1));
        assert_eq!(bundle.count(keys::ROW_COUNT), Some(3));
        assert!(bundle.matrix(keys::NUMERIC_COLS).is_none());
        assert_eq!(
            bundle.keys().collect::<Vec<_>>(),
            vec!["numeric_cols", "row_count", "top_sellers"]
        );
    }

    #[test]
    fn test_serialized_shape() {
        let mut bundle = ResultBundle::new();
        bundle.insert(keys::DATETIME_COLS, BundleValue::Columns(vec!["Data".into()]));
        let json = serde_json::to_value(&bundle).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"datetime_cols": {"type": "columns", "value": ["Data"]}})
        );
    }

    #[test]
    fn test_crosstab_lookup() {
        let table = CrossTab {
            row_column: "Regiao".into(),
            column_column: "Canal".into(),
            row_labels: vec!["Norte".into(), "Sul".into()],
            column_labels: vec!["Loja".into(), "Web".into()],
            counts: vec![vec![1, 2], vec![3, 0]],
        };
        assert_eq!(table.count("Sul", "Loja"), 3);
        assert_eq!(table.count("Leste", "Loja"), 0);
        assert_eq!(table.total(), 6);
    }
}

//! Declarative chart plans derived from an analysis.
//!
//! [`ChartPlan::from_output`] reads the result bundle and describes which
//! charts are worth drawing; it does not draw anything. Rendering backends
//! consume the serialized [`ChartSpec`]s. Categorical views need the row
//! data, so their counts are filled in by [`ChartPlan::resolve`].

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::analyzers::{cross_tabulate, value_counts};
use crate::dataset::Dataset;
use crate::error::Result;
use crate::report::{keys, AnalysisOutput, CorrelationMatrix, CrossTab, RankedEntry};

/// Bins used for every histogram.
pub const HISTOGRAM_BINS: usize = 30;

/// Categories shown per count chart.
pub const CATEGORY_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Histogram,
    Bar,
    Pie,
    Scatter,
    Heatmap,
    Line,
    StackedBar,
}

/// Dashboard tab a chart belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartGroup {
    Univariate,
    Bivariate,
    Temporal,
    SalesHighlights,
}

impl ChartGroup {
    pub fn title(&self) -> &'static str {
        match self {
            ChartGroup::Univariate => "Análise Univariada",
            ChartGroup::Bivariate => "Análise Bivariada",
            ChartGroup::Temporal => "Análise Temporal",
            ChartGroup::SalesHighlights => "Destaques de Vendas",
        }
    }
}

/// What a chart plots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum ChartData {
    /// Raw values of one column.
    Column { column: String, bins: usize },
    /// Most frequent values of a categorical column. `counts` is `None` until resolved.
    CategoryCounts {
        column: String,
        limit: usize,
        counts: Option<Vec<RankedEntry>>,
    },
    /// Two numeric columns against each other.
    Pair { x: String, y: String },
    Matrix { matrix: CorrelationMatrix },
    /// A measure ordered by a temporal column.
    Series { time: String, value: String },
    Ranking { entries: Vec<RankedEntry> },
    /// Frequencies of two categorical columns. `table` is `None` until resolved.
    Composition {
        row: String,
        column: String,
        table: Option<CrossTab>,
    },
}

impl ChartData {
    /// Whether the data is complete without reading the dataset again.
    pub fn is_resolved(&self) -> bool {
        match self {
            ChartData::CategoryCounts { counts, .. } => counts.is_some(),
            ChartData::Composition { table, .. } => table.is_some(),
            _ => true,
        }
    }
}

/// One chart to draw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    /// Unique within a plan
    pub key: String,
    pub kind: ChartKind,
    pub group: ChartGroup,
    pub title: String,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    pub data: ChartData,
}

impl ChartSpec {
    fn new(
        key: impl Into<String>,
        kind: ChartKind,
        group: ChartGroup,
        title: impl Into<String>,
        data: ChartData,
    ) -> Self {
        Self {
            key: key.into(),
            kind,
            group,
            title: title.into(),
            x_label: None,
            y_label: None,
            data,
        }
    }

    fn with_labels(mut self, x: impl Into<String>, y: impl Into<String>) -> Self {
        self.x_label = Some(x.into());
        self.y_label = Some(y.into());
        self
    }
}

/// Ordered collection of charts for one analysis.
///
/// # Example
///
/// ```rust,no_run
/// use term_explore::charts::ChartPlan;
/// use term_explore::dataset::Dataset;
/// use term_explore::engine::InsightEngine;
///
/// # async fn example(dataset: Dataset) -> term_explore::Result<()> {
/// let output = InsightEngine::new().run(&dataset).await?;
/// let plan = ChartPlan::from_output(&output).resolve(&dataset).await?;
/// for chart in plan.charts() {
///     println!("{:?}: {}", chart.kind, chart.title);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartPlan {
    charts: Vec<ChartSpec>,
}

impl ChartPlan {
    /// Plans charts from the bundle alone. The output is not modified.
    pub fn from_output(output: &AnalysisOutput) -> Self {
        let bundle = &output.bundle;
        let numeric = bundle.columns(keys::NUMERIC_COLS).unwrap_or_default();
        let categorical = bundle.columns(keys::CATEGORICAL_COLS).unwrap_or_default();
        let temporal = bundle.columns(keys::DATETIME_COLS).unwrap_or_default();

        let mut charts = Vec::new();

        for column in numeric {
            charts.push(ChartSpec::new(
                format!("histogram:{column}"),
                ChartKind::Histogram,
                ChartGroup::Univariate,
                format!("Distribuição de {column}"),
                ChartData::Column {
                    column: column.clone(),
                    bins: HISTOGRAM_BINS,
                },
            ));
        }
        for column in categorical {
            charts.push(ChartSpec::new(
                format!("counts:{column}"),
                ChartKind::Bar,
                ChartGroup::Univariate,
                format!("Contagem em {column}"),
                ChartData::CategoryCounts {
                    column: column.clone(),
                    limit: CATEGORY_LIMIT,
                    counts: None,
                },
            ));
        }

        if let [x, y, ..] = numeric {
            charts.push(ChartSpec::new(
                "scatter",
                ChartKind::Scatter,
                ChartGroup::Bivariate,
                format!("{y} vs. {x}"),
                ChartData::Pair {
                    x: x.clone(),
                    y: y.clone(),
                },
            ));
        }
        if let Some(matrix) = bundle.matrix(keys::CORR_MATRIX) {
            charts.push(ChartSpec::new(
                keys::CORR_MATRIX,
                ChartKind::Heatmap,
                ChartGroup::Bivariate,
                "Mapa de Calor de Correlação",
                ChartData::Matrix {
                    matrix: matrix.clone(),
                },
            ));
        }
        if let [row, column, ..] = categorical {
            charts.push(ChartSpec::new(
                "composition",
                ChartKind::StackedBar,
                ChartGroup::Bivariate,
                format!("Composição de {row} por {column}"),
                ChartData::Composition {
                    row: row.clone(),
                    column: column.clone(),
                    table: bundle
                        .crosstab(keys::COMPOSITION)
                        .filter(|t| t.row_column == *row && t.column_column == *column)
                        .cloned(),
                },
            ));
        }

        if let (Some(time), Some(value)) = (temporal.first(), numeric.first()) {
            charts.push(
                ChartSpec::new(
                    "trend",
                    ChartKind::Line,
                    ChartGroup::Temporal,
                    format!("{value} ao longo do tempo"),
                    ChartData::Series {
                        time: time.clone(),
                        value: value.clone(),
                    },
                )
                .with_labels(time.clone(), value.clone()),
            );
        }

        for (key, title, x_label) in [
            (keys::TOP_SELLERS, "Vendedores por Vendas", "Vendedor"),
            (keys::TOP_PRODUCTS, "Produtos Mais Vendidos", "Produto"),
            (keys::BOTTOM_PRODUCTS, "Produtos Menos Vendidos", "Produto"),
        ] {
            if let Some(entries) = bundle.ranking(key) {
                let title = format!("Top {} {title}", entries.len());
                charts.push(
                    ranking_chart(key, title, entries).with_labels(x_label, "Total de Vendas"),
                );
            }
        }
        // Rankings from custom rules go last, under their own keys.
        for key in bundle.keys() {
            if matches!(key, keys::TOP_SELLERS | keys::TOP_PRODUCTS | keys::BOTTOM_PRODUCTS) {
                continue;
            }
            if let Some(entries) = bundle.ranking(key) {
                charts.push(ranking_chart(key, key.to_string(), entries));
            }
        }

        debug!(charts = charts.len(), "Planned charts");
        Self { charts }
    }

    /// Fills in category counts, and compositions the bundle lacked, from the dataset.
    #[instrument(skip(self, dataset), fields(charts = self.charts.len()))]
    pub async fn resolve(mut self, dataset: &Dataset) -> Result<Self> {
        for chart in &mut self.charts {
            match &mut chart.data {
                ChartData::CategoryCounts {
                    column,
                    limit,
                    counts,
                } if counts.is_none() => {
                    *counts = Some(value_counts(dataset, column, *limit).await?);
                }
                ChartData::Composition { row, column, table } if table.is_none() => {
                    *table = Some(cross_tabulate(dataset, row, column).await?);
                }
                _ => {}
            }
        }
        Ok(self)
    }

    /// Shows category counts as pie charts instead of bars.
    pub fn with_pie_counts(mut self) -> Self {
        for chart in &mut self.charts {
            if let ChartData::CategoryCounts { column, .. } = &chart.data {
                chart.kind = ChartKind::Pie;
                chart.title = format!("Distribuição em {column}");
            }
        }
        self
    }

    pub fn charts(&self) -> &[ChartSpec] {
        &self.charts
    }

    pub fn get(&self, key: &str) -> Option<&ChartSpec> {
        self.charts.iter().find(|c| c.key == key)
    }

    pub fn in_group(&self, group: ChartGroup) -> impl Iterator<Item = &ChartSpec> {
        self.charts.iter().filter(move |c| c.group == group)
    }

    pub fn is_resolved(&self) -> bool {
        self.charts.iter().all(|c| c.data.is_resolved())
    }

    pub fn len(&self) -> usize {
        self.charts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.charts.is_empty()
    }
}

fn ranking_chart(key: &str, title: String, entries: &[RankedEntry]) -> ChartSpec {
    ChartSpec::new(
        key,
        ChartKind::Bar,
        ChartGroup::SalesHighlights,
        title,
        ChartData::Ranking {
            entries: entries.to_vec(),
        },
    )
}

//! Column role inference.
//!
//! Every column of a dataset is assigned exactly one [`ColumnRole`]. The
//! assignment is driven by the Arrow type, with one refinement: text columns
//! whose values are all dates in a single layout are treated as temporal and
//! converted to timestamps by [`ColumnClassifier::prepare`].

use std::collections::HashMap;

use arrow::array::ArrayRef;
use arrow::datatypes::DataType;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use super::temporal::{is_temporal_type, is_text_type, parse_strict};
use crate::dataset::Dataset;
use crate::error::Result;

/// Role a column plays in the analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnRole {
    /// Integer, floating point or decimal measures.
    Numeric,
    /// Text, enumerations, booleans and anything unrecognised.
    Categorical,
    /// Dates and timestamps.
    Temporal,
}

impl ColumnRole {
    /// Classifies a column from its Arrow type alone.
    pub fn from_data_type(data_type: &DataType) -> Self {
        if is_temporal_type(data_type) {
            ColumnRole::Temporal
        } else if data_type.is_numeric() {
            ColumnRole::Numeric
        } else {
            ColumnRole::Categorical
        }
    }
}

/// The three disjoint, dataset-ordered column lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRoles {
    pub numeric: Vec<String>,
    pub categorical: Vec<String>,
    pub temporal: Vec<String>,
}

impl ColumnRoles {
    /// Returns the role assigned to a column.
    pub fn role_of(&self, column: &str) -> Option<ColumnRole> {
        if self.numeric.iter().any(|c| c == column) {
            Some(ColumnRole::Numeric)
        } else if self.categorical.iter().any(|c| c == column) {
            Some(ColumnRole::Categorical)
        } else if self.temporal.iter().any(|c| c == column) {
            Some(ColumnRole::Temporal)
        } else {
            None
        }
    }

    /// Columns carrying the given role, in dataset order.
    pub fn columns(&self, role: ColumnRole) -> &[String] {
        match role {
            ColumnRole::Numeric => &self.numeric,
            ColumnRole::Categorical => &self.categorical,
            ColumnRole::Temporal => &self.temporal,
        }
    }

    /// The temporal column that appears first in the dataset.
    pub fn first_temporal(&self) -> Option<&str> {
        self.temporal.first().map(String::as_str)
    }

    /// Total number of classified columns.
    pub fn len(&self) -> usize {
        self.numeric.len() + self.categorical.len() + self.temporal.len()
    }

    /// Whether no column was classified.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&mut self, role: ColumnRole, column: String) {
        match role {
            ColumnRole::Numeric => self.numeric.push(column),
            ColumnRole::Categorical => self.categorical.push(column),
            ColumnRole::Temporal => self.temporal.push(column),
        }
    }
}

/// Assigns roles to the columns of a dataset.
#[derive(Debug, Clone)]
pub struct ColumnClassifier {
    detect_text_temporals: bool,
}

impl Default for ColumnClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ColumnClassifier {
    /// Creates a classifier that also recognises dates stored as text.
    pub fn new() -> Self {
        Self {
            detect_text_temporals: true,
        }
    }

    /// Enables or disables promotion of text columns to temporal.
    pub fn detect_text_temporals(mut self, enable: bool) -> Self {
        self.detect_text_temporals = enable;
        self
    }

    /// Classifies every column. Never fails: columns that cannot be inspected
    /// fall back to their type-based role.
    #[instrument(skip(self, dataset), fields(columns = dataset.num_columns()))]
    pub fn classify(&self, dataset: &Dataset) -> ColumnRoles {
        self.inspect(dataset).0
    }

    /// Classifies every column and converts temporal text columns to timestamps.
    ///
    /// The returned dataset has the same columns in the same order.
    #[instrument(skip(self, dataset), fields(columns = dataset.num_columns()))]
    pub fn prepare(&self, dataset: &Dataset) -> Result<(Dataset, ColumnRoles)> {
        let (roles, converted) = self.inspect(dataset);

        let mut prepared = dataset.clone();
        for name in dataset.column_names() {
            if let Some(array) = converted.get(&name) {
                debug!(column = %name, "Coercing text column to timestamps");
                prepared = prepared.replace_column(&name, array.clone())?;
            }
        }

        Ok((prepared, roles))
    }

    fn inspect(&self, dataset: &Dataset) -> (ColumnRoles, HashMap<String, ArrayRef>) {
        let mut roles = ColumnRoles::default();
        let mut converted = HashMap::new();

        for field in dataset.schema().fields() {
            let name = field.name().to_string();
            let mut role = ColumnRole::from_data_type(field.data_type());

            if self.detect_text_temporals && is_text_type(field.data_type()) {
                match dataset.column(&name).map(|array| parse_strict(&array)) {
                    Ok(Ok(Some(timestamps))) => {
                        role = ColumnRole::Temporal;
                        converted.insert(name.clone(), timestamps);
                    }
                    Ok(Ok(None)) => {}
                    Ok(Err(e)) => warn!(column = %name, error = %e, "Temporal detection failed"),
                    Err(e) => warn!(column = %name, error = %e, "Could not read column"),
                }
            }

            roles.push(role, name);
        }

        debug!(
            numeric = roles.numeric.len(),
            categorical = roles.categorical.len(),
            temporal = roles.temporal.len(),
            "Classified columns"
        );
        (roles, converted)
    }
}

//! Temporal value detection and conversion.
//!
//! Text columns are only promoted to timestamps when every non-empty value
//! parses under one single format. Loaders that follow a coerce-on-error policy
//! use [`parse_lenient`] instead, which turns unparseable values into nulls.

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Int64Array, StringArray, TimestampNanosecondArray};
use arrow::datatypes::{DataType, TimeUnit};
use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

use super::errors::{AnalyzerError, AnalyzerResult};

// These regexes are compile-time constants and known to be valid
#[allow(clippy::expect_used)]
static ISO_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{1,2}-\d{1,2}$").expect("valid regex"));
#[allow(clippy::expect_used)]
static ISO_DATETIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{1,2}-\d{1,2}[T ]\d{1,2}:\d{2}(:\d{2}(\.\d+)?)?$").expect("valid regex")
});
#[allow(clippy::expect_used)]
static DAY_FIRST_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{1,2}/\d{1,2}/\d{4}$").expect("valid regex"));
#[allow(clippy::expect_used)]
static DAY_FIRST_DATETIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{1,2}/\d{1,2}/\d{4} \d{1,2}:\d{2}(:\d{2})?$").expect("valid regex")
});

/// Text layouts recognised as dates or timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemporalFormat {
    /// `2024-03-31`
    IsoDate,
    /// `2024-03-31 14:05:00` or `2024-03-31T14:05:00`
    IsoDateTime,
    /// `31/03/2024`
    DayFirstDate,
    /// `31/03/2024 14:05`
    DayFirstDateTime,
}

impl TemporalFormat {
    /// All formats, in detection order.
    pub const ALL: [TemporalFormat; 4] = [
        TemporalFormat::IsoDate,
        TemporalFormat::IsoDateTime,
        TemporalFormat::DayFirstDate,
        TemporalFormat::DayFirstDateTime,
    ];

    /// Human-readable layout name.
    pub fn layout(&self) -> &'static str {
        match self {
            TemporalFormat::IsoDate => "YYYY-MM-DD",
            TemporalFormat::IsoDateTime => "YYYY-MM-DD HH:MM:SS",
            TemporalFormat::DayFirstDate => "DD/MM/YYYY",
            TemporalFormat::DayFirstDateTime => "DD/MM/YYYY HH:MM:SS",
        }
    }

    fn pattern(&self) -> &'static Regex {
        match self {
            TemporalFormat::IsoDate => &*ISO_DATE,
            TemporalFormat::IsoDateTime => &*ISO_DATETIME,
            TemporalFormat::DayFirstDate => &*DAY_FIRST_DATE,
            TemporalFormat::DayFirstDateTime => &*DAY_FIRST_DATETIME,
        }
    }

    /// Parses a value into epoch nanoseconds (UTC, no timezone shift).
    pub fn parse(&self, value: &str) -> Option<i64> {
        let value = value.trim();
        if !self.pattern().is_match(value) {
            return None;
        }

        let datetime = match self {
            TemporalFormat::IsoDate => NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0)),
            TemporalFormat::IsoDateTime => {
                let normalized = value.replacen('T', " ", 1);
                parse_datetime(
                    &normalized,
                    &["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"],
                )
            }
            TemporalFormat::DayFirstDate => NaiveDate::parse_from_str(value, "%d/%m/%Y")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0)),
            TemporalFormat::DayFirstDateTime => {
                parse_datetime(value, &["%d/%m/%Y %H:%M:%S", "%d/%m/%Y %H:%M"])
            }
        }?;

        datetime.and_utc().timestamp_nanos_opt()
    }
}

fn parse_datetime(value: &str, layouts: &[&str]) -> Option<NaiveDateTime> {
    layouts
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(value, layout).ok())
}

/// Returns whether the Arrow type is natively temporal.
pub fn is_temporal_type(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Date32 | DataType::Date64 | DataType::Timestamp(_, _)
    )
}

/// Returns whether the Arrow type holds text.
pub fn is_text_type(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View
    )
}

/// Finds the single format under which every non-empty value parses.
///
/// Returns `None` when there are no non-empty values or when no format
/// accepts all of them.
pub fn detect_format<'a, I>(values: I) -> Option<TemporalFormat>
where
    I: IntoIterator<Item = &'a str>,
{
    let values: Vec<&str> = values
        .into_iter()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .collect();
    let first = values.first()?;

    TemporalFormat::ALL
        .iter()
        .copied()
        .filter(|format| format.parse(first).is_some())
        .find(|format| values.iter().all(|v| format.parse(v).is_some()))
}

/// Converts a text column to timestamps when it is unambiguously temporal.
pub fn parse_strict(array: &ArrayRef) -> AnalyzerResult<Option<ArrayRef>> {
    let strings = as_strings(array)?;
    let Some(format) = detect_format(strings.iter().flatten()) else {
        return Ok(None);
    };

    let parsed: TimestampNanosecondArray = strings
        .iter()
        .map(|value| value.and_then(|v| format.parse(v)))
        .collect();
    Ok(Some(Arc::new(parsed)))
}

/// Converts a text column to timestamps, turning unparseable values into nulls.
///
/// Returns `None` when not a single value parses.
pub fn parse_lenient(array: &ArrayRef) -> AnalyzerResult<Option<ArrayRef>> {
    let strings = as_strings(array)?;
    let parsed: TimestampNanosecondArray = strings
        .iter()
        .map(|value| {
            value.and_then(|v| TemporalFormat::ALL.iter().find_map(|format| format.parse(v)))
        })
        .collect();

    if parsed.null_count() == parsed.len() {
        return Ok(None);
    }
    Ok(Some(Arc::new(parsed)))
}

/// Reinterprets a temporal column as epoch nanoseconds.
pub fn to_epoch_nanos(array: &ArrayRef) -> AnalyzerResult<Vec<Option<i64>>> {
    if !is_temporal_type(array.data_type()) {
        return Err(AnalyzerError::invalid_data(format!(
            "expected a temporal column, found {}",
            array.data_type()
        )));
    }

    let timestamps = arrow::compute::cast(array, &DataType::Timestamp(TimeUnit::Nanosecond, None))?;
    let nanos = arrow::compute::cast(&timestamps, &DataType::Int64)?;
    let nanos = nanos
        .as_any()
        .downcast_ref::<Int64Array>()
        .ok_or_else(|| AnalyzerError::invalid_data("failed to read timestamps as integers"))?;
    Ok(nanos.iter().collect())
}

fn as_strings(array: &ArrayRef) -> AnalyzerResult<StringArray> {
    if !is_text_type(array.data_type()) {
        return Err(AnalyzerError::invalid_data(format!(
            "expected a text column, found {}",
            array.data_type()
        )));
    }
    let cast = arrow::compute::cast(array, &DataType::Utf8)?;
    cast.as_any()
        .downcast_ref::<StringArray>()
        .cloned()
        .ok_or_else(|| AnalyzerError::invalid_data("failed to read text column"))
}

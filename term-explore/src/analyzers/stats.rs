//! Descriptive statistics shared by the heuristics.

use serde::{Deserialize, Serialize};

/// Pearson correlation over the rows where both values are present and finite.
///
/// Returns `NaN` when fewer than two complete pairs exist or when either side
/// has zero variance.
pub fn pearson(xs: &[Option<f64>], ys: &[Option<f64>]) -> f64 {
    let pairs: Vec<(f64, f64)> = xs
        .iter()
        .zip(ys.iter())
        .filter_map(|(x, y)| match (x, y) {
            (Some(x), Some(y)) if x.is_finite() && y.is_finite() => Some((*x, *y)),
            _ => None,
        })
        .collect();

    if pairs.len() < 2 {
        return f64::NAN;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;

    let mut covariance = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        covariance += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return f64::NAN;
    }

    (covariance / (var_x * var_y).sqrt()).clamp(-1.0, 1.0)
}

/// Present, finite values sorted ascending.
pub fn sorted_finite(values: &[Option<f64>]) -> Vec<f64> {
    let mut sorted: Vec<f64> = values
        .iter()
        .flatten()
        .copied()
        .filter(|v| v.is_finite())
        .collect();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// Quantile of sorted values using linear interpolation between the two
/// nearest ranks (position `q * (n - 1)`).
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }

    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - position.floor();

    Some(sorted[lower] + fraction * (sorted[upper] - sorted[lower]))
}

/// Tukey fences computed from the inter-quartile range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IqrBounds {
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub lower: f64,
    pub upper: f64,
}

impl IqrBounds {
    /// Computes the fences for `values`, ignoring missing entries.
    pub fn compute(values: &[Option<f64>], multiplier: f64) -> Option<Self> {
        let sorted = sorted_finite(values);
        let q1 = quantile(&sorted, 0.25)?;
        let q3 = quantile(&sorted, 0.75)?;
        let iqr = q3 - q1;
        Some(Self {
            q1,
            q3,
            iqr,
            lower: q1 - multiplier * iqr,
            upper: q3 + multiplier * iqr,
        })
    }

    /// Whether a value lies strictly outside the fences.
    pub fn is_outlier(&self, value: f64) -> bool {
        value < self.lower || value > self.upper
    }

    /// Number of present values strictly outside the fences.
    pub fn count_outliers(&self, values: &[Option<f64>]) -> usize {
        values
            .iter()
            .flatten()
            .filter(|v| self.is_outlier(**v))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn some(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().copied().map(Some).collect()
    }

    #[test]
    fn test_pearson_perfect() {
        let a = some(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let b = some(&[2.0, 4.0, 6.0, 8.0, 10.0]);
        assert_eq!(pearson(&a, &b), 1.0);

        let c = some(&[10.0, 8.0, 6.0, 4.0, 2.0]);
        assert_eq!(pearson(&a, &c), -1.0);
    }

    #[test]
    fn test_pearson_skips_incomplete_pairs() {
        let a = vec![Some(1.0), None, Some(3.0), Some(4.0)];
        let b = vec![Some(1.0), Some(100.0), Some(3.0), None];
        // Only (1,1) and (3,3) are complete.
        assert_eq!(pearson(&a, &b), 1.0);
    }

    #[test]
    fn test_pearson_degenerate() {
        let constant = some(&[3.0, 3.0, 3.0]);
        let varying = some(&[1.0, 2.0, 3.0]);
        assert!(pearson(&constant, &varying).is_nan());
        assert!(pearson(&some(&[1.0]), &some(&[2.0])).is_nan());
    }

    #[test]
    fn test_quantile_linear_interpolation() {
        let sorted = vec![100.0, 110.0, 200.0, 300.0, 900.0];
        assert_eq!(quantile(&sorted, 0.25), Some(110.0));
        assert_eq!(quantile(&sorted, 0.75), Some(300.0));
        assert_eq!(quantile(&sorted, 0.5), Some(200.0));
        assert_eq!(quantile(&[1.0, 2.0], 0.25), Some(1.25));
        assert_eq!(quantile(&[], 0.5), None);
        assert_eq!(quantile(&sorted, 1.5), None);
    }

    #[test]
    fn test_iqr_bounds() {
        let values = some(&[100.0, 200.0, 300.0, 900.0, 110.0]);
        let bounds = IqrBounds::compute(&values, 1.5).unwrap();
        assert_eq!(bounds.q1, 110.0);
        assert_eq!(bounds.q3, 300.0);
        assert_eq!(bounds.iqr, 190.0);
        assert_eq!(bounds.upper, 585.0);
        assert_eq!(bounds.count_outliers(&values), 1);
        assert!(bounds.is_outlier(900.0));
        assert!(!bounds.is_outlier(585.0));
    }

    #[test]
    fn test_iqr_bounds_empty() {
        assert!(IqrBounds::compute(&[None, None], 1.5).is_none());
    }
}

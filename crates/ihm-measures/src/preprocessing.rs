//! Per-column statistics used to normalize heterogeneous features.
//!
//! Gower distance divides each numeric difference by the column range, so
//! the range is fitted once over the whole dataset and shared by every pair.

use ndarray::Array2;

use crate::data_handling::FeatureKind;

/// Per-column range (max - min).
#[derive(Clone, Debug)]
pub struct FeatureRanges {
    pub range: Vec<f64>,
}

impl FeatureRanges {
    /// Ranges below this are treated as constant columns.
    const MIN_RANGE: f64 = 1e-12;

    /// Scaled absolute difference for a numeric column, 0 for constant columns.
    #[inline]
    pub fn scaled_diff(&self, col: usize, a: f64, b: f64) -> f64 {
        let range = self.range[col];
        if range < Self::MIN_RANGE {
            0.0
        } else {
            (a - b).abs() / range
        }
    }
}

/// Fit `FeatureRanges` from an `Array2<f64>` where rows are samples and
/// columns are features. Categorical columns get a zero range; NaN cells are
/// skipped.
pub fn fit_ranges(x: &Array2<f64>, kinds: &[FeatureKind]) -> FeatureRanges {
    let ncols = x.ncols();
    let mut range = vec![0.0f64; ncols];

    for (c, column) in x.columns().into_iter().enumerate() {
        if kinds.get(c) == Some(&FeatureKind::Categorical) {
            continue;
        }
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for &v in column.iter().filter(|v| !v.is_nan()) {
            lo = lo.min(v);
            hi = hi.max(v);
        }
        if lo.is_finite() && hi.is_finite() {
            range[c] = hi - lo;
        }
    }

    FeatureRanges { range }
}

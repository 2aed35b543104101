use ndarray::{Array2, ArrayView1};
use rayon::prelude::*;

use crate::config::DistanceMetric;
use crate::data_handling::{Dataset, FeatureKind};
use crate::preprocessing::{fit_ranges, FeatureRanges};

/// Compute the dense N x N distance matrix for `dataset`.
///
/// The matrix is symmetric with a zero diagonal. Rows are computed on the
/// rayon pool.
pub fn pairwise_distances(dataset: &Dataset, metric: DistanceMetric) -> Array2<f64> {
    let n = dataset.n_instances();
    let ranges = fit_ranges(&dataset.x, &dataset.kinds);

    let rows: Vec<Vec<f64>> = (0..n)
        .into_par_iter()
        .map(|i| {
            let a = dataset.x.row(i);
            (0..n)
                .map(|j| {
                    if i == j {
                        0.0
                    } else {
                        distance(metric, a, dataset.x.row(j), &dataset.kinds, &ranges)
                    }
                })
                .collect()
        })
        .collect();

    let mut out = Array2::<f64>::zeros((n, n));
    for (i, row) in rows.into_iter().enumerate() {
        for (j, value) in row.into_iter().enumerate() {
            out[(i, j)] = value;
        }
    }
    out
}

fn distance(
    metric: DistanceMetric,
    a: ArrayView1<f64>,
    b: ArrayView1<f64>,
    kinds: &[FeatureKind],
    ranges: &FeatureRanges,
) -> f64 {
    match metric {
        DistanceMetric::Gower => gower(a, b, kinds, ranges),
        DistanceMetric::Euclidean => a
            .iter()
            .zip(b.iter())
            .map(|(x, y)| (x - y).powi(2))
            .sum::<f64>()
            .sqrt(),
        DistanceMetric::Manhattan => a.iter().zip(b.iter()).map(|(x, y)| (x - y).abs()).sum(),
        DistanceMetric::Chebyshev => a
            .iter()
            .zip(b.iter())
            .map(|(x, y)| (x - y).abs())
            .fold(0.0, f64::max),
    }
}

/// Gower distance: numeric attributes contribute their range-scaled absolute
/// difference, categorical attributes a 0/1 mismatch. Attributes missing
/// (NaN) on either side are left out of the average.
fn gower(
    a: ArrayView1<f64>,
    b: ArrayView1<f64>,
    kinds: &[FeatureKind],
    ranges: &FeatureRanges,
) -> f64 {
    let mut total = 0.0;
    let mut used = 0usize;
    for (col, (&x, &y)) in a.iter().zip(b.iter()).enumerate() {
        if x.is_nan() || y.is_nan() {
            continue;
        }
        total += match kinds[col] {
            FeatureKind::Numeric => ranges.scaled_diff(col, x, y),
            FeatureKind::Categorical => {
                if x == y {
                    0.0
                } else {
                    1.0
                }
            }
        };
        used += 1;
    }
    if used == 0 {
        0.0
    } else {
        total / used as f64
    }
}

/// Per-instance neighbor order, nearest first.
///
/// Rank 0 is always the instance itself at distance 0; ranks 1.. are the
/// other instances by non-decreasing distance, ties kept in row order.
#[derive(Debug, Clone)]
pub struct NeighborRanking {
    order: Vec<Vec<usize>>,
    distances: Vec<Vec<f64>>,
}

impl NeighborRanking {
    pub fn from_distances(d: &Array2<f64>) -> Self {
        let n = d.nrows();
        let (order, distances): (Vec<Vec<usize>>, Vec<Vec<f64>>) = (0..n)
            .into_par_iter()
            .map(|i| {
                let row = d.row(i);
                let mut others: Vec<usize> = (0..n).filter(|&j| j != i).collect();
                // stable: equal distances stay in row order
                others.sort_by(|&a, &b| row[a].total_cmp(&row[b]));

                let mut idx = Vec::with_capacity(n);
                idx.push(i);
                idx.extend(others);
                let dist = idx
                    .iter()
                    .map(|&j| if j == i { 0.0 } else { row[j] })
                    .collect();
                (idx, dist)
            })
            .unzip();

        NeighborRanking { order, distances }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Full ranking for `i`, starting with `i` itself.
    pub fn neighbors(&self, i: usize) -> &[usize] {
        &self.order[i]
    }

    /// Distances parallel to [`NeighborRanking::neighbors`].
    pub fn distances(&self, i: usize) -> &[f64] {
        &self.distances[i]
    }

    /// The `k` nearest other instances (ranks 1..=k).
    pub fn nearest(&self, i: usize, k: usize) -> &[usize] {
        let row = &self.order[i];
        let end = (k + 1).min(row.len());
        &row[1..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_gower_mixed_features() {
        let x = array![[0.0, 0.0], [10.0, 1.0], [5.0, 0.0]];
        let dataset = Dataset::with_kinds(
            x,
            vec![FeatureKind::Numeric, FeatureKind::Categorical],
            &["a", "b", "a"],
        )
        .unwrap();
        let d = pairwise_distances(&dataset, DistanceMetric::Gower);
        // (1.0 + 1.0) / 2
        assert!((d[(0, 1)] - 1.0).abs() < 1e-12);
        // (0.5 + 0.0) / 2
        assert!((d[(0, 2)] - 0.25).abs() < 1e-12);
        assert_eq!(d[(1, 0)], d[(0, 1)]);
        assert_eq!(d[(2, 2)], 0.0);
    }

    #[test]
    fn test_euclidean() {
        let x = array![[0.0, 0.0], [3.0, 4.0]];
        let dataset = Dataset::new(x, &[0, 1]).unwrap();
        let d = pairwise_distances(&dataset, DistanceMetric::Euclidean);
        assert!((d[(0, 1)] - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_ranking_self_first_and_stable_ties() {
        let d = array![
            [0.0, 1.0, 1.0, 0.5],
            [1.0, 0.0, 2.0, 2.0],
            [1.0, 2.0, 0.0, 3.0],
            [0.5, 2.0, 3.0, 0.0]
        ];
        let ranking = NeighborRanking::from_distances(&d);
        assert_eq!(ranking.neighbors(0), &[0, 3, 1, 2]);
        assert_eq!(ranking.distances(0), &[0.0, 0.5, 1.0, 1.0]);
        assert_eq!(ranking.nearest(0, 2), &[3, 1]);
        assert_eq!(ranking.nearest(1, 10), &[0, 2, 3]);
    }

    #[test]
    fn test_duplicate_rows_do_not_displace_self() {
        let d = array![[0.0, 0.0], [0.0, 0.0]];
        let ranking = NeighborRanking::from_distances(&d);
        assert_eq!(ranking.neighbors(1), &[1, 0]);
    }
}

use ndarray::Array1;

use crate::data_handling::Dataset;
use crate::error::{HardnessError, Result};
use crate::math::NeighborRanking;
use crate::measures::MeasureResult;
use crate::stats::{class_fractions, entropy};

/// Floor applied to the nearest-enemy distance in N2.
pub const MIN_EXTRA_DISTANCE: f64 = 1e-15;

/// kDN (entropy form).
///
/// Shannon entropy (base 2) of the label distribution among each instance's
/// `k` nearest other instances. 0 when all neighbors share one label, at most
/// `log2(n_classes)`.
pub fn kdn(dataset: &Dataset, ranking: &NeighborRanking, k: usize) -> Result<MeasureResult> {
    let n = dataset.n_instances();
    if k == 0 || k >= n {
        return Err(HardnessError::InvalidParameter(format!(
            "k must be in 1..{} for {} instances, got {}",
            n, n, k
        )));
    }

    let values = (0..n)
        .map(|i| {
            let neighbor_labels = ranking.nearest(i, k).iter().map(|&j| dataset.labels[j]);
            entropy(&class_fractions(neighbor_labels, dataset.n_classes()))
        })
        .collect::<Vec<f64>>();
    Ok(Array1::from(values))
}

/// N2 (bounded ratio form).
///
/// `ratio = intra / max(extra, 1e-15)` where intra is the distance to the
/// nearest same-label instance and extra the distance to the nearest enemy;
/// the value is `1 - 1 / (ratio + 1)`, in `[0, 1)`.
///
/// An instance that is the only member of its class has no intra-class
/// neighbor; its intra distance is taken as its largest distance to any
/// other instance.
pub fn n2(dataset: &Dataset, ranking: &NeighborRanking) -> MeasureResult {
    let mut isolated = 0usize;
    let values = (0..dataset.n_instances())
        .map(|i| {
            let own = dataset.labels[i];
            let neighbors = &ranking.neighbors(i)[1..];
            let distances = &ranking.distances(i)[1..];

            let nearest_with = |same: bool| {
                neighbors
                    .iter()
                    .zip(distances.iter())
                    .find(|(&j, _)| (dataset.labels[j] == own) == same)
                    .map(|(_, &d)| d)
            };

            let intra = nearest_with(true).unwrap_or_else(|| {
                isolated += 1;
                distances.last().copied().unwrap_or(0.0)
            });
            let extra = nearest_with(false).unwrap_or(0.0);

            let ratio = intra / extra.max(MIN_EXTRA_DISTANCE);
            1.0 - 1.0 / (ratio + 1.0)
        })
        .collect::<Vec<f64>>();

    if isolated > 0 {
        log::warn!(
            "N2: {} instance(s) have no other member of their class; used their farthest distance",
            isolated
        );
    }
    Array1::from(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DistanceMetric;
    use crate::math::pairwise_distances;
    use ndarray::array;

    fn ranking_for(dataset: &Dataset) -> NeighborRanking {
        NeighborRanking::from_distances(&pairwise_distances(dataset, DistanceMetric::Euclidean))
    }

    #[test]
    fn test_kdn_pure_and_mixed() {
        let x = array![[0.0], [1.0], [2.0], [10.0], [11.0], [12.0]];
        let dataset = Dataset::new(x, &["a", "a", "b", "b", "b", "b"]).unwrap();
        let ranking = ranking_for(&dataset);
        let values = kdn(&dataset, &ranking, 2).unwrap();
        // neighbors of 0 are 1 (a) and 2 (b)
        assert!((values[0] - 1.0).abs() < 1e-12);
        // neighbors of 4 are 3 and 5, both b
        assert_eq!(values[4], 0.0);
    }

    #[test]
    fn test_kdn_rejects_bad_k() {
        let x = array![[0.0], [1.0], [2.0]];
        let dataset = Dataset::new(x, &[0, 1, 1]).unwrap();
        let ranking = ranking_for(&dataset);
        assert!(kdn(&dataset, &ranking, 0).is_err());
        assert!(kdn(&dataset, &ranking, 3).is_err());
        assert!(kdn(&dataset, &ranking, 2).is_ok());
    }

    #[test]
    fn test_n2_ratio() {
        let x = array![[0.0], [1.0], [4.0], [5.0]];
        let dataset = Dataset::new(x, &[0, 0, 1, 1]).unwrap();
        let values = n2(&dataset, &ranking_for(&dataset));
        // instance 1: intra 1, extra 3 -> ratio 1/3 -> 0.25
        assert!((values[1] - 0.25).abs() < 1e-12);
        // instance 0: intra 1, extra 4 -> ratio 0.25 -> 0.2
        assert!((values[0] - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_n2_zero_enemy_distance_is_finite() {
        let x = array![[0.0], [0.0], [3.0]];
        let dataset = Dataset::new(x, &[0, 1, 0]).unwrap();
        let values = n2(&dataset, &ranking_for(&dataset));
        assert!(values.iter().all(|v| v.is_finite() && *v < 1.0));
        assert!(values[0] > 0.99);
    }

    #[test]
    fn test_n2_singleton_class() {
        let x = array![[0.0], [1.0], [2.0]];
        let dataset = Dataset::new(x, &[0, 0, 1]).unwrap();
        let values = n2(&dataset, &ranking_for(&dataset));
        // intra falls back to the farthest distance (2), extra is 1
        assert!((values[2] - (1.0 - 1.0 / 3.0)).abs() < 1e-12);
    }
}

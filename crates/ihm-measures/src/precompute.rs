//! Structures shared by the neighborhood and margin measures.
use std::time::Instant;

use ndarray::Array2;

use crate::config::HardnessConfig;
use crate::data_handling::Dataset;
use crate::error::Result;
use crate::math::{pairwise_distances, NeighborRanking};
use crate::models::{CalibratedClassifier, ProbabilisticClassifier};

/// Distance matrix, neighbor ranking and calibrated classifier for one
/// dataset. Built once and only read afterwards.
pub struct Precomputation {
    pub distances: Array2<f64>,
    pub ranking: NeighborRanking,
    pub classifier: CalibratedClassifier,
}

impl Precomputation {
    pub fn new(dataset: &Dataset, config: &HardnessConfig) -> Result<Self> {
        let start = Instant::now();
        let distances = pairwise_distances(dataset, config.metric);
        let ranking = NeighborRanking::from_distances(&distances);
        log::debug!(
            "{:?} distances and neighbor ranking for {} instances in {:.2?}",
            config.metric,
            dataset.n_instances(),
            start.elapsed()
        );

        let start = Instant::now();
        let mut classifier = CalibratedClassifier::new(
            config.classifier.clone(),
            config.calibration_folds,
            config.seed,
        );
        classifier.fit(&dataset.x, &dataset.labels, dataset.n_classes())?;
        log::debug!(
            "calibrated {:?} fit in {:.2?}",
            config.classifier,
            start.elapsed()
        );

        Ok(Precomputation {
            distances,
            ranking,
            classifier,
        })
    }
}

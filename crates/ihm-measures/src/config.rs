use std::path::Path;
use std::str::FromStr;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::{HardnessError, Result};

/// Central configuration for a hardness run.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct HardnessConfig {
    /// Neighborhood size for kDN.
    pub k: usize,
    pub metric: DistanceMetric,
    /// Base model wrapped by sigmoid calibration for CLD.
    pub classifier: ClassifierKind,
    pub calibration_folds: usize,
    pub dcp: TwoStageTreeParams,
    pub td_pruned: TwoStageTreeParams,
    pub td_unpruned: UnprunedTreeParams,
    pub grid: PruningGrid,
    pub seed: u64,
    /// Run leave-one-out folds on the rayon pool.
    pub parallel: bool,
    /// Raw measure request. Resolved by the registry; `null` means all.
    pub measures: Option<serde_json::Value>,
}

impl Default for HardnessConfig {
    fn default() -> Self {
        Self {
            k: 10,
            metric: DistanceMetric::default(),
            classifier: ClassifierKind::default(),
            calibration_folds: 3,
            dcp: TwoStageTreeParams::default(),
            td_pruned: TwoStageTreeParams::default(),
            td_unpruned: UnprunedTreeParams::default(),
            grid: PruningGrid::default(),
            seed: 0,
            parallel: true,
            measures: None,
        }
    }
}

impl HardnessConfig {
    /// Check parameter ranges that do not depend on the dataset.
    pub fn validate(&self) -> Result<()> {
        if self.k == 0 {
            return Err(HardnessError::InvalidParameter(
                "k must be at least 1".to_string(),
            ));
        }
        if self.calibration_folds < 2 {
            return Err(HardnessError::InvalidParameter(format!(
                "calibration_folds must be at least 2, got {}",
                self.calibration_folds
            )));
        }
        self.grid.validate()?;
        for alpha in [
            self.dcp.stage_one_alpha,
            self.dcp.stage_two_alpha,
            self.td_pruned.stage_one_alpha,
            self.td_pruned.stage_two_alpha,
            self.td_unpruned.stage_one_alpha,
        ]
        .into_iter()
        .flatten()
        {
            check_alpha(alpha)?;
        }
        if let ClassifierKind::DecisionTree { ccp_alpha } = self.classifier {
            check_alpha(ccp_alpha)?;
        }
        Ok(())
    }
}

fn check_alpha(alpha: f64) -> Result<()> {
    if !alpha.is_finite() || alpha < 0.0 {
        return Err(HardnessError::InvalidParameter(format!(
            "pruning strength must be a non-negative number, got {}",
            alpha
        )));
    }
    Ok(())
}

/// Load a configuration from a JSON file.
pub fn load_config<P: AsRef<Path>>(path: P) -> anyhow::Result<HardnessConfig> {
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config: {}", path.as_ref().display()))?;
    let config: HardnessConfig = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config: {}", path.as_ref().display()))?;
    Ok(config)
}

/// Metric used to build the pairwise distance matrix.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// Range-normalized numeric differences and categorical mismatches, averaged.
    #[default]
    Gower,
    Euclidean,
    Manhattan,
    Chebyshev,
}

impl FromStr for DistanceMetric {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gower" => Ok(DistanceMetric::Gower),
            "euclidean" => Ok(DistanceMetric::Euclidean),
            "manhattan" | "cityblock" => Ok(DistanceMetric::Manhattan),
            "chebyshev" => Ok(DistanceMetric::Chebyshev),
            _ => Err(format!(
                "Unknown distance metric: {}. Expected one of gower, euclidean, manhattan, chebyshev",
                s
            )),
        }
    }
}

/// Supported base classifiers and their hyper-parameters.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub enum ClassifierKind {
    GaussianNB { var_smoothing: f64 },
    DecisionTree { ccp_alpha: f64 },
}

impl Default for ClassifierKind {
    fn default() -> Self {
        ClassifierKind::GaussianNB {
            var_smoothing: 1e-9,
        }
    }
}

impl FromStr for ClassifierKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gnb" | "gaussian_nb" | "naive_bayes" => Ok(ClassifierKind::default()),
            "tree" | "decision_tree" => Ok(ClassifierKind::DecisionTree { ccp_alpha: 0.0 }),
            _ => Err(format!(
                "Unknown classifier: {}. Expected one of gaussian_nb, decision_tree",
                s
            )),
        }
    }
}

/// Pruning strengths for the two tree stages of a leave-one-out fold.
/// `None` means the strength is chosen by cross-validated grid search.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, Default, PartialEq)]
#[serde(default)]
pub struct TwoStageTreeParams {
    pub stage_one_alpha: Option<f64>,
    pub stage_two_alpha: Option<f64>,
}

/// TD_U grows its second-stage tree without pruning, so only the first
/// stage is configurable.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, Default, PartialEq)]
#[serde(default)]
pub struct UnprunedTreeParams {
    pub stage_one_alpha: Option<f64>,
}

/// Candidate pruning strengths evaluated by grid search.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PruningGrid {
    pub start: f64,
    pub stop: f64,
    pub steps: usize,
    pub cv_folds: usize,
}

impl Default for PruningGrid {
    fn default() -> Self {
        Self {
            start: 0.001,
            stop: 0.1,
            steps: 10,
            cv_folds: 5,
        }
    }
}

impl PruningGrid {
    pub fn validate(&self) -> Result<()> {
        check_alpha(self.start)?;
        check_alpha(self.stop)?;
        if self.stop < self.start {
            return Err(HardnessError::InvalidParameter(format!(
                "pruning grid stop ({}) is below start ({})",
                self.stop, self.start
            )));
        }
        if self.steps == 0 {
            return Err(HardnessError::InvalidParameter(
                "pruning grid needs at least one step".to_string(),
            ));
        }
        if self.cv_folds < 2 {
            return Err(HardnessError::InvalidParameter(format!(
                "grid search needs at least 2 folds, got {}",
                self.cv_folds
            )));
        }
        Ok(())
    }

    /// Evenly spaced values from `start` to `stop`, both inclusive.
    pub fn values(&self) -> Vec<f64> {
        if self.steps == 1 {
            return vec![self.start];
        }
        let step = (self.stop - self.start) / (self.steps - 1) as f64;
        (0..self.steps)
            .map(|i| self.start + step * i as f64)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_values_inclusive() {
        let grid = PruningGrid::default();
        let values = grid.values();
        assert_eq!(values.len(), 10);
        assert!((values[0] - 0.001).abs() < 1e-12);
        assert!((values[9] - 0.1).abs() < 1e-12);
        assert!((values[1] - 0.012).abs() < 1e-12);
    }

    #[test]
    fn test_metric_from_str() {
        assert_eq!("Gower".parse::<DistanceMetric>(), Ok(DistanceMetric::Gower));
        assert_eq!(
            "cityblock".parse::<DistanceMetric>(),
            Ok(DistanceMetric::Manhattan)
        );
        assert!("cosine".parse::<DistanceMetric>().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = HardnessConfig::default();
        assert!(config.validate().is_ok());

        config.k = 0;
        assert!(matches!(
            config.validate(),
            Err(HardnessError::InvalidParameter(_))
        ));

        let mut config = HardnessConfig::default();
        config.dcp.stage_two_alpha = Some(-0.5);
        assert!(config.validate().is_err());

        let mut config = HardnessConfig::default();
        config.grid.cv_folds = 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: HardnessConfig =
            serde_json::from_str(r#"{"k": 3, "metric": "euclidean"}"#).unwrap();
        assert_eq!(config.k, 3);
        assert_eq!(config.metric, DistanceMetric::Euclidean);
        assert_eq!(config.calibration_folds, 3);
        assert!(config.measures.is_none());
        assert!(config.dcp.stage_one_alpha.is_none());
    }
}

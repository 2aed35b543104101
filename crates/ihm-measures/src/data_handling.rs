//! Dataset container and label encoding.
//!
//! A `Dataset` owns the feature matrix (rows are instances), the kind of each
//! feature column, and the labels encoded as dense 0-based class positions.
//! Every structure derived from a dataset indexes instances by row, so row
//! order is never changed after construction.
use std::collections::BTreeMap;

use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{HardnessError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    Numeric,
    /// Values are category codes; only equality is meaningful.
    Categorical,
}

/// Maps arbitrary ordered labels to dense class positions `0..n_classes`.
#[derive(Debug, Clone)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    /// Fit on raw labels and return the encoder with the encoded labels.
    ///
    /// Classes are ordered by the natural ordering of `L`, so numeric labels
    /// such as `[3, 7, 7, 12]` become `[0, 1, 1, 2]`.
    pub fn fit<L>(labels: &[L]) -> (Self, Vec<usize>)
    where
        L: Ord + Clone + ToString,
    {
        let mut positions: BTreeMap<L, usize> = BTreeMap::new();
        for label in labels {
            positions.entry(label.clone()).or_insert(0);
        }
        for (position, value) in positions.values_mut().enumerate() {
            *value = position;
        }
        let classes = positions.keys().map(|label| label.to_string()).collect();
        let encoded = labels.iter().map(|label| positions[label]).collect();
        (LabelEncoder { classes }, encoded)
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }
}

#[derive(Debug, Clone)]
pub struct Dataset {
    pub x: Array2<f64>,
    pub kinds: Vec<FeatureKind>,
    pub feature_names: Vec<String>,
    /// Dense class position per instance.
    pub labels: Vec<usize>,
    /// Original label text, indexed by class position.
    pub classes: Vec<String>,
}

impl Dataset {
    /// Build a dataset from numeric features and raw labels.
    pub fn new<L>(x: Array2<f64>, labels: &[L]) -> Result<Self>
    where
        L: Ord + Clone + ToString,
    {
        let kinds = vec![FeatureKind::Numeric; x.ncols()];
        Self::with_kinds(x, kinds, labels)
    }

    /// Build a dataset with explicit feature kinds.
    pub fn with_kinds<L>(x: Array2<f64>, kinds: Vec<FeatureKind>, labels: &[L]) -> Result<Self>
    where
        L: Ord + Clone + ToString,
    {
        if x.nrows() == 0 || x.ncols() == 0 {
            return Err(HardnessError::EmptyDataset);
        }
        if x.nrows() != labels.len() {
            return Err(HardnessError::LengthMismatch {
                features: x.nrows(),
                labels: labels.len(),
            });
        }
        if kinds.len() != x.ncols() {
            return Err(HardnessError::InvalidParameter(format!(
                "{} feature kinds given for {} columns",
                kinds.len(),
                x.ncols()
            )));
        }

        let (encoder, encoded) = LabelEncoder::fit(labels);
        if encoder.n_classes() < 2 {
            return Err(HardnessError::TooFewClasses(encoder.n_classes()));
        }

        let feature_names = (0..x.ncols()).map(|i| format!("x{}", i)).collect();
        Ok(Dataset {
            x,
            kinds,
            feature_names,
            labels: encoded,
            classes: encoder.classes().to_vec(),
        })
    }

    pub fn with_feature_names(mut self, names: Vec<String>) -> Self {
        if names.len() == self.n_features() {
            self.feature_names = names;
        } else {
            log::warn!(
                "Ignoring {} feature names for {} columns",
                names.len(),
                self.n_features()
            );
        }
        self
    }

    pub fn n_instances(&self) -> usize {
        self.x.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.x.ncols()
    }

    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    /// Copy of this dataset with the encoded labels replaced. The class
    /// table is kept, so positions stay comparable across copies.
    pub fn with_labels(&self, labels: Vec<usize>) -> Dataset {
        debug_assert_eq!(labels.len(), self.n_instances());
        Dataset {
            x: self.x.clone(),
            kinds: self.kinds.clone(),
            feature_names: self.feature_names.clone(),
            labels,
            classes: self.classes.clone(),
        }
    }

    /// Subset of rows, in the order given.
    pub fn select_rows(&self, indices: &[usize]) -> (Array2<f64>, Vec<usize>) {
        let x = self.x.select(Axis(0), indices);
        let y = indices.iter().map(|&i| self.labels[i]).collect();
        (x, y)
    }

    /// All rows except `excluded`.
    pub fn without_row(&self, excluded: usize) -> (Array2<f64>, Vec<usize>) {
        let keep: Vec<usize> = (0..self.n_instances()).filter(|&i| i != excluded).collect();
        self.select_rows(&keep)
    }

    pub fn class_counts(&self) -> Vec<usize> {
        let mut counts = vec![0usize; self.n_classes()];
        for &label in &self.labels {
            counts[label] += 1;
        }
        counts
    }

    pub fn log_input_data_summary(&self) {
        log::info!(
            "{} instances, {} features ({} categorical), {} classes",
            self.n_instances(),
            self.n_features(),
            self.kinds
                .iter()
                .filter(|&&k| k == FeatureKind::Categorical)
                .count(),
            self.n_classes()
        );
        for (class, count) in self.classes.iter().zip(self.class_counts()) {
            log::debug!("class '{}': {} instances", class, count);
        }
    }
}

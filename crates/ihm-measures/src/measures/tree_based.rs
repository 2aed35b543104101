//! Tree-based measures built on a two-stage leave-one-out protocol.
//!
//! For each instance `i`:
//!
//! 1. fit a pruned tree on every instance except `i` and predict `i`;
//! 2. copy the labels, replace `i`'s label by that prediction and fit a
//!    second tree on the full feature matrix with the copied labels;
//! 3. evaluate the second tree on `i` only, then drop both trees.
//!
//! Folds share nothing mutable, so they may run on the rayon pool; results
//! are collected in instance order either way.
use ndarray::{Array1, Axis};
use rayon::prelude::*;

use crate::config::{PruningGrid, TwoStageTreeParams, UnprunedTreeParams};
use crate::data_handling::Dataset;
use crate::error::Result;
use crate::execution::{check_cancelled, CancelToken};
use crate::measures::MeasureResult;
use crate::models::grid_search::resolve_ccp_alpha;
use crate::models::{DecisionTree, ProbabilisticClassifier};
use crate::stats::{class_fractions, entropy};

#[derive(Debug, Clone, Copy)]
enum StageTwo {
    /// Fixed strength, or grid search when `None`.
    Pruned(Option<f64>),
    Unpruned,
}

pub struct LeaveOneOut<'a> {
    dataset: &'a Dataset,
    grid: &'a PruningGrid,
    seed: u64,
    parallel: bool,
    cancel: Option<&'a CancelToken>,
}

impl<'a> LeaveOneOut<'a> {
    pub fn new(dataset: &'a Dataset, grid: &'a PruningGrid, seed: u64) -> Self {
        LeaveOneOut {
            dataset,
            grid,
            seed,
            parallel: true,
            cancel: None,
        }
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_cancel(mut self, cancel: &'a CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// DCP (entropy form): entropy of the original labels of the instances
    /// sharing `i`'s leaf in the fold's second-stage tree.
    pub fn dcp(&self, params: &TwoStageTreeParams) -> Result<MeasureResult> {
        let n_classes = self.dataset.n_classes();
        let stage_two = StageTwo::Pruned(params.stage_two_alpha);
        self.map_instances(|i| {
            let tree = self.fold(i, params.stage_one_alpha, stage_two)?;
            let leaves = tree.leaf_id(&self.dataset.x);
            Ok(leaf_entropy(&leaves, i, &self.dataset.labels, n_classes))
        })
    }

    /// TD_P: depth of `i`'s leaf over the depth of a pruned second-stage tree.
    pub fn td_pruned(&self, params: &TwoStageTreeParams) -> Result<MeasureResult> {
        let stage_two = StageTwo::Pruned(params.stage_two_alpha);
        self.map_instances(|i| {
            let tree = self.fold(i, params.stage_one_alpha, stage_two)?;
            Ok(self.relative_depth(&tree, i))
        })
    }

    /// TD_U: as TD_P with an unpruned second-stage tree.
    pub fn td_unpruned(&self, params: &UnprunedTreeParams) -> Result<MeasureResult> {
        self.map_instances(|i| {
            let tree = self.fold(i, params.stage_one_alpha, StageTwo::Unpruned)?;
            Ok(self.relative_depth(&tree, i))
        })
    }

    /// Path length of `i` divided by the tree depth; 0 for a single-leaf tree.
    fn relative_depth(&self, tree: &DecisionTree, i: usize) -> f64 {
        let depth = tree.depth();
        if depth == 0 {
            return 0.0;
        }
        let row = self.dataset.x.select(Axis(0), &[i]);
        tree.decision_path_length(&row)[0] as f64 / depth as f64
    }

    /// Run both stages for instance `i` and return the second-stage tree.
    fn fold(&self, i: usize, stage_one: Option<f64>, stage_two: StageTwo) -> Result<DecisionTree> {
        check_cancelled(self.cancel)?;
        let n_classes = self.dataset.n_classes();

        let (x_rest, y_rest) = self.dataset.without_row(i);
        let alpha_one = resolve_ccp_alpha(
            stage_one,
            &x_rest,
            &y_rest,
            n_classes,
            self.grid,
            self.seed,
            self.cancel,
        )?;
        let mut first = DecisionTree::new(alpha_one);
        first.fit(&x_rest, &y_rest, n_classes)?;
        let predicted = first.predict(&self.dataset.x.select(Axis(0), &[i]))[0];

        let mut augmented = self.dataset.labels.clone();
        augmented[i] = predicted;

        let alpha_two = match stage_two {
            StageTwo::Pruned(fixed) => resolve_ccp_alpha(
                fixed,
                &self.dataset.x,
                &augmented,
                n_classes,
                self.grid,
                self.seed,
                self.cancel,
            )?,
            StageTwo::Unpruned => 0.0,
        };
        let mut second = DecisionTree::new(alpha_two);
        second.fit(&self.dataset.x, &augmented, n_classes)?;

        log::trace!(
            "fold {}: label {} -> {}, alphas ({:.4}, {:.4}), depth {}",
            i,
            self.dataset.labels[i],
            predicted,
            alpha_one,
            alpha_two,
            second.depth()
        );
        Ok(second)
    }

    fn map_instances<F>(&self, per_instance: F) -> Result<MeasureResult>
    where
        F: Fn(usize) -> Result<f64> + Send + Sync,
    {
        let n = self.dataset.n_instances();
        let values: Vec<f64> = if self.parallel {
            (0..n).into_par_iter().map(&per_instance).collect::<Result<_>>()?
        } else {
            (0..n).map(&per_instance).collect::<Result<_>>()?
        };
        Ok(Array1::from(values))
    }
}

/// Entropy of `labels` over the instances whose leaf matches `i`'s.
///
/// The leaf always holds `i` itself, so a leaf of one yields fraction 1
/// for `i`'s label and entropy 0.
fn leaf_entropy(leaves: &[usize], i: usize, labels: &[usize], n_classes: usize) -> f64 {
    let members = (0..leaves.len())
        .filter(|&j| leaves[j] == leaves[i])
        .map(|j| labels[j]);
    entropy(&class_fractions(members, n_classes))
}

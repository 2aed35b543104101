//! Cross-validated selection of the tree pruning strength.
use ndarray::{Array2, Axis};

use crate::config::PruningGrid;
use crate::error::Result;
use crate::execution::{check_cancelled, CancelToken};
use crate::model_selection::{KFold, StratifiedKFold};
use crate::models::classifier_trait::ProbabilisticClassifier;
use crate::models::tree::DecisionTree;

/// Pick the pruning strength from `grid` with the lowest mean validation
/// error. Ties go to the smallest strength.
///
/// Each fold grows one unpruned tree and evaluates every candidate by
/// pruning a copy of it.
pub fn select_ccp_alpha(
    x: &Array2<f64>,
    y: &[usize],
    n_classes: usize,
    grid: &PruningGrid,
    seed: u64,
    cancel: Option<&CancelToken>,
) -> Result<f64> {
    grid.validate()?;
    let candidates = grid.values();
    if candidates.len() == 1 || y.len() < 2 {
        return Ok(candidates[0]);
    }

    let mut folds = StratifiedKFold::new(grid.cv_folds)
        .with_random_state(seed)
        .split(y, n_classes)?;
    if folds.len() < 2 {
        folds = KFold::new(grid.cv_folds)
            .with_random_state(seed)
            .split(y.len())?;
    }

    let mut error_rates = vec![0.0f64; candidates.len()];
    for (train, test) in &folds {
        check_cancelled(cancel)?;

        let train_y: Vec<usize> = train.iter().map(|&i| y[i]).collect();
        let test_x = x.select(Axis(0), test);
        let mut full = DecisionTree::unpruned();
        full.fit(&x.select(Axis(0), train), &train_y, n_classes)?;

        for (k, &alpha) in candidates.iter().enumerate() {
            let predictions = full.pruned(alpha).predict(&test_x);
            let wrong = predictions
                .iter()
                .zip(test.iter())
                .filter(|(&p, &i)| p != y[i])
                .count();
            error_rates[k] += wrong as f64 / test.len() as f64;
        }
    }

    let mut best = 0;
    for k in 1..candidates.len() {
        if error_rates[k] < error_rates[best] {
            best = k;
        }
    }
    log::trace!(
        "grid search picked ccp_alpha={:.4} (mean error {:.4})",
        candidates[best],
        error_rates[best] / folds.len() as f64
    );
    Ok(candidates[best])
}

/// Use `fixed` when given, otherwise search the grid.
pub fn resolve_ccp_alpha(
    fixed: Option<f64>,
    x: &Array2<f64>,
    y: &[usize],
    n_classes: usize,
    grid: &PruningGrid,
    seed: u64,
    cancel: Option<&CancelToken>,
) -> Result<f64> {
    match fixed {
        Some(alpha) => Ok(alpha),
        None => select_ccp_alpha(x, y, n_classes, grid, seed, cancel),
    }
}

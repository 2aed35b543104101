//! Sigmoid (Platt) probability calibration.
//!
//! The calibration map is fit once on out-of-fold predictions from
//! stratified cross-validation. The base model is then refit on all data and
//! the single map is applied to it; the fold models are discarded rather
//! than ensembled.
use ndarray::{Array2, Axis};
use statrs::function::logistic::logistic;

use crate::config::ClassifierKind;
use crate::error::Result;
use crate::model_selection::{KFold, StratifiedKFold};
use crate::models::classifier_trait::ProbabilisticClassifier;
use crate::models::factory::build_classifier;

/// `p = 1 / (1 + exp(a * f + b))` fit by Newton's method with backtracking
/// on the smoothed-target cross entropy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SigmoidCalibrator {
    a: f64,
    b: f64,
}

impl SigmoidCalibrator {
    const MAX_ITER: usize = 100;
    const MIN_STEP: f64 = 1e-10;
    const SIGMA: f64 = 1e-12;
    const EPS: f64 = 1e-5;

    pub fn fit(scores: &[f64], positive: &[bool]) -> Self {
        let prior1 = positive.iter().filter(|&&p| p).count() as f64;
        let prior0 = positive.len() as f64 - prior1;
        let hi_target = (prior1 + 1.0) / (prior1 + 2.0);
        let lo_target = 1.0 / (prior0 + 2.0);
        let targets: Vec<f64> = positive
            .iter()
            .map(|&p| if p { hi_target } else { lo_target })
            .collect();

        let objective = |a: f64, b: f64| -> f64 {
            scores
                .iter()
                .zip(targets.iter())
                .map(|(&f, &t)| {
                    let fapb = f * a + b;
                    if fapb >= 0.0 {
                        t * fapb + (-fapb).exp().ln_1p()
                    } else {
                        (t - 1.0) * fapb + fapb.exp().ln_1p()
                    }
                })
                .sum()
        };

        let mut a = 0.0;
        let mut b = ((prior0 + 1.0) / (prior1 + 1.0)).ln();
        let mut fval = objective(a, b);

        for _ in 0..Self::MAX_ITER {
            let (mut h11, mut h22, mut h21) = (Self::SIGMA, Self::SIGMA, 0.0);
            let (mut g1, mut g2) = (0.0, 0.0);
            for (&f, &t) in scores.iter().zip(targets.iter()) {
                let fapb = f * a + b;
                // p = P(positive), q = 1 - p, computed without overflow
                let (p, q) = if fapb >= 0.0 {
                    let e = (-fapb).exp();
                    (e / (1.0 + e), 1.0 / (1.0 + e))
                } else {
                    let e = fapb.exp();
                    (1.0 / (1.0 + e), e / (1.0 + e))
                };
                let d2 = p * q;
                h11 += f * f * d2;
                h22 += d2;
                h21 += f * d2;
                let d1 = t - p;
                g1 += f * d1;
                g2 += d1;
            }
            if g1.abs() < Self::EPS && g2.abs() < Self::EPS {
                break;
            }

            let det = h11 * h22 - h21 * h21;
            let da = -(h22 * g1 - h21 * g2) / det;
            let db = -(-h21 * g1 + h11 * g2) / det;
            let gd = g1 * da + g2 * db;

            let mut step = 1.0;
            while step >= Self::MIN_STEP {
                let new_a = a + step * da;
                let new_b = b + step * db;
                let new_f = objective(new_a, new_b);
                if new_f < fval + 1e-4 * step * gd {
                    a = new_a;
                    b = new_b;
                    fval = new_f;
                    break;
                }
                step /= 2.0;
            }
            if step < Self::MIN_STEP {
                log::debug!("sigmoid calibration line search stalled at a={}, b={}", a, b);
                break;
            }
        }

        SigmoidCalibrator { a, b }
    }

    pub fn predict(&self, score: f64) -> f64 {
        logistic(-(self.a * score + self.b))
    }

    pub fn params(&self) -> (f64, f64) {
        (self.a, self.b)
    }
}

/// A base classifier whose probabilities are corrected by per-class sigmoid
/// maps (one-vs-rest; binary problems use the positive class only).
pub struct CalibratedClassifier {
    kind: ClassifierKind,
    cv: usize,
    seed: u64,
    n_classes: usize,
    base: Option<Box<dyn ProbabilisticClassifier>>,
    calibrators: Vec<SigmoidCalibrator>,
}

impl CalibratedClassifier {
    pub fn new(kind: ClassifierKind, cv: usize, seed: u64) -> Self {
        CalibratedClassifier {
            kind,
            cv,
            seed,
            n_classes: 0,
            base: None,
            calibrators: Vec::new(),
        }
    }

    fn folds(&self, y: &[usize], n_classes: usize) -> Result<Vec<(Vec<usize>, Vec<usize>)>> {
        let folds = StratifiedKFold::new(self.cv)
            .with_random_state(self.seed)
            .split(y, n_classes)?;
        if folds.len() >= 2 {
            return Ok(folds);
        }
        log::warn!("Too few samples per class for stratified calibration, using plain folds");
        KFold::new(self.cv)
            .with_random_state(self.seed)
            .split(y.len())
    }
}

impl ProbabilisticClassifier for CalibratedClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &[usize], n_classes: usize) -> Result<()> {
        let mut out_of_fold = Array2::<f64>::zeros((x.nrows(), n_classes));
        for (fold, (train, test)) in self.folds(y, n_classes)?.into_iter().enumerate() {
            log::trace!(
                "calibration fold {}: {} train, {} held out",
                fold,
                train.len(),
                test.len()
            );
            let mut model = build_classifier(&self.kind);
            let train_y: Vec<usize> = train.iter().map(|&i| y[i]).collect();
            model.fit(&x.select(Axis(0), &train), &train_y, n_classes)?;
            let proba = model.predict_proba(&x.select(Axis(0), &test));
            for (row, &i) in test.iter().enumerate() {
                out_of_fold.row_mut(i).assign(&proba.row(row));
            }
        }

        let calibrated_classes: Vec<usize> = if n_classes == 2 {
            vec![1]
        } else {
            (0..n_classes).collect()
        };
        self.calibrators = calibrated_classes
            .into_iter()
            .map(|c| {
                let scores = out_of_fold.column(c).to_vec();
                let positive: Vec<bool> = y.iter().map(|&label| label == c).collect();
                SigmoidCalibrator::fit(&scores, &positive)
            })
            .collect();

        let mut base = build_classifier(&self.kind);
        base.fit(x, y, n_classes)?;
        self.base = Some(base);
        self.n_classes = n_classes;
        Ok(())
    }

    /// Calibrated probabilities. Before `fit` this returns a uniform
    /// distribution.
    fn predict_proba(&self, x: &Array2<f64>) -> Array2<f64> {
        let Some(base) = self.base.as_ref() else {
            let n_classes = self.n_classes.max(1);
            return Array2::from_elem((x.nrows(), n_classes), 1.0 / n_classes as f64);
        };
        let raw = base.predict_proba(x);
        let mut out = Array2::<f64>::zeros(raw.raw_dim());

        if self.n_classes == 2 {
            for r in 0..raw.nrows() {
                let p = self.calibrators[0].predict(raw[(r, 1)]);
                out[(r, 0)] = 1.0 - p;
                out[(r, 1)] = p;
            }
            return out;
        }

        for r in 0..raw.nrows() {
            for (c, calibrator) in self.calibrators.iter().enumerate() {
                out[(r, c)] = calibrator.predict(raw[(r, c)]);
            }
            let total: f64 = out.row(r).sum();
            if total > 0.0 {
                out.row_mut(r).mapv_inplace(|p| p / total);
            } else {
                out.row_mut(r).fill(1.0 / self.n_classes as f64);
            }
        }
        out
    }

    fn name(&self) -> &str {
        "calibrated_classifier"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_sigmoid_is_monotone_in_score() {
        let scores = [0.1, 0.2, 0.3, 0.6, 0.8, 0.9, 0.4, 0.7];
        let positive = [false, false, false, true, true, true, false, true];
        let calibrator = SigmoidCalibrator::fit(&scores, &positive);
        let (a, _) = calibrator.params();
        assert!(a < 0.0);
        assert!(calibrator.predict(0.9) > calibrator.predict(0.1));
        assert!(calibrator.predict(0.9) < 1.0);
    }

    #[test]
    fn test_calibrated_rows_sum_to_one() {
        let x = array![
            [0.0], [0.3], [0.6], [0.9], [1.2], [1.5],
            [5.0], [5.3], [5.6], [5.9], [6.2], [6.5],
            [10.0], [10.3], [10.6], [10.9], [11.2], [11.5]
        ];
        let y: Vec<usize> = (0..18).map(|i| i / 6).collect();
        let mut model = CalibratedClassifier::new(ClassifierKind::default(), 3, 0);
        model.fit(&x, &y, 3).unwrap();
        let proba = model.predict_proba(&x);
        assert_eq!(proba.dim(), (18, 3));
        for (r, row) in proba.rows().into_iter().enumerate() {
            assert!((row.sum() - 1.0).abs() < 1e-9);
            assert_eq!(crate::stats::argmax(&row.to_vec()), y[r]);
        }
    }

    #[test]
    fn test_binary_calibration_is_deterministic() {
        let x = array![[0.0], [0.5], [1.0], [1.5], [4.0], [4.5], [5.0], [5.5]];
        let y = vec![0, 0, 0, 0, 1, 1, 1, 1];
        let fit = || {
            let mut model = CalibratedClassifier::new(ClassifierKind::default(), 3, 11);
            model.fit(&x, &y, 2).unwrap();
            model.predict_proba(&x)
        };
        assert_eq!(fit(), fit());
    }

    #[test]
    fn test_singleton_class_falls_back_to_plain_folds() {
        let x = array![[0.0], [0.4], [0.8], [1.2], [1.6], [6.0]];
        let y = vec![0, 0, 0, 0, 0, 1];
        let model = CalibratedClassifier::new(ClassifierKind::default(), 3, 5);
        let folds = model.folds(&y, 2).unwrap();
        assert_eq!(folds.len(), 3);

        let mut model = CalibratedClassifier::new(ClassifierKind::default(), 3, 5);
        model.fit(&x, &y, 2).unwrap();
        for row in model.predict_proba(&x).rows() {
            assert!((row.sum() - 1.0).abs() < 1e-9);
        }
    }
}

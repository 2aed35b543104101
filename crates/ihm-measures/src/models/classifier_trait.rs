use ndarray::Array2;

use crate::error::Result;
use crate::stats::argmax;

/// Contract for the probabilistic models used by the measures.
///
/// Labels are dense class positions (`0..n_classes`). `n_classes` is passed
/// explicitly because a training subset may not contain every class, and
/// `predict_proba` must still return one column per class.
pub trait ProbabilisticClassifier: Send + Sync {
    fn fit(&mut self, x: &Array2<f64>, y: &[usize], n_classes: usize) -> Result<()>;

    /// One row per sample, one column per class; each row sums to 1.
    fn predict_proba(&self, x: &Array2<f64>) -> Array2<f64>;

    /// Most probable class per sample.
    fn predict(&self, x: &Array2<f64>) -> Vec<usize> {
        let proba = self.predict_proba(x);
        proba
            .rows()
            .into_iter()
            .map(|row| argmax(&row.to_vec()))
            .collect()
    }

    fn name(&self) -> &str {
        "classifier"
    }
}

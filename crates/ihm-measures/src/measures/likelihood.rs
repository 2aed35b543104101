use ndarray::Array1;

use crate::data_handling::Dataset;
use crate::measures::MeasureResult;
use crate::models::ProbabilisticClassifier;
use crate::stats::top_two;

/// CLD (top-two margin form).
///
/// `(1 - (p1 - p2)) / 2` where `p1`, `p2` are the two largest predicted
/// probabilities for the instance, whichever classes they belong to. The
/// true label is not consulted. Range `[0, 0.5]`.
pub fn cld(dataset: &Dataset, classifier: &dyn ProbabilisticClassifier) -> MeasureResult {
    let proba = classifier.predict_proba(&dataset.x);
    let values: Vec<f64> = proba
        .rows()
        .into_iter()
        .map(|row| {
            let (first, second) = top_two(&row.to_vec());
            (1.0 - (first - second)) / 2.0
        })
        .collect();
    Array1::from(values)
}

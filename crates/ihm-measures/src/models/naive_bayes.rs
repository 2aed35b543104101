use ndarray::{Array1, Array2, Axis};
use statrs::statistics::Statistics;

use crate::error::{HardnessError, Result};
use crate::models::classifier_trait::ProbabilisticClassifier;

/// Gaussian naive Bayes.
///
/// Each class gets a per-feature normal distribution; variances are
/// smoothed by `var_smoothing` times the largest feature variance so that
/// constant features within a class do not collapse the likelihood.
#[derive(Debug, Clone)]
pub struct GaussianNB {
    var_smoothing: f64,
    n_classes: usize,
    log_priors: Vec<f64>,
    means: Array2<f64>,
    variances: Array2<f64>,
}

impl GaussianNB {
    pub fn new(var_smoothing: f64) -> Self {
        GaussianNB {
            var_smoothing,
            n_classes: 0,
            log_priors: Vec::new(),
            means: Array2::zeros((0, 0)),
            variances: Array2::zeros((0, 0)),
        }
    }

    fn joint_log_likelihood(&self, row: ndarray::ArrayView1<f64>) -> Vec<f64> {
        (0..self.n_classes)
            .map(|c| {
                let prior = self.log_priors[c];
                if prior == f64::NEG_INFINITY {
                    return prior;
                }
                let mut ll = prior;
                for (f, &v) in row.iter().enumerate() {
                    let var = self.variances[(c, f)];
                    let diff = v - self.means[(c, f)];
                    ll -= 0.5 * (2.0 * std::f64::consts::PI * var).ln();
                    ll -= 0.5 * diff * diff / var;
                }
                ll
            })
            .collect()
    }
}

impl Default for GaussianNB {
    fn default() -> Self {
        Self::new(1e-9)
    }
}

impl ProbabilisticClassifier for GaussianNB {
    fn fit(&mut self, x: &Array2<f64>, y: &[usize], n_classes: usize) -> Result<()> {
        if x.nrows() == 0 || x.ncols() == 0 {
            return Err(HardnessError::EmptyDataset);
        }
        if x.nrows() != y.len() {
            return Err(HardnessError::LengthMismatch {
                features: x.nrows(),
                labels: y.len(),
            });
        }

        let n_features = x.ncols();
        let max_var = x
            .columns()
            .into_iter()
            .map(|col| col.iter().population_variance())
            .filter(|v| v.is_finite())
            .fold(0.0, f64::max);
        let epsilon = if max_var > 0.0 {
            self.var_smoothing * max_var
        } else {
            self.var_smoothing
        };

        let mut means = Array2::<f64>::zeros((n_classes, n_features));
        let mut variances = Array2::<f64>::from_elem((n_classes, n_features), 1.0);
        let mut log_priors = vec![f64::NEG_INFINITY; n_classes];

        for c in 0..n_classes {
            let members: Vec<usize> = (0..y.len()).filter(|&i| y[i] == c).collect();
            if members.is_empty() {
                continue;
            }
            let rows = x.select(Axis(0), &members);
            for f in 0..n_features {
                let column: Vec<f64> = rows.column(f).to_vec();
                means[(c, f)] = column.iter().mean();
                variances[(c, f)] = column.iter().population_variance() + epsilon;
            }
            log_priors[c] = (members.len() as f64 / y.len() as f64).ln();
        }

        self.n_classes = n_classes;
        self.log_priors = log_priors;
        self.means = means;
        self.variances = variances;
        Ok(())
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Array2<f64> {
        let mut out = Array2::<f64>::zeros((x.nrows(), self.n_classes));
        for (r, row) in x.rows().into_iter().enumerate() {
            let jll = Array1::from(self.joint_log_likelihood(row));
            let max = jll.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            let exp = jll.mapv(|v| (v - max).exp());
            let total = exp.sum();
            for c in 0..self.n_classes {
                out[(r, c)] = exp[c] / total;
            }
        }
        out
    }

    fn name(&self) -> &str {
        "gaussian_nb"
    }
}

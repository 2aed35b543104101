//! Small numeric reductions shared by the measures.

/// Shannon entropy (base 2) of a probability vector.
///
/// Terms with zero probability contribute 0, so the result is never NaN for
/// valid inputs. The sum is order independent.
pub fn entropy(probabilities: &[f64]) -> f64 {
    let h: f64 = probabilities
        .iter()
        .filter(|&&p| p > 0.0)
        .map(|&p| -p * p.log2())
        .sum();
    // -0.0 for single-term distributions
    h.max(0.0)
}

/// Fraction of `labels` carrying each class position in `0..n_classes`.
///
/// An empty selection yields all zeros.
pub fn class_fractions<I>(labels: I, n_classes: usize) -> Vec<f64>
where
    I: IntoIterator<Item = usize>,
{
    let mut counts = vec![0usize; n_classes];
    let mut total = 0usize;
    for label in labels {
        counts[label] += 1;
        total += 1;
    }
    if total == 0 {
        return vec![0.0; n_classes];
    }
    counts
        .into_iter()
        .map(|c| c as f64 / total as f64)
        .collect()
}

/// The largest and second-largest values, regardless of position.
///
/// A single-element slice returns `(v, 0.0)`; an empty slice `(0.0, 0.0)`.
pub fn top_two(values: &[f64]) -> (f64, f64) {
    let mut first = f64::NEG_INFINITY;
    let mut second = f64::NEG_INFINITY;
    for &v in values {
        if v > first {
            second = first;
            first = v;
        } else if v > second {
            second = v;
        }
    }
    let finite = |v: f64| if v.is_finite() { v } else { 0.0 };
    (finite(first), finite(second))
}

/// Index of the largest value; the first one wins on ties.
pub fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entropy_bounds() {
        assert_eq!(entropy(&[1.0, 0.0, 0.0]), 0.0);
        assert!((entropy(&[0.5, 0.5]) - 1.0).abs() < 1e-12);
        let uniform = [0.25; 4];
        assert!((entropy(&uniform) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_entropy_order_independent() {
        let a = entropy(&[0.1, 0.2, 0.7]);
        let b = entropy(&[0.7, 0.1, 0.2]);
        assert!((a - b).abs() < 1e-12);
    }

    #[test]
    fn test_class_fractions() {
        let fractions = class_fractions(vec![0, 2, 2, 2], 3);
        assert_eq!(fractions, vec![0.25, 0.0, 0.75]);
        assert_eq!(class_fractions(Vec::new(), 2), vec![0.0, 0.0]);
    }

    #[test]
    fn test_top_two_ignores_position() {
        assert_eq!(top_two(&[0.2, 0.5, 0.3]), (0.5, 0.3));
        assert_eq!(top_two(&[0.5, 0.5]), (0.5, 0.5));
        assert_eq!(top_two(&[1.0]), (1.0, 0.0));
    }

    #[test]
    fn test_argmax_first_tie() {
        assert_eq!(argmax(&[0.4, 0.4, 0.2]), 0);
        assert_eq!(argmax(&[0.1, 0.4, 0.5]), 2);
    }
}

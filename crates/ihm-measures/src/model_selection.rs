//! Cross-validation splitters with reproducible shuffling.
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::{HardnessError, Result};

/// K-Fold cross-validator.
#[derive(Debug, Clone)]
pub struct KFold {
    n_splits: usize,
    random_state: Option<u64>,
}

impl KFold {
    pub fn new(n_splits: usize) -> Self {
        Self {
            n_splits,
            random_state: None,
        }
    }

    /// Shuffle indices with a fixed seed before splitting.
    pub fn with_random_state(mut self, random_state: u64) -> Self {
        self.random_state = Some(random_state);
        self
    }

    /// Generate `(train, test)` index pairs. The number of folds is capped at
    /// `n_samples`.
    pub fn split(&self, n_samples: usize) -> Result<Vec<(Vec<usize>, Vec<usize>)>> {
        let n_splits = self.n_splits.min(n_samples);
        if n_splits < 2 {
            return Err(HardnessError::InvalidParameter(format!(
                "cannot build {} folds from {} samples",
                self.n_splits, n_samples
            )));
        }

        let mut indices: Vec<usize> = (0..n_samples).collect();
        if let Some(seed) = self.random_state {
            let mut rng = StdRng::seed_from_u64(seed);
            indices.shuffle(&mut rng);
        }

        let fold_size = n_samples / n_splits;
        let remainder = n_samples % n_splits;

        let mut result = Vec::with_capacity(n_splits);
        let mut start = 0;
        for i in 0..n_splits {
            // spread the remainder over the first folds
            let size = if i < remainder { fold_size + 1 } else { fold_size };
            let end = start + size;

            let test = indices[start..end].to_vec();
            let mut train = Vec::with_capacity(n_samples - size);
            train.extend_from_slice(&indices[..start]);
            train.extend_from_slice(&indices[end..]);
            result.push((train, test));

            start = end;
        }
        Ok(result)
    }
}

/// K-Fold variant that keeps class proportions roughly equal across folds.
#[derive(Debug, Clone)]
pub struct StratifiedKFold {
    n_splits: usize,
    random_state: Option<u64>,
}

impl StratifiedKFold {
    pub fn new(n_splits: usize) -> Self {
        Self {
            n_splits,
            random_state: None,
        }
    }

    pub fn with_random_state(mut self, random_state: u64) -> Self {
        self.random_state = Some(random_state);
        self
    }

    /// Deal each class's (optionally shuffled) members round-robin over the
    /// folds. Folds whose train or test side ends up empty are dropped.
    ///
    /// The number of folds is capped at the size of the smallest non-empty
    /// class. When that class has a single member no stratified split exists
    /// and an empty list is returned, so callers can fall back to [`KFold`].
    pub fn split(&self, y: &[usize], n_classes: usize) -> Result<Vec<(Vec<usize>, Vec<usize>)>> {
        let n_samples = y.len();
        let n_splits = self.n_splits.min(n_samples);
        if n_splits < 2 {
            return Err(HardnessError::InvalidParameter(format!(
                "cannot build {} folds from {} samples",
                self.n_splits, n_samples
            )));
        }

        let mut counts = vec![0usize; n_classes];
        for &label in y {
            counts[label] += 1;
        }
        let smallest = counts
            .iter()
            .copied()
            .filter(|&c| c > 0)
            .min()
            .unwrap_or(0);
        let n_splits = n_splits.min(smallest);
        if n_splits < 2 {
            return Ok(Vec::new());
        }

        let mut rng = self.random_state.map(StdRng::seed_from_u64);
        let mut fold_of = vec![0usize; n_samples];
        let mut offset = 0;
        for class in 0..n_classes {
            let mut members: Vec<usize> = (0..n_samples).filter(|&i| y[i] == class).collect();
            if let Some(rng) = rng.as_mut() {
                members.shuffle(rng);
            }
            for (pos, &i) in members.iter().enumerate() {
                fold_of[i] = (pos + offset) % n_splits;
            }
            // continue dealing where the previous class stopped
            offset = (offset + members.len()) % n_splits;
        }

        let folds = (0..n_splits)
            .map(|fold| {
                let (test, train): (Vec<usize>, Vec<usize>) =
                    (0..n_samples).partition(|&i| fold_of[i] == fold);
                (train, test)
            })
            .filter(|(train, test)| !train.is_empty() && !test.is_empty())
            .collect();
        Ok(folds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kfold_covers_every_index_once() {
        let folds = KFold::new(3).with_random_state(7).split(10).unwrap();
        assert_eq!(folds.len(), 3);
        let mut seen: Vec<usize> = folds.iter().flat_map(|(_, test)| test.clone()).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..10).collect::<Vec<_>>());
        for (train, test) in &folds {
            assert_eq!(train.len() + test.len(), 10);
        }
    }

    #[test]
    fn test_kfold_is_reproducible() {
        let a = KFold::new(4).with_random_state(42).split(20).unwrap();
        let b = KFold::new(4).with_random_state(42).split(20).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_kfold_caps_splits() {
        let folds = KFold::new(5).split(3).unwrap();
        assert_eq!(folds.len(), 3);
        assert!(KFold::new(5).split(1).is_err());
    }

    #[test]
    fn test_stratified_keeps_classes_in_each_test_fold() {
        let y = vec![0, 0, 0, 0, 0, 0, 1, 1, 1];
        let folds = StratifiedKFold::new(3).with_random_state(1).split(&y, 2).unwrap();
        assert_eq!(folds.len(), 3);
        for (_, test) in &folds {
            assert_eq!(test.iter().filter(|&&i| y[i] == 1).count(), 1);
            assert_eq!(test.iter().filter(|&&i| y[i] == 0).count(), 2);
        }
    }

    #[test]
    fn test_stratified_caps_splits_at_smallest_class() {
        let y = vec![0, 0, 0, 0, 1, 1];
        let folds = StratifiedKFold::new(5).split(&y, 2).unwrap();
        assert_eq!(folds.len(), 2);
        for (_, test) in &folds {
            assert_eq!(test.iter().filter(|&&i| y[i] == 1).count(), 1);
        }
    }

    #[test]
    fn test_stratified_singleton_class_yields_no_folds() {
        let folds = StratifiedKFold::new(3).split(&[0, 0, 0, 0, 0, 1], 2).unwrap();
        assert!(folds.is_empty());
    }
}

//! CART decision tree with minimal cost-complexity pruning.
//!
//! The tree is stored as a flat arena of nodes with index 0 as the root.
//! Node indices double as leaf identifiers, so two samples share a leaf id
//! exactly when they are routed to the same terminal node. Pruning turns
//! internal nodes back into leaves in place; their descendants stay in the
//! arena but are no longer reachable.
use ndarray::{Array2, ArrayView1};

use crate::error::{HardnessError, Result};
use crate::models::classifier_trait::ProbabilisticClassifier;

#[derive(Debug, Clone)]
enum NodeKind {
    Leaf,
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    /// Training samples per class routed through this node.
    counts: Vec<usize>,
}

impl Node {
    fn n_samples(&self) -> usize {
        self.counts.iter().sum()
    }
}

#[derive(Debug, Clone)]
pub struct DecisionTree {
    ccp_alpha: f64,
    n_classes: usize,
    n_train: usize,
    nodes: Vec<Node>,
}

impl DecisionTree {
    /// A tree pruned with strength `ccp_alpha` after full growth; 0 disables
    /// pruning.
    pub fn new(ccp_alpha: f64) -> Self {
        DecisionTree {
            ccp_alpha,
            n_classes: 0,
            n_train: 0,
            nodes: Vec::new(),
        }
    }

    pub fn unpruned() -> Self {
        Self::new(0.0)
    }

    /// Grow the tree on `x`/`y`, then prune it with the configured strength.
    pub fn fit(&mut self, x: &Array2<f64>, y: &[usize], n_classes: usize) -> Result<()> {
        if x.nrows() == 0 || x.ncols() == 0 {
            return Err(HardnessError::EmptyDataset);
        }
        if x.nrows() != y.len() {
            return Err(HardnessError::LengthMismatch {
                features: x.nrows(),
                labels: y.len(),
            });
        }
        if let Some(&bad) = y.iter().find(|&&label| label >= n_classes) {
            return Err(HardnessError::InvalidParameter(format!(
                "label position {} out of range for {} classes",
                bad, n_classes
            )));
        }

        self.n_classes = n_classes;
        self.n_train = y.len();
        self.nodes.clear();
        let indices: Vec<usize> = (0..y.len()).collect();
        self.build(x, y, &indices);

        if self.ccp_alpha > 0.0 {
            self.prune(self.ccp_alpha);
        }
        Ok(())
    }

    /// Copy of this tree pruned further with strength `alpha`.
    ///
    /// Pruning a fully grown tree at several strengths this way gives the same
    /// trees as refitting with each strength, without regrowing.
    pub fn pruned(&self, alpha: f64) -> DecisionTree {
        let mut tree = self.clone();
        tree.ccp_alpha = alpha;
        if alpha > 0.0 {
            tree.prune(alpha);
        }
        tree
    }

    fn build(&mut self, x: &Array2<f64>, y: &[usize], indices: &[usize]) -> usize {
        let mut counts = vec![0usize; self.n_classes];
        for &i in indices {
            counts[y[i]] += 1;
        }
        let pure = counts.iter().filter(|&&c| c > 0).count() <= 1;

        let idx = self.nodes.len();
        self.nodes.push(Node {
            kind: NodeKind::Leaf,
            counts,
        });

        if pure || indices.len() < 2 {
            return idx;
        }

        let Some((feature, threshold)) = self.find_best_split(x, y, indices, idx) else {
            return idx;
        };

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .copied()
            .partition(|&i| x[(i, feature)] <= threshold);
        if left_idx.is_empty() || right_idx.is_empty() {
            return idx;
        }

        let left = self.build(x, y, &left_idx);
        let right = self.build(x, y, &right_idx);
        self.nodes[idx].kind = NodeKind::Split {
            feature,
            threshold,
            left,
            right,
        };
        idx
    }

    /// Best (feature, threshold) by minimum weighted Gini impurity of the
    /// children. Thresholds are midpoints between consecutive distinct
    /// values; NaN values never satisfy `<=` and always go right.
    fn find_best_split(
        &self,
        x: &Array2<f64>,
        y: &[usize],
        indices: &[usize],
        node: usize,
    ) -> Option<(usize, f64)> {
        let n = indices.len();
        let total = &self.nodes[node].counts;
        let mut best: Option<(usize, f64, f64)> = None;
        let mut sorted = indices.to_vec();

        for feature in 0..x.ncols() {
            sorted.sort_by(|&a, &b| x[(a, feature)].total_cmp(&x[(b, feature)]));

            let mut left_counts = vec![0usize; self.n_classes];
            for pos in 0..n - 1 {
                left_counts[y[sorted[pos]]] += 1;
                let current = x[(sorted[pos], feature)];
                let next = x[(sorted[pos + 1], feature)];
                if next.is_nan() || current.is_nan() {
                    break;
                }
                if current == next {
                    continue;
                }

                let n_left = pos + 1;
                let n_right = n - n_left;
                let right_counts: Vec<usize> = total
                    .iter()
                    .zip(left_counts.iter())
                    .map(|(t, l)| t - l)
                    .collect();
                let weighted = (n_left as f64 * gini(&left_counts)
                    + n_right as f64 * gini(&right_counts))
                    / n as f64;

                if best.map_or(true, |(_, _, score)| weighted < score) {
                    let mut threshold = (current + next) / 2.0;
                    if threshold >= next {
                        threshold = current;
                    }
                    best = Some((feature, threshold, weighted));
                }
            }
        }

        best.map(|(feature, threshold, _)| (feature, threshold))
    }

    /// Weakest-link pruning: repeatedly collapse the internal node with the
    /// smallest effective alpha while that alpha does not exceed `alpha`.
    fn prune(&mut self, alpha: f64) {
        loop {
            let mut weakest: Option<(usize, f64)> = None;
            self.subtree_risk(0, &mut weakest);
            match weakest {
                Some((node, effective)) if effective <= alpha => {
                    self.nodes[node].kind = NodeKind::Leaf;
                }
                _ => break,
            }
        }
    }

    /// Returns (risk of the subtree's leaves, number of leaves) and records
    /// the internal node with the smallest effective alpha.
    fn subtree_risk(&self, node: usize, weakest: &mut Option<(usize, f64)>) -> (f64, usize) {
        let own = self.node_risk(node);
        match self.nodes[node].kind {
            NodeKind::Leaf => (own, 1),
            NodeKind::Split { left, right, .. } => {
                let (risk_l, leaves_l) = self.subtree_risk(left, weakest);
                let (risk_r, leaves_r) = self.subtree_risk(right, weakest);
                let risk = risk_l + risk_r;
                let leaves = leaves_l + leaves_r;
                let effective = (own - risk) / (leaves - 1) as f64;
                if weakest.map_or(true, |(_, best)| effective < best) {
                    *weakest = Some((node, effective));
                }
                (risk, leaves)
            }
        }
    }

    /// Gini impurity weighted by the node's share of the training set.
    fn node_risk(&self, node: usize) -> f64 {
        let counts = &self.nodes[node].counts;
        let share = self.nodes[node].n_samples() as f64 / self.n_train.max(1) as f64;
        share * gini(counts)
    }

    /// Terminal node reached by `row` and the number of splits on the way.
    fn descend(&self, row: ArrayView1<f64>) -> (usize, usize) {
        let mut idx = 0;
        let mut depth = 0;
        loop {
            match self.nodes[idx].kind {
                NodeKind::Leaf => return (idx, depth),
                NodeKind::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[feature] <= threshold { left } else { right };
                    depth += 1;
                }
            }
        }
    }

    /// Leaf identifier for every row of `x`.
    pub fn leaf_id(&self, x: &Array2<f64>) -> Vec<usize> {
        x.rows().into_iter().map(|row| self.descend(row).0).collect()
    }

    /// Number of decision nodes between the root and each row's leaf.
    pub fn decision_path_length(&self, x: &Array2<f64>) -> Vec<usize> {
        x.rows().into_iter().map(|row| self.descend(row).1).collect()
    }

    /// Maximum leaf depth of the reachable tree; 0 for a single leaf.
    pub fn depth(&self) -> usize {
        if self.nodes.is_empty() {
            return 0;
        }
        let mut max_depth = 0;
        let mut stack = vec![(0usize, 0usize)];
        while let Some((idx, depth)) = stack.pop() {
            match self.nodes[idx].kind {
                NodeKind::Leaf => max_depth = max_depth.max(depth),
                NodeKind::Split { left, right, .. } => {
                    stack.push((left, depth + 1));
                    stack.push((right, depth + 1));
                }
            }
        }
        max_depth
    }

    pub fn n_leaves(&self) -> usize {
        if self.nodes.is_empty() {
            return 0;
        }
        let mut leaves = 0;
        let mut stack = vec![0usize];
        while let Some(idx) = stack.pop() {
            match self.nodes[idx].kind {
                NodeKind::Leaf => leaves += 1,
                NodeKind::Split { left, right, .. } => {
                    stack.push(left);
                    stack.push(right);
                }
            }
        }
        leaves
    }
}

impl ProbabilisticClassifier for DecisionTree {
    fn fit(&mut self, x: &Array2<f64>, y: &[usize], n_classes: usize) -> Result<()> {
        DecisionTree::fit(self, x, y, n_classes)
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Array2<f64> {
        let mut out = Array2::<f64>::zeros((x.nrows(), self.n_classes));
        for (r, row) in x.rows().into_iter().enumerate() {
            let (leaf, _) = self.descend(row);
            let node = &self.nodes[leaf];
            let n = node.n_samples().max(1) as f64;
            for (c, &count) in node.counts.iter().enumerate() {
                out[(r, c)] = count as f64 / n;
            }
        }
        out
    }

    fn name(&self) -> &str {
        "decision_tree"
    }
}

fn gini(counts: &[usize]) -> f64 {
    let n: usize = counts.iter().sum();
    if n == 0 {
        return 0.0;
    }
    let n = n as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / n;
            p * p
        })
        .sum::<f64>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn staircase() -> (Array2<f64>, Vec<usize>) {
        // one feature, labels change at 3 and 5 plus a lone outlier at 7
        let x = array![[0.0], [1.0], [2.0], [3.0], [4.0], [5.0], [6.0], [7.0], [8.0], [9.0]];
        let y = vec![0, 0, 0, 1, 1, 0, 0, 1, 0, 0];
        (x, y)
    }

    #[test]
    fn test_gini() {
        assert_eq!(gini(&[4, 0]), 0.0);
        assert!((gini(&[2, 2]) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_unpruned_tree_fits_training_data() {
        let (x, y) = staircase();
        let mut tree = DecisionTree::unpruned();
        tree.fit(&x, &y, 2).unwrap();
        assert_eq!(ProbabilisticClassifier::predict(&tree, &x), y);
        assert!(tree.depth() >= 2);
    }

    #[test]
    fn test_path_length_bounded_by_depth() {
        let (x, y) = staircase();
        let mut tree = DecisionTree::unpruned();
        tree.fit(&x, &y, 2).unwrap();
        let depth = tree.depth();
        let lengths = tree.decision_path_length(&x);
        assert!(lengths.iter().all(|&l| l <= depth));
        assert!(lengths.iter().any(|&l| l == depth));
    }

    #[test]
    fn test_pruning_shrinks_tree() {
        let (x, y) = staircase();
        let mut full = DecisionTree::unpruned();
        full.fit(&x, &y, 2).unwrap();

        let pruned = full.pruned(0.09);
        assert!(pruned.n_leaves() < full.n_leaves());

        let stump = full.pruned(1.0);
        assert_eq!(stump.n_leaves(), 1);
        assert_eq!(stump.depth(), 0);
        assert!(stump.decision_path_length(&x).iter().all(|&l| l == 0));
    }

    #[test]
    fn test_pruned_matches_refit() {
        let (x, y) = staircase();
        let mut full = DecisionTree::unpruned();
        full.fit(&x, &y, 2).unwrap();
        let mut refit = DecisionTree::new(0.09);
        refit.fit(&x, &y, 2).unwrap();
        assert_eq!(full.pruned(0.09).leaf_id(&x), refit.leaf_id(&x));
        assert_eq!(refit.n_leaves(), 3);
    }

    #[test]
    fn test_leaf_ids_group_samples() {
        let x = array![[0.0], [0.1], [5.0], [5.1]];
        let y = vec![0, 0, 1, 1];
        let mut tree = DecisionTree::unpruned();
        tree.fit(&x, &y, 2).unwrap();
        let ids = tree.leaf_id(&x);
        assert_eq!(ids[0], ids[1]);
        assert_eq!(ids[2], ids[3]);
        assert_ne!(ids[0], ids[2]);
        assert_eq!(tree.depth(), 1);
    }

    #[test]
    fn test_predict_proba_has_all_classes() {
        let x = array![[0.0], [1.0]];
        let mut tree = DecisionTree::unpruned();
        tree.fit(&x, &[0, 2], 3).unwrap();
        let proba = tree.predict_proba(&x);
        assert_eq!(proba.ncols(), 3);
        assert_eq!(proba.row(0).to_vec(), vec![1.0, 0.0, 0.0]);
        assert_eq!(proba.row(1).to_vec(), vec![0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_fit_rejects_bad_labels() {
        let x = array![[0.0], [1.0]];
        let mut tree = DecisionTree::unpruned();
        assert!(tree.fit(&x, &[0, 3], 2).is_err());
        assert!(tree.fit(&x, &[0], 2).is_err());
    }
}

//! Average-linkage ordering of square score matrices.
//!
//! Replicability scores from directional neighbor voting are only
//! approximately symmetric, so the matrix is averaged with its transpose
//! before clustering. Dissimilarity is `1 - score`; values outside `[0, 1]`
//! are passed through and may produce negative distances.

use super::ScoreMatrix;
use super::label_positions;
use crate::error::ReplicabilityError;
use kodama::{Method, linkage};
use log::debug;
use ndarray::Array2;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy)]
pub struct SimilarityOrderConfig {
    /// Score used for entries missing after symmetrization.
    pub fill_value: f64,
}

impl Default for SimilarityOrderConfig {
    fn default() -> Self {
        SimilarityOrderConfig { fill_value: 0.0 }
    }
}

/// One agglomeration step.
///
/// Node ids below the number of labels are leaves; merge `k` creates node
/// `n + k`. `left` is always the smaller node id, so a singleton comes before
/// a cluster and an older cluster before a newer one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Merge {
    pub left: usize,
    pub right: usize,
    /// Average dissimilarity between the two merged clusters
    pub height: f64,
    /// Number of leaves under the new node
    pub size: usize,
}

#[derive(Debug, Clone)]
pub struct HierarchicalOrdering {
    /// Labels in input (row) order
    pub labels: Vec<String>,
    pub merges: Vec<Merge>,
    /// Leaf indices read left to right
    pub leaf_order: Vec<usize>,
}

impl HierarchicalOrdering {
    pub fn ordered_labels(&self) -> Vec<String> {
        self.leaf_order
            .iter()
            .map(|&i| self.labels[i].clone())
            .collect()
    }

    pub fn num_leaves(&self) -> usize {
        self.labels.len()
    }

    /// Flat membership obtained by undoing the last `k - 1` merges.
    ///
    /// Groups are numbered from 0 in order of appearance along the leaf order,
    /// so adjacent labels in a reordered heatmap share low group numbers.
    pub fn cut(&self, k: usize) -> anyhow::Result<Vec<usize>> {
        let n = self.num_leaves();
        if k == 0 || k > n.max(1) {
            return Err(ReplicabilityError::invalid_parameter(format!(
                "cannot cut {} leaves into {} groups",
                n, k
            ))
            .into());
        }

        // Union-find over leaves plus internal nodes
        let mut parent: Vec<usize> = (0..n + self.merges.len()).collect();
        fn find(parent: &mut [usize], mut x: usize) -> usize {
            while parent[x] != x {
                parent[x] = parent[parent[x]];
                x = parent[x];
            }
            x
        }

        for (step, merge) in self.merges.iter().take(n.saturating_sub(k)).enumerate() {
            let node = n + step;
            let a = find(&mut parent, merge.left);
            let b = find(&mut parent, merge.right);
            parent[a] = node;
            parent[b] = node;
        }

        let mut group_of_root = HashMap::new();
        let mut groups = vec![0; n];
        for &leaf in &self.leaf_order {
            let root = find(&mut parent, leaf);
            let next = group_of_root.len();
            groups[leaf] = *group_of_root.entry(root).or_insert(next);
        }

        Ok(groups)
    }
}

/// Symmetrize `(M + Mᵗ) / 2`, reading columns in row-label order.
///
/// A missing score on either side leaves the symmetrized entry missing.
pub fn symmetrize(matrix: &ScoreMatrix) -> anyhow::Result<Array2<f64>> {
    if !matrix.is_square() {
        return Err(ReplicabilityError::shape_mismatch(
            "square score matrix columns",
            matrix.nrows(),
            matrix.ncols(),
        )
        .into());
    }

    let col_idx = label_positions(matrix.col_labels(), matrix.row_labels(), "columns")?;
    let values = matrix.values().select(ndarray::Axis(1), &col_idx);

    Ok((&values + &values.t()) / 2.0)
}

/// Condensed (upper triangle, row-major) `1 - score` distances.
fn condensed_dissimilarity(similarity: &Array2<f64>, fill_value: f64) -> Vec<f64> {
    let n = similarity.nrows();
    let mut condensed = Vec::with_capacity(n * n.saturating_sub(1) / 2);
    for i in 0..n {
        for j in (i + 1)..n {
            let s = similarity[[i, j]];
            let s = if s.is_nan() { fill_value } else { s };
            condensed.push(1.0 - s);
        }
    }
    condensed
}

fn traverse_leaves(n: usize, merges: &[Merge]) -> Vec<usize> {
    if merges.is_empty() {
        return (0..n).collect();
    }

    let mut order = Vec::with_capacity(n);
    let mut stack = vec![n + merges.len() - 1];
    while let Some(node) = stack.pop() {
        if node < n {
            order.push(node);
        } else {
            let merge = &merges[node - n];
            stack.push(merge.right);
            stack.push(merge.left);
        }
    }
    order
}

/// Order the labels of a square score matrix by average-linkage clustering.
///
/// Fails if the matrix is not square or if its row and column labels are not
/// the same set. Columns may be stored in a different order than rows.
pub fn order_symmetric(
    matrix: &ScoreMatrix,
    config: SimilarityOrderConfig,
) -> anyhow::Result<HierarchicalOrdering> {
    if config.fill_value.is_nan() {
        return Err(ReplicabilityError::invalid_parameter("fill value must not be NaN").into());
    }

    let similarity = symmetrize(matrix)?;
    let n = similarity.nrows();
    let labels = matrix.row_labels().to_vec();

    if n < 2 {
        return Ok(HierarchicalOrdering {
            labels,
            merges: Vec::new(),
            leaf_order: (0..n).collect(),
        });
    }

    let mut condensed = condensed_dissimilarity(&similarity, config.fill_value);
    let dendrogram = linkage(&mut condensed, n, Method::Average);

    let merges: Vec<Merge> = dendrogram
        .steps()
        .iter()
        .map(|step| Merge {
            left: step.cluster1.min(step.cluster2),
            right: step.cluster1.max(step.cluster2),
            height: step.dissimilarity,
            size: step.size,
        })
        .collect();

    debug!(
        "average linkage over {} clusters, root height {:.4}",
        n,
        merges.last().map(|m| m.height).unwrap_or(0.0)
    );

    let leaf_order = traverse_leaves(n, &merges);
    Ok(HierarchicalOrdering {
        labels,
        merges,
        leaf_order,
    })
}

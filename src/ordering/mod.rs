//! Label orderings derived from replicability score matrices.
//!
//! A score matrix pairs cluster identifiers (rows) with cluster identifiers
//! (columns), holding AUROC-style scores in `[0, 1]` with `NaN` for missing
//! entries. Two orderings are provided:
//!
//! - **Hierarchical** ([`order_symmetric`]): for square matrices. The matrix is
//!   symmetrized, missing scores are imputed and labels are ordered by the
//!   leaves of an average-linkage dendrogram on `1 - score`.
//! - **Rank-weighted** ([`order_rows_by_rank`]): for rectangular matrices whose
//!   columns already have a fixed order. Each row is placed by the
//!   score-weighted mean position of the columns it matches.
//!
//! [`order_rows_by_hierarchy`] chains the two: it orders the reference clusters
//! hierarchically and then places the test clusters against that order.

use crate::error::ReplicabilityError;
use ndarray::{Array2, Axis};
use std::collections::HashMap;

pub mod hierarchical;
pub mod rank;

pub use hierarchical::{HierarchicalOrdering, Merge, SimilarityOrderConfig, order_symmetric};
pub use rank::{RankOrderConfig, RankOrdering, ZeroMassPlacement, order_rows_by_rank};

/// Score matrix with labeled rows and columns. Missing scores are `NaN`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreMatrix {
    row_labels: Vec<String>,
    col_labels: Vec<String>,
    values: Array2<f64>,
}

impl ScoreMatrix {
    pub fn new(
        row_labels: Vec<String>,
        col_labels: Vec<String>,
        values: Array2<f64>,
    ) -> anyhow::Result<Self> {
        let (nrows, ncols) = values.dim();
        if row_labels.len() != nrows {
            return Err(
                ReplicabilityError::shape_mismatch("row labels", nrows, row_labels.len()).into(),
            );
        }
        if col_labels.len() != ncols {
            return Err(
                ReplicabilityError::shape_mismatch("column labels", ncols, col_labels.len()).into(),
            );
        }

        Ok(ScoreMatrix {
            row_labels,
            col_labels,
            values,
        })
    }

    /// Square matrix using the same labels for rows and columns.
    pub fn square(labels: Vec<String>, values: Array2<f64>) -> anyhow::Result<Self> {
        Self::new(labels.clone(), labels, values)
    }

    pub fn row_labels(&self) -> &[String] {
        &self.row_labels
    }

    pub fn col_labels(&self) -> &[String] {
        &self.col_labels
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn nrows(&self) -> usize {
        self.values.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.values.ncols()
    }

    pub fn is_square(&self) -> bool {
        self.nrows() == self.ncols()
    }

    pub fn get(&self, row: &str, col: &str) -> Option<f64> {
        let i = self.row_labels.iter().position(|l| l == row)?;
        let j = self.col_labels.iter().position(|l| l == col)?;
        Some(self.values[[i, j]])
    }

    pub fn transpose(&self) -> ScoreMatrix {
        ScoreMatrix {
            row_labels: self.col_labels.clone(),
            col_labels: self.row_labels.clone(),
            values: self.values.t().to_owned(),
        }
    }

    /// Copy with rows and columns rearranged to the given label orders.
    ///
    /// Each order must name every row (column) exactly once.
    pub fn reindex<S1, S2>(&self, rows: &[S1], cols: &[S2]) -> anyhow::Result<ScoreMatrix>
    where
        S1: AsRef<str>,
        S2: AsRef<str>,
    {
        let row_idx = label_positions(&self.row_labels, rows, "rows")?;
        let col_idx = label_positions(&self.col_labels, cols, "columns")?;

        let values = self
            .values
            .select(Axis(0), &row_idx)
            .select(Axis(1), &col_idx);

        Ok(ScoreMatrix {
            row_labels: row_idx.iter().map(|&i| self.row_labels[i].clone()).collect(),
            col_labels: col_idx.iter().map(|&j| self.col_labels[j].clone()).collect(),
            values,
        })
    }

    /// Rows and columns both arranged by the leaf order of a dendrogram.
    pub fn reordered(&self, ordering: &HierarchicalOrdering) -> anyhow::Result<ScoreMatrix> {
        let labels = ordering.ordered_labels();
        self.reindex(&labels, &labels)
    }
}

/// Position of each requested label in `labels`; a permutation is required.
pub(crate) fn label_positions<S: AsRef<str>>(
    labels: &[String],
    order: &[S],
    what: &str,
) -> anyhow::Result<Vec<usize>> {
    if order.len() != labels.len() {
        return Err(ReplicabilityError::shape_mismatch(what, labels.len(), order.len()).into());
    }

    let lookup: HashMap<&str, usize> = labels
        .iter()
        .enumerate()
        .map(|(i, l)| (l.as_str(), i))
        .collect();
    if lookup.len() != labels.len() {
        return Err(
            ReplicabilityError::label_mismatch(format!("duplicate labels in {}", what)).into(),
        );
    }

    let mut seen = vec![false; labels.len()];
    let mut positions = Vec::with_capacity(order.len());
    for label in order {
        let label = label.as_ref();
        match lookup.get(label) {
            Some(&i) if !seen[i] => {
                seen[i] = true;
                positions.push(i);
            }
            Some(_) => {
                return Err(ReplicabilityError::label_mismatch(format!(
                    "{:?} listed twice in the {} order",
                    label, what
                ))
                .into());
            }
            None => {
                return Err(ReplicabilityError::label_mismatch(format!(
                    "{:?} is not one of the {}",
                    label, what
                ))
                .into());
            }
        }
    }

    Ok(positions)
}

/// Order the reference clusters hierarchically, then the test clusters
/// against that column order.
///
/// `test_vs_reference` has test clusters as rows and reference clusters as
/// columns; `reference` is the square reference-by-reference score matrix.
pub fn order_rows_by_hierarchy(
    test_vs_reference: &ScoreMatrix,
    reference: &ScoreMatrix,
    similarity_config: SimilarityOrderConfig,
    rank_config: RankOrderConfig,
) -> anyhow::Result<(HierarchicalOrdering, RankOrdering)> {
    let column_order = order_symmetric(reference, similarity_config)?;
    let row_order = order_rows_by_rank(
        test_vs_reference,
        &column_order.ordered_labels(),
        rank_config,
    )?;
    Ok((column_order, row_order))
}

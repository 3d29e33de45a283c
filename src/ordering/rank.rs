//! Rank-weighted ordering of test clusters against an ordered reference.
//!
//! Each row receives the weighted mean of the 1-based column positions, using
//! `score^alpha` as weights. Rows are then sorted ascending by that value, so a
//! row concentrated on the leftmost reference columns is placed first.

use super::{ScoreMatrix, label_positions};
use crate::error::ReplicabilityError;
use log::debug;
use ndarray::{ArrayView1, Axis};
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use std::cmp::Ordering;

/// Where rows without any weight (all scores zero or missing) are placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZeroMassPlacement {
    /// Score `-inf`: before every other row
    First,
    /// Score `+inf`: after every other row
    #[default]
    Last,
}

impl ZeroMassPlacement {
    fn score(self) -> f64 {
        match self {
            ZeroMassPlacement::First => f64::NEG_INFINITY,
            ZeroMassPlacement::Last => f64::INFINITY,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RankOrderConfig {
    /// Exponent applied to every score; `> 1` sharpens, `< 1` flattens
    pub alpha: f64,
    pub zero_mass: ZeroMassPlacement,
}

impl Default for RankOrderConfig {
    fn default() -> Self {
        RankOrderConfig {
            alpha: 1.0,
            zero_mass: ZeroMassPlacement::Last,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RankOrdering {
    /// Row labels in input order
    pub labels: Vec<String>,
    /// Rank score per input row, `±inf` for zero-mass rows
    pub scores: Vec<f64>,
    /// Input row indices in sorted order
    pub order: Vec<usize>,
}

impl RankOrdering {
    pub fn ordered_labels(&self) -> Vec<String> {
        self.order.iter().map(|&i| self.labels[i].clone()).collect()
    }
}

/// Weighted mean 1-based position of one row, `None` when undefined.
fn rank_score(row: ArrayView1<f64>, alpha: f64) -> Option<f64> {
    let mut weighted = 0.0;
    let mut mass = 0.0;
    for (j, &value) in row.iter().enumerate() {
        // Missing scores carry no weight
        let value = if value.is_nan() { 0.0 } else { value };
        let w = value.powf(alpha);
        weighted += w * (j + 1) as f64;
        mass += w;
    }

    let score = weighted / mass;
    if mass == 0.0 || !score.is_finite() {
        None
    } else {
        Some(score)
    }
}

/// Order the rows of `matrix` against the fixed column order `reference_order`.
///
/// The matrix columns are read in `reference_order`, which must list every
/// column label exactly once. Ties keep input row order.
pub fn order_rows_by_rank<S>(
    matrix: &ScoreMatrix,
    reference_order: &[S],
    config: RankOrderConfig,
) -> anyhow::Result<RankOrdering>
where
    S: AsRef<str>,
{
    if config.alpha.is_nan() || config.alpha < 0.0 {
        return Err(ReplicabilityError::invalid_parameter(format!(
            "alpha must be non-negative, got {}",
            config.alpha
        ))
        .into());
    }

    if reference_order.len() != matrix.ncols() {
        return Err(ReplicabilityError::shape_mismatch(
            "reference order",
            matrix.ncols(),
            reference_order.len(),
        )
        .into());
    }

    // Only columns are realigned; row labels may repeat
    let columns = label_positions(matrix.col_labels(), reference_order, "columns")?;
    let values = matrix.values().select(Axis(1), &columns);

    let scores: Vec<f64> = (0..values.nrows())
        .into_par_iter()
        .map(|i| rank_score(values.row(i), config.alpha).unwrap_or(f64::NAN))
        .collect();

    let undefined = scores.iter().filter(|s| s.is_nan()).count();
    if undefined > 0 {
        debug!(
            "{} of {} rows have no score mass, placing them {:?}",
            undefined,
            scores.len(),
            config.zero_mass
        );
    }
    let scores: Vec<f64> = scores
        .into_iter()
        .map(|s| if s.is_nan() { config.zero_mass.score() } else { s })
        .collect();

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].partial_cmp(&scores[b]).unwrap_or(Ordering::Equal));

    Ok(RankOrdering {
        labels: matrix.row_labels().to_vec(),
        scores,
        order,
    })
}

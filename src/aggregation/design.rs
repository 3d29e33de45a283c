//! Binary indicator (design) matrices for categorical sample labels.

use crate::error::ReplicabilityError;
use ndarray::{Array1, Array2, Axis};
use std::collections::{HashMap, HashSet};

/// Column order of a [`DesignMatrix`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupOrder {
    /// Groups in the order their first sample appears
    #[default]
    FirstAppearance,
    /// Groups sorted lexically; independent of sample order
    Lexical,
}

/// Samples × groups membership matrix with exactly one 1 per row.
#[derive(Debug, Clone)]
pub struct DesignMatrix {
    groups: Vec<String>,
    assignments: Vec<usize>,
    matrix: Array2<f64>,
}

impl DesignMatrix {
    /// Build the indicator matrix for `labels`.
    ///
    /// An empty label counts as missing and is rejected.
    pub fn new<S: AsRef<str>>(labels: &[S], order: GroupOrder) -> anyhow::Result<Self> {
        let mut groups: Vec<String> = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        for (index, label) in labels.iter().enumerate() {
            let label = label.as_ref();
            if label.is_empty() {
                return Err(ReplicabilityError::MissingLabel { index }.into());
            }
            if seen.insert(label) {
                groups.push(label.to_string());
            }
        }

        if order == GroupOrder::Lexical {
            groups.sort();
        }
        let column: HashMap<&str, usize> = groups
            .iter()
            .enumerate()
            .map(|(j, g)| (g.as_str(), j))
            .collect();

        let assignments: Vec<usize> = labels.iter().map(|l| column[l.as_ref()]).collect();

        let mut matrix = Array2::zeros((labels.len(), groups.len()));
        for (i, &j) in assignments.iter().enumerate() {
            matrix[[i, j]] = 1.0;
        }

        Ok(DesignMatrix {
            groups,
            assignments,
            matrix,
        })
    }

    /// Group name of each column.
    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    /// Column index of each sample.
    pub fn assignments(&self) -> &[usize] {
        &self.assignments
    }

    pub fn matrix(&self) -> &Array2<f64> {
        &self.matrix
    }

    pub fn num_samples(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn num_groups(&self) -> usize {
        self.groups.len()
    }

    /// Number of samples in each group.
    pub fn group_sizes(&self) -> Array1<f64> {
        self.matrix.sum_axis(Axis(0))
    }

    /// Each column divided by its sum, so that `X · D` averages within groups.
    pub fn column_normalized(&self) -> Array2<f64> {
        let sizes = self.group_sizes();
        &self.matrix / &sizes.insert_axis(Axis(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_first_appearance_order() {
        let design = DesignMatrix::new(&["b", "a", "b", "c"], GroupOrder::FirstAppearance).unwrap();
        assert_eq!(design.groups(), &["b", "a", "c"]);
        assert_eq!(design.assignments(), &[0, 1, 0, 2]);
        assert_eq!(
            design.matrix(),
            &array![
                [1.0, 0.0, 0.0],
                [0.0, 1.0, 0.0],
                [1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0]
            ]
        );
    }

    #[test]
    fn test_lexical_order() {
        let design = DesignMatrix::new(&["b", "a", "b", "c"], GroupOrder::Lexical).unwrap();
        assert_eq!(design.groups(), &["a", "b", "c"]);
        assert_eq!(design.assignments(), &[1, 0, 1, 2]);
    }

    #[test]
    fn test_row_and_column_sums() {
        let labels = ["x", "y", "y", "z", "x", "y", "w"];
        for order in [GroupOrder::FirstAppearance, GroupOrder::Lexical] {
            let design = DesignMatrix::new(&labels, order).unwrap();
            for row_sum in design.matrix().sum_axis(Axis(1)).iter() {
                assert_eq!(*row_sum, 1.0);
            }
            assert_eq!(design.group_sizes().sum(), labels.len() as f64);
        }
    }

    #[test]
    fn test_column_normalized() {
        let design = DesignMatrix::new(&["a", "b", "a", "a"], GroupOrder::FirstAppearance).unwrap();
        let normalized = design.column_normalized();
        for col_sum in normalized.sum_axis(Axis(0)).iter() {
            assert_abs_diff_eq!(*col_sum, 1.0, epsilon = 1e-12);
        }
        assert_abs_diff_eq!(normalized[[0, 0]], 1.0 / 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(normalized[[1, 1]], 1.0, epsilon = 1e-12);
        assert_eq!(normalized[[1, 0]], 0.0);
    }

    #[test]
    fn test_missing_label() {
        let err = DesignMatrix::new(&["a", "", "b"], GroupOrder::FirstAppearance).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ReplicabilityError>(),
            Some(&ReplicabilityError::MissingLabel { index: 1 })
        );
    }

    #[test]
    fn test_no_samples() {
        let labels: [&str; 0] = [];
        let design = DesignMatrix::new(&labels, GroupOrder::Lexical).unwrap();
        assert_eq!(design.num_samples(), 0);
        assert_eq!(design.num_groups(), 0);
    }
}

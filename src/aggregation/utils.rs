use ndarray::{Array2, ArrayView1, Axis};
use std::collections::HashSet;

/// Row indices of `gene_names` that appear in `gene_set`, in matrix order.
pub fn select_genes<S1, S2>(gene_names: &[S1], gene_set: &[S2]) -> Vec<usize>
where
    S1: AsRef<str>,
    S2: AsRef<str>,
{
    let wanted: HashSet<&str> = gene_set.iter().map(|g| g.as_ref()).collect();
    gene_names
        .iter()
        .enumerate()
        .filter_map(|(i, g)| if wanted.contains(g.as_ref()) { Some(i) } else { None })
        .collect()
}

/// Per-sample multiplier turning raw values into `scale_factor`-scaled
/// fractions of the library size. Empty libraries get 0.
pub fn library_scaling(library_sizes: &[f64], scale_factor: f64) -> Vec<f64> {
    library_sizes
        .iter()
        .map(|&total| if total > 0.0 { scale_factor / total } else { 0.0 })
        .collect()
}

/// Mean of the non-missing values, `NaN` if there are none.
pub fn nan_mean(values: ArrayView1<f64>) -> f64 {
    let (sum, count) = values
        .iter()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(sum, count), &v| (sum + v, count + 1));
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

/// Average the columns of `values` within each group of column indices.
pub fn grouped_nan_mean(values: &Array2<f64>, groups: &[Vec<usize>]) -> Array2<f64> {
    let mut out = Array2::from_elem((values.nrows(), groups.len()), f64::NAN);
    for (j, members) in groups.iter().enumerate() {
        let block = values.select(Axis(1), members);
        for (i, row) in block.axis_iter(Axis(0)).enumerate() {
            out[[i, j]] = nan_mean(row);
        }
    }
    out
}

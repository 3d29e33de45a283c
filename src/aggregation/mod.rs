//! Per-cluster expression summaries across studies.
//!
//! Samples are grouped into clusters by their (study, cell type) pair. For a
//! gene set this module computes, per cluster, the mean expression (centroid)
//! and the fraction of samples expressing each gene, then averages both
//! statistics across the studies that share a cell type.
//!
//! ## Pipeline
//!
//! 1. Keep the genes present in both the gene set and the matrix.
//! 2. Optionally scale every sample to a common library size (CPM by default).
//! 3. Build a design matrix over cluster ids and normalize its columns.
//! 4. Centroids = expression × design; fractions = (expression > 0) × design.
//! 5. Optionally condition centroids on expression (divide by the fraction).
//! 6. Average clusters sharing a cell type, ignoring missing values.
//!
//! The matrix is genes × samples and is only read. Dense ([`ndarray::Array2`])
//! and sparse ([`nalgebra_sparse::CsrMatrix`]) storage are both supported
//! through [`ClusterAggregation`].

use crate::error::ReplicabilityError;
use crate::labels::{cell_type_of, make_cluster_ids};
use log::{debug, warn};
use nalgebra_sparse::CsrMatrix;
use ndarray::{Array2, Axis, Zip};
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use single_utilities::traits::FloatOpsTS;
use std::collections::BTreeMap;

pub mod design;
mod summary;
pub(crate) mod utils;

pub use design::{DesignMatrix, GroupOrder};
pub use summary::{ClusterSummary, SummaryRecord};

use utils::{grouped_nan_mean, library_scaling, select_genes};

#[derive(Debug, Clone, Copy)]
pub struct AggregationConfig {
    /// Scale each sample to `scale_factor` total counts before averaging
    pub normalize_library_size: bool,
    /// Average expression over expressing samples only
    pub average_expressing_only: bool,
    pub scale_factor: f64,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        AggregationConfig {
            normalize_library_size: true,
            average_expressing_only: false,
            scale_factor: 1e6,
        }
    }
}

/// Cluster summaries for a genes × samples expression matrix.
pub trait ClusterAggregation<T>
where
    T: FloatOpsTS,
{
    /// Summarize `gene_set` per cluster and per cell type.
    ///
    /// `gene_names` labels the matrix rows; `studies` and `cell_types` label
    /// the samples (columns). An empty intersection between `gene_set` and
    /// `gene_names` yields an empty summary and a warning.
    fn summarize_clusters<S1, S2, S3, S4>(
        &self,
        gene_names: &[S1],
        studies: &[S2],
        cell_types: &[S3],
        gene_set: &[S4],
        config: AggregationConfig,
    ) -> anyhow::Result<ClusterSummary>
    where
        S1: AsRef<str>,
        S2: AsRef<str>,
        S3: AsRef<str>,
        S4: AsRef<str>;
}

/// Genes and clusters a summary is computed over.
struct AggregationPlan {
    gene_idx: Vec<usize>,
    genes: Vec<String>,
    design: DesignMatrix,
}

impl AggregationPlan {
    fn new<S1, S2, S3, S4>(
        n_genes: usize,
        n_samples: usize,
        gene_names: &[S1],
        studies: &[S2],
        cell_types: &[S3],
        gene_set: &[S4],
    ) -> anyhow::Result<Option<Self>>
    where
        S1: AsRef<str>,
        S2: AsRef<str>,
        S3: AsRef<str>,
        S4: AsRef<str>,
    {
        if gene_names.len() != n_genes {
            return Err(
                ReplicabilityError::shape_mismatch("gene names", n_genes, gene_names.len()).into(),
            );
        }
        if studies.len() != n_samples {
            return Err(
                ReplicabilityError::shape_mismatch("study labels", n_samples, studies.len()).into(),
            );
        }
        if cell_types.len() != n_samples {
            return Err(ReplicabilityError::shape_mismatch(
                "cell-type labels",
                n_samples,
                cell_types.len(),
            )
            .into());
        }

        if let Some(index) = studies
            .iter()
            .zip(cell_types)
            .position(|(s, c)| s.as_ref().is_empty() || c.as_ref().is_empty())
        {
            return Err(ReplicabilityError::MissingLabel { index }.into());
        }

        let cluster_ids = make_cluster_ids(studies, cell_types)?;

        let gene_idx = select_genes(gene_names, gene_set);
        if gene_idx.is_empty() {
            warn!(
                "None of the {} requested genes were found among {} matrix genes",
                gene_set.len(),
                n_genes
            );
            return Ok(None);
        }
        debug!(
            "Summarizing {} of {} requested genes",
            gene_idx.len(),
            gene_set.len()
        );

        // Lexical groups keep the cluster layout independent of sample order
        let design = DesignMatrix::new(&cluster_ids, GroupOrder::Lexical)?;
        debug!(
            "{} samples in {} clusters",
            design.num_samples(),
            design.num_groups()
        );

        let genes = gene_idx
            .iter()
            .map(|&g| gene_names[g].as_ref().to_string())
            .collect();

        Ok(Some(AggregationPlan {
            gene_idx,
            genes,
            design,
        }))
    }

    /// Condition on expression if requested, then average across studies.
    fn finish(
        self,
        mut cluster_expression: Array2<f64>,
        cluster_fraction: Array2<f64>,
        config: AggregationConfig,
    ) -> anyhow::Result<ClusterSummary> {
        if config.average_expressing_only {
            Zip::from(&mut cluster_expression)
                .and(&cluster_fraction)
                .for_each(|e, &f| *e = if f > 0.0 { *e / f } else { f64::NAN });
        }

        let clusters = self.design.groups().to_vec();
        let mut by_cell_type: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (j, id) in clusters.iter().enumerate() {
            by_cell_type
                .entry(cell_type_of(id)?.to_string())
                .or_default()
                .push(j);
        }
        let (cell_types, members): (Vec<String>, Vec<Vec<usize>>) =
            by_cell_type.into_iter().unzip();

        let expression = grouped_nan_mean(&cluster_expression, &members);
        let fraction = grouped_nan_mean(&cluster_fraction, &members);

        Ok(ClusterSummary {
            genes: self.genes,
            clusters,
            cell_types,
            cluster_expression,
            cluster_fraction,
            expression,
            fraction,
        })
    }
}

fn validate_config(config: &AggregationConfig) -> anyhow::Result<()> {
    if config.normalize_library_size && !(config.scale_factor > 0.0) {
        return Err(ReplicabilityError::invalid_parameter(format!(
            "scale factor must be positive, got {}",
            config.scale_factor
        ))
        .into());
    }
    Ok(())
}

impl<T> ClusterAggregation<T> for Array2<T>
where
    T: FloatOpsTS,
{
    fn summarize_clusters<S1, S2, S3, S4>(
        &self,
        gene_names: &[S1],
        studies: &[S2],
        cell_types: &[S3],
        gene_set: &[S4],
        config: AggregationConfig,
    ) -> anyhow::Result<ClusterSummary>
    where
        S1: AsRef<str>,
        S2: AsRef<str>,
        S3: AsRef<str>,
        S4: AsRef<str>,
    {
        validate_config(&config)?;
        let (n_genes, n_samples) = self.dim();
        let Some(plan) = AggregationPlan::new(
            n_genes, n_samples, gene_names, studies, cell_types, gene_set,
        )?
        else {
            return Ok(ClusterSummary::empty());
        };

        let scaling = if config.normalize_library_size {
            let library_sizes: Vec<f64> = self
                .axis_iter(Axis(1))
                .map(|sample| sample.iter().map(|v| v.to_f64().unwrap_or(0.0)).sum::<f64>())
                .collect();
            library_scaling(&library_sizes, config.scale_factor)
        } else {
            vec![1.0; n_samples]
        };

        let values: Vec<f64> = plan
            .gene_idx
            .par_iter()
            .flat_map_iter(|&g| {
                let row = self.row(g);
                let scaling = &scaling;
                (0..n_samples).map(move |s| row[s].to_f64().unwrap_or(0.0) * scaling[s])
            })
            .collect();
        let expression = Array2::from_shape_vec((plan.gene_idx.len(), n_samples), values)?;
        let detected = expression.mapv(|v| if v > 0.0 { 1.0 } else { 0.0 });

        let weights = plan.design.column_normalized();
        let cluster_expression = expression.dot(&weights);
        let cluster_fraction = detected.dot(&weights);

        plan.finish(cluster_expression, cluster_fraction, config)
    }
}

impl<T> ClusterAggregation<T> for CsrMatrix<T>
where
    T: FloatOpsTS,
{
    fn summarize_clusters<S1, S2, S3, S4>(
        &self,
        gene_names: &[S1],
        studies: &[S2],
        cell_types: &[S3],
        gene_set: &[S4],
        config: AggregationConfig,
    ) -> anyhow::Result<ClusterSummary>
    where
        S1: AsRef<str>,
        S2: AsRef<str>,
        S3: AsRef<str>,
        S4: AsRef<str>,
    {
        validate_config(&config)?;
        let (n_genes, n_samples) = (self.nrows(), self.ncols());
        let Some(plan) = AggregationPlan::new(
            n_genes, n_samples, gene_names, studies, cell_types, gene_set,
        )?
        else {
            return Ok(ClusterSummary::empty());
        };

        let scaling = if config.normalize_library_size {
            let mut library_sizes = vec![0.0; n_samples];
            for (_, s, v) in self.triplet_iter() {
                library_sizes[s] += v.to_f64().unwrap_or(0.0);
            }
            library_scaling(&library_sizes, config.scale_factor)
        } else {
            vec![1.0; n_samples]
        };

        let assignments = plan.design.assignments();
        let inv_sizes: Vec<f64> = plan.design.group_sizes().iter().map(|&n| 1.0 / n).collect();
        let n_clusters = inv_sizes.len();

        // Accumulate stored entries only; implicit zeros add nothing
        let rows: Vec<(Vec<f64>, Vec<f64>)> = plan
            .gene_idx
            .par_iter()
            .map(|&g| {
                let row = self.row(g);
                let mut expr = vec![0.0; n_clusters];
                let mut frac = vec![0.0; n_clusters];
                for (&s, v) in row.col_indices().iter().zip(row.values()) {
                    let value = v.to_f64().unwrap_or(0.0) * scaling[s];
                    let c = assignments[s];
                    expr[c] += value * inv_sizes[c];
                    if value > 0.0 {
                        frac[c] += inv_sizes[c];
                    }
                }
                (expr, frac)
            })
            .collect();

        let n_selected = plan.gene_idx.len();
        let (expr, frac): (Vec<Vec<f64>>, Vec<Vec<f64>>) = rows.into_iter().unzip();
        let cluster_expression =
            Array2::from_shape_vec((n_selected, n_clusters), expr.concat())?;
        let cluster_fraction = Array2::from_shape_vec((n_selected, n_clusters), frac.concat())?;

        plan.finish(cluster_expression, cluster_fraction, config)
    }
}

use ndarray::Array2;

/// One (gene, cell type) entry of a [`ClusterSummary`].
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRecord {
    pub gene: String,
    pub cell_type: String,
    /// Mean expression averaged across studies
    pub average_expression: f64,
    /// Fraction of samples with non-zero expression, averaged across studies
    pub percent_expressing: f64,
}

/// Cluster-level and cross-study expression statistics for a gene set.
///
/// Tables are genes × clusters (`cluster_*`) and genes × cell types. Missing
/// values are `NaN`.
#[derive(Debug, Clone)]
pub struct ClusterSummary {
    pub genes: Vec<String>,
    /// Cluster identifiers, `study|celltype`, sorted
    pub clusters: Vec<String>,
    /// Cell types, sorted
    pub cell_types: Vec<String>,
    pub cluster_expression: Array2<f64>,
    pub cluster_fraction: Array2<f64>,
    pub expression: Array2<f64>,
    pub fraction: Array2<f64>,
}

impl ClusterSummary {
    /// Summary of an empty gene selection.
    pub fn empty() -> Self {
        ClusterSummary {
            genes: Vec::new(),
            clusters: Vec::new(),
            cell_types: Vec::new(),
            cluster_expression: Array2::zeros((0, 0)),
            cluster_fraction: Array2::zeros((0, 0)),
            expression: Array2::zeros((0, 0)),
            fraction: Array2::zeros((0, 0)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    /// Long-form records, gene-major in the order of `genes` and `cell_types`.
    pub fn records(&self) -> Vec<SummaryRecord> {
        let mut records = Vec::with_capacity(self.genes.len() * self.cell_types.len());
        for (i, gene) in self.genes.iter().enumerate() {
            for (j, cell_type) in self.cell_types.iter().enumerate() {
                records.push(SummaryRecord {
                    gene: gene.clone(),
                    cell_type: cell_type.clone(),
                    average_expression: self.expression[[i, j]],
                    percent_expressing: self.fraction[[i, j]],
                });
            }
        }
        records
    }

    pub fn get(&self, gene: &str, cell_type: &str) -> Option<SummaryRecord> {
        let i = self.genes.iter().position(|g| g == gene)?;
        let j = self.cell_types.iter().position(|c| c == cell_type)?;
        Some(SummaryRecord {
            gene: gene.to_string(),
            cell_type: cell_type.to_string(),
            average_expression: self.expression[[i, j]],
            percent_expressing: self.fraction[[i, j]],
        })
    }
}

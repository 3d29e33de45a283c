//! Composite cluster identifiers.
//!
//! A cluster is one (study, cell type) pair. It is addressed by a single string
//! `"<study>|<celltype>"`, which is what score matrices are labeled with and
//! what the aggregation pipeline groups samples by.
//!
//! The separator is reserved: a label that already contains it is rejected
//! rather than escaped, so every identifier splits back into exactly the two
//! labels it was built from.

use crate::error::ReplicabilityError;

/// Reserved separator between the study and the cell-type component.
pub const CLUSTER_SEPARATOR: char = '|';

/// Build the identifier of the cluster `cell_type` in `study`.
///
/// Fails with [`ReplicabilityError::AmbiguousIdentifier`] if either label
/// contains [`CLUSTER_SEPARATOR`].
pub fn make_cluster_id(study: &str, cell_type: &str) -> anyhow::Result<String> {
    for label in [study, cell_type] {
        if label.contains(CLUSTER_SEPARATOR) {
            return Err(ReplicabilityError::ambiguous(label).into());
        }
    }

    let mut id = String::with_capacity(study.len() + cell_type.len() + 1);
    id.push_str(study);
    id.push(CLUSTER_SEPARATOR);
    id.push_str(cell_type);
    Ok(id)
}

/// Build one identifier per sample from parallel study and cell-type labels.
pub fn make_cluster_ids<S1, S2>(studies: &[S1], cell_types: &[S2]) -> anyhow::Result<Vec<String>>
where
    S1: AsRef<str>,
    S2: AsRef<str>,
{
    if studies.len() != cell_types.len() {
        return Err(ReplicabilityError::shape_mismatch(
            "cell-type labels",
            studies.len(),
            cell_types.len(),
        )
        .into());
    }

    studies
        .iter()
        .zip(cell_types)
        .map(|(study, cell_type)| make_cluster_id(study.as_ref(), cell_type.as_ref()))
        .collect()
}

/// Split an identifier into its (study, cell type) components.
pub fn split_cluster_id(id: &str) -> anyhow::Result<(&str, &str)> {
    id.split_once(CLUSTER_SEPARATOR)
        .ok_or_else(|| ReplicabilityError::ambiguous(id).into())
}

/// Study component: everything before the first separator.
pub fn study_of(id: &str) -> anyhow::Result<&str> {
    split_cluster_id(id).map(|(study, _)| study)
}

/// Cell-type component: everything after the first separator.
pub fn cell_type_of(id: &str) -> anyhow::Result<&str> {
    split_cluster_id(id).map(|(_, cell_type)| cell_type)
}

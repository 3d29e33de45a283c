//! # single-replicability
//!
//! A Rust library for interpreting cross-study cell-type replicability scores, part of the
//! single-rust ecosystem.
//!
//! Replicability between cell-type clusters from different studies is usually reported as a
//! matrix of AUROC scores indexed by cluster identifiers of the form `"<study>|<celltype>"`.
//! This crate turns such a matrix into an interpretable label ordering and summarizes gene
//! expression per cluster so that the same cell type can be compared across studies.
//!
//! ## Core Features
//!
//! - **Cluster identifiers**: Build and parse `study|celltype` identifiers
//! - **Hierarchical ordering**: Average-linkage ordering of square score matrices
//! - **Rank-weighted ordering**: Place test clusters against an ordered reference
//! - **Cluster aggregation**: Per-cluster centroids and expressing fractions, averaged across
//!   studies, for dense `Array2` and sparse `CsrMatrix` expression data
//!
//! ## Quick Start
//!
//! Wrap a score matrix in [`ordering::ScoreMatrix`] and call [`ordering::order_symmetric`] or
//! [`ordering::order_rows_by_rank`]. Use the [`aggregation::ClusterAggregation`] trait on an
//! expression matrix (genes × samples) to obtain a [`aggregation::ClusterSummary`].
//!
//! ## Module Organization
//!
//! - **[`labels`]**: Cluster identifier codec
//! - **[`ordering`]**: Score matrices and label orderings
//! - **[`aggregation`]**: Design matrices and cluster expression summaries
//! - **[`error`]**: Error kinds

pub mod aggregation;
pub mod error;
pub mod labels;
pub mod ordering;

pub use error::ReplicabilityError;

//! Pathogenicity classification from cross-species conservation features.
//!
//! The pipeline runs in four stages: resolve feature/label columns out of a
//! wide variant table, search the ensemble branching factor with a two-round
//! grid over repeated stratified cross-validation, fit and persist the final
//! model, and score unseen tables into an exportable prediction table.

/// Reference-list configuration.
pub mod config;
/// Tabular dataset model, loading, and column resolution.
pub mod dataset;
/// Bundled random-forest classifier and the trainer seam.
pub mod forest;
/// Logging setup.
pub mod logging;
/// Evaluation metrics.
pub mod metrics;
/// Scoring and prediction export.
pub mod predict;
/// Final model fitting and artifact persistence.
pub mod training;
/// Two-round branching-factor search.
pub mod tuning;

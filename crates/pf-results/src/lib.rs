//! pf-results: writes the per-element result tables from the solved pits.
//!
//! Extraction is atomic per solve: the solver calls [`extract_results`]
//! only after full convergence, and every out-of-service element keeps its
//! NaN row.

pub mod extract;

pub use extract::extract_results;

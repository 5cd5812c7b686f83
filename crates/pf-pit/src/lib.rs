//! pf-pit: the process-internal tables of the pipeflow solver.
//!
//! User-facing element tables are materialized into two dense `f64` tables,
//! one row per physical node and one per branch (pipes contribute one row
//! per section plus internal nodes between sections). Branch rows are
//! grouped contiguously by component kind so the solver can iterate over
//! `(kind, slice)` pairs.
//!
//! The crate also owns the graph reachability check that takes unsupplied
//! subnetworks out of service, and the reducer that projects the full pit
//! onto the active rows participating in a solve.

pub mod build;
pub mod connectivity;
pub mod error;
pub mod idx;
pub mod kind;
pub mod lookups;
pub mod reduce;
pub mod table;
pub mod view;

pub use build::{build_pit, topology_hash, Workspace};
pub use connectivity::check_connectivity;
pub use error::{PitError, PitResult};
pub use kind::BranchKind;
pub use lookups::Lookups;
pub use reduce::{reduce_pit, ActivePit};
pub use table::Table;

//! pf-solver: the Newton–Raphson pipeflow kernel.
//!
//! [`pipeflow`] is the single entry point: it materializes the internal
//! tables, runs the connectivity check and the reducer, iterates the
//! hydraulic (and, depending on the mode, thermal) Newton loop on the
//! active pit, and extracts the result tables.
//!
//! Unknown layout of the hydraulic system: pressures of all active nodes
//! followed by (reference-state) velocities of all active branches. The
//! thermal system mirrors it with nodal mixing temperatures followed by
//! branch outlet temperatures.

pub mod components;
pub mod derivatives;
pub mod error;
pub mod friction;
pub mod hydraulics;
pub mod matrix;
pub mod pipeflow;
pub mod thermal;

pub use error::{PipeflowError, PipeflowResult};
pub use pipeflow::pipeflow;

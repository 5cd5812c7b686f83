//! pf-core: shared foundation for the pipeflow workspace.
//!
//! Provides:
//! - Compact element identifiers used by all tables
//! - Canonical `uom` unit aliases and constructor helpers
//! - Physical constants of the solver's unit system
//! - Finite-value guards for numeric hot paths

pub mod error;
pub mod ids;
pub mod numeric;
pub mod units;

pub use error::{CoreError, CoreResult};
pub use ids::{
    CircPumpMassId, CircPumpPressureId, CompressorId, ExtGridId, FlowControlId, HeatConsumerId,
    HeatExchangerId, Id, JunctionId, MassStorageId, PipeId, PressureControlId, PumpId, SinkId,
    SourceId, ValveId,
};

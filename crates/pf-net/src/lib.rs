//! pf-net: the user-facing network model.
//!
//! A [`Network`] owns one fluid, one table per element kind and the result
//! tables written back by a successful solve. Junction references between
//! elements are validated before any solver structure is built.

pub mod cache;
pub mod elements;
pub mod error;
pub mod network;
pub mod options;
pub mod results;

pub use cache::SolverCache;
pub use elements::{
    CircPumpMass, CircPumpPressure, Compressor, ExtGrid, ExtGridKind, FlowControl, HeatConsumer,
    HeatExchanger, Junction, MassStorage, Pipe, PressureControl, Pump, PumpCurve, Sink, Source,
    Valve,
};
pub use error::{NetError, NetResult};
pub use network::Network;
pub use options::{
    CalculationMode, FrictionModel, NonlinearMethod, PipeflowOptions, ZeroFlowPolicy,
};
pub use results::{
    PipeInternals, ResBranch, ResCircPump, ResExtGrid, ResJunction, ResPump, ResultCounts,
    ResultTables, SolveRecord,
};

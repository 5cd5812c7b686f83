//! Error taxonomy surfaced by `pipeflow`.

use thiserror::Error;

pub type PipeflowResult<T> = Result<T, PipeflowError>;

#[derive(Error, Debug)]
pub enum PipeflowError {
    #[error("Invalid topology: {0}")]
    InvalidTopology(String),

    #[error("No slack: {0}")]
    NoSlack(String),

    #[error(
        "Hydraulics did not converge within {iterations} iterations \
         (residual={residual_norm:.3e}, error_p={error_p:.3e}, error_m={error_m:.3e})"
    )]
    NoConvergence {
        iterations: usize,
        residual_norm: f64,
        error_p: f64,
        error_m: f64,
    },

    #[error(
        "Heat transfer did not converge within {iterations} iterations \
         (residual={residual_norm:.3e}, error_t={error_t:.3e})"
    )]
    ThermalNoConvergence {
        iterations: usize,
        residual_norm: f64,
        error_t: f64,
    },

    #[error("Zero mass flow on thermally active branch {branch}")]
    ThermalSingularity { branch: usize },

    #[error("Solver failure: {what}")]
    SolverError { what: String },

    #[error("Fluid error: {0}")]
    Fluid(#[from] pf_fluids::FluidError),
}

impl From<pf_net::NetError> for PipeflowError {
    fn from(e: pf_net::NetError) -> Self {
        PipeflowError::InvalidTopology(e.to_string())
    }
}

impl From<pf_pit::PitError> for PipeflowError {
    fn from(e: pf_pit::PitError) -> Self {
        match e {
            pf_pit::PitError::NoSlack { what } => PipeflowError::NoSlack(what),
            pf_pit::PitError::Net(n) => PipeflowError::InvalidTopology(n.to_string()),
            pf_pit::PitError::Fluid(f) => PipeflowError::Fluid(f),
            pf_pit::PitError::Inconsistent { what } => PipeflowError::SolverError {
                what: what.to_string(),
            },
        }
    }
}

//! Errors raised while building or checking the internal tables.

use thiserror::Error;

pub type PitResult<T> = Result<T, PitError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PitError {
    #[error("Invalid topology: {0}")]
    Net(#[from] pf_net::NetError),

    #[error("No slack: {what}")]
    NoSlack { what: String },

    #[error("Fluid error: {0}")]
    Fluid(#[from] pf_fluids::FluidError),

    #[error("Internal table inconsistency: {what}")]
    Inconsistent { what: &'static str },
}

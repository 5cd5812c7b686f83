//! Network-level validation errors.

use thiserror::Error;

pub type NetResult<T> = Result<T, NetError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NetError {
    #[error("Invalid topology: {table}[{element}] references non-existent junction {junction}")]
    DanglingJunction {
        table: &'static str,
        element: usize,
        junction: u32,
    },

    #[error("Invalid topology: {what}")]
    InvalidTopology { what: String },
}

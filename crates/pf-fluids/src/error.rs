//! Error types for fluid property evaluation.

use crate::fluid::PropertyKind;
use pf_core::CoreError;
use thiserror::Error;

pub type FluidResult<T> = Result<T, FluidError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FluidError {
    #[error("Property {property:?} is not defined for fluid {fluid}")]
    UndefinedProperty {
        fluid: String,
        property: PropertyKind,
    },

    #[error("Invalid property model: {what}")]
    InvalidModel { what: &'static str },

    #[error("Non-physical value: {what}")]
    NonPhysical { what: &'static str },
}

impl From<CoreError> for FluidError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::NonFinite { quantity, .. }
            | CoreError::NonPositive { quantity, .. } => {
                FluidError::NonPhysical { what: quantity }
            }
        }
    }
}

use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

/// Failures raised by the numeric guards in [`crate::numeric`].
///
/// The solver's hot paths carry raw `f64` state; these are the two ways a
/// physical quantity can leave its admissible range.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum CoreError {
    #[error("{quantity} is not finite: {value}")]
    NonFinite { quantity: &'static str, value: f64 },

    #[error("{quantity} must be positive, got {value}")]
    NonPositive { quantity: &'static str, value: f64 },
}

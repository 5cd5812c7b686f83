//! Closed-form property models.

use crate::error::{FluidError, FluidResult};
use pf_core::numeric::polyval;
use serde::{Deserialize, Serialize};

/// One physical property as a function of a single state variable.
///
/// Temperature-driven properties (density, viscosity, heat capacity) are
/// evaluated at T in K; pressure-driven properties (compressibility) at the
/// absolute pressure in bar. The model does not know which — callers pick
/// the argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyModel {
    /// Value independent of the state variable.
    Constant(f64),
    /// `offset + slope * x`.
    Linear { slope: f64, offset: f64 },
    /// Piecewise-linear interpolation with linear extrapolation beyond the
    /// table ends. `x` must be strictly increasing.
    Table { x: Vec<f64>, y: Vec<f64> },
    /// Polynomial with coefficients in ascending order of power.
    Polynomial { coeffs: Vec<f64> },
}

impl PropertyModel {
    /// Validate model invariants once at construction time.
    pub fn validate(&self) -> FluidResult<()> {
        match self {
            PropertyModel::Constant(v) => {
                if !v.is_finite() {
                    return Err(FluidError::InvalidModel {
                        what: "constant property must be finite",
                    });
                }
            }
            PropertyModel::Linear { slope, offset } => {
                if !slope.is_finite() || !offset.is_finite() {
                    return Err(FluidError::InvalidModel {
                        what: "linear property coefficients must be finite",
                    });
                }
            }
            PropertyModel::Table { x, y } => {
                if x.len() != y.len() || x.len() < 2 {
                    return Err(FluidError::InvalidModel {
                        what: "property table needs at least two equally long columns",
                    });
                }
                if x.windows(2).any(|w| w[1] <= w[0]) {
                    return Err(FluidError::InvalidModel {
                        what: "property table abscissae must be strictly increasing",
                    });
                }
            }
            PropertyModel::Polynomial { coeffs } => {
                if coeffs.is_empty() {
                    return Err(FluidError::InvalidModel {
                        what: "polynomial property needs at least one coefficient",
                    });
                }
            }
        }
        Ok(())
    }

    /// Evaluate the property at the given state variable.
    pub fn at(&self, x: f64) -> f64 {
        match self {
            PropertyModel::Constant(v) => *v,
            PropertyModel::Linear { slope, offset } => offset + slope * x,
            PropertyModel::Table { x: xs, y: ys } => interpolate_extrapolate(xs, ys, x),
            PropertyModel::Polynomial { coeffs } => polyval(coeffs, x),
        }
    }

    /// Derivative of the property with respect to its state variable.
    ///
    /// Used for the compressibility derivative in the gas momentum law.
    pub fn derivative_at(&self, x: f64) -> f64 {
        match self {
            PropertyModel::Constant(_) => 0.0,
            PropertyModel::Linear { slope, .. } => *slope,
            PropertyModel::Table { x: xs, y: ys } => {
                let seg = segment(xs, x);
                (ys[seg + 1] - ys[seg]) / (xs[seg + 1] - xs[seg])
            }
            PropertyModel::Polynomial { coeffs } => {
                let der: Vec<f64> = coeffs
                    .iter()
                    .enumerate()
                    .skip(1)
                    .map(|(i, c)| c * i as f64)
                    .collect();
                polyval(&der, x)
            }
        }
    }
}

fn segment(xs: &[f64], x: f64) -> usize {
    match xs.iter().position(|&xi| xi > x) {
        Some(0) => 0,
        Some(i) => i - 1,
        None => xs.len() - 2,
    }
}

fn interpolate_extrapolate(xs: &[f64], ys: &[f64], x: f64) -> f64 {
    let seg = segment(xs, x);
    let t = (x - xs[seg]) / (xs[seg + 1] - xs[seg]);
    ys[seg] + t * (ys[seg + 1] - ys[seg])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn constant_ignores_argument() {
        let p = PropertyModel::Constant(998.2);
        assert_relative_eq!(p.at(273.15), 998.2);
        assert_relative_eq!(p.at(373.15), 998.2);
        assert_relative_eq!(p.derivative_at(300.0), 0.0);
    }

    #[test]
    fn linear_slope_and_offset() {
        let p = PropertyModel::Linear {
            slope: -0.2,
            offset: 1060.0,
        };
        assert_relative_eq!(p.at(300.0), 1000.0);
        assert_relative_eq!(p.derivative_at(300.0), -0.2);
    }

    #[test]
    fn table_interpolates_and_extrapolates() {
        let p = PropertyModel::Table {
            x: vec![273.15, 293.15, 313.15],
            y: vec![999.8, 998.2, 992.2],
        };
        assert_relative_eq!(p.at(293.15), 998.2);
        assert_relative_eq!(p.at(283.15), 999.0, max_relative = 1e-12);
        // extrapolation continues the last segment
        assert_relative_eq!(p.at(333.15), 986.2, max_relative = 1e-12);
    }

    #[test]
    fn table_validation_rejects_unsorted() {
        let p = PropertyModel::Table {
            x: vec![293.15, 273.15],
            y: vec![998.2, 999.8],
        };
        assert!(p.validate().is_err());
    }

    #[test]
    fn polynomial_evaluation() {
        let p = PropertyModel::Polynomial {
            coeffs: vec![1.0, 0.0, 2.0],
        };
        assert_relative_eq!(p.at(3.0), 19.0);
        assert_relative_eq!(p.derivative_at(3.0), 12.0);
    }
}

//! Friction factor closures and their velocity derivatives.
//!
//! All formulas work on the branch's reference-state velocity; Reynolds
//! numbers use the branch density and viscosity columns.

use pf_net::FrictionModel;

use crate::error::{PipeflowError, PipeflowResult};

/// Floor applied to |v| before computing Reynolds numbers.
const V_RE_FLOOR: f64 = 1e-6;
/// Substitute used for v in derivative denominators at v = 0.
const V_DER_FLOOR: f64 = 1e-5;

/// Friction state of one branch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Friction {
    pub reynolds: f64,
    pub lambda: f64,
    /// dλ/dv at the current velocity.
    pub der_lambda: f64,
}

/// Reynolds number with the near-zero velocity floor.
#[inline]
pub fn reynolds(v: f64, rho: f64, eta: f64, d: f64) -> f64 {
    rho * v.abs().max(V_RE_FLOOR) * d / eta
}

fn lambda_nikuradse(d: f64, k: f64, gas: bool) -> f64 {
    if gas {
        1.0 / (2.0 * (d / k).log10() + 1.14).powi(2)
    } else {
        1.0 / (-2.0 * (k / (3.71 * d)).log10()).powi(2)
    }
}

fn colebrook(
    re: f64,
    d: f64,
    k: f64,
    lambda_start: f64,
    max_iter: usize,
) -> PipeflowResult<f64> {
    // Inner Newton loop on the implicit Prandtl-Colebrook law.
    let mut lambda = lambda_start.max(1e-4);
    for _ in 0..max_iter {
        let sqrt_l = lambda.sqrt();
        let f = lambda.powf(-0.5) + 2.0 * (2.51 / (re * sqrt_l) + k / (3.71 * d)).log10();
        let df = (-0.5 * lambda.powf(-1.5))
            - (2.51 / re) * lambda.powf(-1.5)
                / (std::f64::consts::LN_10 * (2.51 / (re * sqrt_l) + k / (3.71 * d)));
        let dx = -f / df;
        lambda += dx;
        if !lambda.is_finite() || lambda <= 0.0 {
            return Err(PipeflowError::SolverError {
                what: "Colebrook iteration left the feasible region".into(),
            });
        }
        if dx.abs() <= 1e-4 {
            return Ok(lambda);
        }
    }
    Err(PipeflowError::SolverError {
        what: format!(
            "Prandtl-Colebrook friction iteration did not converge within {max_iter} iterations"
        ),
    })
}

/// Friction factor λ, its velocity derivative and the Reynolds number for
/// one branch. Zero-length branches must not call this (their friction term
/// vanishes).
pub fn friction_factor(
    v: f64,
    rho: f64,
    eta: f64,
    d: f64,
    k: f64,
    gas: bool,
    model: FrictionModel,
    max_iter_colebrook: usize,
) -> PipeflowResult<Friction> {
    let re = reynolds(v, rho, eta, d);
    let lambda_laminar = if v != 0.0 { 64.0 / re } else { 0.0 };
    let nikuradse = lambda_nikuradse(d, k, gas);
    let v_corr = if v == 0.0 { V_DER_FLOOR } else { v };

    let (lambda, der_lambda) = match model {
        FrictionModel::Nikuradse => {
            let lambda = lambda_laminar + nikuradse;
            let der = -(64.0 * eta) / (rho * v_corr * v_corr * d);
            (lambda, der)
        }
        FrictionModel::SwameeJain => {
            let lambda = 0.25 / ((k / (3.7 * d) + 5.74 / re.powf(0.9)).log10()).powi(2);
            let param = k / (3.7 * d)
                + 5.74 * eta.abs().powf(0.9) / (rho * v_corr * d).abs().powf(0.9);
            let der = 0.5 / std::f64::consts::LN_10 / param.ln().powi(3) / param * 5.166
                * eta.abs().powf(0.9)
                / ((rho * d).abs().powf(0.9) * v_corr.abs().powf(1.9));
            (lambda, der)
        }
        FrictionModel::Colebrook => {
            let lambda = colebrook(re, d, k, nikuradse, max_iter_colebrook)?;
            let b_term = 2.51 * eta / (rho * d * lambda.sqrt() * v_corr) + k / (3.71 * d);
            let df_dv = -2.0 * (2.51 * eta / (rho * lambda.sqrt() * v_corr * v_corr))
                / (std::f64::consts::LN_10 * b_term);
            let df_dlambda = -0.5 * lambda.powf(-1.5)
                - (2.51 * eta / (rho * d * v_corr)) * lambda.powf(-1.5)
                    / (std::f64::consts::LN_10 * b_term);
            (lambda, df_dv / df_dlambda)
        }
    };

    Ok(Friction {
        reynolds: re,
        lambda,
        der_lambda,
    })
}

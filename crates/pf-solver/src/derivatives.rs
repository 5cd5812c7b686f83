//! Per-branch hydraulic residuals and analytic derivatives.
//!
//! The branch momentum law is evaluated for every active branch row in one
//! pass; component-specific adaptions (controllers, pressure lifts) are
//! applied on top by [`crate::components`].
//!
//! Load-vector convention: the stored load is the *negative* residual, so
//! the Newton step solves `J·Δx = load` and updates `x += Δx`.

use pf_core::units::constants::{
    GRAVITATION_CONSTANT, NORMAL_PRESSURE, NORMAL_TEMPERATURE, P_CONVERSION,
};
use pf_fluids::Fluid;
use pf_net::PipeflowOptions;
use pf_pit::idx::{branch, node};
use pf_pit::ActivePit;

use crate::error::PipeflowResult;
use crate::friction::{friction_factor, reynolds, Friction};

/// Cubic mean pressure between the branch ends and its derivatives with
/// respect to both end pressures (ideal-gas averaged state).
pub fn medium_pressure(p_from_abs: f64, p_to_abs: f64) -> (f64, f64, f64) {
    if p_from_abs == p_to_abs {
        return (p_from_abs, 1.0, -1.0);
    }
    let p_sq = p_from_abs * p_from_abs;
    let p1_sq = p_to_abs * p_to_abs;
    let diff_sq = p_sq - p1_sq;
    let diff_cub = p_from_abs.powi(3) - p_to_abs.powi(3);
    let factor = (2.0 / 3.0) / (diff_sq * diff_sq);
    let p_m = (2.0 / 3.0) * diff_cub / diff_sq;
    let der_m = (3.0 * p_sq * diff_sq - 2.0 * p_from_abs * diff_cub) * factor;
    let der_m1 = (-3.0 * p1_sq * diff_sq + 2.0 * p_to_abs * diff_cub) * factor;
    (p_m, der_m, der_m1)
}

/// Reference-to-actual velocity factor for compressible flow.
pub fn norm_factor(fluid: &Fluid, p_abs_bar: f64, t_k: f64) -> PipeflowResult<f64> {
    let z = fluid.compressibility(p_abs_bar)?;
    Ok(NORMAL_PRESSURE * t_k * z / (p_abs_bar * NORMAL_TEMPERATURE))
}

/// Evaluate the momentum law and its derivatives for every branch row.
///
/// Writes RE, LAMBDA, T_MEAN, JAC_DV, JAC_DP_FROM, JAC_DP_TO, LOAD_VEC,
/// JAC_DV_NODE and MDOT.
pub fn hydraulic_derivatives(
    active: &mut ActivePit,
    fluid: &Fluid,
    options: &PipeflowOptions,
) -> PipeflowResult<()> {
    let gas = fluid.is_gas();
    let g = GRAVITATION_CONSTANT;

    for b in 0..active.branch.rows() {
        let from = active.branch.at_usize(b, branch::FROM);
        let to = active.branch.at_usize(b, branch::TO);

        let rho = active.branch.at(b, branch::RHO);
        let eta = active.branch.at(b, branch::ETA);
        let d = active.branch.at(b, branch::D);
        let k = active.branch.at(b, branch::K);
        let length = active.branch.at(b, branch::LENGTH);
        let loss = active.branch.at(b, branch::LOSS);
        let area = active.branch.at(b, branch::AREA);
        let pl = active.branch.at(b, branch::PL);
        let v = active.branch.at(b, branch::V);
        let v2 = v * v.abs();

        let t_mean = (active.node.at(from, node::T) + active.node.at(to, node::T)) / 2.0;
        active.branch.set(b, branch::T_MEAN, t_mean);

        let p_from_abs = active.node.at(from, node::P) + active.node.at(from, node::PAMB);
        let p_to_abs = active.node.at(to, node::P) + active.node.at(to, node::PAMB);
        let dh = active.node.at(from, node::HEIGHT) - active.node.at(to, node::HEIGHT);

        let Friction {
            reynolds: re,
            lambda,
            der_lambda,
        } = if length > 0.0 {
            friction_factor(
                v,
                rho,
                eta,
                d,
                k,
                gas,
                options.friction_model,
                options.max_iter_colebrook,
            )?
        } else {
            Friction {
                reynolds: reynolds(v, rho, eta, d),
                lambda: 0.0,
                der_lambda: 0.0,
            }
        };
        active.branch.set(b, branch::RE, re);
        active.branch.set(b, branch::LAMBDA, lambda);

        let friction_term = lambda * length / d + loss;

        if !gas {
            let const_p = rho / (2.0 * P_CONVERSION);
            let jac_dv = const_p
                * (length / d * (der_lambda * v2 + 2.0 * lambda * v.abs())
                    + 2.0 * loss * v.abs());
            let load = p_from_abs - p_to_abs + pl
                + const_p * (2.0 * g * dh - v2 * friction_term);

            active.branch.set(b, branch::JAC_DV, jac_dv);
            active.branch.set(b, branch::JAC_DP_FROM, -1.0);
            active.branch.set(b, branch::JAC_DP_TO, 1.0);
            active.branch.set(b, branch::LOAD_VEC, load);
        } else {
            let (p_m, der_p_m, der_p_m1) = medium_pressure(p_from_abs, p_to_abs);
            let comp_fact = fluid.compressibility(p_m)?;
            let der_comp_fact = fluid.der_compressibility(p_m)?;
            let der_comp = der_comp_fact * der_p_m;
            let der_comp1 = der_comp_fact * der_p_m1;

            let p_sum = p_from_abs + p_to_abs;
            let const_lambda =
                NORMAL_PRESSURE * rho * t_mean / (NORMAL_TEMPERATURE * P_CONVERSION);
            let const_height = rho * NORMAL_TEMPERATURE * g * dh
                / (2.0 * NORMAL_PRESSURE * t_mean * P_CONVERSION);

            let load = (p_from_abs - p_to_abs) + pl + const_height * p_sum
                - const_lambda * comp_fact * v2 * friction_term / p_sum;

            let p_deriv = const_lambda * v2 * friction_term / p_sum;
            let jac_dp = -1.0 + p_deriv * (der_comp - comp_fact / p_sum) + const_height;
            let jac_dp1 = 1.0 + p_deriv * (der_comp1 - comp_fact / p_sum) + const_height;
            let jac_dv = 2.0 * const_lambda * comp_fact / p_sum * v.abs() * friction_term
                + const_lambda * comp_fact * der_lambda * length * v2 / (p_sum * d);

            active.branch.set(b, branch::JAC_DV, jac_dv);
            active.branch.set(b, branch::JAC_DP_FROM, jac_dp);
            active.branch.set(b, branch::JAC_DP_TO, jac_dp1);
            active.branch.set(b, branch::LOAD_VEC, load);
        }

        let mass_flow_dv = rho * area;
        active.branch.set(b, branch::JAC_DV_NODE, mass_flow_dv);
        active.branch.set(b, branch::MDOT, mass_flow_dv * v);
    }

    Ok(())
}

/// Refresh temperature-dependent fluid state on both pits.
///
/// Used between the outer passes of a bidirectional solve where the thermal
/// result feeds back into density, viscosity and heat capacity.
pub fn refresh_fluid_state(active: &mut ActivePit, fluid: &Fluid) -> PipeflowResult<()> {
    for n in 0..active.node.rows() {
        let t = active.node.at(n, node::T);
        active.node.set(n, node::RHO, fluid.density(t)?);
    }
    for b in 0..active.branch.rows() {
        let from = active.branch.at_usize(b, branch::FROM);
        let to = active.branch.at_usize(b, branch::TO);
        let t_mean = (active.node.at(from, node::T) + active.node.at(to, node::T)) / 2.0;
        active.branch.set(b, branch::T_MEAN, t_mean);
        active.branch.set(b, branch::RHO, fluid.density(t_mean)?);
        active.branch.set(b, branch::ETA, fluid.viscosity(t_mean)?);
        active.branch.set(b, branch::CP, fluid.heat_capacity(t_mean)?);
    }
    Ok(())
}

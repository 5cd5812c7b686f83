//! The thermal solver: nodal mixing temperatures and branch outlet
//! temperatures on the directed flow field left by the hydraulics.

use log::{debug, info, warn};
use pf_fluids::Fluid;
use pf_net::{Network, PipeflowOptions, ZeroFlowPolicy};
use pf_pit::idx::{branch, node};
use pf_pit::{ActivePit, BranchKind};

use crate::components::{self, ComponentContext};
use crate::error::{PipeflowError, PipeflowResult};
use crate::hydraulics::Damping;
use crate::matrix::{thermal_system, Assembler};

/// Convergence report of one thermal solve.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThermalReport {
    pub iterations: usize,
    pub residual_norm: f64,
    pub error_t: f64,
    /// Number of branches skipped because they carry no mass flow.
    pub skipped_zero_flow: usize,
}

/// Evaluate the heat-transport law and its derivatives for every branch.
///
/// Branches of kinds that do not adapt temperature propagate `T_in + TL`
/// unchanged; so do branches without mass flow under the lenient policy.
fn thermal_derivatives(
    active: &mut ActivePit,
    options: &PipeflowOptions,
) -> PipeflowResult<usize> {
    let mut skipped = 0usize;

    for b in 0..active.branch.rows() {
        let kind = BranchKind::from_table_tag(active.branch.at(b, branch::TABLE));
        let from_t = active.branch.at_usize(b, branch::FROM_T);
        let t_in = active.node.at(from_t, node::T);
        let t_out = active.branch.at(b, branch::T_OUT);
        let tl = active.branch.at(b, branch::TL);
        let mdot = active.branch.at(b, branch::MDOT_T);

        let adapts = kind.map(|k| k.adapts_temperature()).unwrap_or(false);

        if adapts && mdot < options.tol_m {
            match options.zero_flow_policy {
                ZeroFlowPolicy::Strict => {
                    return Err(PipeflowError::ThermalSingularity { branch: b });
                }
                ZeroFlowPolicy::WarnAndSkip => skipped += 1,
            }
        }

        if !adapts || mdot < options.tol_m {
            // Pure propagation: T_out = T_in + TL.
            active.branch.set(b, branch::JAC_DT_IN, -1.0);
            active.branch.set(b, branch::JAC_DT_OUT, 1.0);
            active.branch.set(b, branch::LOAD_VEC_T, -(t_out - t_in - tl));
            continue;
        }

        let cp = active.branch.at(b, branch::CP);
        let alpha_eff = active.branch.at(b, branch::ALPHA)
            * std::f64::consts::PI
            * active.branch.at(b, branch::D);
        let length = active.branch.at(b, branch::LENGTH);
        let t_amb = active.branch.at(b, branch::TEXT);
        let qext = active.branch.at(b, branch::QEXT);
        let t_m = (t_in + t_out) / 2.0;

        let residual =
            mdot * cp * (t_out - t_in - tl) - alpha_eff * (t_amb - t_m) * length + qext;
        active.branch.set(b, branch::LOAD_VEC_T, -residual);
        active
            .branch
            .set(b, branch::JAC_DT_IN, -mdot * cp + alpha_eff * length / 2.0);
        active
            .branch
            .set(b, branch::JAC_DT_OUT, mdot * cp + alpha_eff * length / 2.0);
    }

    Ok(skipped)
}

/// Run the Newton iteration for nodal and branch outlet temperatures.
pub fn solve_thermal(
    net: &Network,
    active: &mut ActivePit,
    ctx: &ComponentContext,
    options: &PipeflowOptions,
) -> PipeflowResult<ThermalReport> {
    let n = active.node.rows();
    let nb = active.branch.rows();
    if n == 0 {
        return Ok(ThermalReport::default());
    }

    let fluid: &Fluid = net.fluid();
    components::thermal_pre_step(active, ctx, fluid)?;

    let mut assembler = Assembler::new(
        options.only_update_hydraulic_matrix || options.use_numerical_acceleration,
    );
    let mut damping = Damping::new(options.nonlinear_method);
    let mut report = ThermalReport::default();

    for iter in 0..=options.max_iter_thermal {
        let skipped = thermal_derivatives(active, options)?;
        if iter == 0 && skipped > 0 {
            warn!(
                "thermal solve: {skipped} branch(es) without mass flow kept at T_out = T_in"
            );
        }

        let system = thermal_system(active, options.tol_m);
        let residual_norm = system.rhs.amax();
        let dx = assembler.solve(&system).map_err(|e| match e {
            PipeflowError::SolverError { what } => PipeflowError::SolverError {
                what: format!("thermal system: {what}"),
            },
            other => other,
        })?;

        let t_old = active.node.col(node::T);
        let t_out_old = active.branch.col(branch::T_OUT);

        for i in 0..n {
            active.node.set(i, node::T, t_old[i] + damping.alpha * dx[i]);
        }
        for b in 0..nb {
            active
                .branch
                .set(b, branch::T_OUT, t_out_old[b] + dx[n + b]);
        }

        let mut error_t_node = 0.0_f64;
        for i in 0..n {
            let t = active.node.at(i, node::T);
            if !t.is_finite() {
                return Err(PipeflowError::SolverError {
                    what: format!("non-finite temperature at active node {i}"),
                });
            }
            error_t_node = error_t_node.max((t - t_old[i]).abs());
        }
        let mut error_t_out = 0.0_f64;
        for b in 0..nb {
            let t = active.branch.at(b, branch::T_OUT);
            if !t.is_finite() {
                return Err(PipeflowError::SolverError {
                    what: format!("non-finite outlet temperature at active branch {b}"),
                });
            }
            error_t_out = error_t_out.max((t - t_out_old[b]).abs());
        }

        let (t_grew, t_out_grew) = damping.update(error_t_node, error_t_out);
        if t_grew {
            active.node.set_col(node::T, &t_old);
        }
        if t_out_grew {
            active.branch.set_col(branch::T_OUT, &t_out_old);
        }

        let error_t = error_t_node.max(error_t_out);
        report = ThermalReport {
            iterations: iter + 1,
            residual_norm,
            error_t,
            skipped_zero_flow: skipped,
        };
        debug!(
            "thermal iter {iter}: residual={residual_norm:.3e} error_t={error_t:.3e} alpha={}",
            damping.alpha
        );

        if error_t <= options.tol_t
            && residual_norm <= options.tol_res
            && damping.accepts_convergence()
        {
            info!(
                "thermal solve converged after {} iterations (residual {:.3e})",
                iter + 1,
                residual_norm
            );
            return Ok(report);
        }
    }

    Err(PipeflowError::ThermalNoConvergence {
        iterations: report.iterations,
        residual_norm: report.residual_norm,
        error_t: report.error_t,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pf_core::units::{bar, k, kgps, m};
    use pf_net::{CalculationMode, ExtGrid, Junction, Network, Pipe, Sink};
    use pf_pit::{build_pit, check_connectivity, reduce_pit};

    /// Water at 1 kg/s through a cooled pipe; the outlet temperature must
    /// follow the exponential decay law within the sectioning error.
    #[test]
    fn pipe_cooling_approaches_exponential_decay() {
        let mut net = Network::new(pf_fluids::water());
        let j0 = net.add_junction(Junction::new(bar(5.0), k(363.15)));
        let j1 = net.add_junction(Junction::new(bar(5.0), k(363.15)));
        net.add_pipe(
            Pipe::new(j0, j1, m(200.0), m(0.05))
                .with_sections(10)
                .with_heat_transfer(20.0, k(283.15)),
        );
        net.add_ext_grid(ExtGrid::new_pt(j0, bar(5.0), k(363.15)));
        net.add_sink(Sink::new(j1, kgps(1.0)));

        let options = PipeflowOptions::with_mode(CalculationMode::Sequential);
        let ws = build_pit(&net, &options, None).unwrap();
        let (nodes, branches) = check_connectivity(&ws.node_pit, &ws.branch_pit, true).unwrap();
        let mut active = reduce_pit(&ws.node_pit, &ws.branch_pit, nodes, branches);
        let ctx = ComponentContext::build(&net, &active);
        crate::hydraulics::solve_hydraulics(&net, &mut active, &ctx, &options).unwrap();
        let report = solve_thermal(&net, &mut active, &ctx, &options).unwrap();
        assert!(report.iterations > 0);

        let t_end = active.node.at(1, node::T);
        let cp = net.fluid().heat_capacity(323.0).unwrap();
        let decay = (-20.0 * std::f64::consts::PI * 0.05 * 200.0 / (1.0 * cp)).exp();
        let expected = 283.15 + (363.15 - 283.15) * decay;
        assert_relative_eq!(t_end, expected, epsilon = 0.1);
    }

    /// A closed-off side branch carries no flow; the lenient policy keeps
    /// its outlet at the inlet temperature instead of failing.
    #[test]
    fn zero_flow_branch_is_skipped_with_warning() {
        let mut net = Network::new(pf_fluids::water());
        let j0 = net.add_junction(Junction::new(bar(5.0), k(330.0)));
        let j1 = net.add_junction(Junction::new(bar(5.0), k(330.0)));
        let j2 = net.add_junction(Junction::new(bar(5.0), k(330.0)));
        net.add_pipe(Pipe::new(j0, j1, m(10.0), m(0.05)));
        // dead-end pipe: no sink behind it, so it carries no flow
        net.add_pipe(Pipe::new(j1, j2, m(10.0), m(0.05)));
        net.add_ext_grid(ExtGrid::new_pt(j0, bar(5.0), k(330.0)));
        net.add_sink(Sink::new(j1, kgps(0.5)));

        let options = PipeflowOptions::with_mode(CalculationMode::Sequential);
        let ws = build_pit(&net, &options, None).unwrap();
        let (nodes, branches) = check_connectivity(&ws.node_pit, &ws.branch_pit, true).unwrap();
        let mut active = reduce_pit(&ws.node_pit, &ws.branch_pit, nodes, branches);
        let ctx = ComponentContext::build(&net, &active);
        crate::hydraulics::solve_hydraulics(&net, &mut active, &ctx, &options).unwrap();
        let report = solve_thermal(&net, &mut active, &ctx, &options).unwrap();
        assert!(report.skipped_zero_flow >= 1);
    }

    /// The strict policy turns the same situation into an error.
    #[test]
    fn zero_flow_branch_fails_under_strict_policy() {
        let mut net = Network::new(pf_fluids::water());
        let j0 = net.add_junction(Junction::new(bar(5.0), k(330.0)));
        let j1 = net.add_junction(Junction::new(bar(5.0), k(330.0)));
        let j2 = net.add_junction(Junction::new(bar(5.0), k(330.0)));
        net.add_pipe(Pipe::new(j0, j1, m(10.0), m(0.05)));
        net.add_pipe(Pipe::new(j1, j2, m(10.0), m(0.05)));
        net.add_ext_grid(ExtGrid::new_pt(j0, bar(5.0), k(330.0)));
        net.add_sink(Sink::new(j1, kgps(0.5)));

        let mut options = PipeflowOptions::with_mode(CalculationMode::Sequential);
        options.zero_flow_policy = ZeroFlowPolicy::Strict;
        let ws = build_pit(&net, &options, None).unwrap();
        let (nodes, branches) = check_connectivity(&ws.node_pit, &ws.branch_pit, true).unwrap();
        let mut active = reduce_pit(&ws.node_pit, &ws.branch_pit, nodes, branches);
        let ctx = ComponentContext::build(&net, &active);
        crate::hydraulics::solve_hydraulics(&net, &mut active, &ctx, &options).unwrap();
        assert!(matches!(
            solve_thermal(&net, &mut active, &ctx, &options),
            Err(PipeflowError::ThermalSingularity { .. })
        ));
    }
}

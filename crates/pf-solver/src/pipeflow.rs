//! The `pipeflow` entry point: one complete steady-state solve.

use log::{info, warn};
use pf_core::numeric::max_abs_diff;
use pf_net::{CalculationMode, Network, PipeflowOptions, SolveRecord};
use pf_pit::idx::{branch, node};
use pf_pit::{build_pit, check_connectivity, reduce_pit, ActivePit, Workspace};

use crate::components::ComponentContext;
use crate::derivatives::refresh_fluid_state;
use crate::error::{PipeflowError, PipeflowResult};
use crate::hydraulics::{solve_hydraulics, HydraulicReport};
use crate::thermal::{solve_thermal, ThermalReport};

/// Run one steady-state solve on the network.
///
/// On success the result tables are filled and `net.converged` is set; on
/// failure the result tables are cleared, cached internals are invalidated
/// and the error is returned. The network's service flags are never
/// mutated; out-of-service decisions of the connectivity check live only in
/// the solve-scoped tables.
pub fn pipeflow(net: &mut Network, options: &PipeflowOptions) -> PipeflowResult<()> {
    net.converged = false;

    match run(net, options) {
        Ok(record) => {
            net.record = record;
            net.converged = true;
            Ok(())
        }
        Err(e) => {
            net.res.clear();
            net.solver_cache.invalidate();
            Err(e)
        }
    }
}

fn run(net: &mut Network, options: &PipeflowOptions) -> PipeflowResult<SolveRecord> {
    let previous = net.solver_cache.take::<Workspace>();
    let mut ws = build_pit(net, options, previous.as_ref())?;

    // An empty network solves trivially to empty result tables.
    if ws.lookups.n_nodes == 0 {
        let counts = net.result_counts();
        net.res.reset(&counts);
        return Ok(SolveRecord::default());
    }

    let thermal = options.thermal_requested();
    let (nodes_connected, branches_connected) = if options.check_connectivity {
        check_connectivity(&ws.node_pit, &ws.branch_pit, thermal)?
    } else {
        let nodes = (0..ws.node_pit.rows())
            .map(|n| ws.node_pit.at(n, node::ACTIVE) != 0.0)
            .collect::<Vec<_>>();
        let branches = (0..ws.branch_pit.rows())
            .map(|b| {
                ws.branch_pit.at(b, branch::ACTIVE) != 0.0
                    && nodes[ws.branch_pit.at_usize(b, branch::FROM)]
                    && nodes[ws.branch_pit.at_usize(b, branch::TO)]
            })
            .collect::<Vec<_>>();
        (nodes, branches)
    };

    let mut active = reduce_pit(
        &ws.node_pit,
        &ws.branch_pit,
        nodes_connected,
        branches_connected,
    );
    let ctx = ComponentContext::build(net, &active);

    let mut hyd_report = HydraulicReport::default();
    let mut thermal_report = ThermalReport::default();

    match options.mode {
        CalculationMode::Hydraulics => {
            hyd_report = solve_hydraulics(net, &mut active, &ctx, options)?;
            ws.hydraulics_valid = true;
        }
        CalculationMode::Sequential => {
            hyd_report = solve_hydraulics(net, &mut active, &ctx, options)?;
            ws.hydraulics_valid = true;
            thermal_report = solve_thermal(net, &mut active, &ctx, options)?;
        }
        CalculationMode::Heat => {
            if ws.hydraulics_valid {
                // Refresh the derived hydraulic columns (mass flows,
                // friction data) for the warm-started velocities.
                crate::components::hydraulic_pre_step(net, &mut active, &ctx, net.fluid())?;
                crate::derivatives::hydraulic_derivatives(&mut active, net.fluid(), options)?;
                crate::components::adapt_after_derivatives(&mut active, &ctx);
            } else {
                warn!(
                    "heat mode without a previous hydraulic solution; \
                     running hydraulics first"
                );
                hyd_report = solve_hydraulics(net, &mut active, &ctx, options)?;
                ws.hydraulics_valid = true;
            }
            thermal_report = solve_thermal(net, &mut active, &ctx, options)?;
        }
        CalculationMode::Bidirectional => {
            let (h, t) = solve_bidirectional(net, &mut active, &ctx, options)?;
            hyd_report = h;
            thermal_report = t;
            ws.hydraulics_valid = true;
        }
    }

    active.scatter_back(&mut ws.node_pit, &mut ws.branch_pit);
    ws.previous_solution_present = true;

    pf_results::extract_results(net, &ws, options)?;

    let record = SolveRecord {
        iterations_hydraulic: hyd_report.iterations,
        iterations_thermal: thermal_report.iterations,
        residual_norm: hyd_report.residual_norm,
        residual_norm_thermal: thermal_report.residual_norm,
        error_p: hyd_report.error_p,
        error_m: hyd_report.error_m,
        error_t: thermal_report.error_t,
    };

    net.solver_cache.put(ws);
    Ok(record)
}

/// Alternate hydraulic and thermal passes until pressures, mass flows and
/// temperatures all stop moving in the same outer iteration.
fn solve_bidirectional(
    net: &Network,
    active: &mut ActivePit,
    ctx: &ComponentContext,
    options: &PipeflowOptions,
) -> PipeflowResult<(HydraulicReport, ThermalReport)> {
    let fluid = net.fluid();
    let mut hyd_report = HydraulicReport::default();
    let mut thermal_report = ThermalReport::default();

    let mut p_prev = active.node.col(node::P);
    let mut t_prev = active.node.col(node::T);
    let mut m_prev = active.branch.col(branch::MDOT);

    for outer in 0..options.max_iter_coupled {
        hyd_report = solve_hydraulics(net, active, ctx, options)?;
        thermal_report = solve_thermal(net, active, ctx, options)?;
        refresh_fluid_state(active, fluid)?;

        let p_now = active.node.col(node::P);
        let t_now = active.node.col(node::T);
        let m_now = active.branch.col(branch::MDOT);
        let dp = max_abs_diff(&p_now, &p_prev);
        let dt = max_abs_diff(&t_now, &t_prev);
        let dm = max_abs_diff(&m_now, &m_prev);
        info!(
            "bidirectional outer {outer}: dp={dp:.3e} dm={dm:.3e} dt={dt:.3e}"
        );

        if dp <= options.tol_p && dm <= options.tol_m && dt <= options.tol_t {
            return Ok((hyd_report, thermal_report));
        }
        p_prev = p_now;
        t_prev = t_now;
        m_prev = m_now;
    }

    Err(PipeflowError::NoConvergence {
        iterations: options.max_iter_coupled,
        residual_norm: hyd_report.residual_norm.max(thermal_report.residual_norm),
        error_p: hyd_report.error_p,
        error_m: hyd_report.error_m,
    })
}

//! Scatter the solved pit state into the user-facing result tables.

use pf_core::units::constants::{
    NORMAL_PRESSURE, NORMAL_TEMPERATURE, P_CONVERSION,
};
use pf_fluids::{Fluid, FluidResult};
use pf_net::{Network, PipeflowOptions, ResBranch, ResCircPump, ResExtGrid, ResPump};
use pf_pit::idx::{branch, node};
use pf_pit::{BranchKind, Workspace};

/// Reference-to-actual velocity factor at (p_abs, T).
fn norm_factor(fluid: &Fluid, p_abs_bar: f64, t_k: f64) -> FluidResult<f64> {
    let z = fluid.compressibility(p_abs_bar)?;
    Ok(NORMAL_PRESSURE * t_k * z / (p_abs_bar * NORMAL_TEMPERATURE))
}

/// Cubic mean pressure used to report mean gas velocities.
fn mean_pressure(p_from_abs: f64, p_to_abs: f64) -> f64 {
    if p_from_abs == p_to_abs {
        p_from_abs
    } else {
        2.0 / 3.0 * (p_from_abs.powi(3) - p_to_abs.powi(3))
            / (p_from_abs.powi(2) - p_to_abs.powi(2))
    }
}

/// Results of one branch pit row, referenced to the given junction rows.
fn branch_row_results(
    ws: &Workspace,
    fluid: &Fluid,
    row: usize,
    from_junction: usize,
    to_junction: usize,
) -> FluidResult<ResBranch> {
    let bp = &ws.branch_pit;
    let np = &ws.node_pit;

    let v = bp.at(row, branch::V);
    if !v.is_finite() {
        // out of service in this solve
        return Ok(ResBranch::default());
    }

    let mdot = bp.at(row, branch::MDOT);
    let rho = bp.at(row, branch::RHO);
    let mut res = ResBranch {
        p_from_bar: np.at(from_junction, node::P),
        p_to_bar: np.at(to_junction, node::P),
        t_from_k: np.at(from_junction, node::T),
        t_to_k: np.at(to_junction, node::T),
        t_outlet_k: bp.at(row, branch::T_OUT),
        mdot_from_kg_per_s: mdot,
        mdot_to_kg_per_s: -mdot,
        vdot_m3_per_s: mdot / rho,
        reynolds: bp.at(row, branch::RE),
        lambda: bp.at(row, branch::LAMBDA),
        ..ResBranch::default()
    };

    if fluid.is_gas() {
        let from = bp.at_usize(row, branch::FROM);
        let to = bp.at_usize(row, branch::TO);
        let t_mean = bp.at(row, branch::T_MEAN);
        let p_from_abs = np.at(from, node::P) + np.at(from, node::PAMB);
        let p_to_abs = np.at(to, node::P) + np.at(to, node::PAMB);
        let nf_from = norm_factor(fluid, p_from_abs, t_mean)?;
        let nf_to = norm_factor(fluid, p_to_abs, t_mean)?;
        let nf_mean = norm_factor(fluid, mean_pressure(p_from_abs, p_to_abs), t_mean)?;
        res.v_from_m_per_s = v * nf_from;
        res.v_to_m_per_s = v * nf_to;
        res.v_mean_m_per_s = v * nf_mean;
        res.normfactor_from = nf_from;
        res.normfactor_to = nf_to;
    } else {
        res.v_from_m_per_s = v;
        res.v_to_m_per_s = v;
        res.v_mean_m_per_s = v;
    }

    Ok(res)
}

/// Average a set of per-section results into one pipe row.
fn aggregate_sections(rows: Vec<ResBranch>) -> ResBranch {
    let n = rows.len() as f64;
    let first = rows.first().cloned().unwrap_or_default();
    let last = rows.last().cloned().unwrap_or_default();
    let mean = |f: fn(&ResBranch) -> f64| rows.iter().map(f).sum::<f64>() / n;
    ResBranch {
        v_mean_m_per_s: mean(|r| r.v_mean_m_per_s),
        v_from_m_per_s: first.v_from_m_per_s,
        v_to_m_per_s: last.v_to_m_per_s,
        p_from_bar: first.p_from_bar,
        p_to_bar: first.p_to_bar,
        t_from_k: first.t_from_k,
        t_to_k: first.t_to_k,
        t_outlet_k: last.t_outlet_k,
        mdot_from_kg_per_s: mean(|r| r.mdot_from_kg_per_s),
        mdot_to_kg_per_s: mean(|r| r.mdot_to_kg_per_s),
        vdot_m3_per_s: mean(|r| r.vdot_m3_per_s),
        reynolds: mean(|r| r.reynolds),
        lambda: mean(|r| r.lambda),
        normfactor_from: first.normfactor_from,
        normfactor_to: last.normfactor_to,
    }
}

/// Slack mass flow a boundary must feed into the given junction row:
/// net branch outflow plus the nodal demand.
fn slack_flow(ws: &Workspace, junction_row: usize) -> f64 {
    let bp = &ws.branch_pit;
    let mut flow = ws.node_pit.at(junction_row, node::LOAD);
    for b in 0..bp.rows() {
        let mdot = bp.at(b, branch::MDOT);
        if !mdot.is_finite() {
            continue;
        }
        if bp.at_usize(b, branch::FROM) == junction_row {
            flow += mdot;
        }
        if bp.at_usize(b, branch::TO) == junction_row {
            flow -= mdot;
        }
    }
    flow
}

/// Heat duty needed at a temperature-pinned junction row, in W: the power
/// that lifts all incoming flows to the pinned temperature.
fn slack_heat(ws: &Workspace, fluid: &Fluid, junction_row: usize) -> FluidResult<f64> {
    let bp = &ws.branch_pit;
    let t_node = ws.node_pit.at(junction_row, node::T);
    let cp = fluid.heat_capacity(t_node)?;
    let mut q = 0.0;
    for b in 0..bp.rows() {
        let mdot = bp.at(b, branch::MDOT_T);
        if !mdot.is_finite() || mdot <= 0.0 {
            continue;
        }
        if bp.at_usize(b, branch::TO_T) == junction_row {
            q += mdot * cp * (t_node - bp.at(b, branch::T_OUT));
        }
    }
    Ok(q)
}

/// Fill every result table from the solved workspace.
pub fn extract_results(
    net: &mut Network,
    ws: &Workspace,
    options: &PipeflowOptions,
) -> FluidResult<()> {
    let fluid = net.fluid().clone();
    let counts = net.result_counts();
    net.res.reset(&counts);
    let thermal = options.thermal_requested();

    // Junctions: node rows coincide with junction indices.
    for j in 0..net.junctions.len() {
        net.res.junction[j].p_bar = ws.node_pit.at(j, node::P);
        net.res.junction[j].t_k = ws.node_pit.at(j, node::T);
    }

    // Pipes: aggregate per-section rows, keep interior state.
    for (i, pipe) in net.pipes.iter().enumerate() {
        let (bf, bt) = ws.lookups.pipe_branches[i];
        let from_j = pipe.from.index() as usize;
        let to_j = pipe.to.index() as usize;
        if (bf..bt).any(|b| !ws.branch_pit.at(b, branch::V).is_finite()) {
            continue; // keeps the NaN row
        }
        let mut section_rows = Vec::with_capacity(bt - bf);
        for b in bf..bt {
            section_rows.push(branch_row_results(ws, &fluid, b, from_j, to_j)?);
        }
        net.res.pipe[i] = aggregate_sections(section_rows);

        let (nf, nt) = ws.lookups.pipe_internal_nodes[i];
        let internals = &mut net.res.pipe_internals[i];
        internals.p_bar = (nf..nt).map(|n| ws.node_pit.at(n, node::P)).collect();
        internals.t_k = (nf..nt).map(|n| ws.node_pit.at(n, node::T)).collect();
        internals.v_m_per_s = (bf..bt).map(|b| ws.branch_pit.at(b, branch::V)).collect();
    }

    // Single-row branch kinds.
    let single_row = |kind: BranchKind, i: usize| ws.lookups.group(kind).0 + i;

    for (i, v) in net.valves.iter().enumerate() {
        let row = single_row(BranchKind::Valve, i);
        net.res.valve[i] = branch_row_results(
            ws,
            &fluid,
            row,
            v.from.index() as usize,
            v.to.index() as usize,
        )?;
    }

    for (i, p) in net.pumps.iter().enumerate() {
        let row = single_row(BranchKind::Pump, i);
        let res = branch_row_results(
            ws,
            &fluid,
            row,
            p.from.index() as usize,
            p.to.index() as usize,
        )?;
        let deltap = ws.branch_pit.at(row, branch::PL);
        let mut extra = ResPump::default();
        if res.mdot_from_kg_per_s.is_finite() {
            extra.deltap_bar = deltap;
            // hydraulic power of the lift
            extra.power_w = deltap * P_CONVERSION * res.vdot_m3_per_s.abs();
        }
        net.res.pump[i] = res;
        net.res.pump_extra[i] = extra;
    }

    for (i, c) in net.compressors.iter().enumerate() {
        let row = single_row(BranchKind::Compressor, i);
        let from_j = c.from.index() as usize;
        let to_j = c.to.index() as usize;
        let res = branch_row_results(ws, &fluid, row, from_j, to_j)?;
        let mut extra = ResPump::default();
        if res.mdot_from_kg_per_s.is_finite() {
            extra.deltap_bar = ws.branch_pit.at(row, branch::PL);
            extra.power_w = if res.mdot_from_kg_per_s > 0.0 {
                let from = ws.branch_pit.at_usize(row, branch::FROM);
                let to = ws.branch_pit.at_usize(row, branch::TO);
                let p_from_abs = ws.node_pit.at(from, node::P) + ws.node_pit.at(from, node::PAMB);
                let p_to_abs = ws.node_pit.at(to, node::P) + ws.node_pit.at(to, node::PAMB);
                let t_in = ws.node_pit.at(from, node::T);
                let kappa = fluid.isentropic_exponent(t_in)?;
                let rs = fluid.specific_gas_constant()?;
                let ratio = (p_to_abs / p_from_abs).max(1.0);
                res.mdot_from_kg_per_s * kappa / (kappa - 1.0) * rs * t_in
                    * (ratio.powf((kappa - 1.0) / kappa) - 1.0)
            } else {
                0.0
            };
        }
        net.res.compressor[i] = res;
        net.res.compressor_extra[i] = extra;
    }

    for (i, h) in net.heat_exchangers.iter().enumerate() {
        let row = single_row(BranchKind::HeatExchanger, i);
        net.res.heat_exchanger[i] = branch_row_results(
            ws,
            &fluid,
            row,
            h.from.index() as usize,
            h.to.index() as usize,
        )?;
    }

    for (i, h) in net.heat_consumers.iter().enumerate() {
        let row = single_row(BranchKind::HeatConsumer, i);
        net.res.heat_consumer[i] = branch_row_results(
            ws,
            &fluid,
            row,
            h.from.index() as usize,
            h.to.index() as usize,
        )?;
    }

    for (i, f) in net.flow_controls.iter().enumerate() {
        let row = single_row(BranchKind::FlowControl, i);
        net.res.flow_control[i] = branch_row_results(
            ws,
            &fluid,
            row,
            f.from.index() as usize,
            f.to.index() as usize,
        )?;
    }

    for (i, p) in net.pressure_controls.iter().enumerate() {
        let row = single_row(BranchKind::PressureControl, i);
        net.res.pressure_control[i] = branch_row_results(
            ws,
            &fluid,
            row,
            p.from.index() as usize,
            p.to.index() as usize,
        )?;
    }

    // External grids: slack flows, and heat duties where temperature is
    // pinned and a thermal pass ran.
    for (i, eg) in net.ext_grids.iter().enumerate() {
        if !eg.in_service {
            continue;
        }
        let j = eg.junction.index() as usize;
        if !ws.node_pit.at(j, node::P).is_finite() {
            continue;
        }
        let mut res = ResExtGrid::default();
        if eg.kind.fixes_pressure() {
            let hits = ws.node_pit.at(j, node::SLACK_HITS).max(1.0);
            res.mdot_kg_per_s = slack_flow(ws, j) / hits;
        }
        if thermal && eg.kind.fixes_temperature() {
            let hits = ws.node_pit.at(j, node::SLACK_HITS_T).max(1.0);
            res.q_kw = slack_heat(ws, &fluid, j)? / hits / 1000.0;
        }
        net.res.ext_grid[i] = res;
    }

    // Circulation pumps: slack flow on the flow side, lift across the loop.
    for (i, cp) in net.circ_pumps_mass.iter().enumerate() {
        if !cp.in_service {
            continue;
        }
        let flow_j = cp.flow_junction.index() as usize;
        let ret_j = cp.return_junction.index() as usize;
        if !ws.node_pit.at(flow_j, node::P).is_finite() {
            continue;
        }
        net.res.circ_pump_mass[i] = ResCircPump {
            mdot_kg_per_s: slack_flow(ws, flow_j),
            deltap_bar: ws.node_pit.at(flow_j, node::P) - ws.node_pit.at(ret_j, node::P),
        };
    }
    for (i, cp) in net.circ_pumps_pressure.iter().enumerate() {
        if !cp.in_service {
            continue;
        }
        let flow_j = cp.flow_junction.index() as usize;
        let ret_j = cp.return_junction.index() as usize;
        if !ws.node_pit.at(flow_j, node::P).is_finite() {
            continue;
        }
        net.res.circ_pump_pressure[i] = ResCircPump {
            mdot_kg_per_s: slack_flow(ws, flow_j),
            deltap_bar: ws.node_pit.at(flow_j, node::P) - ws.node_pit.at(ret_j, node::P),
        };
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn mean_pressure_reduces_to_endpoint_for_equal_ends() {
        assert_relative_eq!(mean_pressure(4.0, 4.0), 4.0);
        let p_m = mean_pressure(6.0, 4.0);
        assert!(p_m > 5.0 && p_m < 6.0);
    }

    #[test]
    fn norm_factor_scales_inverse_with_pressure() {
        let fluid = pf_fluids::air();
        let nf1 = norm_factor(&fluid, 1.01325, 273.15).unwrap();
        let nf2 = norm_factor(&fluid, 2.0265, 273.15).unwrap();
        assert_relative_eq!(nf1 / nf2, 2.0, max_relative = 1e-12);
    }
}

//! Component-specific contributions on top of the generic branch law.
//!
//! The solver iterates over (kind, contiguous pit slice) pairs; everything
//! a kind needs beyond the generic momentum/heat law happens here: pump and
//! compressor pressure lifts before each iteration, controller rows after
//! the derivative pass, compressor temperature lift before the thermal
//! pass.

use log::warn;
use pf_core::units::in_kgps;
use pf_fluids::Fluid;
use pf_net::Network;
use pf_pit::idx::{branch, node};
use pf_pit::{ActivePit, BranchKind};

use crate::derivatives::{medium_pressure, norm_factor};
use crate::error::PipeflowResult;

/// Per-solve component bookkeeping on the active pit.
#[derive(Debug, Default)]
pub struct ComponentContext {
    /// Active pump rows with their element indices.
    pub pump_rows: Vec<(usize, usize)>,
    /// Active compressor rows with their element indices.
    pub compressor_rows: Vec<(usize, usize)>,
    /// Rows whose mass flow is pinned (flow controllers, heat consumers),
    /// with the controlled flow in kg/s.
    pub controlled_flow_rows: Vec<(usize, f64)>,
    /// Pressure-control rows with the active node row they pin.
    pub pc_rows: Vec<(usize, usize)>,
}

impl ComponentContext {
    /// Scan the active branch pit and resolve element references.
    pub fn build(net: &Network, active: &ActivePit) -> Self {
        let mut ctx = ComponentContext::default();
        for b in 0..active.branch.rows() {
            let kind = match BranchKind::from_table_tag(active.branch.at(b, branch::TABLE)) {
                Some(kind) => kind,
                None => continue,
            };
            let element = active.branch.at_usize(b, branch::ELEMENT);
            match kind {
                BranchKind::Pump => ctx.pump_rows.push((b, element)),
                BranchKind::Compressor => ctx.compressor_rows.push((b, element)),
                BranchKind::FlowControl => {
                    let fc = &net.flow_controls[element];
                    if fc.control_active {
                        ctx.controlled_flow_rows
                            .push((b, in_kgps(fc.controlled_mdot)));
                    }
                }
                BranchKind::HeatConsumer => {
                    let hc = &net.heat_consumers[element];
                    ctx.controlled_flow_rows
                        .push((b, in_kgps(hc.controlled_mdot)));
                }
                BranchKind::PressureControl => {
                    let pc = &net.pressure_controls[element];
                    if !pc.control_active {
                        continue;
                    }
                    let full_node = pc.controlled_junction.index() as usize;
                    let active_node = active.node_full_to_active[full_node];
                    if active_node == usize::MAX {
                        warn!(
                            "press_control[{element}] controls an out-of-service junction; \
                             treating it as an open branch"
                        );
                        continue;
                    }
                    ctx.pc_rows.push((b, active_node));
                }
                _ => {}
            }
        }
        ctx
    }
}

/// Update component state that depends on the current iterate.
pub fn hydraulic_pre_step(
    net: &Network,
    active: &mut ActivePit,
    ctx: &ComponentContext,
    fluid: &Fluid,
) -> PipeflowResult<()> {
    // Pumps: pressure lift from the characteristic at the current volume
    // flow; zero on reverse flow or beyond the curve range.
    for &(b, element) in &ctx.pump_rows {
        let v = active.branch.at(b, branch::V);
        let area = active.branch.at(b, branch::AREA);
        let v_mean = if fluid.is_gas() {
            let from = active.branch.at_usize(b, branch::FROM);
            let to = active.branch.at_usize(b, branch::TO);
            let p_from_abs = active.node.at(from, node::P) + active.node.at(from, node::PAMB);
            let p_to_abs = active.node.at(to, node::P) + active.node.at(to, node::PAMB);
            let (p_m, _, _) = medium_pressure(p_from_abs, p_to_abs);
            let t_mean = active.branch.at(b, branch::T_MEAN);
            v * norm_factor(fluid, p_m, t_mean)?
        } else {
            v
        };
        let vdot_m3_per_h = v_mean * area * 3600.0;
        let pl = net.pumps[element].curve.pressure_lift_bar(vdot_m3_per_h);
        active.branch.set(b, branch::PL, pl);
    }

    // Compressors: multiplicative lift on the absolute inlet pressure,
    // released on reverse flow.
    for &(b, element) in &ctx.compressor_rows {
        let v = active.branch.at(b, branch::V);
        let pl = if v >= 0.0 {
            let from = active.branch.at_usize(b, branch::FROM);
            let p_from_abs = active.node.at(from, node::P) + active.node.at(from, node::PAMB);
            p_from_abs * (net.compressors[element].boost_ratio - 1.0)
        } else {
            0.0
        };
        active.branch.set(b, branch::PL, pl);
    }

    // Controlled flows track the (possibly temperature-dependent) density.
    for &(b, mdot) in &ctx.controlled_flow_rows {
        let rho = active.branch.at(b, branch::RHO);
        let area = active.branch.at(b, branch::AREA);
        active.branch.set(b, branch::V, mdot / (rho * area));
    }

    Ok(())
}

/// Overwrite controller rows after the generic derivative pass.
pub fn adapt_after_derivatives(active: &mut ActivePit, ctx: &ComponentContext) {
    // Flow controllers: no velocity change during the iteration.
    for &(b, _) in &ctx.controlled_flow_rows {
        active.branch.set(b, branch::JAC_DP_FROM, 0.0);
        active.branch.set(b, branch::JAC_DP_TO, 0.0);
        active.branch.set(b, branch::JAC_DV, 1.0);
        active.branch.set(b, branch::LOAD_VEC, 0.0);
    }
    // Pressure controllers: the momentum row is released entirely; the
    // assembly pins the controlled node through this matrix row instead.
    for &(b, _) in &ctx.pc_rows {
        active.branch.set(b, branch::JAC_DP_FROM, 0.0);
        active.branch.set(b, branch::JAC_DP_TO, 0.0);
        active.branch.set(b, branch::JAC_DV, 0.0);
        active.branch.set(b, branch::LOAD_VEC, 0.0);
    }
}

/// Align the thermal columns with the solved flow directions and set
/// component temperature lifts.
pub fn thermal_pre_step(
    active: &mut ActivePit,
    ctx: &ComponentContext,
    fluid: &Fluid,
) -> PipeflowResult<()> {
    for b in 0..active.branch.rows() {
        let v = active.branch.at(b, branch::V);
        let (from, to) = if v >= 0.0 {
            (
                active.branch.at(b, branch::FROM),
                active.branch.at(b, branch::TO),
            )
        } else {
            (
                active.branch.at(b, branch::TO),
                active.branch.at(b, branch::FROM),
            )
        };
        active.branch.set(b, branch::FROM_T, from);
        active.branch.set(b, branch::TO_T, to);
        active.branch.set(b, branch::V_T, v.abs());
        let rho = active.branch.at(b, branch::RHO);
        let area = active.branch.at(b, branch::AREA);
        active.branch.set(b, branch::MDOT_T, rho * area * v.abs());
        active.branch.set(b, branch::TL, 0.0);
    }

    // Adiabatic compression heating across compressors in forward flow.
    for &(b, _element) in &ctx.compressor_rows {
        if active.branch.at(b, branch::V) < 0.0 {
            continue;
        }
        let from = active.branch.at_usize(b, branch::FROM);
        let to = active.branch.at_usize(b, branch::TO);
        let p_from_abs = active.node.at(from, node::P) + active.node.at(from, node::PAMB);
        let p_to_abs = active.node.at(to, node::P) + active.node.at(to, node::PAMB);
        let ratio = (p_to_abs / p_from_abs).max(1.0);
        let t_in = active.node.at(active.branch.at_usize(b, branch::FROM_T), node::T);
        let kappa = fluid.isentropic_exponent(t_in)?;
        let tl = t_in * (ratio.powf((kappa - 1.0) / kappa) - 1.0);
        active.branch.set(b, branch::TL, tl);
    }
    Ok(())
}

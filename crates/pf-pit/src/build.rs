//! The PIT builder: element tables + fluid + options → node/branch pits.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use pf_core::units::constants::{AVG_TEMPERATURE_K, HEIGHT_EXPONENT, TEMP_GRADIENT_KPM};
use pf_core::units::{in_bar, in_k, in_kgps, in_m, in_w};
use pf_net::{Network, PipeflowOptions};

use crate::error::PitResult;
use crate::idx::{branch, branch_type, node, node_type};
use crate::kind::{node_table, BranchKind};
use crate::lookups::Lookups;
use crate::table::Table;

/// Solver-internal state attached to the network between solves.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub node_pit: Table,
    pub branch_pit: Table,
    pub lookups: Lookups,
    /// Structure fingerprint used to decide whether cached state applies.
    pub topology_hash: u64,
    /// Whether the pits hold a previous solution usable for warm starts.
    pub previous_solution_present: bool,
    /// Whether a hydraulic solution has been computed on these pits.
    pub hydraulics_valid: bool,
}

/// Fingerprint of everything that affects pit structure.
pub fn topology_hash(net: &Network) -> u64 {
    let mut h = DefaultHasher::new();
    net.junctions.len().hash(&mut h);
    for j in &net.junctions {
        j.in_service.hash(&mut h);
    }
    net.pipes.len().hash(&mut h);
    for p in &net.pipes {
        (p.from.index(), p.to.index(), p.sections, p.in_service).hash(&mut h);
    }
    net.valves.len().hash(&mut h);
    for v in &net.valves {
        (v.from.index(), v.to.index(), v.opened).hash(&mut h);
    }
    net.pumps.len().hash(&mut h);
    for p in &net.pumps {
        (p.from.index(), p.to.index(), p.in_service).hash(&mut h);
    }
    net.compressors.len().hash(&mut h);
    for c in &net.compressors {
        (c.from.index(), c.to.index(), c.in_service).hash(&mut h);
    }
    net.heat_exchangers.len().hash(&mut h);
    for x in &net.heat_exchangers {
        (x.from.index(), x.to.index(), x.in_service).hash(&mut h);
    }
    net.heat_consumers.len().hash(&mut h);
    for x in &net.heat_consumers {
        (x.from.index(), x.to.index(), x.in_service).hash(&mut h);
    }
    net.flow_controls.len().hash(&mut h);
    for f in &net.flow_controls {
        (f.from.index(), f.to.index(), f.control_active, f.in_service).hash(&mut h);
    }
    net.pressure_controls.len().hash(&mut h);
    for p in &net.pressure_controls {
        (
            p.from.index(),
            p.to.index(),
            p.controlled_junction.index(),
            p.control_active,
            p.in_service,
        )
            .hash(&mut h);
    }
    net.ext_grids.len().hash(&mut h);
    for e in &net.ext_grids {
        (e.junction.index(), e.kind.fixes_pressure(), e.kind.fixes_temperature(), e.in_service)
            .hash(&mut h);
    }
    net.sinks.len().hash(&mut h);
    for s in &net.sinks {
        (s.junction.index(), s.in_service).hash(&mut h);
    }
    net.sources.len().hash(&mut h);
    for s in &net.sources {
        (s.junction.index(), s.in_service).hash(&mut h);
    }
    net.mass_storages.len().hash(&mut h);
    for s in &net.mass_storages {
        (s.junction.index(), s.in_service).hash(&mut h);
    }
    net.circ_pumps_mass.len().hash(&mut h);
    for c in &net.circ_pumps_mass {
        (c.flow_junction.index(), c.return_junction.index(), c.in_service).hash(&mut h);
    }
    net.circ_pumps_pressure.len().hash(&mut h);
    for c in &net.circ_pumps_pressure {
        (c.flow_junction.index(), c.return_junction.index(), c.in_service).hash(&mut h);
    }
    h.finish()
}

/// Ambient pressure at `height` m above the reference, barometric formula.
fn ambient_pressure_at_height(p0_bar: f64, height_m: f64) -> f64 {
    p0_bar * (1.0 - height_m * TEMP_GRADIENT_KPM / AVG_TEMPERATURE_K).powf(HEIGHT_EXPONENT)
}

/// Linear interpolation of `n` interior values between two endpoint values.
fn vinterp(from: f64, to: f64, n: usize) -> Vec<f64> {
    (1..=n)
        .map(|i| from + (to - from) * i as f64 / (n + 1) as f64)
        .collect()
}

fn fill_common(
    node_pit: &Table,
    row: &mut [f64],
    kind: BranchKind,
    element: usize,
    from: usize,
    to: usize,
    active: bool,
    ambient_t: f64,
) {
    row[branch::TABLE] = kind.table_tag();
    row[branch::ELEMENT] = element as f64;
    row[branch::FROM] = from as f64;
    row[branch::TO] = to as f64;
    row[branch::ACTIVE] = active as u8 as f64;
    row[branch::V] = V_START;
    row[branch::TYPE] = branch_type::NORMAL;
    row[branch::T_MEAN] = (node_pit.at(from, node::T) + node_pit.at(to, node::T)) / 2.0;
    row[branch::T_OUT] = node_pit.at(to, node::T);
    row[branch::TEXT] = ambient_t;
}

fn compute_lookups(net: &Network) -> Lookups {
    let n_junctions = net.junctions.len();
    let mut n_nodes = n_junctions;
    let mut pipe_internal_nodes = Vec::with_capacity(net.pipes.len());
    for p in &net.pipes {
        let internals = (p.sections - 1) as usize;
        pipe_internal_nodes.push((n_nodes, n_nodes + internals));
        n_nodes += internals;
    }

    let mut branch_groups = Vec::new();
    let mut cursor = 0usize;
    let mut pipe_branches = Vec::with_capacity(net.pipes.len());

    let pipe_rows: usize = net.pipes.iter().map(|p| p.sections as usize).sum();
    let mut sec_cursor = cursor;
    for p in &net.pipes {
        pipe_branches.push((sec_cursor, sec_cursor + p.sections as usize));
        sec_cursor += p.sections as usize;
    }
    branch_groups.push((BranchKind::Pipe, cursor, cursor + pipe_rows));
    cursor += pipe_rows;

    for (kind, len) in [
        (BranchKind::Valve, net.valves.len()),
        (BranchKind::Pump, net.pumps.len()),
        (BranchKind::Compressor, net.compressors.len()),
        (BranchKind::HeatExchanger, net.heat_exchangers.len()),
        (BranchKind::HeatConsumer, net.heat_consumers.len()),
        (BranchKind::FlowControl, net.flow_controls.len()),
        (BranchKind::PressureControl, net.pressure_controls.len()),
    ] {
        branch_groups.push((kind, cursor, cursor + len));
        cursor += len;
    }

    Lookups {
        n_junctions,
        n_nodes,
        n_branches: cursor,
        pipe_internal_nodes,
        pipe_branches,
        branch_groups,
    }
}

/// Default start velocity for branches without a better guess.
const V_START: f64 = 0.1;

/// Materialize the pits from the element tables.
///
/// If `previous` matches the current topology and `reuse_internal_data` is
/// set, the previous solution columns (p, T, v, T_out) seed the initial
/// guess; otherwise the net flat-starts from nominal values.
pub fn build_pit(
    net: &Network,
    options: &PipeflowOptions,
    previous: Option<&Workspace>,
) -> PitResult<Workspace> {
    net.validate()?;
    let fluid = net.fluid();
    let lookups = compute_lookups(net);
    let hash = topology_hash(net);

    let mut node_pit = Table::zeros(lookups.n_nodes, node::COLS);
    let mut branch_pit = Table::zeros(lookups.n_branches, branch::COLS);

    let p0_amb = in_bar(options.ambient_pressure);

    // Junction rows.
    for (i, junction) in net.junctions.iter().enumerate() {
        let t_k = in_k(junction.tfluid);
        let height = in_m(junction.height);
        let row = node_pit.row_mut(i);
        row[node::TABLE] = node_table::JUNCTION;
        row[node::ELEMENT] = i as f64;
        row[node::TYPE] = node_type::FREE;
        row[node::ACTIVE] = junction.in_service as u8 as f64;
        row[node::P] = in_bar(junction.pn);
        row[node::HEIGHT] = height;
        row[node::T] = t_k;
        row[node::TYPE_T] = node_type::FREE;
        row[node::PAMB] = ambient_pressure_at_height(p0_amb, height);
        row[node::RHO] = fluid.density(t_k)?;
    }

    // Internal pipe nodes, interpolated between the endpoints.
    for (pi, pipe) in net.pipes.iter().enumerate() {
        let (nf, nt) = lookups.pipe_internal_nodes[pi];
        let n_int = nt - nf;
        if n_int == 0 {
            continue;
        }
        let jf = pipe.from.index() as usize;
        let jt = pipe.to.index() as usize;
        let p_vals = vinterp(node_pit.at(jf, node::P), node_pit.at(jt, node::P), n_int);
        let t_vals = vinterp(node_pit.at(jf, node::T), node_pit.at(jt, node::T), n_int);
        let h_vals = vinterp(
            node_pit.at(jf, node::HEIGHT),
            node_pit.at(jt, node::HEIGHT),
            n_int,
        );
        for i in 0..n_int {
            let row = node_pit.row_mut(nf + i);
            row[node::TABLE] = node_table::PIPE_NODES;
            row[node::ELEMENT] = pi as f64;
            row[node::TYPE] = node_type::FREE;
            row[node::TYPE_T] = node_type::FREE;
            row[node::ACTIVE] = pipe.in_service as u8 as f64;
            row[node::P] = p_vals[i];
            row[node::T] = t_vals[i];
            row[node::HEIGHT] = h_vals[i];
            row[node::PAMB] = ambient_pressure_at_height(p0_amb, h_vals[i]);
            row[node::RHO] = fluid.density(t_vals[i])?;
        }
    }

    let ambient_t = in_k(options.ambient_temperature);

    // Pipes, one row per section.
    for (pi, pipe) in net.pipes.iter().enumerate() {
        let (bf, _bt) = lookups.pipe_branches[pi];
        let (nf, _nt) = lookups.pipe_internal_nodes[pi];
        let jf = pipe.from.index() as usize;
        let jt = pipe.to.index() as usize;
        let sections = pipe.sections as usize;
        let d = in_m(pipe.diameter);
        let area = d * d * std::f64::consts::PI / 4.0;
        let sec_len = in_m(pipe.length) / sections as f64;
        for s in 0..sections {
            let from = if s == 0 { jf } else { nf + s - 1 };
            let to = if s == sections - 1 { jt } else { nf + s };
            let b = bf + s;
            {
                let row = branch_pit.row_mut(b);
                fill_common(&node_pit, row, BranchKind::Pipe, pi, from, to, pipe.in_service, ambient_t);
                row[branch::LENGTH] = sec_len;
                row[branch::D] = d;
                row[branch::AREA] = area;
                row[branch::K] = in_m(pipe.roughness);
                row[branch::LOSS] = pipe.loss_coefficient / sections as f64;
                row[branch::ALPHA] = pipe.u_w_per_m2k;
                row[branch::QEXT] = in_w(pipe.qext) / sections as f64;
                row[branch::TEXT] = in_k(pipe.ambient_temperature);
            }
        }
    }

    // Valves.
    let (vf, _) = lookups.group(BranchKind::Valve);
    for (i, valve) in net.valves.iter().enumerate() {
        let from = valve.from.index() as usize;
        let to = valve.to.index() as usize;
        let d = in_m(valve.diameter);
        let row = branch_pit.row_mut(vf + i);
        fill_common(&node_pit, row, BranchKind::Valve, i, from, to, valve.opened, ambient_t);
        row[branch::D] = d;
        row[branch::AREA] = d * d * std::f64::consts::PI / 4.0;
        row[branch::LOSS] = valve.loss_coefficient;
    }

    // Pumps; the characteristic lives in the element table, read per
    // iteration through the ELEMENT column.
    let (pf, _) = lookups.group(BranchKind::Pump);
    for (i, pump) in net.pumps.iter().enumerate() {
        let from = pump.from.index() as usize;
        let to = pump.to.index() as usize;
        let row = branch_pit.row_mut(pf + i);
        fill_common(&node_pit, row, BranchKind::Pump, i, from, to, pump.in_service, ambient_t);
        row[branch::D] = 0.1;
        row[branch::AREA] = 0.1 * 0.1 * std::f64::consts::PI / 4.0;
    }

    // Compressors.
    let (cf, _) = lookups.group(BranchKind::Compressor);
    for (i, comp) in net.compressors.iter().enumerate() {
        let from = comp.from.index() as usize;
        let to = comp.to.index() as usize;
        let row = branch_pit.row_mut(cf + i);
        fill_common(&node_pit, row, BranchKind::Compressor, i, from, to, comp.in_service, ambient_t);
        row[branch::D] = 0.1;
        row[branch::AREA] = 0.1 * 0.1 * std::f64::consts::PI / 4.0;
    }

    // Heat exchangers.
    let (hf, _) = lookups.group(BranchKind::HeatExchanger);
    for (i, hx) in net.heat_exchangers.iter().enumerate() {
        let from = hx.from.index() as usize;
        let to = hx.to.index() as usize;
        let d = in_m(hx.diameter);
        let row = branch_pit.row_mut(hf + i);
        fill_common(&node_pit, row, BranchKind::HeatExchanger, i, from, to, hx.in_service, ambient_t);
        row[branch::D] = d;
        row[branch::AREA] = d * d * std::f64::consts::PI / 4.0;
        row[branch::LOSS] = hx.loss_coefficient;
        row[branch::QEXT] = in_w(hx.qext);
    }

    // Heat consumers: controlled flow plus heat duty.
    let (hcf, _) = lookups.group(BranchKind::HeatConsumer);
    for (i, hc) in net.heat_consumers.iter().enumerate() {
        let from = hc.from.index() as usize;
        let to = hc.to.index() as usize;
        let d = in_m(hc.diameter);
        let row = branch_pit.row_mut(hcf + i);
        fill_common(&node_pit, row, BranchKind::HeatConsumer, i, from, to, hc.in_service, ambient_t);
        row[branch::D] = d;
        row[branch::AREA] = d * d * std::f64::consts::PI / 4.0;
        row[branch::QEXT] = in_w(hc.qext);
    }

    // Flow controllers.
    let (fcf, _) = lookups.group(BranchKind::FlowControl);
    for (i, fc) in net.flow_controls.iter().enumerate() {
        let from = fc.from.index() as usize;
        let to = fc.to.index() as usize;
        let d = in_m(fc.diameter);
        let row = branch_pit.row_mut(fcf + i);
        fill_common(&node_pit, row, BranchKind::FlowControl, i, from, to, fc.in_service, ambient_t);
        row[branch::D] = d;
        row[branch::AREA] = d * d * std::f64::consts::PI / 4.0;
    }

    // Pressure controllers.
    let (pcf, _) = lookups.group(BranchKind::PressureControl);
    for (i, pc) in net.pressure_controls.iter().enumerate() {
        let from = pc.from.index() as usize;
        let to = pc.to.index() as usize;
        let row = branch_pit.row_mut(pcf + i);
        fill_common(&node_pit, row, BranchKind::PressureControl, i, from, to, pc.in_service, ambient_t);
        row[branch::D] = 0.1;
        row[branch::AREA] = 0.1 * 0.1 * std::f64::consts::PI / 4.0;
        if pc.in_service && pc.control_active {
            row[branch::TYPE] = branch_type::CONTROL;
        }
    }

    // Fluid state on branches: density, viscosity, cp at the mean branch
    // temperature.
    for b in 0..lookups.n_branches {
        let t_mean = branch_pit.at(b, branch::T_MEAN);
        branch_pit.set(b, branch::RHO, fluid.density(t_mean)?);
        branch_pit.set(b, branch::ETA, fluid.viscosity(t_mean)?);
        branch_pit.set(b, branch::CP, fluid.heat_capacity(t_mean)?);
    }

    // Flow controllers and heat consumers start at their controlled flow.
    for (i, fc) in net.flow_controls.iter().enumerate() {
        let b = fcf + i;
        let rho = branch_pit.at(b, branch::RHO);
        let area = branch_pit.at(b, branch::AREA);
        branch_pit.set(b, branch::V, in_kgps(fc.controlled_mdot) / (rho * area));
    }
    for (i, hc) in net.heat_consumers.iter().enumerate() {
        let b = hcf + i;
        let rho = branch_pit.at(b, branch::RHO);
        let area = branch_pit.at(b, branch::AREA);
        branch_pit.set(b, branch::V, in_kgps(hc.controlled_mdot) / (rho * area));
    }

    // Node elements: pressure controllers pin their controlled junction,
    // ext grids and circulation pumps override afterwards.
    for pc in net.pressure_controls.iter() {
        if !(pc.in_service && pc.control_active) {
            continue;
        }
        let row = pc.controlled_junction.index() as usize;
        node_pit.set(row, node::TYPE, node_type::CONTROLLED);
        node_pit.set(row, node::P, in_bar(pc.controlled_p));
    }

    // Accumulate pressure/temperature boundaries, averaging duplicates.
    let mut p_sum = vec![0.0; lookups.n_nodes];
    let mut p_cnt = vec![0u32; lookups.n_nodes];
    let mut t_sum = vec![0.0; lookups.n_nodes];
    let mut t_cnt = vec![0u32; lookups.n_nodes];

    for eg in net.ext_grids.iter().filter(|e| e.in_service) {
        let row = eg.junction.index() as usize;
        if eg.kind.fixes_pressure() {
            p_sum[row] += in_bar(eg.p);
            p_cnt[row] += 1;
        }
        if eg.kind.fixes_temperature() {
            t_sum[row] += in_k(eg.t);
            t_cnt[row] += 1;
        }
    }
    for cp in net.circ_pumps_mass.iter().filter(|c| c.in_service) {
        let row = cp.flow_junction.index() as usize;
        p_sum[row] += in_bar(cp.p_flow);
        p_cnt[row] += 1;
        t_sum[row] += in_k(cp.t_flow);
        t_cnt[row] += 1;
        // Circulated mass is drawn at the return junction.
        node_pit.add(
            cp.return_junction.index() as usize,
            node::LOAD,
            in_kgps(cp.mdot),
        );
    }
    for cp in net.circ_pumps_pressure.iter().filter(|c| c.in_service) {
        let flow_row = cp.flow_junction.index() as usize;
        let ret_row = cp.return_junction.index() as usize;
        p_sum[flow_row] += in_bar(cp.p_flow);
        p_cnt[flow_row] += 1;
        t_sum[flow_row] += in_k(cp.t_flow);
        t_cnt[flow_row] += 1;
        p_sum[ret_row] += in_bar(cp.p_flow) - in_bar(cp.plift);
        p_cnt[ret_row] += 1;
    }

    for row in 0..lookups.n_nodes {
        if p_cnt[row] > 0 {
            node_pit.set(row, node::TYPE, node_type::SLACK);
            node_pit.set(row, node::P, p_sum[row] / p_cnt[row] as f64);
            node_pit.set(row, node::SLACK_HITS, p_cnt[row] as f64);
        }
        if t_cnt[row] > 0 {
            node_pit.set(row, node::TYPE_T, node_type::SLACK);
            node_pit.set(row, node::T, t_sum[row] / t_cnt[row] as f64);
            node_pit.set(row, node::SLACK_HITS_T, t_cnt[row] as f64);
        }
    }

    // Demands.
    for s in net.sinks.iter().filter(|s| s.in_service) {
        node_pit.add(s.junction.index() as usize, node::LOAD, in_kgps(s.mdot));
    }
    for s in net.sources.iter().filter(|s| s.in_service) {
        node_pit.add(s.junction.index() as usize, node::LOAD, -in_kgps(s.mdot));
    }
    for s in net.mass_storages.iter().filter(|s| s.in_service) {
        node_pit.add(
            s.junction.index() as usize,
            node::LOAD,
            in_kgps(s.mdot_stored),
        );
    }

    // Warm start from a previous solution on identical topology.
    let mut previous_solution_present = false;
    if options.reuse_internal_data {
        if let Some(prev) = previous {
            if prev.topology_hash == hash
                && prev.previous_solution_present
                && prev.node_pit.rows() == node_pit.rows()
                && prev.branch_pit.rows() == branch_pit.rows()
            {
                for r in 0..node_pit.rows() {
                    // Slack values were just re-applied; only free state is
                    // seeded from the previous solution.
                    if node_pit.at(r, node::TYPE) == node_type::FREE {
                        node_pit.set(r, node::P, prev.node_pit.at(r, node::P));
                    }
                    if node_pit.at(r, node::TYPE_T) == node_type::FREE {
                        node_pit.set(r, node::T, prev.node_pit.at(r, node::T));
                    }
                }
                for b in 0..branch_pit.rows() {
                    branch_pit.set(b, branch::V, prev.branch_pit.at(b, branch::V));
                    branch_pit.set(b, branch::T_OUT, prev.branch_pit.at(b, branch::T_OUT));
                }
                previous_solution_present = true;
            }
        }
    }

    Ok(Workspace {
        node_pit,
        branch_pit,
        lookups,
        topology_hash: hash,
        previous_solution_present,
        hydraulics_valid: previous
            .map(|p| p.hydraulics_valid && p.topology_hash == hash && previous_solution_present)
            .unwrap_or(false),
    })
}

//! Compressible gas networks: compressor boost, adiabatic power and the
//! reference-state velocity reporting.

use approx::assert_relative_eq;
use pf_core::units::constants::{NORMAL_PRESSURE, R_UNIVERSAL};
use pf_core::units::{bar, k, kgps, m, mm};
use pf_net::{Compressor, ExtGrid, Junction, Network, Pipe, PipeflowOptions, Sink};
use pf_solver::pipeflow;

const T_K: f64 = 293.15;
/// 5 bar absolute expressed as gauge pressure at height zero.
const P_IN_REL: f64 = 5.0 - NORMAL_PRESSURE;

#[test]
fn compressor_boosts_the_absolute_inlet_pressure() {
    let mut net = Network::new(pf_fluids::hgas());
    let j0 = net.add_junction(Junction::new(bar(P_IN_REL), k(T_K)));
    let j1 = net.add_junction(Junction::new(bar(P_IN_REL), k(T_K)));
    net.add_compressor(Compressor::new(j0, j1, 1.5));
    net.add_ext_grid(ExtGrid::new_pt(j0, bar(P_IN_REL), k(T_K)));
    net.add_sink(Sink::new(j1, kgps(1.0)));

    pipeflow(&mut net, &PipeflowOptions::default()).unwrap();
    assert!(net.converged);

    // p_to + p_amb = (p_from + p_amb) * boost ratio
    assert_relative_eq!(
        net.res.junction[1].p_bar,
        5.0 * 1.5 - NORMAL_PRESSURE,
        epsilon = 1e-6
    );
    assert_relative_eq!(net.res.compressor[0].mdot_from_kg_per_s, 1.0, epsilon = 1e-6);
    assert_relative_eq!(
        net.res.compressor_extra[0].deltap_bar,
        5.0 * 0.5,
        epsilon = 1e-6
    );
}

#[test]
fn compression_power_matches_the_adiabatic_closed_form() {
    let mut net = Network::new(pf_fluids::hgas());
    let j0 = net.add_junction(Junction::new(bar(P_IN_REL), k(T_K)));
    let j1 = net.add_junction(Junction::new(bar(P_IN_REL), k(T_K)));
    net.add_compressor(Compressor::new(j0, j1, 1.5));
    net.add_ext_grid(ExtGrid::new_pt(j0, bar(P_IN_REL), k(T_K)));
    net.add_sink(Sink::new(j1, kgps(1.0)));

    pipeflow(&mut net, &PipeflowOptions::default()).unwrap();

    let fluid = net.fluid();
    let rs = R_UNIVERSAL / fluid.molar_mass().unwrap();
    let cp = fluid.heat_capacity(T_K).unwrap();
    let kappa = cp / (cp - rs);
    let expected = 1.0 * kappa / (kappa - 1.0) * rs * T_K
        * (1.5_f64.powf((kappa - 1.0) / kappa) - 1.0);
    assert_relative_eq!(
        net.res.compressor_extra[0].power_w,
        expected,
        max_relative = 0.01
    );
}

#[test]
fn reversed_compressor_passes_pressure_through() {
    // sink on the from-side pulls the flow backwards through the compressor
    let mut net = Network::new(pf_fluids::hgas());
    let j0 = net.add_junction(Junction::new(bar(P_IN_REL), k(T_K)));
    let j1 = net.add_junction(Junction::new(bar(P_IN_REL), k(T_K)));
    net.add_compressor(Compressor::new(j1, j0, 1.5));
    net.add_ext_grid(ExtGrid::new_pt(j0, bar(P_IN_REL), k(T_K)));
    net.add_sink(Sink::new(j1, kgps(1.0)));

    pipeflow(&mut net, &PipeflowOptions::default()).unwrap();
    // reverse flow: no boost, the free junction follows the grid pressure
    assert!(net.res.compressor[0].mdot_from_kg_per_s < 0.0);
    assert_relative_eq!(net.res.junction[1].p_bar, P_IN_REL, epsilon = 1e-6);
    assert_relative_eq!(net.res.compressor_extra[0].power_w, 0.0, epsilon = 1e-9);
}

#[test]
fn gas_pipe_drops_pressure_and_accelerates() {
    let mut net = Network::new(pf_fluids::hgas());
    let j0 = net.add_junction(Junction::new(bar(P_IN_REL), k(T_K)));
    let j1 = net.add_junction(Junction::new(bar(P_IN_REL), k(T_K)));
    net.add_pipe(Pipe::new(j0, j1, m(1000.0), m(0.3)).with_roughness(mm(0.05)));
    net.add_ext_grid(ExtGrid::new_pt(j0, bar(P_IN_REL), k(T_K)));
    net.add_sink(Sink::new(j1, kgps(1.0)));

    pipeflow(&mut net, &PipeflowOptions::default()).unwrap();
    assert!(net.converged);

    let pipe = &net.res.pipe[0];
    assert_relative_eq!(pipe.mdot_from_kg_per_s, 1.0, epsilon = 1e-6);
    assert!(net.res.junction[1].p_bar < net.res.junction[0].p_bar);
    // expanding gas speeds up towards the low-pressure end
    assert!(pipe.v_to_m_per_s > pipe.v_from_m_per_s);
    // the line runs well above normal pressure, so the actual velocity
    // stays below the reference-state velocity
    let area = 0.3_f64.powi(2) * std::f64::consts::PI / 4.0;
    let v_ref = pipe.vdot_m3_per_s / area;
    assert!(pipe.v_mean_m_per_s < v_ref);
}

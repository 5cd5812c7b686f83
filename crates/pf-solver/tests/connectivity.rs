//! Connectivity behavior at the `pipeflow` boundary: disconnected
//! subnetworks, missing slacks, invalid topology and the empty network.

use approx::assert_relative_eq;
use pf_core::units::{bar, k, kgps, m};
use pf_core::Id;
use pf_net::{ExtGrid, Junction, Network, Pipe, PipeflowOptions, Sink, Valve};
use pf_solver::{pipeflow, PipeflowError};

const T_K: f64 = 293.15;

/// grid - pipe - j1 - closed valve - j2 (sink)
fn valve_net(opened: bool) -> Network {
    let mut net = Network::new(pf_fluids::water());
    let j0 = net.add_junction(Junction::new(bar(5.0), k(T_K)));
    let j1 = net.add_junction(Junction::new(bar(5.0), k(T_K)));
    let j2 = net.add_junction(Junction::new(bar(5.0), k(T_K)));
    net.add_pipe(Pipe::new(j0, j1, m(100.0), m(0.1)));
    let mut valve = Valve::new(j1, j2, m(0.1));
    valve.opened = opened;
    net.add_valve(valve);
    net.add_ext_grid(ExtGrid::new_pt(j0, bar(5.0), k(T_K)));
    net.add_sink(Sink::new(j2, kgps(1.0)));
    net
}

#[test]
fn closed_valve_takes_the_far_side_out_of_service() {
    let mut net = valve_net(false);
    pipeflow(&mut net, &PipeflowOptions::default()).unwrap();
    assert!(net.converged);

    // supplied side solves, unsupplied side reads NaN
    assert!(net.res.junction[0].p_bar.is_finite());
    assert!(net.res.junction[1].p_bar.is_finite());
    assert!(net.res.junction[2].p_bar.is_nan());
    assert!(net.res.valve[0].mdot_from_kg_per_s.is_nan());
    // nothing flows into the dead end
    assert_relative_eq!(net.res.pipe[0].mdot_from_kg_per_s, 0.0, epsilon = 1e-6);
}

#[test]
fn open_valve_supplies_the_sink() {
    let mut net = valve_net(true);
    pipeflow(&mut net, &PipeflowOptions::default()).unwrap();
    assert_relative_eq!(net.res.valve[0].mdot_from_kg_per_s, 1.0, epsilon = 1e-6);
    assert!(net.res.junction[2].p_bar.is_finite());
}

#[test]
fn missing_pressure_slack_raises_no_slack() {
    let mut net = Network::new(pf_fluids::water());
    let j0 = net.add_junction(Junction::new(bar(5.0), k(T_K)));
    let j1 = net.add_junction(Junction::new(bar(5.0), k(T_K)));
    net.add_pipe(Pipe::new(j0, j1, m(100.0), m(0.1)));
    net.add_sink(Sink::new(j1, kgps(1.0)));

    let err = pipeflow(&mut net, &PipeflowOptions::default()).unwrap_err();
    assert!(matches!(err, PipeflowError::NoSlack(_)));
    assert!(!net.converged);
    // a failed solve clears the result tables
    assert!(net.res.junction.is_empty());
}

#[test]
fn dangling_reference_raises_invalid_topology() {
    let mut net = Network::new(pf_fluids::water());
    let j0 = net.add_junction(Junction::new(bar(5.0), k(T_K)));
    net.add_pipe(Pipe::new(j0, Id::from_index(7), m(10.0), m(0.1)));
    net.add_ext_grid(ExtGrid::new_pt(j0, bar(5.0), k(T_K)));

    let err = pipeflow(&mut net, &PipeflowOptions::default()).unwrap_err();
    assert!(matches!(err, PipeflowError::InvalidTopology(_)));
}

#[test]
fn empty_network_solves_to_empty_tables() {
    let mut net = Network::new(pf_fluids::water());
    pipeflow(&mut net, &PipeflowOptions::default()).unwrap();
    assert!(net.converged);
    assert!(net.res.junction.is_empty());
    assert!(net.res.pipe.is_empty());
}

#[test]
fn out_of_service_junction_disables_incident_branches() {
    let mut net = Network::new(pf_fluids::water());
    let j0 = net.add_junction(Junction::new(bar(5.0), k(T_K)));
    let j1 = net.add_junction(Junction::new(bar(5.0), k(T_K)));
    let mut j2_data = Junction::new(bar(5.0), k(T_K));
    j2_data.in_service = false;
    let j2 = net.add_junction(j2_data);
    net.add_pipe(Pipe::new(j0, j1, m(100.0), m(0.1)));
    net.add_pipe(Pipe::new(j1, j2, m(100.0), m(0.1)));
    net.add_ext_grid(ExtGrid::new_pt(j0, bar(5.0), k(T_K)));
    net.add_sink(Sink::new(j1, kgps(0.5)));

    pipeflow(&mut net, &PipeflowOptions::default()).unwrap();
    assert!(net.res.junction[2].p_bar.is_nan());
    assert!(net.res.pipe[1].mdot_from_kg_per_s.is_nan());
    assert_relative_eq!(net.res.pipe[0].mdot_from_kg_per_s, 0.5, epsilon = 1e-6);
}

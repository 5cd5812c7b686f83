//! Circular district heating network in sequential mode: circulation pump,
//! heat exchanger and sectioned pipes with heat losses.

use approx::assert_relative_eq;
use pf_core::units::{bar, k, kgps, kw, m, mm};
use pf_net::{
    CalculationMode, CircPumpMass, ExtGrid, HeatExchanger, Junction, Network, Pipe,
    PipeflowOptions, Sink,
};
use pf_solver::pipeflow;

const T_FLOW: f64 = 308.15;
const T_AMB: f64 = 293.0;
const MDOT: f64 = 20.0;
const U_W_PER_M2K: f64 = 10.0;

/// flow junction -> pipe -> hx inlet -> hx -> pipe -> return junction
fn loop_net() -> Network {
    let mut net = Network::new(pf_fluids::water());
    let j_flow = net.add_junction(Junction::new(bar(5.0), k(T_FLOW)));
    let j1 = net.add_junction(Junction::new(bar(5.0), k(T_FLOW)));
    let j2 = net.add_junction(Junction::new(bar(5.0), k(T_FLOW)));
    let j_return = net.add_junction(Junction::new(bar(5.0), k(T_FLOW)));

    for (from, to) in [(j_flow, j1), (j2, j_return)] {
        net.add_pipe(
            Pipe::new(from, to, m(1000.0), m(0.2))
                .with_roughness(mm(0.1))
                .with_sections(5)
                .with_heat_transfer(U_W_PER_M2K, k(T_AMB)),
        );
    }
    net.add_heat_exchanger(HeatExchanger::new(j1, j2, m(0.2), kw(100.0)));
    net.add_circ_pump_mass(CircPumpMass::new(
        j_flow,
        j_return,
        bar(5.0),
        k(T_FLOW),
        kgps(MDOT),
    ));
    net
}

/// Outlet temperature of one pipe under the exponential decay law.
fn pipe_outlet(t_in: f64, cp: f64) -> f64 {
    let decay =
        (-U_W_PER_M2K * std::f64::consts::PI * 0.2 * 1000.0 / (MDOT * cp)).exp();
    T_AMB + (t_in - T_AMB) * decay
}

#[test]
fn temperatures_drop_monotonically_around_the_loop() {
    let mut net = loop_net();
    let options = PipeflowOptions::with_mode(CalculationMode::Sequential);
    pipeflow(&mut net, &options).unwrap();
    assert!(net.converged);

    let cp = net.fluid().heat_capacity(T_FLOW).unwrap();
    let t_j1 = pipe_outlet(T_FLOW, cp);
    let t_j2 = t_j1 - 100_000.0 / (MDOT * cp);
    let t_return = pipe_outlet(t_j2, cp);

    assert_relative_eq!(net.res.junction[0].t_k, T_FLOW, epsilon = 1e-9);
    assert_relative_eq!(net.res.junction[1].t_k, t_j1, epsilon = 0.05);
    assert_relative_eq!(net.res.junction[2].t_k, t_j2, epsilon = 0.05);
    assert_relative_eq!(net.res.junction[3].t_k, t_return, epsilon = 0.05);

    // reference values from the network description
    assert_relative_eq!(net.res.junction[1].t_k, 307.05, epsilon = 0.05);
    assert_relative_eq!(net.res.junction[2].t_k, 305.86, epsilon = 0.05);
    assert_relative_eq!(net.res.junction[3].t_k, 304.93, epsilon = 0.05);
}

#[test]
fn circulated_mass_flows_through_every_branch() {
    let mut net = loop_net();
    let options = PipeflowOptions::with_mode(CalculationMode::Sequential);
    pipeflow(&mut net, &options).unwrap();

    for res in net.res.pipe.iter().chain(net.res.heat_exchanger.iter()) {
        assert_relative_eq!(res.mdot_from_kg_per_s, MDOT, epsilon = 1e-4);
    }
    assert_relative_eq!(
        net.res.circ_pump_mass[0].mdot_kg_per_s,
        MDOT,
        epsilon = 1e-4
    );
}

#[test]
fn pipe_pressure_drop_matches_the_loop_head() {
    let mut net = loop_net();
    let options = PipeflowOptions::with_mode(CalculationMode::Sequential);
    pipeflow(&mut net, &options).unwrap();

    for pipe_res in &net.res.pipe {
        let dp = pipe_res.p_from_bar - pipe_res.p_to_bar;
        assert_relative_eq!(dp, 0.175, epsilon = 0.01);
    }
    // the pump lift covers both pipes (the heat exchanger is lossless)
    let lift = net.res.circ_pump_mass[0].deltap_bar;
    let dp_total: f64 = net
        .res
        .pipe
        .iter()
        .map(|r| r.p_from_bar - r.p_to_bar)
        .sum();
    assert_relative_eq!(lift, dp_total, epsilon = 1e-6);
}

#[test]
fn mixing_junction_blends_inflows_by_mass_flow() {
    // two supplies at different temperatures meet at one sink junction
    let mut net = Network::new(pf_fluids::water());
    let j_hot = net.add_junction(Junction::new(bar(6.0), k(350.0)));
    let j_cold = net.add_junction(Junction::new(bar(6.0), k(300.0)));
    let j_mix = net.add_junction(Junction::new(bar(6.0), k(325.0)));
    net.add_pipe(Pipe::new(j_hot, j_mix, m(100.0), m(0.1)));
    net.add_pipe(Pipe::new(j_cold, j_mix, m(100.0), m(0.1)));
    net.add_ext_grid(ExtGrid::new_pt(j_hot, bar(6.0), k(350.0)));
    net.add_ext_grid(ExtGrid::new_pt(j_cold, bar(6.0), k(300.0)));
    net.add_sink(Sink::new(j_mix, kgps(4.0)));

    let options = PipeflowOptions::with_mode(CalculationMode::Sequential);
    pipeflow(&mut net, &options).unwrap();

    // flow-weighted mean of the incoming outlet temperatures
    let m_hot = net.res.pipe[0].mdot_from_kg_per_s;
    let m_cold = net.res.pipe[1].mdot_from_kg_per_s;
    assert_relative_eq!(m_hot + m_cold, 4.0, epsilon = 1e-4);
    let t_expected = (m_hot * net.res.pipe[0].t_outlet_k
        + m_cold * net.res.pipe[1].t_outlet_k)
        / (m_hot + m_cold);
    assert_relative_eq!(net.res.junction[2].t_k, t_expected, epsilon = 1e-4);

    // adiabatic pipes: outlet equals the supply temperature
    assert_relative_eq!(net.res.pipe[0].t_outlet_k, 350.0, epsilon = 1e-6);
    assert_relative_eq!(net.res.pipe[1].t_outlet_k, 300.0, epsilon = 1e-6);
}

#[test]
fn lossless_heat_exchanger_keeps_temperature_with_zero_duty() {
    let mut net = Network::new(pf_fluids::water());
    let j_flow = net.add_junction(Junction::new(bar(5.0), k(T_FLOW)));
    let j1 = net.add_junction(Junction::new(bar(5.0), k(T_FLOW)));
    let j_return = net.add_junction(Junction::new(bar(5.0), k(T_FLOW)));
    net.add_pipe(
        Pipe::new(j_flow, j1, m(100.0), m(0.2))
            .with_heat_transfer(U_W_PER_M2K, k(T_AMB)),
    );
    net.add_heat_exchanger(HeatExchanger::new(j1, j_return, m(0.2), kw(0.0)));
    net.add_circ_pump_mass(CircPumpMass::new(
        j_flow,
        j_return,
        bar(5.0),
        k(T_FLOW),
        kgps(MDOT),
    ));

    let options = PipeflowOptions::with_mode(CalculationMode::Sequential);
    pipeflow(&mut net, &options).unwrap();
    let hx = &net.res.heat_exchanger[0];
    assert_relative_eq!(hx.t_outlet_k, net.res.junction[1].t_k, epsilon = 1e-6);
}

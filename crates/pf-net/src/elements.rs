//! Element tables: one struct per row of each user-facing table.
//!
//! All quantities are `uom` SI quantities; the PIT builder converts them to
//! the solver's column units (bar, K, m, m/s) at the boundary.

use pf_core::units::{Length, MassRate, Power, Pressure, Temperature};
use pf_core::JunctionId;
use serde::{Deserialize, Serialize};

/// A junction: the only primary node element.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Junction {
    /// Nominal pressure, also the flat-start initial guess.
    pub pn: Pressure,
    /// Initial fluid temperature.
    pub tfluid: Temperature,
    /// Height above the reference level.
    pub height: Length,
    pub in_service: bool,
}

impl Junction {
    pub fn new(pn: Pressure, tfluid: Temperature) -> Self {
        Self {
            pn,
            tfluid,
            height: Length::default(),
            in_service: true,
        }
    }

    pub fn with_height(mut self, height: Length) -> Self {
        self.height = height;
        self
    }
}

/// A pipe; `sections` splits it into equally long internal segments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pipe {
    pub from: JunctionId,
    pub to: JunctionId,
    pub length: Length,
    pub diameter: Length,
    /// Absolute sand roughness.
    pub roughness: Length,
    /// Additional lumped loss coefficient ζ.
    pub loss_coefficient: f64,
    /// Heat transfer coefficient to the surroundings in W/(m²·K).
    pub u_w_per_m2k: f64,
    /// Ambient temperature seen by the pipe wall.
    pub ambient_temperature: Temperature,
    /// External heat duty along the pipe (positive withdraws heat).
    pub qext: Power,
    pub sections: u32,
    pub in_service: bool,
}

impl Pipe {
    pub fn new(from: JunctionId, to: JunctionId, length: Length, diameter: Length) -> Self {
        Self {
            from,
            to,
            length,
            diameter,
            roughness: pf_core::units::mm(0.1),
            loss_coefficient: 0.0,
            u_w_per_m2k: 0.0,
            ambient_temperature: pf_core::units::k(293.15),
            qext: Power::default(),
            sections: 1,
            in_service: true,
        }
    }

    pub fn with_roughness(mut self, roughness: Length) -> Self {
        self.roughness = roughness;
        self
    }

    pub fn with_sections(mut self, sections: u32) -> Self {
        self.sections = sections.max(1);
        self
    }

    pub fn with_heat_transfer(mut self, u_w_per_m2k: f64, ambient: Temperature) -> Self {
        self.u_w_per_m2k = u_w_per_m2k;
        self.ambient_temperature = ambient;
        self
    }
}

/// A valve: zero-length branch, ideal when open, disconnecting when closed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Valve {
    pub from: JunctionId,
    pub to: JunctionId,
    pub diameter: Length,
    pub loss_coefficient: f64,
    pub opened: bool,
}

impl Valve {
    pub fn new(from: JunctionId, to: JunctionId, diameter: Length) -> Self {
        Self {
            from,
            to,
            diameter,
            loss_coefficient: 0.0,
            opened: true,
        }
    }
}

/// Polynomial pressure-lift characteristic of a pump.
///
/// The lift in bar is a polynomial in the volume flow in m³/h, clipped to
/// zero outside the valid operating range `[0, max_vdot_m3_per_h]` and for
/// reverse flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PumpCurve {
    /// Coefficients in ascending order of power.
    pub coeffs: Vec<f64>,
    pub max_vdot_m3_per_h: f64,
}

impl PumpCurve {
    pub fn new(coeffs: Vec<f64>, max_vdot_m3_per_h: f64) -> Self {
        Self {
            coeffs,
            max_vdot_m3_per_h,
        }
    }

    /// Pressure lift in bar for the given volume flow in m³/h.
    pub fn pressure_lift_bar(&self, vdot_m3_per_h: f64) -> f64 {
        if vdot_m3_per_h < 0.0 || vdot_m3_per_h > self.max_vdot_m3_per_h {
            return 0.0;
        }
        pf_core::numeric::polyval(&self.coeffs, vdot_m3_per_h).max(0.0)
    }
}

/// A pump: zero-length branch with a polynomial pressure lift.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pump {
    pub from: JunctionId,
    pub to: JunctionId,
    pub curve: PumpCurve,
    pub in_service: bool,
}

impl Pump {
    pub fn new(from: JunctionId, to: JunctionId, curve: PumpCurve) -> Self {
        Self {
            from,
            to,
            curve,
            in_service: true,
        }
    }
}

/// A compressor: multiplies the absolute inlet pressure by `boost_ratio`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Compressor {
    pub from: JunctionId,
    pub to: JunctionId,
    /// Pressure ratio Π applied to the absolute inlet pressure.
    pub boost_ratio: f64,
    pub in_service: bool,
}

impl Compressor {
    pub fn new(from: JunctionId, to: JunctionId, boost_ratio: f64) -> Self {
        Self {
            from,
            to,
            boost_ratio,
            in_service: true,
        }
    }
}

/// A heat exchanger: zero-length branch exchanging `qext` with the fluid
/// (positive withdraws heat).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeatExchanger {
    pub from: JunctionId,
    pub to: JunctionId,
    pub diameter: Length,
    pub qext: Power,
    pub loss_coefficient: f64,
    pub in_service: bool,
}

impl HeatExchanger {
    pub fn new(from: JunctionId, to: JunctionId, diameter: Length, qext: Power) -> Self {
        Self {
            from,
            to,
            diameter,
            qext,
            loss_coefficient: 0.0,
            in_service: true,
        }
    }
}

/// A heat consumer: controlled mass flow with fixed heat extraction;
/// hydraulically a flow controller, thermally a heat exchanger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeatConsumer {
    pub from: JunctionId,
    pub to: JunctionId,
    pub diameter: Length,
    pub controlled_mdot: MassRate,
    pub qext: Power,
    pub in_service: bool,
}

impl HeatConsumer {
    pub fn new(
        from: JunctionId,
        to: JunctionId,
        diameter: Length,
        controlled_mdot: MassRate,
        qext: Power,
    ) -> Self {
        Self {
            from,
            to,
            diameter,
            controlled_mdot,
            qext,
            in_service: true,
        }
    }
}

/// A flow controller: enforces its mass flow, trading its own pressure drop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowControl {
    pub from: JunctionId,
    pub to: JunctionId,
    pub diameter: Length,
    pub controlled_mdot: MassRate,
    /// Inactive controllers degrade to ideal open branches.
    pub control_active: bool,
    pub in_service: bool,
}

impl FlowControl {
    pub fn new(
        from: JunctionId,
        to: JunctionId,
        diameter: Length,
        controlled_mdot: MassRate,
    ) -> Self {
        Self {
            from,
            to,
            diameter,
            controlled_mdot,
            control_active: true,
            in_service: true,
        }
    }
}

/// A pressure controller: pins the controlled junction's pressure, trading
/// its own pressure drop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PressureControl {
    pub from: JunctionId,
    pub to: JunctionId,
    pub controlled_junction: JunctionId,
    pub controlled_p: Pressure,
    pub control_active: bool,
    pub in_service: bool,
}

impl PressureControl {
    pub fn new(
        from: JunctionId,
        to: JunctionId,
        controlled_junction: JunctionId,
        controlled_p: Pressure,
    ) -> Self {
        Self {
            from,
            to,
            controlled_junction,
            controlled_p,
            control_active: true,
            in_service: true,
        }
    }
}

/// Which state an external grid pins at its junction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtGridKind {
    /// Pressure only.
    P,
    /// Temperature only.
    T,
    /// Pressure and temperature.
    Pt,
}

impl ExtGridKind {
    pub fn fixes_pressure(self) -> bool {
        matches!(self, ExtGridKind::P | ExtGridKind::Pt)
    }

    pub fn fixes_temperature(self) -> bool {
        matches!(self, ExtGridKind::T | ExtGridKind::Pt)
    }
}

/// An external grid: boundary element pinning pressure and/or temperature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtGrid {
    pub junction: JunctionId,
    pub kind: ExtGridKind,
    pub p: Pressure,
    pub t: Temperature,
    pub in_service: bool,
}

impl ExtGrid {
    pub fn new_pt(junction: JunctionId, p: Pressure, t: Temperature) -> Self {
        Self {
            junction,
            kind: ExtGridKind::Pt,
            p,
            t,
            in_service: true,
        }
    }

    pub fn new_p(junction: JunctionId, p: Pressure) -> Self {
        Self {
            junction,
            kind: ExtGridKind::P,
            p,
            t: pf_core::units::k(293.15),
            in_service: true,
        }
    }

    pub fn new_t(junction: JunctionId, t: Temperature) -> Self {
        Self {
            junction,
            kind: ExtGridKind::T,
            p: Pressure::default(),
            t,
            in_service: true,
        }
    }
}

/// A sink: withdraws mass at a junction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sink {
    pub junction: JunctionId,
    pub mdot: MassRate,
    pub in_service: bool,
}

impl Sink {
    pub fn new(junction: JunctionId, mdot: MassRate) -> Self {
        Self {
            junction,
            mdot,
            in_service: true,
        }
    }
}

/// A source: injects mass at a junction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub junction: JunctionId,
    pub mdot: MassRate,
    pub in_service: bool,
}

impl Source {
    pub fn new(junction: JunctionId, mdot: MassRate) -> Self {
        Self {
            junction,
            mdot,
            in_service: true,
        }
    }
}

/// Mass storage: its stored mass-flow rate acts as a demand at the junction
/// (positive = charging, i.e. withdrawal from the net).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MassStorage {
    pub junction: JunctionId,
    pub mdot_stored: MassRate,
    pub in_service: bool,
}

impl MassStorage {
    pub fn new(junction: JunctionId, mdot_stored: MassRate) -> Self {
        Self {
            junction,
            mdot_stored,
            in_service: true,
        }
    }
}

/// Circulation pump, constant-mass variant: fixes pressure (and temperature)
/// at the flow junction and withdraws the circulated mass at the return
/// junction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircPumpMass {
    /// Flow-side junction (pressure/temperature pinned).
    pub flow_junction: JunctionId,
    /// Return-side junction (mass withdrawn).
    pub return_junction: JunctionId,
    pub p_flow: Pressure,
    pub t_flow: Temperature,
    pub mdot: MassRate,
    pub in_service: bool,
}

impl CircPumpMass {
    pub fn new(
        flow_junction: JunctionId,
        return_junction: JunctionId,
        p_flow: Pressure,
        t_flow: Temperature,
        mdot: MassRate,
    ) -> Self {
        Self {
            flow_junction,
            return_junction,
            p_flow,
            t_flow,
            mdot,
            in_service: true,
        }
    }
}

/// Circulation pump, pressure-lift variant: pins the flow junction at
/// `p_flow` and the return junction at `p_flow - plift`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircPumpPressure {
    pub flow_junction: JunctionId,
    pub return_junction: JunctionId,
    pub p_flow: Pressure,
    pub t_flow: Temperature,
    pub plift: Pressure,
    pub in_service: bool,
}

impl CircPumpPressure {
    pub fn new(
        flow_junction: JunctionId,
        return_junction: JunctionId,
        p_flow: Pressure,
        t_flow: Temperature,
        plift: Pressure,
    ) -> Self {
        Self {
            flow_junction,
            return_junction,
            p_flow,
            t_flow,
            plift,
            in_service: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pf_core::units::{bar, k, m};
    use pf_core::Id;

    #[test]
    fn pipe_builder_defaults() {
        let p = Pipe::new(Id::from_index(0), Id::from_index(1), m(100.0), m(0.1));
        assert_eq!(p.sections, 1);
        assert!(p.in_service);
        assert_relative_eq!(pf_core::units::in_m(p.roughness), 1e-4, max_relative = 1e-12);
    }

    #[test]
    fn pump_curve_clips_reverse_and_overrange_flow() {
        let curve = PumpCurve::new(vec![4.0, -0.01], 300.0);
        assert_relative_eq!(curve.pressure_lift_bar(100.0), 3.0);
        assert_relative_eq!(curve.pressure_lift_bar(-5.0), 0.0);
        assert_relative_eq!(curve.pressure_lift_bar(500.0), 0.0);
        // negative polynomial values clip to zero
        let steep = PumpCurve::new(vec![1.0, -0.1], 300.0);
        assert_relative_eq!(steep.pressure_lift_bar(50.0), 0.0);
    }

    #[test]
    fn ext_grid_kind_flags() {
        assert!(ExtGridKind::Pt.fixes_pressure() && ExtGridKind::Pt.fixes_temperature());
        assert!(ExtGridKind::P.fixes_pressure() && !ExtGridKind::P.fixes_temperature());
        assert!(!ExtGridKind::T.fixes_pressure() && ExtGridKind::T.fixes_temperature());
        let _eg = ExtGrid::new_pt(Id::from_index(0), bar(5.0), k(293.15));
    }
}

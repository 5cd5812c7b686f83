//! Result tables written back by a successful solve.
//!
//! Every row starts as NaN; only elements active in the solve receive
//! values. Columns follow the solver's reporting units (bar, K, kg/s, m/s).

use serde::{Deserialize, Serialize};

fn nan() -> f64 {
    f64::NAN
}

/// Junction results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResJunction {
    pub p_bar: f64,
    pub t_k: f64,
}

impl Default for ResJunction {
    fn default() -> Self {
        Self {
            p_bar: nan(),
            t_k: nan(),
        }
    }
}

/// Results shared by all branch elements.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResBranch {
    pub v_mean_m_per_s: f64,
    /// Actual inlet velocity; differs from the mean for gases.
    pub v_from_m_per_s: f64,
    pub v_to_m_per_s: f64,
    pub p_from_bar: f64,
    pub p_to_bar: f64,
    pub t_from_k: f64,
    pub t_to_k: f64,
    /// Branch outlet temperature before nodal mixing.
    pub t_outlet_k: f64,
    pub mdot_from_kg_per_s: f64,
    pub mdot_to_kg_per_s: f64,
    /// Volume flow at the reference state.
    pub vdot_m3_per_s: f64,
    pub reynolds: f64,
    pub lambda: f64,
    /// Reference-to-actual velocity factor at the inlet (gases only).
    pub normfactor_from: f64,
    pub normfactor_to: f64,
}

impl Default for ResBranch {
    fn default() -> Self {
        Self {
            v_mean_m_per_s: nan(),
            v_from_m_per_s: nan(),
            v_to_m_per_s: nan(),
            p_from_bar: nan(),
            p_to_bar: nan(),
            t_from_k: nan(),
            t_to_k: nan(),
            t_outlet_k: nan(),
            mdot_from_kg_per_s: nan(),
            mdot_to_kg_per_s: nan(),
            vdot_m3_per_s: nan(),
            reynolds: nan(),
            lambda: nan(),
            normfactor_from: nan(),
            normfactor_to: nan(),
        }
    }
}

/// Extra results for pumps and compressors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResPump {
    pub deltap_bar: f64,
    /// Shaft power estimate in W (adiabatic ideal-gas form for compressors,
    /// hydraulic power for pumps).
    pub power_w: f64,
}

impl Default for ResPump {
    fn default() -> Self {
        Self {
            deltap_bar: nan(),
            power_w: nan(),
        }
    }
}

/// External grid results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResExtGrid {
    /// Positive values feed into the net.
    pub mdot_kg_per_s: f64,
    /// Heat duty needed to hold the pinned temperature (T-fixed grids only).
    pub q_kw: f64,
}

impl Default for ResExtGrid {
    fn default() -> Self {
        Self {
            mdot_kg_per_s: nan(),
            q_kw: nan(),
        }
    }
}

/// Circulation pump results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResCircPump {
    pub mdot_kg_per_s: f64,
    pub deltap_bar: f64,
}

impl Default for ResCircPump {
    fn default() -> Self {
        Self {
            mdot_kg_per_s: nan(),
            deltap_bar: nan(),
        }
    }
}

/// Interior state of a sectioned pipe (sections > 1).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipeInternals {
    /// Pressures at the internal nodes, from- to to-side.
    pub p_bar: Vec<f64>,
    /// Temperatures at the internal nodes.
    pub t_k: Vec<f64>,
    /// Per-section velocities.
    pub v_m_per_s: Vec<f64>,
}

/// Iteration record of the last solve.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SolveRecord {
    pub iterations_hydraulic: usize,
    pub iterations_thermal: usize,
    pub residual_norm: f64,
    pub residual_norm_thermal: f64,
    pub error_p: f64,
    pub error_m: f64,
    pub error_t: f64,
}

/// All result tables of a network.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultTables {
    pub junction: Vec<ResJunction>,
    pub pipe: Vec<ResBranch>,
    pub pipe_internals: Vec<PipeInternals>,
    pub valve: Vec<ResBranch>,
    pub pump: Vec<ResBranch>,
    pub pump_extra: Vec<ResPump>,
    pub compressor: Vec<ResBranch>,
    pub compressor_extra: Vec<ResPump>,
    pub heat_exchanger: Vec<ResBranch>,
    pub heat_consumer: Vec<ResBranch>,
    pub flow_control: Vec<ResBranch>,
    pub pressure_control: Vec<ResBranch>,
    pub ext_grid: Vec<ResExtGrid>,
    pub circ_pump_mass: Vec<ResCircPump>,
    pub circ_pump_pressure: Vec<ResCircPump>,
}

impl ResultTables {
    /// Reset every table to NaN rows with the given per-table lengths.
    pub fn reset(&mut self, counts: &ResultCounts) {
        self.junction = vec![ResJunction::default(); counts.junction];
        self.pipe = vec![ResBranch::default(); counts.pipe];
        self.pipe_internals = vec![PipeInternals::default(); counts.pipe];
        self.valve = vec![ResBranch::default(); counts.valve];
        self.pump = vec![ResBranch::default(); counts.pump];
        self.pump_extra = vec![ResPump::default(); counts.pump];
        self.compressor = vec![ResBranch::default(); counts.compressor];
        self.compressor_extra = vec![ResPump::default(); counts.compressor];
        self.heat_exchanger = vec![ResBranch::default(); counts.heat_exchanger];
        self.heat_consumer = vec![ResBranch::default(); counts.heat_consumer];
        self.flow_control = vec![ResBranch::default(); counts.flow_control];
        self.pressure_control = vec![ResBranch::default(); counts.pressure_control];
        self.ext_grid = vec![ResExtGrid::default(); counts.ext_grid];
        self.circ_pump_mass = vec![ResCircPump::default(); counts.circ_pump_mass];
        self.circ_pump_pressure = vec![ResCircPump::default(); counts.circ_pump_pressure];
    }

    /// Clear all tables (used when a solve fails).
    pub fn clear(&mut self) {
        *self = ResultTables::default();
    }
}

/// Table lengths used to size the result tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultCounts {
    pub junction: usize,
    pub pipe: usize,
    pub valve: usize,
    pub pump: usize,
    pub compressor: usize,
    pub heat_exchanger: usize,
    pub heat_consumer: usize,
    pub flow_control: usize,
    pub pressure_control: usize,
    pub ext_grid: usize,
    pub circ_pump_mass: usize,
    pub circ_pump_pressure: usize,
}

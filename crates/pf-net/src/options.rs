//! Solver options recognized by `pipeflow`.

use pf_core::units::{bar, k, Pressure, Temperature};
use serde::{Deserialize, Serialize};

/// Which fields a pipeflow run computes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalculationMode {
    /// Pressure and mass flow only.
    Hydraulics,
    /// Temperature only, reusing a previous hydraulic solution.
    Heat,
    /// Hydraulics to convergence, then one thermal solve.
    Sequential,
    /// Alternate hydraulic and thermal passes until both criteria hold
    /// simultaneously; required when density feeds back on the hydraulics.
    Bidirectional,
}

/// Friction factor closure for pipes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrictionModel {
    Nikuradse,
    SwameeJain,
    Colebrook,
}

/// Newton damping strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NonlinearMethod {
    /// Fixed damping factor of 1.
    Constant,
    /// Contract the damping factor when the error history grows, restore it
    /// when it shrinks; convergence is only accepted at full steps.
    Automatic,
}

/// Policy for thermally active branches with (near) zero mass flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZeroFlowPolicy {
    /// Warn, hold T_out = T_in and drop the branch from nodal mixing.
    WarnAndSkip,
    /// Fail the thermal solve with `ThermalSingularity`.
    Strict,
}

/// Options controlling one `pipeflow` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipeflowOptions {
    pub mode: CalculationMode,
    pub friction_model: FrictionModel,
    pub nonlinear_method: NonlinearMethod,
    pub max_iter_hydraulic: usize,
    pub max_iter_thermal: usize,
    pub max_iter_colebrook: usize,
    /// Outer-iteration cap for bidirectional coupling.
    pub max_iter_coupled: usize,
    /// Tolerance on the nodal pressure step in bar.
    pub tol_p: f64,
    /// Tolerance on the branch mass-flow step in kg/s.
    pub tol_m: f64,
    /// Tolerance on the nodal/branch temperature step in K.
    pub tol_t: f64,
    /// Tolerance on the residual vector (max norm).
    pub tol_res: f64,
    pub check_connectivity: bool,
    /// Keep PIT arrays and warm-start values between solves on unchanged
    /// topology.
    pub reuse_internal_data: bool,
    /// Refresh only the values of the hydraulic matrix, keeping its cached
    /// sparsity structure.
    pub only_update_hydraulic_matrix: bool,
    /// Hint to enable the accelerated assembly path.
    pub use_numerical_acceleration: bool,
    pub zero_flow_policy: ZeroFlowPolicy,
    /// Ambient temperature used where no element-specific value is given.
    pub ambient_temperature: Temperature,
    /// Ambient pressure at height zero; node ambient pressures are height
    /// corrected from this.
    pub ambient_pressure: Pressure,
}

impl Default for PipeflowOptions {
    fn default() -> Self {
        Self {
            mode: CalculationMode::Hydraulics,
            friction_model: FrictionModel::Nikuradse,
            nonlinear_method: NonlinearMethod::Constant,
            max_iter_hydraulic: 30,
            max_iter_thermal: 30,
            max_iter_colebrook: 100,
            max_iter_coupled: 10,
            tol_p: 1e-5,
            tol_m: 1e-5,
            tol_t: 1e-4,
            tol_res: 1e-3,
            check_connectivity: true,
            reuse_internal_data: false,
            only_update_hydraulic_matrix: false,
            use_numerical_acceleration: false,
            zero_flow_policy: ZeroFlowPolicy::WarnAndSkip,
            ambient_temperature: k(293.15),
            ambient_pressure: bar(pf_core::units::constants::NORMAL_PRESSURE),
        }
    }
}

impl PipeflowOptions {
    pub fn with_mode(mode: CalculationMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Whether this run needs a thermal pass.
    pub fn thermal_requested(&self) -> bool {
        matches!(
            self.mode,
            CalculationMode::Heat | CalculationMode::Sequential | CalculationMode::Bidirectional
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_hydraulic_nikuradse() {
        let o = PipeflowOptions::default();
        assert_eq!(o.mode, CalculationMode::Hydraulics);
        assert_eq!(o.friction_model, FrictionModel::Nikuradse);
        assert!(o.check_connectivity);
        assert!(!o.thermal_requested());
    }

    #[test]
    fn thermal_modes_request_thermal() {
        for mode in [
            CalculationMode::Heat,
            CalculationMode::Sequential,
            CalculationMode::Bidirectional,
        ] {
            assert!(PipeflowOptions::with_mode(mode).thermal_requested());
        }
    }
}

//! Column layouts of the node and branch pits, plus type tags.
//!
//! Column units: pressure in bar, temperature in K, length in m, velocity
//! in m/s, mass flow in kg/s, density in kg/m³, viscosity in Pa·s.

/// Node pit columns.
pub mod node {
    /// Table tag (see [`crate::kind::node_table`]).
    pub const TABLE: usize = 0;
    /// Element index within its user-facing table.
    pub const ELEMENT: usize = 1;
    /// Hydraulic node type tag (see [`node_type`]).
    pub const TYPE: usize = 2;
    pub const ACTIVE: usize = 3;
    /// Density at the node temperature.
    pub const RHO: usize = 4;
    /// Current pressure (relative, bar).
    pub const P: usize = 5;
    /// Demand: positive withdraws mass from the net (kg/s).
    pub const LOAD: usize = 6;
    /// Height above reference (m).
    pub const HEIGHT: usize = 7;
    /// Current temperature (K).
    pub const T: usize = 8;
    /// Ambient pressure at the node height (bar).
    pub const PAMB: usize = 9;
    /// Heat demand at the node (W), positive withdraws heat.
    pub const LOAD_T: usize = 10;
    /// Thermal node type tag (see [`node_type`]).
    pub const TYPE_T: usize = 11;
    /// Number of pressure boundaries attached to this node.
    pub const SLACK_HITS: usize = 12;
    /// Number of temperature boundaries attached to this node.
    pub const SLACK_HITS_T: usize = 13;

    pub const COLS: usize = 14;
}

/// Node type tags stored in [`node::TYPE`] / [`node::TYPE_T`].
pub mod node_type {
    /// Free variable.
    pub const FREE: f64 = 0.0;
    /// Pressure slack (hydraulic) or temperature slack (thermal column).
    pub const SLACK: f64 = 1.0;
    /// Pressure-controlled node (pinned by a pressure controller).
    pub const CONTROLLED: f64 = 2.0;
}

/// Branch pit columns.
pub mod branch {
    pub const TABLE: usize = 0;
    pub const ELEMENT: usize = 1;
    /// From-node row in the node pit.
    pub const FROM: usize = 2;
    /// To-node row in the node pit.
    pub const TO: usize = 3;
    pub const ACTIVE: usize = 4;
    pub const LENGTH: usize = 5;
    /// Hydraulic diameter (m).
    pub const D: usize = 6;
    /// Cross-section area (m²).
    pub const AREA: usize = 7;
    /// Density seen by the branch (mean of its nodes).
    pub const RHO: usize = 8;
    /// Dynamic viscosity (Pa·s).
    pub const ETA: usize = 9;
    /// Absolute roughness (m).
    pub const K: usize = 10;
    /// Mean branch temperature (K).
    pub const T_MEAN: usize = 11;
    /// Current velocity, reference state for gases (m/s).
    pub const V: usize = 12;
    pub const RE: usize = 13;
    pub const LAMBDA: usize = 14;
    /// ∂F_branch/∂v.
    pub const JAC_DV: usize = 15;
    /// ∂F_branch/∂p_from.
    pub const JAC_DP_FROM: usize = 16;
    /// ∂F_branch/∂p_to.
    pub const JAC_DP_TO: usize = 17;
    /// Branch momentum load vector (negative residual).
    pub const LOAD_VEC: usize = 18;
    /// ∂(node mass balance)/∂v = ρ·A.
    pub const JAC_DV_NODE: usize = 19;
    /// Mass flow ρ·A·v carried into node balances (kg/s).
    pub const MDOT: usize = 20;
    /// Lumped loss coefficient ζ.
    pub const LOSS: usize = 21;
    /// Heat capacity at the branch temperature (J/(kg·K)).
    pub const CP: usize = 22;
    /// Heat transfer coefficient to ambient (W/(m²·K)).
    pub const ALPHA: usize = 23;
    /// ∂F_thermal/∂T_in.
    pub const JAC_DT_IN: usize = 24;
    /// ∂F_thermal/∂T_out.
    pub const JAC_DT_OUT: usize = 25;
    /// Thermal branch load vector (negative residual).
    pub const LOAD_VEC_T: usize = 26;
    /// Branch outlet temperature (K).
    pub const T_OUT: usize = 27;
    /// ∂(node energy balance)/∂T contributions of this branch.
    pub const JAC_DT_NODE: usize = 28;
    /// ṁ·T_out carried into node mixing (kg·K/s).
    pub const MDOT_T: usize = 29;
    /// |v| used by the thermal pass (flow-aligned).
    pub const V_T: usize = 30;
    /// Flow-aligned from node (thermal pass).
    pub const FROM_T: usize = 31;
    /// Flow-aligned to node (thermal pass).
    pub const TO_T: usize = 32;
    /// External heat input (W), positive withdraws heat from the fluid.
    pub const QEXT: usize = 33;
    /// Ambient temperature seen by the branch (K).
    pub const TEXT: usize = 34;
    /// Branch type tag (see [`branch_type`]).
    pub const TYPE: usize = 35;
    /// Pressure lift (bar).
    pub const PL: usize = 36;
    /// Temperature lift (K).
    pub const TL: usize = 37;

    pub const COLS: usize = 38;
}

/// Branch type tags stored in [`branch::TYPE`].
pub mod branch_type {
    pub const NORMAL: f64 = 0.0;
    /// Active pressure-control branch: its matrix row pins the controlled
    /// node instead of a momentum law.
    pub const CONTROL: f64 = 2.0;
}

//! The process-wide fluid and its property lookup.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use pf_core::numeric::ensure_positive;

use crate::error::{FluidError, FluidResult};
use crate::property::PropertyModel;

/// Phase of the fluid; switches the solver between the incompressible and
/// the compressible momentum law.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Liquid,
    Gas,
}

/// Physical properties a fluid can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyKind {
    /// Density in kg/m³ as a function of T in K. For gases this is the
    /// density at the normal reference state (p_N, T_N).
    Density,
    /// Dynamic viscosity in Pa·s as a function of T in K.
    Viscosity,
    /// Specific isobaric heat capacity in J/(kg·K) as a function of T in K.
    HeatCapacity,
    /// Compressibility factor as a function of absolute pressure in bar.
    Compressibility,
    /// Molar mass in kg/mol.
    MolarMass,
}

/// One fluid for the whole network.
///
/// Created before the first solve and read immutably by the solver; may be
/// replaced between solves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fluid {
    name: String,
    phase: Phase,
    properties: HashMap<PropertyKind, PropertyModel>,
}

impl Fluid {
    pub fn new(name: impl Into<String>, phase: Phase) -> Self {
        Self {
            name: name.into(),
            phase,
            properties: HashMap::new(),
        }
    }

    /// Attach or replace a property model (builder style).
    pub fn with_property(mut self, kind: PropertyKind, model: PropertyModel) -> FluidResult<Self> {
        model.validate()?;
        self.properties.insert(kind, model);
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_gas(&self) -> bool {
        self.phase == Phase::Gas
    }

    fn property(&self, kind: PropertyKind) -> FluidResult<&PropertyModel> {
        self.properties
            .get(&kind)
            .ok_or_else(|| FluidError::UndefinedProperty {
                fluid: self.name.clone(),
                property: kind,
            })
    }

    /// Density in kg/m³ at temperature T in K (normal-state density for gases).
    pub fn density(&self, t_k: f64) -> FluidResult<f64> {
        let rho = self.property(PropertyKind::Density)?.at(t_k);
        Ok(ensure_positive(rho, "density")?)
    }

    /// Dynamic viscosity in Pa·s at temperature T in K.
    pub fn viscosity(&self, t_k: f64) -> FluidResult<f64> {
        let eta = self.property(PropertyKind::Viscosity)?.at(t_k);
        Ok(ensure_positive(eta, "viscosity")?)
    }

    /// Specific isobaric heat capacity in J/(kg·K) at temperature T in K.
    pub fn heat_capacity(&self, t_k: f64) -> FluidResult<f64> {
        let cp = self.property(PropertyKind::HeatCapacity)?.at(t_k);
        Ok(ensure_positive(cp, "heat capacity")?)
    }

    /// Compressibility factor at absolute pressure in bar.
    ///
    /// Liquids without a compressibility model report 1.0.
    pub fn compressibility(&self, p_bar_abs: f64) -> FluidResult<f64> {
        match self.properties.get(&PropertyKind::Compressibility) {
            Some(model) => Ok(ensure_positive(model.at(p_bar_abs), "compressibility factor")?),
            None => Ok(1.0),
        }
    }

    /// Derivative of the compressibility factor with respect to pressure.
    pub fn der_compressibility(&self, p_bar_abs: f64) -> FluidResult<f64> {
        match self.properties.get(&PropertyKind::Compressibility) {
            Some(model) => Ok(model.derivative_at(p_bar_abs)),
            None => Ok(0.0),
        }
    }

    /// Molar mass in kg/mol.
    pub fn molar_mass(&self) -> FluidResult<f64> {
        Ok(self.property(PropertyKind::MolarMass)?.at(0.0))
    }

    /// Specific gas constant R/M in J/(kg·K).
    pub fn specific_gas_constant(&self) -> FluidResult<f64> {
        Ok(pf_core::units::constants::R_UNIVERSAL / self.molar_mass()?)
    }

    /// Isentropic exponent estimated from cp and the specific gas constant.
    pub fn isentropic_exponent(&self, t_k: f64) -> FluidResult<f64> {
        let cp = self.heat_capacity(t_k)?;
        let rs = self.specific_gas_constant()?;
        if cp <= rs {
            return Err(FluidError::NonPhysical {
                what: "cp must exceed the specific gas constant",
            });
        }
        Ok(cp / (cp - rs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn test_fluid() -> Fluid {
        Fluid::new("test", Phase::Liquid)
            .with_property(PropertyKind::Density, PropertyModel::Constant(998.2))
            .unwrap()
            .with_property(PropertyKind::Viscosity, PropertyModel::Constant(1.002e-3))
            .unwrap()
            .with_property(PropertyKind::HeatCapacity, PropertyModel::Constant(4182.0))
            .unwrap()
    }

    #[test]
    fn property_lookup() {
        let f = test_fluid();
        assert_relative_eq!(f.density(293.15).unwrap(), 998.2);
        assert_relative_eq!(f.viscosity(293.15).unwrap(), 1.002e-3);
        assert!(!f.is_gas());
    }

    #[test]
    fn missing_property_is_an_error() {
        let f = test_fluid();
        assert!(matches!(
            f.molar_mass(),
            Err(FluidError::UndefinedProperty { .. })
        ));
    }

    #[test]
    fn non_positive_property_is_rejected() {
        let f = Fluid::new("bad", Phase::Liquid)
            .with_property(PropertyKind::Density, PropertyModel::Constant(-1.0))
            .unwrap();
        assert!(matches!(
            f.density(293.15),
            Err(FluidError::NonPhysical { what: "density" })
        ));
    }

    #[test]
    fn compressibility_defaults_to_ideal() {
        let f = test_fluid();
        assert_relative_eq!(f.compressibility(5.0).unwrap(), 1.0);
        assert_relative_eq!(f.der_compressibility(5.0).unwrap(), 0.0);
    }

    #[test]
    fn isentropic_exponent_from_cp() {
        let f = Fluid::new("gas", Phase::Gas)
            .with_property(PropertyKind::HeatCapacity, PropertyModel::Constant(2185.0))
            .unwrap()
            .with_property(PropertyKind::MolarMass, PropertyModel::Constant(0.016))
            .unwrap();
        let rs = f.specific_gas_constant().unwrap();
        assert_relative_eq!(rs, 8.314 / 0.016, max_relative = 1e-12);
        let kappa = f.isentropic_exponent(293.15).unwrap();
        assert_relative_eq!(kappa, 2185.0 / (2185.0 - rs), max_relative = 1e-12);
    }
}

//! Predefined fluids with property values in the solver's unit system.
//!
//! Liquids carry temperature tables for density and viscosity; gases carry
//! their normal-state density plus a linear compressibility model.

use crate::fluid::{Fluid, Phase, PropertyKind};
use crate::property::PropertyModel;

/// Liquid water between 0 °C and 100 °C.
pub fn water() -> Fluid {
    Fluid::new("water", Phase::Liquid)
        .with_property(
            PropertyKind::Density,
            PropertyModel::Table {
                x: vec![273.15, 283.15, 293.15, 303.15, 313.15, 333.15, 353.15, 373.15],
                y: vec![999.84, 999.70, 998.21, 995.65, 992.22, 983.20, 971.80, 958.35],
            },
        )
        .expect("static property table is valid")
        .with_property(
            PropertyKind::Viscosity,
            PropertyModel::Table {
                x: vec![273.15, 283.15, 293.15, 303.15, 313.15, 333.15, 353.15, 373.15],
                y: vec![
                    1.793e-3, 1.307e-3, 1.002e-3, 0.798e-3, 0.653e-3, 0.467e-3, 0.355e-3, 0.282e-3,
                ],
            },
        )
        .expect("static property table is valid")
        .with_property(PropertyKind::HeatCapacity, PropertyModel::Constant(4186.0))
        .expect("constant is valid")
        .with_property(PropertyKind::MolarMass, PropertyModel::Constant(0.018_015))
        .expect("constant is valid")
}

/// High calorific natural gas.
pub fn hgas() -> Fluid {
    Fluid::new("hgas", Phase::Gas)
        .with_property(PropertyKind::Density, PropertyModel::Constant(0.7614))
        .expect("constant is valid")
        .with_property(PropertyKind::Viscosity, PropertyModel::Constant(1.10e-5))
        .expect("constant is valid")
        .with_property(PropertyKind::HeatCapacity, PropertyModel::Constant(2185.0))
        .expect("constant is valid")
        .with_property(
            PropertyKind::Compressibility,
            PropertyModel::Linear {
                slope: -0.0022,
                offset: 1.0,
            },
        )
        .expect("linear model is valid")
        .with_property(PropertyKind::MolarMass, PropertyModel::Constant(0.016_04))
        .expect("constant is valid")
}

/// Low calorific natural gas.
pub fn lgas() -> Fluid {
    Fluid::new("lgas", Phase::Gas)
        .with_property(PropertyKind::Density, PropertyModel::Constant(0.8281))
        .expect("constant is valid")
        .with_property(PropertyKind::Viscosity, PropertyModel::Constant(1.22e-5))
        .expect("constant is valid")
        .with_property(PropertyKind::HeatCapacity, PropertyModel::Constant(2100.0))
        .expect("constant is valid")
        .with_property(
            PropertyKind::Compressibility,
            PropertyModel::Linear {
                slope: -0.0021,
                offset: 1.0,
            },
        )
        .expect("linear model is valid")
        .with_property(PropertyKind::MolarMass, PropertyModel::Constant(0.018_31))
        .expect("constant is valid")
}

/// Hydrogen.
pub fn hydrogen() -> Fluid {
    Fluid::new("hydrogen", Phase::Gas)
        .with_property(PropertyKind::Density, PropertyModel::Constant(0.0899))
        .expect("constant is valid")
        .with_property(PropertyKind::Viscosity, PropertyModel::Constant(8.76e-6))
        .expect("constant is valid")
        .with_property(PropertyKind::HeatCapacity, PropertyModel::Constant(14_300.0))
        .expect("constant is valid")
        .with_property(
            PropertyKind::Compressibility,
            PropertyModel::Linear {
                slope: 0.0006,
                offset: 1.0,
            },
        )
        .expect("linear model is valid")
        .with_property(PropertyKind::MolarMass, PropertyModel::Constant(0.002_016))
        .expect("constant is valid")
}

/// Dry air.
pub fn air() -> Fluid {
    Fluid::new("air", Phase::Gas)
        .with_property(PropertyKind::Density, PropertyModel::Constant(1.2922))
        .expect("constant is valid")
        .with_property(PropertyKind::Viscosity, PropertyModel::Constant(1.72e-5))
        .expect("constant is valid")
        .with_property(PropertyKind::HeatCapacity, PropertyModel::Constant(1006.0))
        .expect("constant is valid")
        .with_property(
            PropertyKind::Compressibility,
            PropertyModel::Constant(1.0),
        )
        .expect("constant is valid")
        .with_property(
            PropertyKind::MolarMass,
            PropertyModel::Constant(pf_core::units::constants::MOLAR_MASS_AIR),
        )
        .expect("constant is valid")
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn water_density_at_room_temperature() {
        let f = water();
        assert_relative_eq!(f.density(293.15).unwrap(), 998.21, max_relative = 1e-6);
        assert!(!f.is_gas());
    }

    #[test]
    fn gases_report_gas_phase_and_normal_density() {
        for f in [hgas(), lgas(), hydrogen(), air()] {
            assert!(f.is_gas());
            assert!(f.density(293.15).unwrap() > 0.0);
            assert!(f.compressibility(1.01325).unwrap() > 0.9);
        }
    }

    #[test]
    fn hgas_compressibility_drops_with_pressure() {
        let f = hgas();
        let z1 = f.compressibility(1.0).unwrap();
        let z50 = f.compressibility(50.0).unwrap();
        assert!(z50 < z1);
        assert_relative_eq!(f.der_compressibility(10.0).unwrap(), -0.0022);
    }
}

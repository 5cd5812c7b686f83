use uom::si::f64::{
    Area as UomArea, DynamicViscosity as UomDynamicViscosity, HeatTransfer as UomHeatTransfer,
    Length as UomLength, MassDensity as UomMassDensity, MassRate as UomMassRate,
    MolarMass as UomMolarMass, Power as UomPower, Pressure as UomPressure, Ratio as UomRatio,
    SpecificHeatCapacity as UomSpecificHeatCapacity,
    ThermodynamicTemperature as UomThermodynamicTemperature, Velocity as UomVelocity,
};

// Public canonical unit types (SI, f64)
pub type Area = UomArea;
pub type Density = UomMassDensity;
pub type DynVisc = UomDynamicViscosity;
pub type HeatTransfer = UomHeatTransfer;
pub type Length = UomLength;
pub type MassRate = UomMassRate;
pub type MolarMass = UomMolarMass;
pub type Power = UomPower;
pub type Pressure = UomPressure;
pub type Ratio = UomRatio;
pub type SpecHeatCapacity = UomSpecificHeatCapacity;
pub type Temperature = UomThermodynamicTemperature;
pub type Velocity = UomVelocity;

#[inline]
pub fn pa(v: f64) -> Pressure {
    use uom::si::pressure::pascal;
    Pressure::new::<pascal>(v)
}

#[inline]
pub fn bar(v: f64) -> Pressure {
    use uom::si::pressure::bar;
    Pressure::new::<bar>(v)
}

#[inline]
pub fn k(v: f64) -> Temperature {
    use uom::si::thermodynamic_temperature::kelvin;
    Temperature::new::<kelvin>(v)
}

#[inline]
pub fn kgps(v: f64) -> MassRate {
    use uom::si::mass_rate::kilogram_per_second;
    MassRate::new::<kilogram_per_second>(v)
}

#[inline]
pub fn m(v: f64) -> Length {
    use uom::si::length::meter;
    Length::new::<meter>(v)
}

#[inline]
pub fn mm(v: f64) -> Length {
    use uom::si::length::millimeter;
    Length::new::<millimeter>(v)
}

#[inline]
pub fn km(v: f64) -> Length {
    use uom::si::length::kilometer;
    Length::new::<kilometer>(v)
}

#[inline]
pub fn w(v: f64) -> Power {
    use uom::si::power::watt;
    Power::new::<watt>(v)
}

#[inline]
pub fn kw(v: f64) -> Power {
    use uom::si::power::kilowatt;
    Power::new::<kilowatt>(v)
}

/// Extractors used at the PIT boundary where columns are raw `f64`.
#[inline]
pub fn in_bar(p: Pressure) -> f64 {
    use uom::si::pressure::bar;
    p.get::<bar>()
}

#[inline]
pub fn in_k(t: Temperature) -> f64 {
    use uom::si::thermodynamic_temperature::kelvin;
    t.get::<kelvin>()
}

#[inline]
pub fn in_kgps(mdot: MassRate) -> f64 {
    use uom::si::mass_rate::kilogram_per_second;
    mdot.get::<kilogram_per_second>()
}

#[inline]
pub fn in_m(l: Length) -> f64 {
    use uom::si::length::meter;
    l.get::<meter>()
}

#[inline]
pub fn in_w(p: Power) -> f64 {
    use uom::si::power::watt;
    p.get::<watt>()
}

/// Physical and unit-system constants of the solver.
///
/// The internal tables carry pressure in bar, temperature in K and velocity
/// in m/s; `P_CONVERSION` relates the momentum terms (Pa) to the pressure
/// columns (bar).
pub mod constants {
    /// Earth acceleration in m/s².
    pub const GRAVITATION_CONSTANT: f64 = 9.81;
    /// Normal temperature (0 °C) in K.
    pub const NORMAL_TEMPERATURE: f64 = 273.15;
    /// Pressure at normal conditions (sea level) in bar.
    pub const NORMAL_PRESSURE: f64 = 1.01325;
    /// Universal (molar) gas constant in J/(mol·K).
    pub const R_UNIVERSAL: f64 = 8.314;
    /// Molar mass of air in kg/mol.
    pub const MOLAR_MASS_AIR: f64 = 0.028_96;
    /// Pa per bar, relates momentum terms to pressure columns.
    pub const P_CONVERSION: f64 = 1e5;
    /// Exponent of the international barometric height formula.
    pub const HEIGHT_EXPONENT: f64 = 5.255;
    /// Temperature gradient of moist air in K/m.
    pub const TEMP_GRADIENT_KPM: f64 = 0.0065;
    /// Average sea-level temperature in K.
    pub const AVG_TEMPERATURE_K: f64 = 288.15;
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn constructors_smoke() {
        let _p = pa(101_325.0);
        let _t = k(300.0);
        let _mdot = kgps(1.2);
        let _l = m(2.0);
        let _q = kw(100.0);
    }

    #[test]
    fn bar_pascal_round_trip() {
        assert_relative_eq!(in_bar(pa(1e5)), 1.0, max_relative = 1e-12);
        assert_relative_eq!(bar(5.0).value, 5e5, max_relative = 1e-12);
    }

    #[test]
    fn length_units_collapse_to_meters() {
        assert_relative_eq!(in_m(km(1.0)), 1000.0, max_relative = 1e-12);
        assert_relative_eq!(in_m(mm(200.0)), 0.2, max_relative = 1e-12);
    }
}

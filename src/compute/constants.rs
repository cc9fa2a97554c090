//! Physical and astronomical constants in SI units.

/// Gravitational constant (m³ kg⁻¹ s⁻²).
pub const G: f64 = 6.674_30e-11;

/// Boltzmann constant (J/K).
pub const BOLTZMANN: f64 = 1.380_649e-23;

/// Proton mass (kg).
pub const PROTON_MASS: f64 = 1.672_621_923_69e-27;

/// Solar mass (kg).
pub const SOLAR_MASS: f64 = 1.988_92e30;

/// Solar radius (m).
pub const SOLAR_RADIUS: f64 = 6.955e8;

/// Solar luminosity (W).
pub const SOLAR_LUMINOSITY: f64 = 3.839e26;

/// Julian year (s).
pub const YEAR: f64 = 3.155_76e7;

/// One kilometre per second (m/s).
pub const KM_PER_S: f64 = 1.0e3;

/// Convert a mass-loss rate in solar masses per year to kg/s.
#[inline]
pub fn solar_masses_per_year(value: f64) -> f64 {
    value * SOLAR_MASS / YEAR
}

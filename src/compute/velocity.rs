//! Terminal wind velocity after Kudritzki & Puls (2000) and Kudritzki et al. (1989).
//!
//! The terminal velocity is the surface escape velocity, reduced by the
//! Eddington factor for Thomson scattering, times an empirical multiplier
//! that depends on the effective temperature.

use super::constants::{G, SOLAR_LUMINOSITY, SOLAR_MASS};

/// Default helium mass fraction.
pub const DEFAULT_HELIUM_FRACTION: f64 = 0.25;

/// Default number of free electrons per helium nucleus (2 in O stars).
pub const DEFAULT_HELIUM_ELECTRONS: f64 = 2.0;

/// Hot-star branch lower bound (K), inclusive.
pub const HOT_WIND_TEMPERATURE: f64 = 21_000.0;

/// Cool-star branch upper bound (K), inclusive.
pub const COOL_WIND_TEMPERATURE: f64 = 10_000.0;

/// Temperature-dependent ratio of terminal to escape velocity.
///
/// `T >= 21000 K` gives 2.65, `10000 K < T < 21000 K` gives 1.4 and
/// `T <= 10000 K` gives 1.0. Both boundaries belong to the outer branches.
#[inline]
pub fn velocity_multiplier(temperature: f64) -> f64 {
    if temperature >= HOT_WIND_TEMPERATURE {
        2.65
    } else if temperature > COOL_WIND_TEMPERATURE {
        1.4
    } else {
        1.0
    }
}

/// Thomson opacity per unit mass in cm²/g for helium fraction `y`.
#[inline]
pub fn thomson_opacity(y: f64, helium_electrons: f64) -> f64 {
    0.398 * (1.0 + helium_electrons * y) / (1.0 + 4.0 * y)
}

/// Eddington ratio of radiative Thomson to gravitational acceleration.
#[inline]
pub fn eddington_factor(mass: f64, luminosity: f64, y: f64, helium_electrons: f64) -> f64 {
    if mass <= 0.0 {
        return 0.0;
    }
    7.66e-5 * thomson_opacity(y, helium_electrons) * (luminosity / SOLAR_LUMINOSITY)
        / (mass / SOLAR_MASS)
}

/// Surface escape velocity corrected for the Eddington factor (m/s).
///
/// Returns zero when the star is at or beyond the Eddington limit or has
/// a non-positive radius.
pub fn effective_escape_velocity(
    mass: f64,
    radius: f64,
    luminosity: f64,
    y: f64,
    helium_electrons: f64,
) -> f64 {
    if radius <= 0.0 {
        return 0.0;
    }
    let gamma = eddington_factor(mass, luminosity, y, helium_electrons);
    (2.0 * G * mass / radius * (1.0 - gamma)).max(0.0).sqrt()
}

/// Terminal wind velocity (m/s) with explicit composition parameters.
pub fn kudritzki_wind_velocity_with(
    mass: f64,
    radius: f64,
    luminosity: f64,
    temperature: f64,
    y: f64,
    helium_electrons: f64,
) -> f64 {
    effective_escape_velocity(mass, radius, luminosity, y, helium_electrons)
        * velocity_multiplier(temperature)
}

/// Terminal wind velocity (m/s) for `Y = 0.25` and `I_He = 2`.
///
/// # Examples
///
/// ```
/// use stellar_wind::compute::constants::{SOLAR_LUMINOSITY, SOLAR_MASS, SOLAR_RADIUS};
/// use stellar_wind::compute::kudritzki_wind_velocity;
///
/// let v = kudritzki_wind_velocity(
///     20.0 * SOLAR_MASS,
///     10.0 * SOLAR_RADIUS,
///     1.0e5 * SOLAR_LUMINOSITY,
///     30_000.0,
/// );
/// assert!(v > 1.0e6 && v < 3.0e6);
/// ```
pub fn kudritzki_wind_velocity(mass: f64, radius: f64, luminosity: f64, temperature: f64) -> f64 {
    kudritzki_wind_velocity_with(
        mass,
        radius,
        luminosity,
        temperature,
        DEFAULT_HELIUM_FRACTION,
        DEFAULT_HELIUM_ELECTRONS,
    )
}

/// Elementwise terminal velocities over parallel attribute slices.
pub fn kudritzki_wind_velocities(
    mass: &[f64],
    radius: &[f64],
    luminosity: &[f64],
    temperature: &[f64],
) -> Vec<f64> {
    mass.iter()
        .zip(radius)
        .zip(luminosity)
        .zip(temperature)
        .map(|(((&m, &r), &l), &t)| kudritzki_wind_velocity(m, r, l, t))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::constants::SOLAR_RADIUS;

    #[test]
    fn test_multiplier_branches() {
        assert_eq!(velocity_multiplier(25_000.0), 2.65);
        assert_eq!(velocity_multiplier(15_000.0), 1.4);
        assert_eq!(velocity_multiplier(5_000.0), 1.0);
    }

    #[test]
    fn test_multiplier_boundaries() {
        // Both boundaries resolve to the outer, closed branches
        assert_eq!(velocity_multiplier(21_000.0), 2.65);
        assert_eq!(velocity_multiplier(10_000.0), 1.0);
        assert_eq!(velocity_multiplier(10_000.000_001), 1.4);
        assert_eq!(velocity_multiplier(20_999.999_999), 1.4);
    }

    #[test]
    fn test_thomson_opacity_default_composition() {
        // 0.398 * (1 + 0.5) / 2
        let sigma = thomson_opacity(0.25, 2.0);
        assert!((sigma - 0.2985).abs() < 1e-12);
    }

    #[test]
    fn test_terminal_velocity_matches_formula() {
        let mass = 20.0 * SOLAR_MASS;
        let radius = 10.0 * SOLAR_RADIUS;
        let luminosity = 1.0e5 * SOLAR_LUMINOSITY;

        let gamma = 7.66e-5 * 0.2985 * 1.0e5 / 20.0;
        let v_esc = (2.0 * G * mass / radius * (1.0 - gamma)).sqrt();

        let v = kudritzki_wind_velocity(mass, radius, luminosity, 30_000.0);
        assert!((v - 2.65 * v_esc).abs() / v < 1e-12);

        let v_cool = kudritzki_wind_velocity(mass, radius, luminosity, 8_000.0);
        assert!((v_cool - v_esc).abs() / v_cool < 1e-12);
    }

    #[test]
    fn test_super_eddington_star_has_no_wind_speed() {
        let v = kudritzki_wind_velocity(
            1.0 * SOLAR_MASS,
            SOLAR_RADIUS,
            1.0e7 * SOLAR_LUMINOSITY,
            40_000.0,
        );
        assert_eq!(v, 0.0);
    }

    #[test]
    fn test_degenerate_inputs_stay_finite() {
        assert_eq!(kudritzki_wind_velocity(0.0, SOLAR_RADIUS, 1.0, 5_000.0), 0.0);
        assert_eq!(kudritzki_wind_velocity(SOLAR_MASS, 0.0, 1.0, 5_000.0), 0.0);
    }

    #[test]
    fn test_elementwise_velocities() {
        let m = [20.0 * SOLAR_MASS, 20.0 * SOLAR_MASS];
        let r = [10.0 * SOLAR_RADIUS, 10.0 * SOLAR_RADIUS];
        let l = [1.0e5 * SOLAR_LUMINOSITY, 1.0e5 * SOLAR_LUMINOSITY];
        let t = [25_000.0, 15_000.0];

        let v = kudritzki_wind_velocities(&m, &r, &l, &t);
        assert_eq!(v.len(), 2);
        assert!((v[0] / v[1] - 2.65 / 1.4).abs() < 1e-12);
    }
}

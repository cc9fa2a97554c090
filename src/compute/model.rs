//! Wind model strategies.
//!
//! Each model decides the launch speed, the shell geometry, and the
//! specific internal energy of emitted particles. The accelerating model
//! also exposes a radial acceleration field for gravity coupling.

use crate::schema::{InternalEnergyRule, WindMode};

use super::constants::{BOLTZMANN, G};
use super::emitter::ShellBounds;
use super::ensemble::Star;

/// Empirical scaling of the surface thermal energy.
const THERMAL_ENERGY_FACTOR: f64 = 0.8;

/// Wind model selected at construction.
#[derive(Debug, Clone, PartialEq)]
pub enum WindModel {
    /// Ballistic wind at the terminal velocity.
    Simple { internal_energy: InternalEnergyRule },
    /// Sub-terminal launch plus a `1/r²` radiative acceleration band.
    Accelerating {
        init_wind_velocity: f64,
        r_min_ratio: f64,
        r_max_ratio: f64,
    },
    /// Comoving particles carrying integrated mechanical luminosity.
    Mechanical {
        feedback_efficiency: f64,
        r_max: Option<f64>,
        r_max_ratio: f64,
    },
}

impl From<&WindMode> for WindModel {
    fn from(mode: &WindMode) -> Self {
        match *mode {
            WindMode::Simple { internal_energy } => Self::Simple { internal_energy },
            WindMode::Accelerate {
                init_wind_velocity,
                r_min_ratio,
                r_max_ratio,
            } => Self::Accelerating {
                init_wind_velocity,
                r_min_ratio,
                r_max_ratio,
            },
            WindMode::Mechanical {
                feedback_efficiency,
                r_max,
                r_max_ratio,
            } => Self::Mechanical {
                feedback_efficiency,
                r_max,
                r_max_ratio,
            },
        }
    }
}

impl WindModel {
    /// Whether stars need mechanical-energy integration under this model.
    #[inline]
    pub fn tracks_mechanical_energy(&self) -> bool {
        matches!(self, Self::Mechanical { .. })
    }

    /// Speed at which particles leave the star (m/s).
    pub fn initial_wind_velocity(&self, star: &Star) -> f64 {
        match *self {
            Self::Simple { .. } => star.terminal_wind_velocity(),
            Self::Accelerating {
                init_wind_velocity, ..
            } => init_wind_velocity,
            Self::Mechanical { .. } => 0.0,
        }
    }

    /// Shell for a star emitting at `model_time`.
    ///
    /// For ballistic models the outer extent is how far the previous ejecta
    /// travelled since the star's last release.
    pub fn shell_bounds(&self, star: &Star, model_time: f64) -> ShellBounds {
        match *self {
            Self::Mechanical {
                r_max, r_max_ratio, ..
            } => ShellBounds {
                r_min: star.radius,
                r_max: r_max.unwrap_or(r_max_ratio * star.radius),
                speed: 0.0,
            },
            _ => {
                let speed = self.initial_wind_velocity(star);
                ShellBounds {
                    r_min: star.radius,
                    r_max: speed * (model_time - star.wind_release_time).max(0.0),
                    speed,
                }
            }
        }
    }

    /// Specific internal energy (J/kg) for a batch of `batch_mass` kg just
    /// taken from `star`.
    ///
    /// The mechanical model draws its share from the star's stored energy:
    /// the fraction of the still-outstanding lost mass that this batch
    /// represents.
    pub fn internal_energy(&self, star: &mut Star, batch_mass: f64) -> f64 {
        match *self {
            Self::Simple {
                internal_energy: InternalEnergyRule::Velocity,
            } => 0.5 * star.terminal_wind_velocity().powi(2),
            Self::Simple {
                internal_energy: InternalEnergyRule::Temperature,
            }
            | Self::Accelerating { .. } => thermal_internal_energy(star),
            Self::Mechanical {
                feedback_efficiency,
                ..
            } => {
                if !(batch_mass > 0.0) {
                    return 0.0;
                }
                let Some(mechanical) = star.mechanical.as_mut() else {
                    return 0.0;
                };
                let share =
                    mechanical.energy / (star.lost_mass.max(0.0) / batch_mass + 1.0);
                mechanical.energy = (mechanical.energy - share).max(0.0);
                feedback_efficiency * share / batch_mass
            }
        }
    }

    /// Radial acceleration magnitude at `distance` from `star` (m/s²).
    ///
    /// Non-zero only for the accelerating model and only inside the band.
    pub fn radial_acceleration(&self, star: &Star, distance: f64) -> f64 {
        match *self {
            Self::Accelerating {
                init_wind_velocity,
                r_min_ratio,
                r_max_ratio,
            } => one_over_r_squared_acceleration(
                star,
                distance,
                init_wind_velocity,
                r_min_ratio * star.radius,
                r_max_ratio * star.radius,
            ),
            _ => 0.0,
        }
    }
}

/// `0.8 * 3/2 k_B T / mu`.
pub fn thermal_internal_energy(star: &Star) -> f64 {
    if !(star.mu > 0.0) {
        return 0.0;
    }
    THERMAL_ENERGY_FACTOR * 1.5 * BOLTZMANN * star.temperature / star.mu
}

/// Scaling constant `C` of `a(d) = C / d²` such that the work done between
/// `r_min` and `r_max` lifts the wind from `v_init` to the terminal velocity
/// against gravity.
pub fn acceleration_constant(star: &Star, init_wind_velocity: f64, r_min: f64, r_max: f64) -> f64 {
    let inverse_span = 1.0 / r_min - 1.0 / r_max;
    if !(inverse_span > 0.0) || !inverse_span.is_finite() {
        return 0.0;
    }
    let v_term = star.terminal_wind_velocity();
    let integrated_gravity = G * star.mass * inverse_span;
    let integrated_acceleration =
        0.5 * (v_term * v_term - init_wind_velocity * init_wind_velocity) + integrated_gravity;
    integrated_acceleration / inverse_span
}

/// `C / d²` inside `[r_min, r_max]`, zero elsewhere.
pub fn one_over_r_squared_acceleration(
    star: &Star,
    distance: f64,
    init_wind_velocity: f64,
    r_min: f64,
    r_max: f64,
) -> f64 {
    if !(distance > 0.0) || distance < r_min || distance > r_max {
        return 0.0;
    }
    acceleration_constant(star, init_wind_velocity, r_min, r_max) / (distance * distance)
}

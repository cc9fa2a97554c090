//! Configuration types for stellar wind parameters.
//!
//! All quantities are SI: kg, m, s, m/s.

use serde::{Deserialize, Serialize};

use crate::compute::constants::{KM_PER_S, PROTON_MASS, SOLAR_MASS, YEAR};

fn default_init_wind_velocity() -> f64 {
    5.0 * KM_PER_S
}

fn default_r_min_ratio() -> f64 {
    1.0
}

fn default_r_max_ratio() -> f64 {
    5.0
}

fn default_feedback_efficiency() -> f64 {
    0.01
}

/// Top-level wind configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindConfig {
    /// Mass of every emitted gas particle (kg).
    pub sph_particle_mass: f64,
    /// Derive mass-loss rates from successive stellar-evolution snapshots.
    #[serde(default)]
    pub derive_from_evolution: bool,
    /// Tag emitted particles with the key of their source star.
    #[serde(default)]
    pub tag_gas_source: bool,
    /// Emission timestep (s). Required when a target gas sink is attached.
    #[serde(default)]
    pub timestep: Option<f64>,
    /// Wind model and its options.
    #[serde(default)]
    pub mode: WindMode,
    /// Composition used to derive the global mean molecular mass.
    #[serde(default)]
    pub composition: Composition,
    /// Seed for shell sampling. `None` draws from system entropy.
    #[serde(default)]
    pub random_seed: Option<u64>,
}

impl Default for WindConfig {
    fn default() -> Self {
        Self {
            sph_particle_mass: 1.0e-8 * SOLAR_MASS,
            derive_from_evolution: false,
            tag_gas_source: false,
            timestep: None,
            mode: WindMode::default(),
            composition: Composition::default(),
            random_seed: None,
        }
    }
}

/// Wind model selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WindMode {
    /// Particles leave the star at the terminal velocity.
    Simple {
        #[serde(default)]
        internal_energy: InternalEnergyRule,
    },
    /// Particles leave at a sub-terminal speed and are accelerated by a
    /// radiation-pressure field between `r_min_ratio` and `r_max_ratio`
    /// stellar radii.
    Accelerate {
        #[serde(default = "default_init_wind_velocity")]
        init_wind_velocity: f64,
        #[serde(default = "default_r_min_ratio")]
        r_min_ratio: f64,
        #[serde(default = "default_r_max_ratio")]
        r_max_ratio: f64,
    },
    /// Particles start at rest relative to the star and carry the
    /// integrated mechanical luminosity as internal energy.
    Mechanical {
        #[serde(default = "default_feedback_efficiency")]
        feedback_efficiency: f64,
        /// Fixed outer shell radius (m). Overrides `r_max_ratio` when set.
        #[serde(default)]
        r_max: Option<f64>,
        #[serde(default = "default_r_max_ratio")]
        r_max_ratio: f64,
    },
}

impl Default for WindMode {
    fn default() -> Self {
        Self::Simple {
            internal_energy: InternalEnergyRule::default(),
        }
    }
}

impl WindMode {
    /// Accelerating mode with default options.
    pub fn accelerate() -> Self {
        Self::Accelerate {
            init_wind_velocity: default_init_wind_velocity(),
            r_min_ratio: default_r_min_ratio(),
            r_max_ratio: default_r_max_ratio(),
        }
    }

    /// Mechanical-luminosity mode with default options.
    pub fn mechanical() -> Self {
        Self::Mechanical {
            feedback_efficiency: default_feedback_efficiency(),
            r_max: None,
            r_max_ratio: default_r_max_ratio(),
        }
    }

    /// Short name as used in configuration files.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Simple { .. } => "simple",
            Self::Accelerate { .. } => "accelerate",
            Self::Mechanical { .. } => "mechanical",
        }
    }
}

/// Rule for the specific internal energy of simple-wind particles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InternalEnergyRule {
    /// `0.8 * 3/2 k_B T / mu` from the stellar surface temperature.
    #[default]
    Temperature,
    /// `v_terminal² / 2`.
    Velocity,
}

/// Gas composition used for the global mean molecular mass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Composition {
    /// Helium mass fraction.
    pub y: f64,
    /// Metal mass fraction.
    pub z: f64,
    /// Ionisation fraction.
    pub x_ion: f64,
}

impl Default for Composition {
    fn default() -> Self {
        Self {
            y: 0.25,
            z: 0.02,
            x_ion: 0.1,
        }
    }
}

impl Composition {
    /// Hydrogen mass fraction `1 - Y - Z`.
    #[inline]
    pub fn hydrogen_fraction(&self) -> f64 {
        1.0 - self.y - self.z
    }

    /// Mean mass per gas particle (kg).
    pub fn mean_molecular_mass(&self) -> f64 {
        let x = self.hydrogen_fraction();
        PROTON_MASS
            / (x * (1.0 + self.x_ion)
                + self.y * (1.0 + 2.0 * self.x_ion) / 4.0
                + self.z * self.x_ion / 2.0)
    }
}

impl WindConfig {
    /// Configuration for `mode` with every other field at its default.
    pub fn with_mode(sph_particle_mass: f64, mode: WindMode) -> Self {
        Self {
            sph_particle_mass,
            mode,
            ..Self::default()
        }
    }

    /// Default timestep suggestion for CLI scenarios (100 yr).
    pub fn default_timestep() -> f64 {
        100.0 * YEAR
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.sph_particle_mass > 0.0) {
            return Err(ConfigError::InvalidParticleMass);
        }
        if let Some(dt) = self.timestep {
            if !(dt > 0.0) {
                return Err(ConfigError::InvalidTimeStep);
            }
        }
        let c = &self.composition;
        if c.y < 0.0 || c.z < 0.0 || c.hydrogen_fraction() < 0.0 || c.x_ion < 0.0 {
            return Err(ConfigError::InvalidComposition);
        }
        match self.mode {
            WindMode::Simple { .. } => {}
            WindMode::Accelerate {
                init_wind_velocity,
                r_min_ratio,
                r_max_ratio,
            } => {
                if init_wind_velocity < 0.0 {
                    return Err(ConfigError::InvalidInitialVelocity);
                }
                if !(r_min_ratio > 0.0 && r_min_ratio < r_max_ratio) {
                    return Err(ConfigError::InvalidRadiusRatios {
                        r_min_ratio,
                        r_max_ratio,
                    });
                }
            }
            WindMode::Mechanical {
                feedback_efficiency,
                r_max,
                r_max_ratio,
            } => {
                if !(0.0..=1.0).contains(&feedback_efficiency) {
                    return Err(ConfigError::InvalidFeedbackEfficiency(feedback_efficiency));
                }
                if r_max.is_some_and(|r| !(r > 0.0)) || !(r_max_ratio > 0.0) {
                    return Err(ConfigError::InvalidShellRadius);
                }
            }
        }
        Ok(())
    }

    /// Check that a target sink and a timestep are supplied together.
    pub fn validate_coupling(&self, has_target: bool) -> Result<(), ConfigError> {
        match (has_target, self.timestep.is_some()) {
            (true, false) => Err(ConfigError::TargetWithoutTimestep),
            (false, true) => Err(ConfigError::TimestepWithoutTarget),
            _ => Ok(()),
        }
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("SPH particle mass must be positive")]
    InvalidParticleMass,
    #[error("Time step must be positive")]
    InvalidTimeStep,
    #[error("Target gas given without a timestep; specify both or neither")]
    TargetWithoutTimestep,
    #[error("Timestep given without a target gas; specify both or neither")]
    TimestepWithoutTarget,
    #[error("Composition fractions must be non-negative and sum to at most one")]
    InvalidComposition,
    #[error("Initial wind velocity must be non-negative")]
    InvalidInitialVelocity,
    #[error("Acceleration band needs 0 < r_min_ratio < r_max_ratio, got {r_min_ratio} and {r_max_ratio}")]
    InvalidRadiusRatios { r_min_ratio: f64, r_max_ratio: f64 },
    #[error("Feedback efficiency {0} outside [0, 1]")]
    InvalidFeedbackEfficiency(f64),
    #[error("Shell radius must be positive")]
    InvalidShellRadius,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(WindConfig::default().validate(), Ok(()));
        assert_eq!(
            WindConfig::with_mode(1e22, WindMode::accelerate()).validate(),
            Ok(())
        );
        assert_eq!(
            WindConfig::with_mode(1e22, WindMode::mechanical()).validate(),
            Ok(())
        );
    }

    #[test]
    fn test_invalid_particle_mass() {
        let config = WindConfig::with_mode(0.0, WindMode::default());
        assert_eq!(config.validate(), Err(ConfigError::InvalidParticleMass));

        let config = WindConfig::with_mode(f64::NAN, WindMode::default());
        assert_eq!(config.validate(), Err(ConfigError::InvalidParticleMass));
    }

    #[test]
    fn test_coupling_requires_both_or_neither() {
        let mut config = WindConfig::default();
        assert!(config.validate_coupling(false).is_ok());
        assert_eq!(
            config.validate_coupling(true),
            Err(ConfigError::TargetWithoutTimestep)
        );

        config.timestep = Some(YEAR);
        assert!(config.validate_coupling(true).is_ok());
        assert_eq!(
            config.validate_coupling(false),
            Err(ConfigError::TimestepWithoutTarget)
        );
    }

    #[test]
    fn test_inverted_acceleration_band_rejected() {
        let config = WindConfig::with_mode(
            1e22,
            WindMode::Accelerate {
                init_wind_velocity: 5e3,
                r_min_ratio: 4.0,
                r_max_ratio: 2.0,
            },
        );
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidRadiusRatios { .. })
        ));
    }

    #[test]
    fn test_feedback_efficiency_bounds() {
        let config = WindConfig::with_mode(
            1e22,
            WindMode::Mechanical {
                feedback_efficiency: 1.5,
                r_max: None,
                r_max_ratio: 5.0,
            },
        );
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidFeedbackEfficiency(1.5))
        );
    }

    #[test]
    fn test_mean_molecular_mass_default_composition() {
        // X = 0.73: 0.803 + 0.075 + 0.001 = 0.879
        let mu = Composition::default().mean_molecular_mass();
        let expected = PROTON_MASS / 0.879;
        assert!((mu - expected).abs() / expected < 1e-12);
    }

    #[test]
    fn test_mode_json_defaults() {
        let mode: WindMode = serde_json::from_str(r#"{"type": "accelerate"}"#).unwrap();
        assert_eq!(mode, WindMode::accelerate());

        let mode: WindMode =
            serde_json::from_str(r#"{"type": "simple", "internal_energy": "velocity"}"#).unwrap();
        assert_eq!(
            mode,
            WindMode::Simple {
                internal_energy: InternalEnergyRule::Velocity
            }
        );
    }

    #[test]
    fn test_config_roundtrip() {
        let mut config = WindConfig::with_mode(2e22, WindMode::mechanical());
        config.timestep = Some(WindConfig::default_timestep());
        config.random_seed = Some(7);

        let json = serde_json::to_string(&config).unwrap();
        let parsed: WindConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.mode, config.mode);
        assert_eq!(parsed.timestep, config.timestep);
        assert_eq!(parsed.random_seed, Some(7));
    }
}

//! Scenario files for command-line wind runs.

use std::fs;
use std::path::Path;

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::compute::NewStar;
use crate::compute::constants::{
    KM_PER_S, SOLAR_LUMINOSITY, SOLAR_MASS, SOLAR_RADIUS, YEAR, solar_masses_per_year,
};

use super::WindConfig;

/// A star given in solar units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StarSpec {
    /// Mass (MSun).
    pub mass: f64,
    /// Radius (RSun).
    pub radius: f64,
    /// Luminosity (LSun).
    pub luminosity: f64,
    /// Effective temperature (K).
    pub temperature: f64,
    /// Mass-loss rate (MSun/yr).
    pub mass_loss_rate: f64,
    /// Terminal wind velocity override (km/s).
    #[serde(default)]
    pub terminal_wind_velocity: Option<f64>,
    /// Position (m).
    #[serde(default)]
    pub position: DVec3,
    /// Velocity (m/s).
    #[serde(default)]
    pub velocity: DVec3,
}

impl StarSpec {
    /// Convert to an SI star record.
    pub fn to_new_star(&self) -> NewStar {
        let mut star = NewStar::new(
            self.mass * SOLAR_MASS,
            self.radius * SOLAR_RADIUS,
            self.luminosity * SOLAR_LUMINOSITY,
            self.temperature,
        )
        .with_mass_loss_rate(solar_masses_per_year(self.mass_loss_rate))
        .with_position(self.position)
        .with_velocity(self.velocity);
        if let Some(v) = self.terminal_wind_velocity {
            star = star.with_terminal_wind_velocity(v * KM_PER_S);
        }
        star
    }
}

/// Complete command-line run: wind configuration, stars and duration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub wind: WindConfig,
    pub stars: Vec<StarSpec>,
    /// Model time to evolve to (s).
    pub end_time: f64,
    /// Create this many particles up front as if the wind had been blowing.
    #[serde(default)]
    pub initial_particles: Option<usize>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            wind: WindConfig {
                timestep: Some(WindConfig::default_timestep()),
                random_seed: Some(42),
                ..WindConfig::default()
            },
            stars: vec![StarSpec {
                mass: 20.0,
                radius: 10.0,
                luminosity: 1.0e5,
                temperature: 30_000.0,
                mass_loss_rate: 1.0e-6,
                terminal_wind_velocity: None,
                position: DVec3::ZERO,
                velocity: DVec3::ZERO,
            }],
            end_time: 1_000.0 * YEAR,
            initial_particles: None,
        }
    }
}

impl Scenario {
    /// Load a scenario from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Star records in SI units.
    pub fn new_stars(&self) -> Vec<NewStar> {
        self.stars.iter().map(StarSpec::to_new_star).collect()
    }
}

/// Errors loading a scenario file.
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("Failed to read scenario: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse scenario: {0}")]
    Parse(#[from] serde_json::Error),
}

//! Stellar wind - mass loss of stars emitted as SPH gas particles.
//!
//! Stars lose mass at a configured (or evolution-derived) rate. Once a star
//! has lost more than one particle mass, the accumulated mass is released as
//! equal-mass gas particles placed in a spherical shell around the star.
//!
//! # Architecture
//!
//! The crate is split into two main modules:
//!
//! - `schema`: Configuration types and scenario files
//! - `compute`: Star ensemble, wind velocities, emission and the driver
//!
//! # Example
//!
//! ```rust,no_run
//! use stellar_wind::{
//!     NewStar, StellarWind, WindConfig, WindParticle,
//!     compute::constants::{SOLAR_LUMINOSITY, SOLAR_MASS, SOLAR_RADIUS, YEAR, solar_masses_per_year},
//! };
//!
//! let mut config = WindConfig::default();
//! config.timestep = Some(100.0 * YEAR);
//!
//! let mut wind = StellarWind::new(config, Some(Vec::<WindParticle>::new())).unwrap();
//! wind.add_stars([NewStar::new(
//!     20.0 * SOLAR_MASS,
//!     10.0 * SOLAR_RADIUS,
//!     1.0e5 * SOLAR_LUMINOSITY,
//!     30_000.0,
//! )
//! .with_mass_loss_rate(solar_masses_per_year(1.0e-6))]);
//!
//! wind.evolve_model(1.0e4 * YEAR);
//!
//! println!("Emitted {} particles", wind.target_gas().unwrap().len());
//! ```

pub mod compute;
pub mod schema;

// Re-export commonly used types
pub use compute::{
    GasSink, GravityField, InitialWind, NewStar, StarEnsemble, StellarWind, WindError,
    WindModel, WindParticle, WindStats,
};
pub use schema::{Scenario, WindConfig, WindMode};

//! Stellar wind driver.
//!
//! Advances model time, accumulates mass loss on the star ensemble, turns
//! it into wind particles and hands them to the target gas sink.
//!
//! The driver is either *idle* (no sink: time jumps straight to the
//! requested value and emission is left to the caller) or *coupled* (sink
//! plus fixed timestep: every tick accumulates, emits, then advances).

use glam::DVec3;
use rayon::prelude::*;

use crate::schema::{Composition, ConfigError, WindConfig};

use super::emitter::{ShellSampler, WindParticle, emittable_count, has_pending_emission};
use super::ensemble::{NewStar, Star, StarEnsemble, StarKey};
use super::model::WindModel;
use super::sink::{GasSink, GravityField};

/// Errors surfaced by the wind driver.
#[derive(Debug, thiserror::Error)]
pub enum WindError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Initial wind time {time} s was too small to create any particles")]
    InsufficientTime { time: f64 },
}

/// How much initial wind to create.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InitialWind {
    /// At least this many particles, assuming the current total rate.
    Particles(usize),
    /// As if the wind had been blowing for this long (s).
    Time(f64),
}

enum Coupling<S> {
    Idle,
    Coupled { target_gas: S, timestep: f64 },
}

/// Stellar wind code: a star ensemble plus a wind model.
pub struct StellarWind<S = Vec<WindParticle>> {
    config: WindConfig,
    model: WindModel,
    particles: StarEnsemble,
    sampler: ShellSampler,
    model_time: f64,
    coupling: Coupling<S>,
}

impl StellarWind<Vec<WindParticle>> {
    /// Create an idle driver without a target sink.
    pub fn detached(config: WindConfig) -> Result<Self, WindError> {
        Self::new(config, None)
    }
}

impl<S: GasSink> StellarWind<S> {
    /// Create a driver from configuration.
    ///
    /// `target_gas` and `config.timestep` must be given together or not at all.
    pub fn new(config: WindConfig, target_gas: Option<S>) -> Result<Self, WindError> {
        config.validate()?;
        config.validate_coupling(target_gas.is_some())?;

        let model = WindModel::from(&config.mode);
        let mu = config.composition.mean_molecular_mass();
        let mut particles = if config.derive_from_evolution {
            StarEnsemble::with_evolution(mu)
        } else {
            StarEnsemble::new(mu)
        };
        particles.track_mechanical_energy(model.tracks_mechanical_energy());

        let coupling = match (target_gas, config.timestep) {
            (Some(target_gas), Some(timestep)) => Coupling::Coupled {
                target_gas,
                timestep,
            },
            _ => Coupling::Idle,
        };

        log::debug!(
            "stellar wind: mode={} particle_mass={:e} kg coupled={}",
            config.mode.name(),
            config.sph_particle_mass,
            matches!(coupling, Coupling::Coupled { .. })
        );

        Ok(Self {
            sampler: ShellSampler::from_seed(config.random_seed),
            config,
            model,
            particles,
            model_time: 0.0,
            coupling,
        })
    }

    /// Attach a target sink, switching to coupled evolution.
    pub fn set_target_gas(&mut self, target_gas: S, timestep: f64) -> Result<(), WindError> {
        if !(timestep > 0.0) {
            return Err(ConfigError::InvalidTimeStep.into());
        }
        self.config.timestep = Some(timestep);
        self.coupling = Coupling::Coupled {
            target_gas,
            timestep,
        };
        Ok(())
    }

    /// Detach and return the target sink, switching back to idle.
    pub fn take_target_gas(&mut self) -> Option<S> {
        self.config.timestep = None;
        match std::mem::replace(&mut self.coupling, Coupling::Idle) {
            Coupling::Coupled { target_gas, .. } => Some(target_gas),
            Coupling::Idle => None,
        }
    }

    pub fn has_target(&self) -> bool {
        matches!(self.coupling, Coupling::Coupled { .. })
    }

    pub fn target_gas(&self) -> Option<&S> {
        match &self.coupling {
            Coupling::Coupled { target_gas, .. } => Some(target_gas),
            Coupling::Idle => None,
        }
    }

    pub fn timestep(&self) -> Option<f64> {
        match self.coupling {
            Coupling::Coupled { timestep, .. } => Some(timestep),
            Coupling::Idle => None,
        }
    }

    pub fn config(&self) -> &WindConfig {
        &self.config
    }

    pub fn model(&self) -> &WindModel {
        &self.model
    }

    pub fn model_time(&self) -> f64 {
        self.model_time
    }

    pub fn particles(&self) -> &StarEnsemble {
        &self.particles
    }

    pub fn particles_mut(&mut self) -> &mut StarEnsemble {
        &mut self.particles
    }

    /// Add stars to the ensemble.
    pub fn add_stars<I>(&mut self, stars: I) -> Vec<StarKey>
    where
        I: IntoIterator<Item = NewStar>,
    {
        self.particles.add(stars)
    }

    /// Set the global mean molecular mass from a composition.
    pub fn set_global_mu(&mut self, composition: Composition) {
        self.config.composition = composition;
        self.particles.set_global_mu(composition.mean_molecular_mass());
    }

    /// Accumulate mass loss up to the current model time.
    pub fn evolve_particles(&mut self) {
        self.particles.evolve_mass_loss(self.model_time);
    }

    /// Advance the wind to `time`.
    pub fn evolve_model(&mut self, time: f64) {
        match self.timestep() {
            Some(timestep) => {
                while self.model_time <= time {
                    self.evolve_particles();
                    if self.has_new_wind_particles() {
                        let wind = self.create_wind_particles();
                        self.push_to_target(wind);
                    }
                    self.model_time += timestep;
                }
            }
            None => {
                self.model_time = time;
                self.evolve_particles();
            }
        }
    }

    fn push_to_target(&mut self, wind: Vec<WindParticle>) {
        if let Coupling::Coupled { target_gas, .. } = &mut self.coupling {
            target_gas.add_particles(wind);
        }
    }

    /// Whether any star holds more than one particle mass of lost mass.
    pub fn has_new_wind_particles(&self) -> bool {
        has_pending_emission(self.particles.stars(), self.config.sph_particle_mass)
    }

    /// Emit wind particles for every star with pending mass.
    pub fn create_wind_particles(&mut self) -> Vec<WindParticle> {
        let particle_mass = self.config.sph_particle_mass;
        let tag_gas_source = self.config.tag_gas_source;
        let model_time = self.model_time;
        let Self {
            particles,
            sampler,
            model,
            ..
        } = self;

        let mut wind = Vec::new();
        for star in particles.stars_mut() {
            if star.lost_mass > particle_mass {
                wind.extend(emit_star(
                    star,
                    model,
                    sampler,
                    particle_mass,
                    model_time,
                    tag_gas_source,
                ));
            }
        }
        log::debug!(
            "t={:.4e} s: emitted {} wind particles",
            model_time,
            wind.len()
        );
        wind
    }

    /// Create particles as if the wind had already been blowing, then reset
    /// the clock to zero.
    ///
    /// Particles also go to the target sink when one is attached. With
    /// `check_length`, producing no particles is an error.
    pub fn create_initial_wind(
        &mut self,
        initial: InitialWind,
        check_length: bool,
    ) -> Result<Vec<WindParticle>, WindError> {
        let time = match initial {
            InitialWind::Time(time) => time,
            InitialWind::Particles(number) => {
                let required_mass = number as f64 * self.config.sph_particle_mass;
                let total_rate = self.particles.total_mass_loss_rate();
                if total_rate > 0.0 {
                    1.1 * required_mass / total_rate
                } else {
                    log::warn!("initial wind requested with zero total mass-loss rate");
                    0.0
                }
            }
        };

        self.model_time = time;
        self.particles.evolve_mass_loss(time);

        let wind = if self.has_new_wind_particles() {
            let wind = self.create_wind_particles();
            if self.has_target() {
                self.push_to_target(wind.clone());
            }
            wind
        } else if check_length {
            self.reset();
            return Err(WindError::InsufficientTime { time });
        } else {
            Vec::new()
        };

        log::info!(
            "initial wind: {} particles over {:.4e} s",
            wind.len(),
            time
        );
        self.reset();
        Ok(wind)
    }

    /// Zero lost mass and restart all clocks at zero.
    pub fn reset(&mut self) {
        self.particles.reset();
        self.model_time = 0.0;
    }

    /// Restart model time, ensemble clock and release times at `time`.
    pub fn set_begin_time(&mut self, time: f64) {
        self.model_time = time;
        self.particles.set_begin_time(time);
    }
}

/// Turn one star's pending lost mass into particles.
fn emit_star(
    star: &mut Star,
    model: &WindModel,
    sampler: &mut ShellSampler,
    particle_mass: f64,
    model_time: f64,
    tag_gas_source: bool,
) -> Vec<WindParticle> {
    let n = emittable_count(star.lost_mass, particle_mass);
    let batch_mass = n as f64 * particle_mass;
    star.lost_mass = (star.lost_mass - batch_mass).max(0.0);

    let bounds = model.shell_bounds(star, model_time);
    let mut wind = sampler.shell(star, n, bounds, particle_mass);

    let internal_energy = model.internal_energy(star, batch_mass);
    let source = tag_gas_source.then_some(star.key);
    for particle in &mut wind {
        particle.internal_energy = internal_energy;
        particle.source = source;
    }

    star.wind_release_time = star.wind_release_time.max(model_time);
    wind
}

impl<S> GravityField for StellarWind<S> {
    fn acceleration_at(&self, _eps: f64, points: &[DVec3]) -> Vec<DVec3> {
        if !matches!(self.model, WindModel::Accelerating { .. }) {
            return vec![DVec3::ZERO; points.len()];
        }
        let model = &self.model;
        let stars = self.particles.stars();
        points
            .par_iter()
            .map(|point| {
                stars
                    .iter()
                    .map(|star| {
                        let relative = *point - star.position;
                        let magnitude = model.radial_acceleration(star, relative.length());
                        relative.normalize_or_zero() * magnitude
                    })
                    .sum::<DVec3>()
            })
            .collect()
    }

    fn potential_at(&self, _eps: f64, points: &[DVec3]) -> Vec<f64> {
        vec![0.0; points.len()]
    }
}

/// Summary of a set of wind particles.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct WindStats {
    pub count: usize,
    pub total_mass: f64,
    pub mean_internal_energy: f64,
    pub mean_speed: f64,
    pub max_distance: f64,
}

impl WindStats {
    /// Compute statistics, with distances measured from `center`.
    pub fn from_particles(particles: &[WindParticle], center: DVec3) -> Self {
        let mut total_mass = 0.0;
        let mut internal_energy = 0.0;
        let mut speed = 0.0;
        let mut max_distance = 0.0f64;

        for p in particles {
            total_mass += p.mass;
            internal_energy += p.internal_energy;
            speed += p.velocity.length();
            max_distance = max_distance.max((p.position - center).length());
        }

        let count = particles.len();
        let n = count.max(1) as f64;
        Self {
            count,
            total_mass,
            mean_internal_energy: internal_energy / n,
            mean_speed: speed / n,
            max_distance,
        }
    }
}

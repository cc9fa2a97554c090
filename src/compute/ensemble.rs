//! Star ensemble with mass-loss bookkeeping.
//!
//! Each star accumulates `lost_mass` at its `wind_mass_loss_rate` until the
//! emitter turns whole particle masses into gas. The ensemble-level clock
//! (`timestamp`, `previous_time`) is mutated only by
//! [`StarEnsemble::evolve_mass_loss`], [`StarEnsemble::reset`] and
//! [`StarEnsemble::set_begin_time`].

use glam::DVec3;
use serde::{Deserialize, Serialize};

use super::kudritzki_wind_velocity;

/// Identity key of a star record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StarKey(pub u64);

/// Mechanical-energy bookkeeping for one star.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MechanicalState {
    /// Integrated mechanical energy not yet deposited into gas (J).
    pub energy: f64,
    /// Mechanical luminosity at the previous evolution step (W).
    /// `None` until the first step after the star was added.
    pub previous_luminosity: Option<f64>,
}

/// Stellar-evolution history used to derive the mass-loss rate.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EvolutionTrack {
    pub previous_age: f64,
    pub previous_mass: f64,
}

/// One star in the ensemble.
#[derive(Debug, Clone, PartialEq)]
pub struct Star {
    pub key: StarKey,
    /// Mass (kg).
    pub mass: f64,
    /// Radius (m).
    pub radius: f64,
    /// Luminosity (W).
    pub luminosity: f64,
    /// Effective temperature (K).
    pub temperature: f64,
    /// Age (s). Only consulted when rates are derived from evolution.
    pub age: f64,
    pub position: DVec3,
    pub velocity: DVec3,
    /// Mean mass per gas particle (kg).
    pub mu: f64,
    /// Mass-loss rate (kg/s).
    pub wind_mass_loss_rate: f64,
    /// Explicit terminal wind velocity (m/s). Kudritzki when `None`.
    pub terminal_wind_velocity: Option<f64>,
    /// Mass lost since the last emission (kg).
    pub lost_mass: f64,
    /// Time of the last emission event (s).
    pub wind_release_time: f64,
    pub mechanical: Option<MechanicalState>,
    pub evolution: Option<EvolutionTrack>,
}

impl Star {
    /// Terminal wind velocity (m/s).
    pub fn terminal_wind_velocity(&self) -> f64 {
        self.terminal_wind_velocity.unwrap_or_else(|| {
            kudritzki_wind_velocity(self.mass, self.radius, self.luminosity, self.temperature)
        })
    }

    /// Kinetic power carried by the wind, `Mdot v_term² / 2` (W).
    pub fn mechanical_luminosity(&self) -> f64 {
        0.5 * self.wind_mass_loss_rate.max(0.0) * self.terminal_wind_velocity().powi(2)
    }

    /// Remaining mechanical energy, zero when not tracked.
    pub fn mechanical_energy(&self) -> f64 {
        self.mechanical.map_or(0.0, |m| m.energy)
    }
}

/// Incoming star record.
///
/// Bookkeeping fields left as `None` are filled with ensemble defaults when
/// the record is new, and left untouched when it merges into an existing
/// star with the same key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewStar {
    #[serde(default)]
    pub key: Option<StarKey>,
    pub mass: f64,
    pub radius: f64,
    #[serde(default)]
    pub luminosity: f64,
    #[serde(default)]
    pub temperature: f64,
    #[serde(default)]
    pub age: f64,
    #[serde(default)]
    pub position: DVec3,
    #[serde(default)]
    pub velocity: DVec3,
    #[serde(default)]
    pub mu: Option<f64>,
    #[serde(default)]
    pub wind_mass_loss_rate: Option<f64>,
    #[serde(default)]
    pub terminal_wind_velocity: Option<f64>,
    #[serde(default)]
    pub lost_mass: Option<f64>,
    #[serde(default)]
    pub wind_release_time: Option<f64>,
    #[serde(default)]
    pub mechanical_energy: Option<f64>,
    #[serde(default)]
    pub previous_mechanical_luminosity: Option<f64>,
    #[serde(default)]
    pub previous_age: Option<f64>,
    #[serde(default)]
    pub previous_mass: Option<f64>,
}

impl NewStar {
    /// Record with the given physical state and everything else unset.
    pub fn new(mass: f64, radius: f64, luminosity: f64, temperature: f64) -> Self {
        Self {
            mass,
            radius,
            luminosity,
            temperature,
            ..Self::default()
        }
    }

    pub fn with_key(mut self, key: StarKey) -> Self {
        self.key = Some(key);
        self
    }

    pub fn with_mass_loss_rate(mut self, rate: f64) -> Self {
        self.wind_mass_loss_rate = Some(rate);
        self
    }

    pub fn with_terminal_wind_velocity(mut self, velocity: f64) -> Self {
        self.terminal_wind_velocity = Some(velocity);
        self
    }

    pub fn with_lost_mass(mut self, lost_mass: f64) -> Self {
        self.lost_mass = Some(lost_mass);
        self
    }

    pub fn with_mu(mut self, mu: f64) -> Self {
        self.mu = Some(mu);
        self
    }

    pub fn with_age(mut self, age: f64) -> Self {
        self.age = age;
        self
    }

    pub fn with_position(mut self, position: DVec3) -> Self {
        self.position = position;
        self
    }

    pub fn with_velocity(mut self, velocity: DVec3) -> Self {
        self.velocity = velocity;
        self
    }
}

/// Snapshot of one star as produced by a stellar-evolution code.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvolutionSnapshot {
    pub key: StarKey,
    pub age: f64,
    pub radius: f64,
    pub mass: f64,
    pub luminosity: f64,
    pub temperature: f64,
}

impl From<EvolutionSnapshot> for NewStar {
    fn from(s: EvolutionSnapshot) -> Self {
        NewStar::new(s.mass, s.radius, s.luminosity, s.temperature)
            .with_key(s.key)
            .with_age(s.age)
    }
}

/// Ensemble-level state shared by all stars.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnsembleState {
    /// Time of the most recent mass-loss evolution (s).
    pub timestamp: f64,
    /// Lower bound for the next elapsed interval (s).
    pub previous_time: f64,
    /// Mean molecular mass given to stars added without `mu` (kg).
    pub global_mu: f64,
    pub track_mechanical_energy: bool,
    pub derive_from_evolution: bool,
}

/// Mutable collection of stars that lose mass.
#[derive(Debug, Clone)]
pub struct StarEnsemble {
    stars: Vec<Star>,
    state: EnsembleState,
    next_key: u64,
}

impl StarEnsemble {
    /// Create an empty ensemble with the given default `mu`.
    pub fn new(global_mu: f64) -> Self {
        Self {
            stars: Vec::new(),
            state: EnsembleState {
                timestamp: 0.0,
                previous_time: 0.0,
                global_mu,
                track_mechanical_energy: false,
                derive_from_evolution: false,
            },
            next_key: 1,
        }
    }

    /// Ensemble whose mass-loss rates follow stellar-evolution snapshots.
    pub fn with_evolution(global_mu: f64) -> Self {
        let mut ensemble = Self::new(global_mu);
        ensemble.state.derive_from_evolution = true;
        ensemble
    }

    pub fn state(&self) -> &EnsembleState {
        &self.state
    }

    pub fn stars(&self) -> &[Star] {
        &self.stars
    }

    pub fn stars_mut(&mut self) -> &mut [Star] {
        &mut self.stars
    }

    pub fn len(&self) -> usize {
        self.stars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stars.is_empty()
    }

    pub fn get(&self, key: StarKey) -> Option<&Star> {
        self.stars.iter().find(|s| s.key == key)
    }

    pub fn get_mut(&mut self, key: StarKey) -> Option<&mut Star> {
        self.stars.iter_mut().find(|s| s.key == key)
    }

    fn index_of(&self, key: StarKey) -> Option<usize> {
        self.stars.iter().position(|s| s.key == key)
    }

    /// Enable or disable mechanical-energy integration.
    ///
    /// Stars already present get a fresh, unset mechanical state when
    /// tracking is switched on.
    pub fn track_mechanical_energy(&mut self, track: bool) {
        self.state.track_mechanical_energy = track;
        if track {
            for star in &mut self.stars {
                star.mechanical.get_or_insert_with(MechanicalState::default);
            }
        }
    }

    /// Whether any star still lacks a previous mechanical luminosity.
    pub fn has_unset_mechanical_luminosity(&self) -> bool {
        self.stars
            .iter()
            .any(|s| s.mechanical.is_some_and(|m| m.previous_luminosity.is_none()))
    }

    /// Merge incoming records and return the keys they landed on, in order.
    pub fn add<I>(&mut self, stars: I) -> Vec<StarKey>
    where
        I: IntoIterator<Item = NewStar>,
    {
        stars.into_iter().map(|s| self.add_one(s)).collect()
    }

    fn add_one(&mut self, incoming: NewStar) -> StarKey {
        if let Some(idx) = incoming.key.and_then(|k| self.index_of(k)) {
            self.merge_into(idx, incoming);
            return self.stars[idx].key;
        }

        let key = match incoming.key {
            Some(k) => {
                self.next_key = self.next_key.max(k.0 + 1);
                k
            }
            None => {
                let k = StarKey(self.next_key);
                self.next_key += 1;
                k
            }
        };

        let mechanical = self.state.track_mechanical_energy.then(|| MechanicalState {
            energy: incoming.mechanical_energy.unwrap_or(0.0),
            previous_luminosity: incoming.previous_mechanical_luminosity,
        });
        let evolution = self.state.derive_from_evolution.then(|| EvolutionTrack {
            previous_age: incoming.previous_age.unwrap_or(incoming.age),
            previous_mass: incoming.previous_mass.unwrap_or(incoming.mass),
        });

        self.stars.push(Star {
            key,
            mass: incoming.mass,
            radius: incoming.radius,
            luminosity: incoming.luminosity,
            temperature: incoming.temperature,
            age: incoming.age,
            position: incoming.position,
            velocity: incoming.velocity,
            mu: incoming.mu.unwrap_or(self.state.global_mu),
            wind_mass_loss_rate: incoming.wind_mass_loss_rate.unwrap_or(0.0),
            terminal_wind_velocity: incoming.terminal_wind_velocity,
            lost_mass: incoming.lost_mass.unwrap_or(0.0),
            wind_release_time: incoming.wind_release_time.unwrap_or(self.state.timestamp),
            mechanical,
            evolution,
        });
        key
    }

    fn merge_into(&mut self, idx: usize, incoming: NewStar) {
        let star = &mut self.stars[idx];
        star.mass = incoming.mass;
        star.radius = incoming.radius;
        star.luminosity = incoming.luminosity;
        star.temperature = incoming.temperature;
        star.age = incoming.age;
        star.position = incoming.position;
        star.velocity = incoming.velocity;

        if let Some(mu) = incoming.mu {
            star.mu = mu;
        }
        if let Some(rate) = incoming.wind_mass_loss_rate {
            star.wind_mass_loss_rate = rate;
        }
        if incoming.terminal_wind_velocity.is_some() {
            star.terminal_wind_velocity = incoming.terminal_wind_velocity;
        }
        if let Some(lost_mass) = incoming.lost_mass {
            star.lost_mass = lost_mass;
        }
        if let Some(t) = incoming.wind_release_time {
            star.wind_release_time = t;
        }
        if let Some(mechanical) = star.mechanical.as_mut() {
            if let Some(energy) = incoming.mechanical_energy {
                mechanical.energy = energy;
            }
            if incoming.previous_mechanical_luminosity.is_some() {
                mechanical.previous_luminosity = incoming.previous_mechanical_luminosity;
            }
        }
        if let Some(track) = star.evolution.as_mut() {
            if let Some(age) = incoming.previous_age {
                track.previous_age = age;
            }
            if let Some(mass) = incoming.previous_mass {
                track.previous_mass = mass;
            }
        }
    }

    /// Copy evolved state (age, radius, mass, luminosity, temperature)
    /// onto matching stars. Returns the number of stars updated.
    pub fn copy_from_evolution(&mut self, snapshots: &[EvolutionSnapshot]) -> usize {
        let mut updated = 0;
        for snapshot in snapshots {
            match self.get_mut(snapshot.key) {
                Some(star) => {
                    star.age = snapshot.age;
                    star.radius = snapshot.radius;
                    star.mass = snapshot.mass;
                    star.luminosity = snapshot.luminosity;
                    star.temperature = snapshot.temperature;
                    updated += 1;
                }
                None => log::warn!("evolution snapshot for unknown star {:?}", snapshot.key),
            }
        }
        updated
    }

    /// Derive mass-loss rates from the change in mass since the last age
    /// at which a star was seen.
    pub fn update_from_evolution(&mut self) {
        for star in &mut self.stars {
            let Some(track) = star.evolution.as_mut() else {
                continue;
            };
            let timestep = star.age - track.previous_age;
            if timestep == 0.0 {
                continue;
            }
            // Mass gained between snapshots is not wind
            star.wind_mass_loss_rate = ((track.previous_mass - star.mass) / timestep).max(0.0);
            track.previous_age = star.age;
            track.previous_mass = star.mass;
        }
    }

    /// Accumulate lost mass (and mechanical energy) up to `time`.
    ///
    /// Does nothing when `time` precedes the previous evolution time.
    /// Negative rates add nothing, so lost mass only shrinks on emission.
    pub fn evolve_mass_loss(&mut self, time: f64) {
        if time < self.state.previous_time {
            return;
        }
        if self.state.derive_from_evolution {
            self.update_from_evolution();
        }

        let elapsed = time - self.state.previous_time;
        for star in &mut self.stars {
            star.lost_mass += (elapsed * star.wind_mass_loss_rate).max(0.0);
        }

        if self.state.track_mechanical_energy {
            for star in &mut self.stars {
                let new_luminosity = star.mechanical_luminosity();
                let mechanical = star.mechanical.get_or_insert_with(MechanicalState::default);
                let previous = *mechanical.previous_luminosity.get_or_insert(new_luminosity);
                mechanical.energy += elapsed * 0.5 * (previous + new_luminosity);
                mechanical.previous_luminosity = Some(new_luminosity);
            }
        }

        self.state.timestamp = time;
        self.state.previous_time = time;
    }

    /// Set `mu` on every star and on stars added later without one.
    pub fn set_global_mu(&mut self, mu: f64) {
        for star in &mut self.stars {
            star.mu = mu;
        }
        self.state.global_mu = mu;
    }

    /// Clear lost mass and restart the clock at zero.
    pub fn reset(&mut self) {
        for star in &mut self.stars {
            star.lost_mass = 0.0;
        }
        self.set_begin_time(0.0);
    }

    /// Restart the clock and every star's release time at `time`.
    pub fn set_begin_time(&mut self, time: f64) {
        for star in &mut self.stars {
            star.wind_release_time = time;
        }
        self.state.timestamp = time;
        self.state.previous_time = time;
    }

    /// Largest accumulated lost mass (kg), zero for an empty ensemble.
    pub fn max_lost_mass(&self) -> f64 {
        self.stars.iter().map(|s| s.lost_mass).fold(0.0, f64::max)
    }

    /// Sum of all mass-loss rates (kg/s).
    pub fn total_mass_loss_rate(&self) -> f64 {
        self.stars.iter().map(|s| s.wind_mass_loss_rate).sum()
    }
}

//! Coupling to an external stellar-evolution code.
//!
//! The evolution code owns the stellar structure; the wind only copies
//! (age, radius, mass, luminosity, temperature) and derives mass-loss rates
//! from the change in mass between snapshots.

use super::driver::StellarWind;
use super::ensemble::{EvolutionSnapshot, NewStar};
use super::sink::GasSink;

/// A stellar-evolution code as seen by the wind.
pub trait StellarEvolution {
    /// Evolve all stars to `time` (s).
    fn evolve_model(&mut self, time: f64);

    /// Current state of every star.
    fn snapshots(&self) -> Vec<EvolutionSnapshot>;
}

/// Copy the current evolution state into the wind's ensemble.
pub fn copy_evolution_state<S, E>(wind: &mut StellarWind<S>, evolution: &E) -> usize
where
    S: GasSink,
    E: StellarEvolution + ?Sized,
{
    wind.particles_mut().copy_from_evolution(&evolution.snapshots())
}

/// Set up a wind whose rates follow the change of the stars between
/// `start_time` and `end_time`.
///
/// The stars must not have been added to `wind` yet. The wind should be
/// configured with `derive_from_evolution`, otherwise rates stay zero.
pub fn static_wind_from_stellar_evolution<S, E>(
    wind: &mut StellarWind<S>,
    evolution: &mut E,
    start_time: f64,
    end_time: f64,
) where
    S: GasSink,
    E: StellarEvolution + ?Sized,
{
    if !wind.config().derive_from_evolution {
        log::warn!("static wind from evolution on a wind that does not derive its rates");
    }

    evolution.evolve_model(start_time);
    wind.add_stars(evolution.snapshots().into_iter().map(NewStar::from));

    evolution.evolve_model(end_time);
    copy_evolution_state(wind, &*evolution);

    wind.evolve_model(0.0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::constants::{
        SOLAR_LUMINOSITY, SOLAR_MASS, SOLAR_RADIUS, YEAR, solar_masses_per_year,
    };
    use crate::compute::ensemble::StarKey;
    use crate::compute::emitter::WindParticle;
    use crate::schema::WindConfig;

    /// Stars losing mass at a constant rate.
    struct LinearEvolution {
        time: f64,
        initial_masses: Vec<f64>,
        rates: Vec<f64>,
    }

    impl StellarEvolution for LinearEvolution {
        fn evolve_model(&mut self, time: f64) {
            self.time = time;
        }

        fn snapshots(&self) -> Vec<EvolutionSnapshot> {
            self.initial_masses
                .iter()
                .zip(&self.rates)
                .enumerate()
                .map(|(i, (&m0, &rate))| EvolutionSnapshot {
                    key: StarKey(i as u64 + 1),
                    age: self.time,
                    radius: 10.0 * SOLAR_RADIUS,
                    mass: m0 - rate * self.time,
                    luminosity: 1.0e5 * SOLAR_LUMINOSITY,
                    temperature: 30_000.0,
                })
                .collect()
        }
    }

    fn evolution() -> LinearEvolution {
        LinearEvolution {
            time: 0.0,
            initial_masses: vec![20.0 * SOLAR_MASS, 40.0 * SOLAR_MASS],
            rates: vec![solar_masses_per_year(1.0e-6), solar_masses_per_year(4.0e-6)],
        }
    }

    fn evolving_config() -> WindConfig {
        let mut config = WindConfig::default();
        config.derive_from_evolution = true;
        config.random_seed = Some(5);
        config
    }

    #[test]
    fn test_static_wind_derives_rates() {
        let mut wind = StellarWind::detached(evolving_config()).unwrap();
        let mut evolution = evolution();

        static_wind_from_stellar_evolution(
            &mut wind,
            &mut evolution,
            1.0e6 * YEAR,
            1.0e6 * YEAR + 1.0e4 * YEAR,
        );

        let stars = wind.particles().stars();
        assert_eq!(stars.len(), 2);
        for (star, expected) in stars.iter().zip(&evolution.rates) {
            assert!(
                (star.wind_mass_loss_rate - expected).abs() / expected < 1e-6,
                "rate {} vs {}",
                star.wind_mass_loss_rate,
                expected
            );
            assert_eq!(star.lost_mass, 0.0);
        }
    }

    #[test]
    fn test_rates_follow_channel_copies() {
        let mut config = evolving_config();
        config.timestep = Some(100.0 * YEAR);
        let mut wind = StellarWind::new(config, Some(Vec::<WindParticle>::new())).unwrap();
        let mut evolution = evolution();
        wind.add_stars(evolution.snapshots().into_iter().map(NewStar::from));

        // Evolve both codes in lockstep, copying state every step
        for step in 1..=5 {
            let t = step as f64 * 100.0 * YEAR;
            evolution.evolve_model(t);
            assert_eq!(copy_evolution_state(&mut wind, &evolution), 2);
            wind.evolve_model(t);
        }

        let emitted: f64 = wind.target_gas().unwrap().iter().map(|p| p.mass).sum();
        let lost: f64 = wind.particles().stars().iter().map(|s| s.lost_mass).sum();
        // Five ticks of 100 yr at a combined 5e-6 MSun/yr
        let expected = 5.0 * 100.0 * YEAR * solar_masses_per_year(5.0e-6);
        assert!((emitted + lost - expected).abs() / expected < 1e-6);
    }

    #[test]
    fn test_static_wind_without_derived_rates() {
        let mut wind = StellarWind::detached(WindConfig::default()).unwrap();
        let mut evolution = evolution();
        static_wind_from_stellar_evolution(&mut wind, &mut evolution, 0.0, YEAR);

        assert!(wind.particles().stars().iter().all(|s| s.wind_mass_loss_rate == 0.0));
    }
}

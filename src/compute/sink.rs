//! Consumers of emitted wind particles and of the wind's force field.

use glam::DVec3;

use super::emitter::WindParticle;

/// Destination for emitted gas, typically a hydrodynamics code.
pub trait GasSink {
    /// Take ownership of a batch of new particles.
    fn add_particles(&mut self, particles: Vec<WindParticle>);
}

impl GasSink for Vec<WindParticle> {
    fn add_particles(&mut self, mut particles: Vec<WindParticle>) {
        self.append(&mut particles);
    }
}

/// Sink that only counts what it receives.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CountingSink {
    pub particles: usize,
    pub batches: usize,
    pub mass: f64,
}

impl GasSink for CountingSink {
    fn add_particles(&mut self, particles: Vec<WindParticle>) {
        self.particles += particles.len();
        self.batches += 1;
        self.mass += particles.iter().map(|p| p.mass).sum::<f64>();
    }
}

/// Additional field felt by particles of an external force integrator.
pub trait GravityField {
    /// Acceleration (m/s²) at each point. `eps` is a softening length.
    fn acceleration_at(&self, eps: f64, points: &[DVec3]) -> Vec<DVec3>;

    /// Specific potential (J/kg) at each point.
    fn potential_at(&self, eps: f64, points: &[DVec3]) -> Vec<f64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn particle(mass: f64) -> WindParticle {
        WindParticle {
            position: DVec3::ZERO,
            velocity: DVec3::ZERO,
            mass,
            internal_energy: 0.0,
            source: None,
        }
    }

    #[test]
    fn test_vec_sink_appends() {
        let mut sink: Vec<WindParticle> = vec![particle(1.0)];
        sink.add_particles(vec![particle(2.0), particle(3.0)]);
        assert_eq!(sink.len(), 3);
        assert_eq!(sink[2].mass, 3.0);
    }

    #[test]
    fn test_counting_sink() {
        let mut sink = CountingSink::default();
        sink.add_particles(vec![particle(2.0); 4]);
        sink.add_particles(Vec::new());
        assert_eq!(sink.particles, 4);
        assert_eq!(sink.batches, 2);
        assert_eq!(sink.mass, 8.0);
    }
}

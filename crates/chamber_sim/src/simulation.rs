use bevy::log::info;
use bevy::prelude::Resource;
use chamber_core::{BubbleChamber, ChamberConfig, Lifecycle, Particle, Result};
use chamber_physics::{decay, forces, particle};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// What the frame pipeline needs from a simulation.
///
/// After every `step`, each particle's dirty flag must truthfully say whether
/// its visual state needs attention, a particle that left `Alive` must stay
/// terminal, and a finalized particle must never be re-dirtied. The run loop
/// only terminates if the driver upholds the last rule.
pub trait Driver {
    /// Reset time to zero with every particle alive and dirty
    fn start(&mut self);

    /// Advance the physical state by one increment
    fn step(&mut self);

    /// Simulated seconds since `start`
    fn time_passed(&self) -> f64;

    fn particles(&self) -> &[Particle];

    fn particles_mut(&mut self) -> &mut [Particle];

    fn has_dirty(&self) -> bool {
        self.particles().iter().any(|p| p.is_dirty)
    }

    fn dirty_count(&self) -> usize {
        self.particles().iter().filter(|p| p.is_dirty).count()
    }

    fn alive_count(&self) -> usize {
        self.particles().iter().filter(|p| p.is_alive()).count()
    }
}

/// Charged particles flying through a bubble chamber in a uniform
/// magnetic field, losing energy, decaying, or hitting the walls.
#[derive(Resource)]
pub struct Simulation {
    pub chamber: BubbleChamber,
    /// Field strength along +z
    pub magnetic_field: f32,
    /// Fractional speed loss per second
    pub energy_loss: f32,
    /// Speed below which a particle stops in the liquid
    pub stop_speed: f32,
    /// Seconds per step
    pub time_step: f64,
    /// Ensemble restored by `start`
    initial: Vec<Particle>,
    particles: Vec<Particle>,
    steps: u64,
    time_passed: f64,
    seed: u64,
    rng: ChaCha8Rng,
}

impl Simulation {
    pub fn new(config: &ChamberConfig, particles: Vec<Particle>) -> Self {
        Self {
            chamber: BubbleChamber::new(config.chamber_dimensions),
            magnetic_field: config.magnetic_field,
            energy_loss: config.energy_loss,
            stop_speed: config.stop_speed,
            time_step: config.time_step,
            initial: particles.clone(),
            particles,
            steps: 0,
            time_passed: 0.0,
            seed: config.seed,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
        }
    }

    /// Seeded ensemble generated from the configuration
    pub fn from_config(config: &ChamberConfig) -> Result<Self> {
        config.validate()?;
        let chamber = BubbleChamber::new(config.chamber_dimensions);
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let particles = particle::generate_ensemble(config, &chamber, &mut rng);
        Ok(Self::new(config, particles))
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }
}

impl Driver for Simulation {
    fn start(&mut self) {
        self.particles = self.initial.clone();
        for p in &mut self.particles {
            p.lifecycle = Lifecycle::Alive;
            p.is_dirty = true;
        }
        self.steps = 0;
        self.time_passed = 0.0;
        // Reseed so that repeated runs decay identically
        self.rng = ChaCha8Rng::seed_from_u64(self.seed);

        info!(
            "Simulation started: {} particles, dt = {:.4}s",
            self.particles.len(),
            self.time_step
        );
    }

    fn step(&mut self) {
        self.steps += 1;
        let dt = self.time_step as f32;

        for p in self.particles.iter_mut() {
            if !p.is_alive() {
                continue;
            }

            forces::integrate(p, dt, self.magnetic_field, self.energy_loss);
            p.mark_dirty();

            let roll: f32 = self.rng.gen_range(0.0..1.0);
            if let Some(cause) =
                decay::terminal_cause(p, &self.chamber, self.stop_speed, dt, roll)
            {
                p.terminate(cause);
            }
        }

        // Derived from the step count rather than accumulated, so rounding
        // error does not build up over a long run
        self.time_passed = self.steps as f64 * self.time_step;
    }

    fn time_passed(&self) -> f64 {
        self.time_passed
    }

    fn particles(&self) -> &[Particle] {
        &self.particles
    }

    fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }
}

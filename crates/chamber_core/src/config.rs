use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_FPS;
use crate::error::{ChamberError, Result};

/// Bake configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChamberConfig {
    /// Number of particles injected at t = 0
    pub particle_count: u32,
    /// Random seed for deterministic runs
    pub seed: u64,
    /// Animation frames per second of simulated time
    pub fps: u32,
    /// Simulation time step in seconds
    pub time_step: f64,
    /// Chamber extent along x, y, z
    pub chamber_dimensions: [f32; 3],
    /// Magnetic field strength along +z
    pub magnetic_field: f32,
    /// Fraction of speed lost per second to ionization drag
    pub energy_loss: f32,
    /// Mean lifetime of unstable particles in seconds
    pub mean_lifetime: f32,
    /// Below this speed a particle stops in the liquid
    pub stop_speed: f32,
    /// Injection speed range
    pub initial_speed: (f32, f32),
    /// Step budget before a run is declared stalled
    pub max_steps: u64,
}

impl Default for ChamberConfig {
    fn default() -> Self {
        Self {
            particle_count: 12,
            seed: 42,
            fps: DEFAULT_FPS,
            time_step: 1.0 / 120.0,
            chamber_dimensions: [4.0, 4.0, 2.0],
            magnetic_field: 1.5,
            energy_loss: 0.35,
            mean_lifetime: 1.5,
            stop_speed: 0.05,
            initial_speed: (0.5, 2.5),
            max_steps: 20_000,
        }
    }
}

impl ChamberConfig {
    pub fn validate(&self) -> Result<()> {
        if self.fps == 0 {
            return Err(ChamberError::Config("fps must be > 0".into()));
        }
        if !(self.time_step.is_finite() && self.time_step > 0.0) {
            return Err(ChamberError::Config(format!(
                "time_step must be > 0, got {}",
                self.time_step
            )));
        }
        if self.chamber_dimensions.iter().any(|d| !(d.is_finite() && *d > 0.0)) {
            return Err(ChamberError::Config(format!(
                "chamber dimensions must be > 0, got {:?}",
                self.chamber_dimensions
            )));
        }
        let (lo, hi) = self.initial_speed;
        if !(lo > 0.0 && hi > lo) {
            return Err(ChamberError::Config(format!(
                "initial_speed range must satisfy 0 < lo < hi, got ({lo}, {hi})"
            )));
        }
        if self.mean_lifetime <= 0.0 {
            return Err(ChamberError::Config("mean_lifetime must be > 0".into()));
        }
        Ok(())
    }
}

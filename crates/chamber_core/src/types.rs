use serde::{Deserialize, Serialize};

use crate::error::{ChamberError, Result};

/// Where a particle is in its life.
///
/// `Alive` is the only non-terminal state: once a particle decays or is
/// absorbed it never comes back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Lifecycle {
    /// Moving through the chamber, leaving a track
    Alive,
    /// Decayed in flight
    Decayed,
    /// Stopped in the liquid or absorbed by the chamber wall
    Absorbed,
}

impl Lifecycle {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Alive)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Alive => "alive",
            Self::Decayed => "decayed",
            Self::Absorbed => "absorbed",
        }
    }
}

/// A charged particle as seen by the visualization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub position: [f32; 3],
    pub velocity: [f32; 3],
    /// Signed charge in units of e, fixed at creation
    pub total_charge: f32,
    /// Rest mass, fixed at creation
    pub mass: f32,
    /// Mean lifetime in seconds; `None` for stable particles
    pub mean_lifetime: Option<f32>,
    pub lifecycle: Lifecycle,
    /// Visual state has not caught up with physical state yet
    pub is_dirty: bool,
}

impl Particle {
    pub fn new(position: [f32; 3], velocity: [f32; 3], total_charge: f32, mass: f32) -> Self {
        Self {
            position,
            velocity,
            total_charge,
            mass,
            mean_lifetime: None,
            lifecycle: Lifecycle::Alive,
            is_dirty: true,
        }
    }

    pub fn with_lifetime(mut self, mean_lifetime: f32) -> Self {
        self.mean_lifetime = Some(mean_lifetime);
        self
    }

    pub fn is_alive(&self) -> bool {
        self.lifecycle == Lifecycle::Alive
    }

    /// Not alive and already synchronized: nothing will touch it again
    pub fn is_finalized(&self) -> bool {
        !self.is_alive() && !self.is_dirty
    }

    /// Flag a visual change. Ignored once the particle has left `Alive`,
    /// so a finalized particle can never be re-dirtied.
    pub fn mark_dirty(&mut self) {
        if self.is_alive() {
            self.is_dirty = true;
        }
    }

    /// Move to a terminal state. Returns false (and changes nothing) if the
    /// particle is already terminal.
    pub fn terminate(&mut self, cause: Lifecycle) -> bool {
        if !self.is_alive() || !cause.is_terminal() {
            return false;
        }
        self.lifecycle = cause;
        self.is_dirty = true;
        true
    }

    /// Consume the pending terminal transition. True exactly once per
    /// particle: on the first call after it left `Alive`.
    pub fn take_finalization(&mut self) -> bool {
        if self.is_alive() || !self.is_dirty {
            return false;
        }
        self.is_dirty = false;
        true
    }

    pub fn speed(&self) -> f32 {
        let v = self.velocity;
        (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
    }

    /// Reject NaN/infinite state before it reaches the host
    pub fn check_finite(&self, index: usize) -> Result<()> {
        if !self.total_charge.is_finite() {
            return Err(ChamberError::NonFinite { index, field: "charge" });
        }
        if !self.mass.is_finite() {
            return Err(ChamberError::NonFinite { index, field: "mass" });
        }
        if self.position.iter().any(|c| !c.is_finite()) {
            return Err(ChamberError::NonFinite { index, field: "position" });
        }
        Ok(())
    }
}

/// The chamber volume: an axis-aligned box centered on the origin
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BubbleChamber {
    /// Full extent along x, y, z
    pub dimensions: [f32; 3],
}

impl BubbleChamber {
    pub fn new(dimensions: [f32; 3]) -> Self {
        Self { dimensions }
    }

    pub fn half_extents(&self) -> [f32; 3] {
        [
            self.dimensions[0] * 0.5,
            self.dimensions[1] * 0.5,
            self.dimensions[2] * 0.5,
        ]
    }

    pub fn contains(&self, pos: [f32; 3]) -> bool {
        let h = self.half_extents();
        (0..3).all(|i| pos[i].abs() <= h[i])
    }

    /// Largest side, used to size scene helpers
    pub fn size(&self) -> f32 {
        self.dimensions.iter().copied().fold(0.0, f32::max)
    }
}

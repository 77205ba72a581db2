use chamber_core::{BubbleChamber, ChamberConfig, Particle};
use rand::Rng;

/// Particle species injected into the chamber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Species {
    Electron,
    Positron,
    MuonMinus,
    PionPlus,
    PionMinus,
    KaonPlus,
    Proton,
}

impl Species {
    pub const ALL: [Species; 7] = [
        Self::Electron,
        Self::Positron,
        Self::MuonMinus,
        Self::PionPlus,
        Self::PionMinus,
        Self::KaonPlus,
        Self::Proton,
    ];

    /// Charge in units of e
    pub fn charge(&self) -> f32 {
        match self {
            Self::Positron | Self::PionPlus | Self::KaonPlus | Self::Proton => 1.0,
            Self::Electron | Self::MuonMinus | Self::PionMinus => -1.0,
        }
    }

    /// Mass in chamber units (GeV/c^2 scaled by 10, electron floored so the
    /// Lorentz radius stays visible)
    pub fn mass(&self) -> f32 {
        match self {
            Self::Electron | Self::Positron => 0.2,
            Self::MuonMinus => 1.06,
            Self::PionPlus | Self::PionMinus => 1.40,
            Self::KaonPlus => 4.94,
            Self::Proton => 9.38,
        }
    }

    /// Lifetime relative to the configured mean; `None` means stable
    pub fn lifetime_factor(&self) -> Option<f32> {
        match self {
            Self::Electron | Self::Positron | Self::Proton => None,
            Self::MuonMinus => Some(2.0),
            Self::PionPlus | Self::PionMinus => Some(1.0),
            Self::KaonPlus => Some(0.5),
        }
    }
}

/// Generate the particles entering the chamber at t = 0.
///
/// All particles start near the beam entry face (-x) and fly into the
/// chamber within a cone around +x.
pub fn generate_ensemble(
    config: &ChamberConfig,
    chamber: &BubbleChamber,
    rng: &mut impl Rng,
) -> Vec<Particle> {
    (0..config.particle_count)
        .map(|_| {
            let species = Species::ALL[rng.gen_range(0..Species::ALL.len())];
            create_particle(species, config, chamber, rng)
        })
        .collect()
}

pub fn create_particle(
    species: Species,
    config: &ChamberConfig,
    chamber: &BubbleChamber,
    rng: &mut impl Rng,
) -> Particle {
    let half = chamber.half_extents();

    // Entry point: just inside the -x face, spread over the face
    let pos = [
        -half[0] * 0.9,
        rng.gen_range(-0.5..0.5f32) * half[1],
        rng.gen_range(-0.5..0.5f32) * half[2],
    ];

    // Direction: cone of ~30 degrees around +x, flattened in z
    let yaw = rng.gen_range(-0.5..0.5f32);
    let pitch = rng.gen_range(-0.1..0.1f32);
    let (lo, hi) = config.initial_speed;
    let speed = rng.gen_range(lo..hi);

    let vel = [
        speed * pitch.cos() * yaw.cos(),
        speed * pitch.cos() * yaw.sin(),
        speed * pitch.sin(),
    ];

    let particle = Particle::new(pos, vel, species.charge(), species.mass());
    match species.lifetime_factor() {
        Some(factor) => particle.with_lifetime(config.mean_lifetime * factor),
        None => particle,
    }
}

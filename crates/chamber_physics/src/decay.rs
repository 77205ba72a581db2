use chamber_core::{BubbleChamber, Lifecycle, Particle};

/// Probability that an unstable particle decays within `dt`
pub fn decay_probability(dt: f32, mean_lifetime: f32) -> f32 {
    1.0 - (-dt / mean_lifetime).exp()
}

/// Decide whether an alive particle ends its track this step.
///
/// `roll` is a uniform sample in [0, 1) supplied by the caller so the rule
/// itself stays deterministic.
pub fn terminal_cause(
    p: &Particle,
    chamber: &BubbleChamber,
    stop_speed: f32,
    dt: f32,
    roll: f32,
) -> Option<Lifecycle> {
    if !p.is_alive() {
        return None;
    }
    if !chamber.contains(p.position) || p.speed() < stop_speed {
        return Some(Lifecycle::Absorbed);
    }
    match p.mean_lifetime {
        Some(tau) if roll < decay_probability(dt, tau) => Some(Lifecycle::Decayed),
        _ => None,
    }
}

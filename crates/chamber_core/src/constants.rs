// Visual constants shared by the driver, the pipeline and the host adapters.
// Time is in seconds, distances in chamber units (1 unit = 10 cm of liquid).

/// Default animation frame rate
pub const DEFAULT_FPS: u32 = 30;

/// Hue for negatively charged tracks (blue-violet)
pub const NEGATIVE_HUE: f32 = 0.7;

/// Hue for neutral and positively charged tracks (red)
pub const POSITIVE_HUE: f32 = 0.0;

/// HSV value (brightness) used for every track
pub const COLOR_VALUE: f32 = 0.7;

/// Radius of the sphere marking a particle head
pub const PARTICLE_RADIUS: f32 = 0.01;

/// Host object names are `"{PARTICLE_NAME_PREFIX} {index}"`
pub const PARTICLE_NAME_PREFIX: &str = "Particle";

/// Name of the particle at a given stable index
pub fn particle_name(index: usize) -> String {
    format!("{PARTICLE_NAME_PREFIX} {index}")
}

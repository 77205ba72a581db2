use chamber_core::Particle;

/// Lorentz acceleration for a uniform field along +z: a = (q/m) v x B
pub fn lorentz_acceleration(charge: f32, mass: f32, vel: [f32; 3], field_z: f32) -> [f32; 3] {
    let k = charge / mass * field_z;
    // v x (0, 0, Bz) = (vy * Bz, -vx * Bz, 0)
    [k * vel[1], -k * vel[0], 0.0]
}

/// Ionization drag: speed decays by `loss` per second
pub fn drag_acceleration(vel: [f32; 3], loss: f32) -> [f32; 3] {
    [-loss * vel[0], -loss * vel[1], -loss * vel[2]]
}

/// Advance one alive particle by `dt`.
///
/// Drag first, then the magnetic force as an exact (speed-preserving)
/// rotation of the transverse velocity, then a drift.
pub fn integrate(p: &mut Particle, dt: f32, field_z: f32, loss: f32) {
    let a_drag = drag_acceleration(p.velocity, loss);
    for i in 0..3 {
        p.velocity[i] += a_drag[i] * dt;
    }

    // Cyclotron rotation: dv/dt = k (vy, -vx) turns v by -k dt around z
    let theta = -p.total_charge / p.mass * field_z * dt;
    let (sin, cos) = theta.sin_cos();
    let [vx, vy, vz] = p.velocity;
    p.velocity = [vx * cos - vy * sin, vx * sin + vy * cos, vz];

    for i in 0..3 {
        p.position[i] += p.velocity[i] * dt;
    }
}

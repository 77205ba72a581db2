use bevy::prelude::*;

use crate::host::{ParticleAnimation, ParticleTint, Timeline};

/// Playback cursor over the baked timeline
#[derive(Resource, Debug, Clone)]
pub struct Playback {
    pub frame: f64,
    pub fps: f64,
    pub looping: bool,
    pub paused: bool,
}

impl Playback {
    pub fn new(fps: u32) -> Self {
        Self {
            frame: 0.0,
            fps: fps as f64,
            looping: true,
            paused: false,
        }
    }

    /// Move the cursor by `seconds` of wall time, wrapping or clamping at `end`
    pub fn advance(&mut self, seconds: f64, end: i64) {
        if self.paused {
            return;
        }
        self.frame += seconds * self.fps;
        let end = end.max(0) as f64;
        if self.frame > end {
            self.frame = if self.looping && end > 0.0 {
                self.frame % end
            } else {
                end
            };
        }
    }

    pub fn whole_frame(&self) -> i64 {
        self.frame.floor() as i64
    }
}

impl Default for Playback {
    fn default() -> Self {
        Self::new(chamber_core::DEFAULT_FPS)
    }
}

pub fn advance_playback(time: Res<Time>, timeline: Res<Timeline>, mut playback: ResMut<Playback>) {
    playback.advance(time.delta_secs_f64(), timeline.end);
}

/// Pose every animated object at the playback cursor
pub fn apply_animation(
    playback: Res<Playback>,
    mut query: Query<(&ParticleAnimation, &mut Transform, &mut Visibility)>,
) {
    let frame = playback.whole_frame();
    for (anim, mut transform, mut visibility) in &mut query {
        if let Some(pos) = anim.position.sample_linear(playback.frame) {
            transform.translation = Vec3::from_array(pos);
        }
        let visible = anim.visibility.sample(frame).unwrap_or(false);
        let target = if visible {
            Visibility::Visible
        } else {
            Visibility::Hidden
        };
        if *visibility != target {
            *visibility = target;
        }
    }
}

/// Positions making up the visible part of a trail at `frame`
pub fn trail_points(anim: &ParticleAnimation, frame: i64) -> Vec<Vec3> {
    anim.position
        .keys()
        .iter()
        .filter(|k| k.frame <= frame && anim.trail.contains(k.frame))
        .map(|k| Vec3::from_array(k.value))
        .collect()
}

/// Condensation trails: a polyline through the keyed positions inside each
/// object's trail window, up to the playback cursor
pub fn draw_trails(
    playback: Res<Playback>,
    query: Query<(&ParticleAnimation, &ParticleTint)>,
    mut gizmos: Gizmos,
) {
    let frame = playback.whole_frame();
    for (anim, tint) in &query {
        let points = trail_points(anim, frame);
        if points.len() >= 2 {
            gizmos.linestrip(points, tint.color());
        }
    }
}

pub fn playback_control_system(keyboard: Res<ButtonInput<KeyCode>>, mut playback: ResMut<Playback>) {
    if keyboard.just_pressed(KeyCode::Space) {
        playback.paused = !playback.paused;
    }
    if keyboard.just_pressed(KeyCode::KeyL) {
        playback.looping = !playback.looping;
    }
    if keyboard.just_pressed(KeyCode::KeyR) {
        playback.frame = 0.0;
    }
}

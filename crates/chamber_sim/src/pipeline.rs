//! Frame synchronization and materialization.
//!
//! Each simulation step becomes zero or more host calls: the step's time is
//! quantized to a timeline frame, every particle gets exactly one host
//! object (created on first use, cached by index), alive particles are
//! keyframed at the frame, and a particle that stopped being alive is
//! finalized exactly once.

use bevy::log::{debug, error, info};
use chamber_core::{
    color_for_particle, particle_name, ChamberConfig, ChamberError, Lifecycle, Particle, Result,
};
use serde::{Deserialize, Serialize};

use crate::host::{at_frame, ObjectKind, Property, SceneHost};
use crate::simulation::Driver;

/// Timeline frame for a simulated time: `floor(time_passed * fps)`.
///
/// Monotonic in `time_passed`, and frame 0 at t = 0. Several steps may land
/// on one frame and a coarse step may skip frames; both are fine.
pub fn frame_for_time(time_passed: f64, fps: u32) -> i64 {
    (time_passed * fps as f64) as i64
}

/// What `Materializer::sync` did for one particle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Alive: position keyed at the current frame
    Tracked,
    /// Terminal transition recorded (fires once per particle)
    Finalized(Lifecycle),
    /// Already finalized, no host calls
    Idle,
}

#[derive(Debug, Clone, Copy)]
struct VisualSlot<K> {
    handle: K,
    /// Last visibility value written to the host
    visible: bool,
}

/// Per-run cache from particle index to host object.
///
/// A fresh materializer is built for every run, so handles never leak from
/// one run into the next.
#[derive(Debug)]
pub struct Materializer<K> {
    slots: Vec<Option<VisualSlot<K>>>,
    created: usize,
    adopted: usize,
}

impl<K> Default for Materializer<K> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            created: 0,
            adopted: 0,
        }
    }
}

impl<K: Copy + Eq + std::fmt::Debug> Materializer<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Objects created on the host during this run
    pub fn created(&self) -> usize {
        self.created
    }

    /// Leftover objects from an earlier run that were reset and reused
    pub fn adopted(&self) -> usize {
        self.adopted
    }

    /// Cached handle for an index, without touching the host
    pub fn handle(&self, index: usize) -> Option<K> {
        self.slots.get(index).and_then(|s| s.as_ref()).map(|s| s.handle)
    }

    /// Return the object for particle `index`, materializing it on first use.
    ///
    /// First use creates the object at the particle's position, keys that
    /// position at `frame`, keys it hidden at frame 0 and visible at `frame`,
    /// assigns the track color and starts the trail.
    pub fn resolve<H>(
        &mut self,
        host: &mut H,
        index: usize,
        particle: &Particle,
        frame: i64,
    ) -> Result<K>
    where
        H: SceneHost<Handle = K>,
    {
        if let Some(handle) = self.handle(index) {
            return Ok(handle);
        }

        particle.check_finite(index)?;
        let color = color_for_particle(particle.total_charge, particle.mass, true)?;
        let name = particle_name(index);

        let handle = match host.lookup_object(&name) {
            None => {
                self.created += 1;
                host.create_object(&name, ObjectKind::Particle, particle.position)?
            }
            Some((handle, ObjectKind::Particle)) => {
                debug!("Reusing leftover object '{name}'");
                host.reset_object(handle, particle.position)?;
                self.adopted += 1;
                handle
            }
            Some((_, kind)) => {
                return Err(ChamberError::IdentityConflict {
                    name,
                    found: kind.name().to_string(),
                });
            }
        };

        if self.slots.len() <= index {
            self.slots.resize_with(index + 1, || None);
        }
        self.slots[index] = Some(VisualSlot {
            handle,
            visible: true,
        });

        host.record_keyframe(handle, Property::Position, frame)?;
        at_frame(host, 0, |host| self.set_visibility(host, index, false, 0))?;
        self.set_visibility(host, index, true, frame)?;
        host.assign_material(handle, color.to_rgba())?;
        host.begin_trail(handle, frame)?;

        Ok(handle)
    }

    /// Write visibility and key it, only if it differs from the last value
    /// written. Returns whether anything was emitted.
    pub fn set_visibility<H>(
        &mut self,
        host: &mut H,
        index: usize,
        visible: bool,
        frame: i64,
    ) -> Result<bool>
    where
        H: SceneHost<Handle = K>,
    {
        let slot = self
            .slots
            .get_mut(index)
            .and_then(|s| s.as_mut())
            .ok_or_else(|| ChamberError::Host(format!("particle {index} not materialized")))?;

        if slot.visible == visible {
            return Ok(false);
        }
        host.set_visibility(slot.handle, visible)?;
        host.record_keyframe(slot.handle, Property::Visibility, frame)?;
        slot.visible = visible;
        Ok(true)
    }

    /// Bring one particle's host object up to date at `frame`
    pub fn sync<H>(
        &mut self,
        host: &mut H,
        index: usize,
        frame: i64,
        particle: &mut Particle,
    ) -> Result<SyncOutcome>
    where
        H: SceneHost<Handle = K>,
    {
        if particle.is_finalized() {
            return Ok(SyncOutcome::Idle);
        }

        let handle = self.resolve(host, index, particle, frame)?;
        particle.check_finite(index)?;

        if particle.is_alive() {
            self.set_visibility(host, index, true, frame)?;
            host.set_position(handle, particle.position)?;
            host.record_keyframe(handle, Property::Position, frame)?;
            return Ok(SyncOutcome::Tracked);
        }

        if !particle.take_finalization() {
            return Ok(SyncOutcome::Idle);
        }

        host.set_position(handle, particle.position)?;
        host.record_keyframe(handle, Property::Position, frame)?;
        self.set_visibility(host, index, false, frame)?;
        host.end_trail(handle, frame)?;

        debug!(
            "Particle {index} finalized at frame {frame} ({})",
            particle.lifecycle.name()
        );
        Ok(SyncOutcome::Finalized(particle.lifecycle))
    }
}

/// Result of one `step_and_sync`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepReport {
    pub frame: i64,
    pub tracked: usize,
    pub finalized: usize,
}

/// Step the driver once and push the new state to the host
pub fn step_and_sync<D, H>(
    driver: &mut D,
    host: &mut H,
    materializer: &mut Materializer<H::Handle>,
    fps: u32,
) -> Result<StepReport>
where
    D: Driver,
    H: SceneHost,
{
    driver.step();

    let frame = frame_for_time(driver.time_passed(), fps);
    host.set_timeline_position(frame);

    let mut report = StepReport {
        frame,
        ..Default::default()
    };
    for (index, particle) in driver.particles_mut().iter_mut().enumerate() {
        match materializer.sync(host, index, frame, particle)? {
            SyncOutcome::Tracked => report.tracked += 1,
            SyncOutcome::Finalized(_) => report.finalized += 1,
            SyncOutcome::Idle => {}
        }
    }
    Ok(report)
}

/// Totals of a completed run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub steps: u64,
    pub last_frame: i64,
    pub objects_created: usize,
    pub objects_reused: usize,
    /// Leftover particle objects beyond this run's ensemble, deleted at start
    pub objects_removed: usize,
    pub finalized: usize,
}

/// Delete particle objects an earlier, larger run left on the host.
///
/// Indices below `count` are reset on first use by `Materializer::resolve`;
/// everything from `count` up to the first free name is removed here.
pub fn remove_leftovers<H: SceneHost>(host: &mut H, count: usize) -> Result<usize> {
    let mut removed = 0;
    let mut index = count;
    while let Some((handle, ObjectKind::Particle)) = host.lookup_object(&particle_name(index)) {
        host.remove_object(handle)?;
        removed += 1;
        index += 1;
    }
    if removed > 0 {
        debug!("Removed {removed} leftover particle objects");
    }
    Ok(removed)
}

/// Run the driver from `start` until no particle is dirty, keyframing every
/// step into `host`.
///
/// Gives up with `LivenessStall` after `config.max_steps` steps.
pub fn run_simulation<D, H>(driver: &mut D, host: &mut H, config: &ChamberConfig) -> Result<RunSummary>
where
    D: Driver,
    H: SceneHost,
{
    if config.fps == 0 {
        return Err(ChamberError::Config("fps must be > 0".into()));
    }

    driver.start();
    info!(
        "Baking {} particles at {} fps",
        driver.particles().len(),
        config.fps
    );

    let mut materializer = Materializer::new();
    let mut summary = RunSummary {
        objects_removed: remove_leftovers(host, driver.particles().len())?,
        ..Default::default()
    };

    while driver.has_dirty() {
        if summary.steps >= config.max_steps {
            let dirty = driver.dirty_count();
            error!(
                "Run stalled: {} particles still dirty after {} steps",
                dirty, summary.steps
            );
            return Err(ChamberError::LivenessStall {
                steps: summary.steps,
                dirty,
            });
        }

        let report = step_and_sync(driver, host, &mut materializer, config.fps)?;
        summary.steps += 1;
        summary.last_frame = report.frame;
        summary.finalized += report.finalized;
    }

    summary.objects_created = materializer.created();
    summary.objects_reused = materializer.adopted();

    info!(
        "Bake finished: {} steps, {} frames, {} objects, {} finalized",
        summary.steps,
        summary.last_frame + 1,
        summary.objects_created + summary.objects_reused,
        summary.finalized
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::{HostOp, RecordingHost};

    #[test]
    fn test_frame_for_time() {
        assert_eq!(frame_for_time(0.0, 30), 0);
        assert_eq!(frame_for_time(0.1, 30), 3);
        assert_eq!(frame_for_time(0.5, 30), 15);
        assert_eq!(frame_for_time(0.0333, 30), 0);
        assert_eq!(frame_for_time(1.0, 24), 24);
        // steps * dt can land just under a boundary; truncation keeps it there
        assert_eq!(frame_for_time(124.0 * (1.0 / 120.0), 30), 30);
    }

    #[test]
    fn test_frame_mapping_is_monotonic() {
        let mut last = 0;
        for step in 0..2000 {
            let frame = frame_for_time(step as f64 / 120.0, 30);
            assert!(frame >= last);
            last = frame;
        }
        assert_eq!(last, frame_for_time(1999.0 / 120.0, 30));
    }

    #[test]
    fn test_first_resolve_initializes_object() {
        let mut host = RecordingHost::new();
        host.set_timeline_position(6);
        let mut mat = Materializer::new();
        let p = Particle::new([0.5, 0.0, 0.0], [1.0, 0.0, 0.0], -1.0, 2.0);

        let id = mat.resolve(&mut host, 0, &p, 6).unwrap();

        let obj = host.object(id).unwrap();
        assert_eq!(obj.name, "Particle 0");
        assert_eq!(obj.visibility_track.sample(0), Some(false));
        assert_eq!(obj.visibility_track.sample(6), Some(true));
        assert_eq!(obj.visibility_track.len(), 2);
        assert_eq!(obj.position_track.sample(6), Some([0.5, 0.0, 0.0]));
        assert_eq!(obj.trail.start, Some(6));
        assert!(obj.color.is_some());
        // The frame-0 excursion put the timeline back
        assert_eq!(host.current_frame(), 6);
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let mut host = RecordingHost::new();
        let mut mat = Materializer::new();
        let p = Particle::new([0.0; 3], [1.0, 0.0, 0.0], 1.0, 1.0);

        let first = mat.resolve(&mut host, 2, &p, 1).unwrap();
        let ops_after_create = host.ops().len();
        for frame in 2..20 {
            assert_eq!(mat.resolve(&mut host, 2, &p, frame).unwrap(), first);
        }
        assert_eq!(host.ops().len(), ops_after_create);
        assert_eq!(mat.created(), 1);
        assert_eq!(host.objects().len(), 1);
    }

    #[test]
    fn test_remove_leftovers_stops_at_first_gap() {
        let mut host = RecordingHost::new();
        for index in 0..4 {
            host.create_object(&particle_name(index), ObjectKind::Particle, [0.0; 3])
                .unwrap();
        }
        host.create_object(&particle_name(5), ObjectKind::Particle, [0.0; 3])
            .unwrap();

        assert_eq!(remove_leftovers(&mut host, 2).unwrap(), 2);
        assert!(host.lookup_object("Particle 1").is_some());
        assert!(host.lookup_object("Particle 2").is_none());
        assert!(host.lookup_object("Particle 3").is_none());
        assert!(host.lookup_object("Particle 5").is_some());
    }

    #[test]
    fn test_remove_leftovers_keeps_other_kinds() {
        let mut host = RecordingHost::new();
        host.create_object("Particle 0", ObjectKind::Helper, [0.0; 3])
            .unwrap();
        assert_eq!(remove_leftovers(&mut host, 0).unwrap(), 0);
        assert_eq!(host.objects().len(), 1);
    }

    #[test]
    fn test_identity_conflict_aborts() {
        let mut host = RecordingHost::new();
        host.create_object("Particle 0", ObjectKind::Helper, [0.0; 3])
            .unwrap();
        let mut mat = Materializer::new();
        let p = Particle::new([0.0; 3], [1.0, 0.0, 0.0], 1.0, 1.0);

        let err = mat.resolve(&mut host, 0, &p, 0).unwrap_err();
        assert_eq!(
            err,
            ChamberError::IdentityConflict {
                name: "Particle 0".into(),
                found: "helper".into()
            }
        );
        assert_eq!(host.objects().len(), 1);
    }

    #[test]
    fn test_invalid_mass_fails_before_creation() {
        let mut host = RecordingHost::new();
        let mut mat = Materializer::new();
        let p = Particle::new([0.0; 3], [1.0, 0.0, 0.0], 1.0, 0.0);

        assert_eq!(
            mat.resolve(&mut host, 0, &p, 0),
            Err(ChamberError::InvalidMass { mass: 0.0 })
        );
        assert!(host.objects().is_empty());
    }

    #[test]
    fn test_non_finite_position_aborts_sync() {
        let mut host = RecordingHost::new();
        let mut mat = Materializer::new();
        let mut p = Particle::new([0.0; 3], [1.0, 0.0, 0.0], 1.0, 1.0);
        mat.sync(&mut host, 0, 1, &mut p).unwrap();

        p.position[0] = f32::NAN;
        assert_eq!(
            mat.sync(&mut host, 0, 2, &mut p),
            Err(ChamberError::NonFinite { index: 0, field: "position" })
        );
    }

    #[test]
    fn test_visibility_is_change_gated() {
        let mut host = RecordingHost::new();
        let mut mat = Materializer::new();
        let p = Particle::new([0.0; 3], [1.0, 0.0, 0.0], 1.0, 1.0);
        let id = mat.resolve(&mut host, 0, &p, 3).unwrap();
        host.clear_ops();

        assert!(!mat.set_visibility(&mut host, 0, true, 4).unwrap());
        assert!(host.ops().is_empty());

        assert!(mat.set_visibility(&mut host, 0, false, 5).unwrap());
        assert!(!mat.set_visibility(&mut host, 0, false, 6).unwrap());
        assert_eq!(
            host.ops(),
            &[
                HostOp::SetVisibility(id, false),
                HostOp::Keyframe(id, Property::Visibility, 5)
            ]
        );
    }

    #[test]
    fn test_sync_finalizes_once() {
        let mut host = RecordingHost::new();
        let mut mat = Materializer::new();
        let mut p = Particle::new([0.0; 3], [1.0, 0.0, 0.0], 1.0, 1.0);

        assert_eq!(mat.sync(&mut host, 0, 1, &mut p).unwrap(), SyncOutcome::Tracked);
        p.position = [0.2, 0.0, 0.0];
        p.terminate(Lifecycle::Decayed);

        assert_eq!(
            mat.sync(&mut host, 0, 2, &mut p).unwrap(),
            SyncOutcome::Finalized(Lifecycle::Decayed)
        );
        assert!(p.is_finalized());

        host.clear_ops();
        for frame in 3..10 {
            assert_eq!(mat.sync(&mut host, 0, frame, &mut p).unwrap(), SyncOutcome::Idle);
        }
        assert!(host.ops().is_empty());

        let obj = host.object_by_name("Particle 0").unwrap();
        assert_eq!(obj.trail.end, Some(2));
        assert_eq!(obj.visibility_track.sample(2), Some(false));
        assert_eq!(obj.position_track.sample(2), Some([0.2, 0.0, 0.0]));
    }

    #[test]
    fn test_leftover_object_is_reset_and_reused() {
        let mut host = RecordingHost::new();
        let p = Particle::new([0.0; 3], [1.0, 0.0, 0.0], 1.0, 1.0);

        let mut first_run = Materializer::new();
        let id = first_run.resolve(&mut host, 0, &p, 40).unwrap();

        let mut second_run = Materializer::new();
        assert_eq!(second_run.resolve(&mut host, 0, &p, 2).unwrap(), id);
        assert_eq!(second_run.created(), 0);
        assert_eq!(second_run.adopted(), 1);

        let obj = host.object(id).unwrap();
        assert_eq!(host.objects().len(), 1);
        assert_eq!(obj.position_track.last_frame(), Some(2));
        assert_eq!(obj.visibility_track.last_frame(), Some(2));
        assert_eq!(obj.trail.start, Some(2));
    }
}

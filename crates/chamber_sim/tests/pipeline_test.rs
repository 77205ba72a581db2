use chamber_core::{ChamberConfig, ChamberError, Lifecycle, Particle};
use chamber_sim::recording::{HostOp, ObjectId, RecordingHost};
use chamber_sim::{run_simulation, Driver, Property, SceneHost, Simulation};

/// Driver with fixed straight-line motion and a scripted death step per particle
pub struct ScriptedDriver {
    time_step: f64,
    steps: u64,
    initial: Vec<Particle>,
    particles: Vec<Particle>,
    /// Step at which each particle leaves `Alive`; `None` keeps it alive forever
    deaths: Vec<Option<u64>>,
}

impl ScriptedDriver {
    pub fn new(time_step: f64, particles: Vec<Particle>, deaths: Vec<Option<u64>>) -> Self {
        Self {
            time_step,
            steps: 0,
            initial: particles.clone(),
            particles,
            deaths,
        }
    }
}

impl Driver for ScriptedDriver {
    fn start(&mut self) {
        self.steps = 0;
        self.particles = self.initial.clone();
    }

    fn step(&mut self) {
        self.steps += 1;
        let dt = self.time_step as f32;
        for (p, death) in self.particles.iter_mut().zip(&self.deaths) {
            if !p.is_alive() {
                continue;
            }
            for i in 0..3 {
                p.position[i] += p.velocity[i] * dt;
            }
            p.mark_dirty();
            if death.is_some_and(|d| self.steps >= d) {
                p.terminate(Lifecycle::Decayed);
            }
        }
    }

    fn time_passed(&self) -> f64 {
        self.steps as f64 * self.time_step
    }

    fn particles(&self) -> &[Particle] {
        &self.particles
    }

    fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }
}

/// Two particles, charges [+1, -1], masses [1, 2], stepping at 60 Hz.
/// Particle 0 dies at t = 0.5 (frame 15), particle 1 at t = 4/3 (frame 40).
fn two_particle_driver() -> ScriptedDriver {
    ScriptedDriver::new(
        1.0 / 60.0,
        vec![
            Particle::new([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], 1.0, 1.0),
            Particle::new([0.0, 1.0, 0.0], [0.0, -1.0, 0.0], -1.0, 2.0),
        ],
        vec![Some(30), Some(80)],
    )
}

fn config_at_30fps() -> ChamberConfig {
    ChamberConfig {
        fps: 30,
        max_steps: 1_000,
        ..Default::default()
    }
}

fn object_id(host: &RecordingHost, index: usize) -> ObjectId {
    host.lookup_object(&format!("Particle {index}")).unwrap().0
}

/// Visibility values in the order they were keyed for one object
fn visibility_emissions(host: &RecordingHost, id: ObjectId) -> Vec<bool> {
    let mut visible = true;
    let mut emitted = Vec::new();
    for op in host.ops_for(id) {
        match op {
            HostOp::Reset(_) => visible = true,
            HostOp::SetVisibility(_, v) => visible = v,
            HostOp::Keyframe(_, Property::Visibility, _) => emitted.push(visible),
            _ => {}
        }
    }
    emitted
}

// ==================================================================================
// Scripted two-particle run
// ==================================================================================

#[test]
fn two_particle_run_terminates_at_last_death() {
    let mut driver = two_particle_driver();
    let mut host = RecordingHost::new();

    let summary = run_simulation(&mut driver, &mut host, &config_at_30fps()).unwrap();

    assert_eq!(summary.steps, 80);
    assert_eq!(summary.last_frame, 40);
    assert_eq!(summary.objects_created, 2);
    assert_eq!(summary.finalized, 2);
    assert!(driver.particles().iter().all(|p| p.is_finalized()));
}

#[test]
fn finalization_batch_fires_once_at_death_frame() {
    let mut driver = two_particle_driver();
    let mut host = RecordingHost::new();
    run_simulation(&mut driver, &mut host, &config_at_30fps()).unwrap();

    let p0 = object_id(&host, 0);
    let ops = host.ops_for(p0);
    let end_trails: Vec<_> = ops
        .iter()
        .filter(|op| matches!(op, HostOp::EndTrail(..)))
        .collect();
    assert_eq!(end_trails, vec![&HostOp::EndTrail(p0, 15)]);

    // Nothing touches particle 0 after its trail closes
    assert_eq!(ops.last(), Some(&HostOp::EndTrail(p0, 15)));

    let obj = host.object(p0).unwrap();
    assert_eq!(obj.position_track.last_frame(), Some(15));
    assert_eq!(obj.visibility_track.sample(15), Some(false));
    assert_eq!(obj.visibility_track.sample(14), Some(true));
    assert_eq!(obj.trail.end, Some(15));

    let p1 = host.object(object_id(&host, 1)).unwrap();
    assert_eq!(p1.position_track.last_frame(), Some(40));
    assert_eq!(p1.trail.end, Some(40));
}

#[test]
fn every_frame_keyed_exactly_once_while_alive() {
    let mut driver = two_particle_driver();
    let mut host = RecordingHost::new();
    run_simulation(&mut driver, &mut host, &config_at_30fps()).unwrap();

    let obj = host.object(object_id(&host, 0)).unwrap();
    let frames: Vec<i64> = obj.position_track.keys().iter().map(|k| k.frame).collect();
    assert_eq!(frames, (0..=15).collect::<Vec<_>>());

    // The last of the two steps sharing a frame wins
    let at_3 = obj.position_track.sample(3).unwrap();
    assert!((at_3[0] - 7.0 / 60.0).abs() < 1e-5);
}

#[test]
fn colors_follow_charge_and_mass() {
    let mut driver = two_particle_driver();
    let mut host = RecordingHost::new();
    run_simulation(&mut driver, &mut host, &config_at_30fps()).unwrap();

    let c0 = host.object(object_id(&host, 0)).unwrap().color.unwrap();
    assert_eq!(c0, [0.7, 0.0, 0.0, 1.0]);

    let c1 = host.object(object_id(&host, 1)).unwrap().color.unwrap();
    let expected = [0.42, 0.35, 0.7, 1.0];
    for i in 0..4 {
        assert!((c1[i] - expected[i]).abs() < 1e-5, "{c1:?}");
    }
}

#[test]
fn visibility_keys_never_repeat() {
    let mut driver = two_particle_driver();
    let mut host = RecordingHost::new();
    run_simulation(&mut driver, &mut host, &config_at_30fps()).unwrap();

    for index in 0..2 {
        let emitted = visibility_emissions(&host, object_id(&host, index));
        assert_eq!(emitted, vec![false, true, false]);
    }
}

#[test]
fn timeline_is_restored_after_frame_zero_excursion() {
    let mut driver = ScriptedDriver::new(
        0.1,
        vec![Particle::new([0.0; 3], [1.0, 0.0, 0.0], 1.0, 1.0)],
        vec![Some(3)],
    );
    let mut host = RecordingHost::new();
    run_simulation(&mut driver, &mut host, &config_at_30fps()).unwrap();

    let frames: Vec<i64> = host
        .ops()
        .iter()
        .filter_map(|op| match op {
            HostOp::SetFrame(f) => Some(*f),
            _ => None,
        })
        .collect();
    // step 1 -> frame 3, excursion to 0 and back, then frames 6 and 9
    assert_eq!(frames, vec![3, 0, 3, 6, 9]);
    assert_eq!(host.current_frame(), 9);
}

// ==================================================================================
// Liveness
// ==================================================================================

#[test]
fn run_without_convergence_stalls() {
    let mut driver = ScriptedDriver::new(
        0.1,
        vec![
            Particle::new([0.0; 3], [1.0, 0.0, 0.0], 1.0, 1.0),
            Particle::new([0.0; 3], [0.0, 1.0, 0.0], 1.0, 1.0),
        ],
        vec![Some(2), None],
    );
    let mut host = RecordingHost::new();
    let config = ChamberConfig {
        max_steps: 50,
        ..config_at_30fps()
    };

    let err = run_simulation(&mut driver, &mut host, &config).unwrap_err();
    assert_eq!(err, ChamberError::LivenessStall { steps: 50, dirty: 1 });
}

#[test]
fn empty_driver_finishes_immediately() {
    let mut driver = ScriptedDriver::new(0.1, Vec::new(), Vec::new());
    let mut host = RecordingHost::new();
    let summary = run_simulation(&mut driver, &mut host, &config_at_30fps()).unwrap();
    assert_eq!(summary.steps, 0);
    assert!(host.objects().is_empty());
}

#[test]
fn particle_dying_on_first_step_is_still_materialized() {
    let mut driver = ScriptedDriver::new(
        0.1,
        vec![Particle::new([0.0; 3], [1.0, 0.0, 0.0], -1.0, 1.0)],
        vec![Some(1)],
    );
    let mut host = RecordingHost::new();
    let summary = run_simulation(&mut driver, &mut host, &config_at_30fps()).unwrap();

    assert_eq!(summary.steps, 1);
    let obj = host.object_by_name("Particle 0").unwrap();
    assert_eq!(obj.trail.start, Some(3));
    assert_eq!(obj.trail.end, Some(3));
    assert_eq!(obj.visibility_track.sample(0), Some(false));
    assert_eq!(obj.visibility_track.sample(3), Some(false));
}

// ==================================================================================
// Full chamber simulation
// ==================================================================================

#[test]
fn chamber_run_finalizes_every_particle_once() {
    let config = ChamberConfig::default();
    let mut sim = Simulation::from_config(&config).unwrap();
    let mut host = RecordingHost::new();

    let summary = run_simulation(&mut sim, &mut host, &config).unwrap();

    let n = config.particle_count as usize;
    assert_eq!(summary.objects_created, n);
    assert_eq!(summary.finalized, n);
    assert_eq!(host.objects().len(), n);

    for index in 0..n {
        let id = object_id(&host, index);
        let ends = host
            .ops_for(id)
            .iter()
            .filter(|op| matches!(op, HostOp::EndTrail(..)))
            .count();
        assert_eq!(ends, 1, "particle {index}");

        let emitted = visibility_emissions(&host, id);
        assert!(emitted.windows(2).all(|w| w[0] != w[1]), "particle {index}: {emitted:?}");
    }
}

#[test]
fn chamber_keyframes_are_frame_monotonic() {
    let config = ChamberConfig::default();
    let mut sim = Simulation::from_config(&config).unwrap();
    let mut host = RecordingHost::new();
    run_simulation(&mut sim, &mut host, &config).unwrap();

    for index in 0..host.objects().len() {
        let frames: Vec<i64> = host
            .ops_for(object_id(&host, index))
            .iter()
            .filter_map(|op| match op {
                HostOp::Keyframe(_, Property::Position, f) => Some(*f),
                _ => None,
            })
            .collect();
        assert!(frames.windows(2).all(|w| w[0] <= w[1]), "particle {index}");
    }
}

#[test]
fn rerun_on_same_host_reuses_objects() {
    let config = ChamberConfig {
        particle_count: 4,
        ..Default::default()
    };
    let mut sim = Simulation::from_config(&config).unwrap();
    let mut host = RecordingHost::new();

    let first = run_simulation(&mut sim, &mut host, &config).unwrap();
    let tracks: Vec<_> = host
        .objects()
        .iter()
        .map(|o| (o.position_track.clone(), o.visibility_track.clone()))
        .collect();

    let second = run_simulation(&mut sim, &mut host, &config).unwrap();
    assert_eq!(second.objects_created, 0);
    assert_eq!(second.objects_reused, 4);
    assert_eq!(first.steps, second.steps);
    assert_eq!(host.objects().len(), 4);

    let rerun: Vec<_> = host
        .objects()
        .iter()
        .map(|o| (o.position_track.clone(), o.visibility_track.clone()))
        .collect();
    assert_eq!(tracks, rerun);
}

#[test]
fn smaller_rerun_removes_leftover_objects() {
    let mut host = RecordingHost::new();

    let four = ChamberConfig {
        particle_count: 4,
        ..Default::default()
    };
    let mut sim = Simulation::from_config(&four).unwrap();
    run_simulation(&mut sim, &mut host, &four).unwrap();
    assert_eq!(host.objects().len(), 4);

    let two = ChamberConfig {
        particle_count: 2,
        ..Default::default()
    };
    let mut sim = Simulation::from_config(&two).unwrap();
    let summary = run_simulation(&mut sim, &mut host, &two).unwrap();

    assert_eq!(summary.objects_reused, 2);
    assert_eq!(summary.objects_removed, 2);
    assert_eq!(host.objects().len(), 2);
    assert!(host.lookup_object("Particle 2").is_none());
    assert!(host.lookup_object("Particle 3").is_none());

    // Nothing on the host outlives the second run's timeline
    for obj in host.objects() {
        assert!(obj.position_track.last_frame() <= Some(summary.last_frame));
        assert!(obj.trail.end <= Some(summary.last_frame));
    }
}

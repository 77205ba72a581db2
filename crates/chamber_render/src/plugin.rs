use bevy::prelude::*;
use chamber_core::{BubbleChamber, ChamberConfig, ChamberError, Result};
use chamber_sim::{run_simulation, RunSummary, Simulation};

use crate::host::{BevyHost, SceneIndex, Timeline};
use crate::playback::{self, Playback};
use crate::ui;

/// Chamber configuration as a world resource
#[derive(Resource, Debug, Clone, Default)]
pub struct ChamberSettings(pub ChamberConfig);

/// Outcome of the startup bake, `None` until it has run
#[derive(Resource, Debug, Default)]
pub struct BakeReport(pub Option<std::result::Result<RunSummary, ChamberError>>);

/// Bakes the chamber simulation into the world at startup and plays it back
pub struct ChamberRenderPlugin;

impl Plugin for ChamberRenderPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ChamberSettings>()
            .init_resource::<BakeReport>()
            .init_resource::<SceneIndex>()
            .init_resource::<Timeline>()
            .init_resource::<Playback>()
            .add_systems(Startup, (spawn_camera, ui::spawn_hud, bake_chamber))
            .add_systems(
                Update,
                (
                    playback::playback_control_system,
                    playback::advance_playback.after(playback::playback_control_system),
                    playback::apply_animation.after(playback::advance_playback),
                    playback::draw_trails.after(playback::advance_playback),
                    ui::update_hud,
                ),
            );
    }
}

/// Run the simulation to completion, writing every particle into the world
pub fn bake(world: &mut World) -> Result<RunSummary> {
    let config = world.get_resource_or_insert_with(ChamberSettings::default).0.clone();
    // Always rebuilt from the current settings
    let sim = Simulation::from_config(&config)?;
    world.insert_resource(sim);
    world.insert_resource(Timeline::default());

    world.resource_scope(|world, mut sim: Mut<Simulation>| {
        let mut host = BevyHost::new(world);
        run_simulation(&mut *sim, &mut host, &config)
    })
}

pub fn bake_chamber(world: &mut World) {
    let result = bake(world);
    match &result {
        Ok(summary) => {
            info!(
                "Chamber baked: {} frames, {} tracks",
                summary.last_frame,
                summary.objects_created + summary.objects_reused
            );
            let fps = world.resource::<ChamberSettings>().0.fps;
            world.insert_resource(Playback::new(fps));
        }
        Err(e) => error!("Chamber bake failed: {e}"),
    }
    world.insert_resource(BakeReport(Some(result)));
}

fn spawn_camera(mut commands: Commands, settings: Res<ChamberSettings>) {
    let chamber = BubbleChamber::new(settings.0.chamber_dimensions);
    let pos = Vec3::new(0.0, 0.0, chamber.dimensions[2] * 2.0 + chamber.size());

    info!("Camera spawned at ({:.1}, {:.1}, {:.1})", pos.x, pos.y, pos.z);

    commands.spawn((
        Camera3d::default(),
        IsDefaultUiCamera,
        Transform::from_translation(pos).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    commands.insert_resource(AmbientLight {
        color: Color::srgb(0.6, 0.6, 0.7),
        brightness: 80.0,
    });
}

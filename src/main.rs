use bevy::prelude::*;
use chamber_core::ChamberConfig;
use chamber_render::plugin::{ChamberRenderPlugin, ChamberSettings};

fn main() {
    let config = ChamberConfig::default();

    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Bubble Chamber".into(),
                resolution: (1600.0, 900.0).into(),
                ..default()
            }),
            ..default()
        }))
        .insert_resource(ClearColor(Color::srgb(0.0, 0.0, 0.0)))
        .insert_resource(ChamberSettings(config))
        .add_plugins(ChamberRenderPlugin)
        .run();
}

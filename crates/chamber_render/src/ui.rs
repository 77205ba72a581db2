use bevy::prelude::*;

use crate::host::{ParticleAnimation, Timeline};
use crate::playback::Playback;
use crate::plugin::BakeReport;

/// Marker for the HUD text
#[derive(Component)]
pub struct HudText;

pub fn spawn_hud(mut commands: Commands) {
    commands.spawn((
        Text::new("Bubble Chamber"),
        TextFont {
            font_size: 16.0,
            ..default()
        },
        TextColor(Color::srgba(0.7, 0.8, 1.0, 0.9)),
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(10.0),
            left: Val::Px(10.0),
            ..default()
        },
        HudText,
    ));
}

fn bake_line(report: &BakeReport) -> String {
    match &report.0 {
        Some(Ok(summary)) => format!(
            "Baked {} steps | {} tracks ({} reused) | {} finalized",
            summary.steps,
            summary.objects_created + summary.objects_reused,
            summary.objects_reused,
            summary.finalized,
        ),
        Some(Err(err)) => format!("Bake failed: {err}"),
        None => "Not baked".to_string(),
    }
}

pub fn update_hud(
    playback: Res<Playback>,
    timeline: Res<Timeline>,
    report: Res<BakeReport>,
    tracks: Query<&Visibility, With<ParticleAnimation>>,
    mut hud_query: Query<&mut Text, With<HudText>>,
) {
    let Ok(mut text) = hud_query.get_single_mut() else {
        return;
    };
    let visible = tracks
        .iter()
        .filter(|v| **v != Visibility::Hidden)
        .count();
    let paused = if playback.paused { " [PAUSED]" } else { "" };
    let looping = if playback.looping { "on" } else { "off" };

    **text = format!(
        "BUBBLE CHAMBER\n\
         Frame: {} / {}{}\n\
         Visible tracks: {}\n\
         {}\n\
         \n\
         [Space] Pause  [R] Rewind  [L] Loop ({})",
        playback.whole_frame(),
        timeline.end,
        paused,
        visible,
        bake_line(&report),
        looping,
    );
}

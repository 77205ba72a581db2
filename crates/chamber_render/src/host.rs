//! `SceneHost` backed by a Bevy `World`.
//!
//! Host objects are entities. Names resolve through the `SceneIndex`
//! resource, and the bake-time timeline cursor lives in `Timeline`.
//! Meshes and materials are only attached when the render asset stores
//! exist, so a bare `World` works as a host too.

use std::collections::HashMap;

use bevy::prelude::*;
use chamber_core::{ChamberError, Result, PARTICLE_RADIUS};
use chamber_sim::{ObjectKind, Property, SceneHost, Track, TrailWindow};

/// Kind tag carried by every entity the host created
#[derive(Component, Debug, Clone, Copy)]
pub struct SceneObject {
    pub kind: ObjectKind,
}

/// Baked keyframes of one object
#[derive(Component, Debug, Default, Clone)]
pub struct ParticleAnimation {
    pub position: Track<[f32; 3]>,
    pub visibility: Track<bool>,
    pub trail: TrailWindow,
}

/// Track color assigned at creation
#[derive(Component, Debug, Clone, Copy)]
pub struct ParticleTint(pub [f32; 4]);

impl ParticleTint {
    pub fn color(&self) -> Color {
        let [r, g, b, a] = self.0;
        Color::linear_rgba(r, g, b, a)
    }
}

/// Host object names to entities
#[derive(Resource, Default)]
pub struct SceneIndex(pub HashMap<String, Entity>);

/// Bake-time timeline: the cursor keyframes are written at, and the last
/// frame holding any key
#[derive(Resource, Default, Debug)]
pub struct Timeline {
    pub current: i64,
    pub end: i64,
}

pub struct BevyHost<'w> {
    world: &'w mut World,
}

impl<'w> BevyHost<'w> {
    pub fn new(world: &'w mut World) -> Self {
        world.init_resource::<SceneIndex>();
        world.init_resource::<Timeline>();
        Self { world }
    }

    fn missing(entity: Entity) -> ChamberError {
        ChamberError::Host(format!("entity {entity} is not a scene object"))
    }

    fn animation_mut(&mut self, entity: Entity) -> Result<Mut<'_, ParticleAnimation>> {
        self.world
            .get_mut::<ParticleAnimation>(entity)
            .ok_or_else(|| Self::missing(entity))
    }

    fn is_scene_object(&self, entity: Entity) -> bool {
        self.world.get::<SceneObject>(entity).is_some()
    }
}

impl SceneHost for BevyHost<'_> {
    type Handle = Entity;

    fn create_object(&mut self, name: &str, kind: ObjectKind, position: [f32; 3]) -> Result<Entity> {
        if let Some(&existing) = self.world.resource::<SceneIndex>().0.get(name) {
            if self.is_scene_object(existing) {
                return Err(ChamberError::Host(format!("object '{name}' already exists")));
            }
        }

        let mesh = if kind == ObjectKind::Particle {
            self.world
                .get_resource_mut::<Assets<Mesh>>()
                .map(|mut meshes| meshes.add(Sphere::new(PARTICLE_RADIUS)))
        } else {
            None
        };

        let mut entity = self.world.spawn((
            Name::new(name.to_string()),
            SceneObject { kind },
            Transform::from_translation(Vec3::from_array(position)),
            Visibility::Visible,
            ParticleAnimation::default(),
        ));
        if let Some(mesh) = mesh {
            entity.insert(Mesh3d(mesh));
        }
        let id = entity.id();

        self.world
            .resource_mut::<SceneIndex>()
            .0
            .insert(name.to_string(), id);
        Ok(id)
    }

    fn lookup_object(&self, name: &str) -> Option<(Entity, ObjectKind)> {
        let entity = *self.world.resource::<SceneIndex>().0.get(name)?;
        // Despawned entities leave a stale index entry; treat it as absent
        let object = self.world.get::<SceneObject>(entity)?;
        Some((entity, object.kind))
    }

    fn reset_object(&mut self, entity: Entity, position: [f32; 3]) -> Result<()> {
        *self.animation_mut(entity)? = ParticleAnimation::default();
        self.set_position(entity, position)?;
        self.set_visibility(entity, true)
    }

    fn remove_object(&mut self, entity: Entity) -> Result<()> {
        if !self.is_scene_object(entity) {
            return Err(Self::missing(entity));
        }
        self.world
            .resource_mut::<SceneIndex>()
            .0
            .retain(|_, e| *e != entity);
        self.world.despawn(entity);
        Ok(())
    }

    fn set_position(&mut self, entity: Entity, position: [f32; 3]) -> Result<()> {
        let mut transform = self
            .world
            .get_mut::<Transform>(entity)
            .ok_or_else(|| Self::missing(entity))?;
        transform.translation = Vec3::from_array(position);
        Ok(())
    }

    fn current_frame(&self) -> i64 {
        self.world.resource::<Timeline>().current
    }

    fn set_timeline_position(&mut self, frame: i64) {
        self.world.resource_mut::<Timeline>().current = frame;
    }

    fn record_keyframe(&mut self, entity: Entity, property: Property, frame: i64) -> Result<()> {
        match property {
            Property::Position => {
                let value = self
                    .world
                    .get::<Transform>(entity)
                    .ok_or_else(|| Self::missing(entity))?
                    .translation
                    .to_array();
                self.animation_mut(entity)?.position.insert(frame, value);
            }
            Property::Visibility => {
                let value = self
                    .world
                    .get::<Visibility>(entity)
                    .ok_or_else(|| Self::missing(entity))?;
                let visible = *value != Visibility::Hidden;
                self.animation_mut(entity)?.visibility.insert(frame, visible);
            }
        }

        let mut timeline = self.world.resource_mut::<Timeline>();
        timeline.end = timeline.end.max(frame);
        Ok(())
    }

    fn set_visibility(&mut self, entity: Entity, visible: bool) -> Result<()> {
        let mut visibility = self
            .world
            .get_mut::<Visibility>(entity)
            .ok_or_else(|| Self::missing(entity))?;
        *visibility = if visible {
            Visibility::Visible
        } else {
            Visibility::Hidden
        };
        Ok(())
    }

    fn assign_material(&mut self, entity: Entity, rgba: [f32; 4]) -> Result<()> {
        if !self.is_scene_object(entity) {
            return Err(Self::missing(entity));
        }
        let tint = ParticleTint(rgba);

        let material = self
            .world
            .get_resource_mut::<Assets<StandardMaterial>>()
            .map(|mut materials| {
                let color = tint.color();
                materials.add(StandardMaterial {
                    base_color: color,
                    emissive: LinearRgba::from(color) * 3.0,
                    unlit: true,
                    ..default()
                })
            });

        let mut object = self.world.entity_mut(entity);
        object.insert(tint);
        if let Some(material) = material {
            object.insert(MeshMaterial3d(material));
        }
        Ok(())
    }

    fn begin_trail(&mut self, entity: Entity, frame: i64) -> Result<()> {
        self.animation_mut(entity)?.trail.start = Some(frame);
        Ok(())
    }

    fn end_trail(&mut self, entity: Entity, frame: i64) -> Result<()> {
        self.animation_mut(entity)?.trail.end = Some(frame);
        Ok(())
    }
}

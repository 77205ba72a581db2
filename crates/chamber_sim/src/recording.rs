//! In-memory scene host.
//!
//! Records every object, keyframe track and host call so a bake can run
//! headless and so the pipeline's output can be inspected directly.

use std::collections::HashMap;

use chamber_core::{ChamberError, Result};
use serde::{Deserialize, Serialize};

use crate::host::{ObjectKind, Property, SceneHost};
use crate::track::{Track, TrailWindow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub usize);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordedObject {
    pub name: String,
    pub kind: ObjectKind,
    pub position: [f32; 3],
    pub visible: bool,
    pub color: Option<[f32; 4]>,
    pub trail: TrailWindow,
    pub position_track: Track<[f32; 3]>,
    pub visibility_track: Track<bool>,
}

/// One host call, in the order the pipeline issued it
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HostOp {
    Create(ObjectId),
    Reset(ObjectId),
    Remove(ObjectId),
    SetPosition(ObjectId),
    SetFrame(i64),
    Keyframe(ObjectId, Property, i64),
    SetVisibility(ObjectId, bool),
    AssignMaterial(ObjectId),
    BeginTrail(ObjectId, i64),
    EndTrail(ObjectId, i64),
}

impl HostOp {
    /// The object this call touched, if any
    pub fn object(&self) -> Option<ObjectId> {
        match *self {
            Self::SetFrame(_) => None,
            Self::Create(id)
            | Self::Reset(id)
            | Self::Remove(id)
            | Self::SetPosition(id)
            | Self::Keyframe(id, _, _)
            | Self::SetVisibility(id, _)
            | Self::AssignMaterial(id)
            | Self::BeginTrail(id, _)
            | Self::EndTrail(id, _) => Some(id),
        }
    }
}

#[derive(Debug, Default)]
pub struct RecordingHost {
    /// Indexed by `ObjectId`; removed objects leave an empty slot
    objects: Vec<Option<RecordedObject>>,
    by_name: HashMap<String, ObjectId>,
    frame: i64,
    ops: Vec<HostOp>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Live objects in creation order
    pub fn objects(&self) -> Vec<&RecordedObject> {
        self.objects.iter().flatten().collect()
    }

    pub fn object(&self, id: ObjectId) -> Option<&RecordedObject> {
        self.objects.get(id.0)?.as_ref()
    }

    pub fn object_by_name(&self, name: &str) -> Option<&RecordedObject> {
        self.by_name.get(name).and_then(|id| self.object(*id))
    }

    pub fn ops(&self) -> &[HostOp] {
        &self.ops
    }

    /// Calls that touched one object
    pub fn ops_for(&self, id: ObjectId) -> Vec<HostOp> {
        self.ops
            .iter()
            .copied()
            .filter(|op| op.object() == Some(id))
            .collect()
    }

    /// Forget the call log but keep the scene
    pub fn clear_ops(&mut self) {
        self.ops.clear();
    }

    fn get_mut(&mut self, id: ObjectId) -> Result<&mut RecordedObject> {
        self.objects
            .get_mut(id.0)
            .and_then(|slot| slot.as_mut())
            .ok_or_else(|| ChamberError::Host(format!("no object with id {}", id.0)))
    }
}

impl SceneHost for RecordingHost {
    type Handle = ObjectId;

    fn create_object(
        &mut self,
        name: &str,
        kind: ObjectKind,
        position: [f32; 3],
    ) -> Result<ObjectId> {
        if self.by_name.contains_key(name) {
            return Err(ChamberError::Host(format!("object '{name}' already exists")));
        }
        let id = ObjectId(self.objects.len());
        self.objects.push(Some(RecordedObject {
            name: name.to_string(),
            kind,
            position,
            visible: true,
            color: None,
            trail: TrailWindow::default(),
            position_track: Track::new(),
            visibility_track: Track::new(),
        }));
        self.by_name.insert(name.to_string(), id);
        self.ops.push(HostOp::Create(id));
        Ok(id)
    }

    fn lookup_object(&self, name: &str) -> Option<(ObjectId, ObjectKind)> {
        let id = *self.by_name.get(name)?;
        self.object(id).map(|obj| (id, obj.kind))
    }

    fn reset_object(&mut self, id: ObjectId, position: [f32; 3]) -> Result<()> {
        let obj = self.get_mut(id)?;
        obj.position = position;
        obj.visible = true;
        obj.color = None;
        obj.trail = TrailWindow::default();
        obj.position_track.clear();
        obj.visibility_track.clear();
        self.ops.push(HostOp::Reset(id));
        Ok(())
    }

    fn remove_object(&mut self, id: ObjectId) -> Result<()> {
        let obj = self
            .objects
            .get_mut(id.0)
            .and_then(|slot| slot.take())
            .ok_or_else(|| ChamberError::Host(format!("no object with id {}", id.0)))?;
        self.by_name.remove(&obj.name);
        self.ops.push(HostOp::Remove(id));
        Ok(())
    }

    fn set_position(&mut self, id: ObjectId, position: [f32; 3]) -> Result<()> {
        self.get_mut(id)?.position = position;
        self.ops.push(HostOp::SetPosition(id));
        Ok(())
    }

    fn current_frame(&self) -> i64 {
        self.frame
    }

    fn set_timeline_position(&mut self, frame: i64) {
        self.frame = frame;
        self.ops.push(HostOp::SetFrame(frame));
    }

    fn record_keyframe(&mut self, id: ObjectId, property: Property, frame: i64) -> Result<()> {
        let obj = self.get_mut(id)?;
        match property {
            Property::Position => {
                let value = obj.position;
                obj.position_track.insert(frame, value);
            }
            Property::Visibility => {
                let value = obj.visible;
                obj.visibility_track.insert(frame, value);
            }
        }
        self.ops.push(HostOp::Keyframe(id, property, frame));
        Ok(())
    }

    fn set_visibility(&mut self, id: ObjectId, visible: bool) -> Result<()> {
        self.get_mut(id)?.visible = visible;
        self.ops.push(HostOp::SetVisibility(id, visible));
        Ok(())
    }

    fn assign_material(&mut self, id: ObjectId, rgba: [f32; 4]) -> Result<()> {
        self.get_mut(id)?.color = Some(rgba);
        self.ops.push(HostOp::AssignMaterial(id));
        Ok(())
    }

    fn begin_trail(&mut self, id: ObjectId, frame: i64) -> Result<()> {
        self.get_mut(id)?.trail.start = Some(frame);
        self.ops.push(HostOp::BeginTrail(id, frame));
        Ok(())
    }

    fn end_trail(&mut self, id: ObjectId, frame: i64) -> Result<()> {
        self.get_mut(id)?.trail.end = Some(frame);
        self.ops.push(HostOp::EndTrail(id, frame));
        Ok(())
    }
}

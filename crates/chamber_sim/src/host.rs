//! The scene host contract.
//!
//! The pipeline never builds meshes, materials or scene graphs itself; it
//! drives whatever 3D host implements [`SceneHost`]. The host owns a single
//! timeline whose current frame is the only ambient state the pipeline
//! touches, and [`at_frame`] is the only way to visit a frame out of band.

use std::fmt::Debug;
use std::ops::{Deref, DerefMut};

use chamber_core::Result;
use serde::{Deserialize, Serialize};

/// What a host object represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    /// Head of a particle track
    Particle,
    /// Chamber volume or other static scene helper
    Helper,
}

impl ObjectKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Particle => "particle",
            Self::Helper => "helper",
        }
    }
}

/// Keyframeable object properties
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Property {
    Position,
    Visibility,
}

/// Operations the pipeline needs from a 3D scene host
pub trait SceneHost {
    type Handle: Copy + Eq + Debug;

    /// Create a named object at `position`. Objects start visible.
    fn create_object(
        &mut self,
        name: &str,
        kind: ObjectKind,
        position: [f32; 3],
    ) -> Result<Self::Handle>;

    fn lookup_object(&self, name: &str) -> Option<(Self::Handle, ObjectKind)>;

    /// Drop all animation from an existing object and return it to the
    /// freshly created state at `position`
    fn reset_object(&mut self, handle: Self::Handle, position: [f32; 3]) -> Result<()>;

    /// Delete an object; its name becomes free again
    fn remove_object(&mut self, handle: Self::Handle) -> Result<()>;

    fn set_position(&mut self, handle: Self::Handle, position: [f32; 3]) -> Result<()>;

    fn current_frame(&self) -> i64;

    fn set_timeline_position(&mut self, frame: i64);

    /// Capture the current value of `property` as a key at `frame`
    fn record_keyframe(
        &mut self,
        handle: Self::Handle,
        property: Property,
        frame: i64,
    ) -> Result<()>;

    fn set_visibility(&mut self, handle: Self::Handle, visible: bool) -> Result<()>;

    fn assign_material(&mut self, handle: Self::Handle, rgba: [f32; 4]) -> Result<()>;

    /// Start the object's trailing effect (vapor trail) at `frame`
    fn begin_trail(&mut self, handle: Self::Handle, frame: i64) -> Result<()>;

    /// Close the object's trailing effect at `frame`
    fn end_trail(&mut self, handle: Self::Handle, frame: i64) -> Result<()>;
}

/// Restores the host timeline to a saved frame when dropped
pub struct FrameGuard<'a, H: SceneHost> {
    host: &'a mut H,
    saved: i64,
}

impl<H: SceneHost> Deref for FrameGuard<'_, H> {
    type Target = H;

    fn deref(&self) -> &H {
        &*self.host
    }
}

impl<H: SceneHost> DerefMut for FrameGuard<'_, H> {
    fn deref_mut(&mut self) -> &mut H {
        &mut *self.host
    }
}

impl<H: SceneHost> Drop for FrameGuard<'_, H> {
    fn drop(&mut self) {
        self.host.set_timeline_position(self.saved);
    }
}

/// Run `body` with the host timeline moved to `frame`, then put it back.
///
/// The previous frame is restored on every exit: normal return, `Err`, and
/// unwinding out of `body`.
pub fn at_frame<H, T, F>(host: &mut H, frame: i64, body: F) -> Result<T>
where
    H: SceneHost,
    F: FnOnce(&mut H) -> Result<T>,
{
    let saved = host.current_frame();
    host.set_timeline_position(frame);
    let mut guard = FrameGuard { host, saved };
    body(&mut *guard)
}

pub mod host;
pub mod pipeline;
pub mod recording;
pub mod simulation;
pub mod track;

pub use host::{at_frame, ObjectKind, Property, SceneHost};
pub use pipeline::{
    frame_for_time, remove_leftovers, run_simulation, Materializer, RunSummary, SyncOutcome,
};
pub use recording::RecordingHost;
pub use simulation::{Driver, Simulation};
pub use track::{Keyframe, Track, TrailWindow};

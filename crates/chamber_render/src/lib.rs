pub mod host;
pub mod playback;
pub mod plugin;
pub mod ui;

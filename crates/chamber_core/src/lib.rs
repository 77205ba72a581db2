pub mod color;
pub mod config;
pub mod constants;
pub mod error;
pub mod types;

pub use color::{color_for_particle, hsv_to_rgb, Color};
pub use config::ChamberConfig;
pub use constants::*;
pub use error::{ChamberError, Result};
pub use types::*;

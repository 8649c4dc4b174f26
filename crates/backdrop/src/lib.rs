//! Core state machine for the spores shader background.
//!
//! Nothing in this crate touches the GPU. The renderer crate owns the surface
//! and implements [`DrawTarget`]; everything that decides *what* gets drawn
//! lives here so it can be stepped deterministically in tests:
//!
//! ```text
//!   texture loader ──▶ BackgroundController::texture_loaded ──▶ FrameDriver::start
//!   resize event   ──▶ handlers::apply_resize ──▶ UniformSet (geometry) + DrawTarget::resize
//!   pointer event  ──▶ handlers::apply_pointer_move ──▶ UniformSet (pointer)
//!   redraw         ──▶ BackgroundController::frame ──▶ intensity ramp, time step, DrawTarget::draw
//! ```

mod controller;
mod easing;
mod error;
mod frame;
mod geometry;
pub mod handlers;
mod uniforms;

pub use controller::{BackgroundController, FrameOutcome, Lifecycle, MotionSettings};
pub use easing::{ease_out, EntryRamp, DEFAULT_EASE_POWER};
pub use error::{InitializationError, ResourceLoadError};
pub use frame::{
    DrawTarget, FrameDriver, FrameSource, LoopState, ManualFrameSource, SystemFrameSource,
};
pub use geometry::{to_ndc, Anchor, AnchorSpec, Rect, Viewport};
pub use uniforms::{SurfaceGeometry, UniformSet};

use std::time::Duration;

/// Amount `time` advances on every drawn frame.
pub const TIME_STEP: f64 = 0.005;

/// Length of the entry animation that ramps `intensity` from 0 to 1.
pub const ENTRY_DURATION: Duration = Duration::from_millis(1256);

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::geometry::Viewport;
use crate::uniforms::UniformSet;

/// Supplies the timestamp of the frame about to be produced.
pub trait FrameSource {
    /// Milliseconds since an arbitrary, fixed origin.
    fn now_ms(&self) -> f64;
}

/// Frame timestamps from the monotonic system clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemFrameSource {
    origin: Instant,
}

impl SystemFrameSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for SystemFrameSource {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl FrameSource for SystemFrameSource {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Manually stepped clock for deterministic tests.
///
/// Clones share the same timestamp, so a test can keep one handle while the
/// controller owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualFrameSource {
    now_ms: Rc<Cell<f64>>,
}

impl ManualFrameSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(now_ms: f64) -> Self {
        let source = Self::default();
        source.set(now_ms);
        source
    }

    pub fn set(&self, now_ms: f64) {
        self.now_ms.set(now_ms);
    }

    pub fn advance(&self, by: Duration) {
        self.now_ms
            .set(self.now_ms.get() + by.as_nanos() as f64 / 1_000_000.0);
    }
}

impl FrameSource for ManualFrameSource {
    fn now_ms(&self) -> f64 {
        self.now_ms.get()
    }
}

/// The surface the controller draws into.
pub trait DrawTarget {
    type Error;

    /// Resizes the backing surface to the viewport's pixel dimensions.
    fn resize(&mut self, viewport: &Viewport);

    /// Issues exactly one draw call with the given uniforms.
    fn draw(&mut self, uniforms: &UniformSet) -> Result<(), Self::Error>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Stopped,
    Running,
    Paused,
}

/// Explicitly startable and stoppable frame loop.
#[derive(Debug)]
pub struct FrameDriver<S> {
    source: S,
    state: LoopState,
    frames: u64,
}

impl<S: FrameSource> FrameDriver<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            state: LoopState::Stopped,
            frames: 0,
        }
    }

    pub fn now_ms(&self) -> f64 {
        self.source.now_ms()
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn start(&mut self) {
        self.state = LoopState::Running;
    }

    pub fn stop(&mut self) {
        self.state = LoopState::Stopped;
    }

    /// Pauses a running loop; a stopped loop stays stopped.
    pub fn pause(&mut self) {
        if self.state == LoopState::Running {
            self.state = LoopState::Paused;
        }
    }

    /// Resumes a paused loop; a stopped loop stays stopped.
    pub fn resume(&mut self) {
        if self.state == LoopState::Paused {
            self.state = LoopState::Running;
        }
    }

    /// Timestamp for the next frame, or `None` when the loop is not running.
    pub(crate) fn begin_frame(&mut self) -> Option<f64> {
        if !self.is_running() {
            return None;
        }
        self.frames = self.frames.saturating_add(1);
        Some(self.source.now_ms())
    }
}

use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::easing::{EntryRamp, DEFAULT_EASE_POWER};
use crate::error::ResourceLoadError;
use crate::frame::{DrawTarget, FrameDriver, FrameSource, LoopState};
use crate::geometry::{Anchor, Viewport};
use crate::handlers;
use crate::uniforms::{SurfaceGeometry, UniformSet};
use crate::{ENTRY_DURATION, TIME_STEP};

/// Tunables for the per-frame animation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionSettings {
    /// Added to `time` on every drawn frame, independent of wall-clock time.
    pub time_step: f64,
    /// How long the entry ramp takes to bring intensity from 0 to 1.
    pub entry_duration: Duration,
    /// Exponent of the ease-out curve.
    pub ease_power: i32,
}

impl Default for MotionSettings {
    fn default() -> Self {
        Self {
            time_step: TIME_STEP,
            entry_duration: ENTRY_DURATION,
            ease_power: DEFAULT_EASE_POWER,
        }
    }
}

/// Texture-gated startup lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Waiting for the texture; the surface stays hidden and no frames run.
    Loading,
    /// Texture arrived; the frame loop has been started.
    Ready,
    /// Texture failed to load; the loop never starts.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Drawn,
    /// Not ready yet, paused, or stopped.
    Skipped,
}

/// Owns the uniform set and drives it from resize, pointer, and frame events.
pub struct BackgroundController<A, S> {
    anchor: A,
    uniforms: UniformSet,
    settings: MotionSettings,
    lifecycle: Lifecycle,
    failure: Option<ResourceLoadError>,
    ramp: Option<EntryRamp>,
    driver: FrameDriver<S>,
    viewport: Viewport,
    /// Pause requested before the loop existed; applied when it starts.
    start_paused: bool,
    /// Set by `stop`; the loop never starts again afterwards.
    stopped: bool,
}

impl<A: Anchor, S: FrameSource> BackgroundController<A, S> {
    pub fn new(anchor: A, settings: MotionSettings, source: S, viewport: Viewport) -> Self {
        Self {
            anchor,
            uniforms: UniformSet::new(viewport.size()),
            settings,
            lifecycle: Lifecycle::Loading,
            failure: None,
            ramp: None,
            driver: FrameDriver::new(source),
            viewport,
            start_paused: false,
            stopped: false,
        }
    }

    /// Replaces the initial uniform set, e.g. one with a randomized start time.
    pub fn with_uniforms(mut self, uniforms: UniformSet) -> Self {
        self.uniforms = uniforms;
        self
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn failure(&self) -> Option<&ResourceLoadError> {
        self.failure.as_ref()
    }

    /// Hands the load failure to the caller; the lifecycle stays `Failed`.
    pub fn take_failure(&mut self) -> Option<ResourceLoadError> {
        self.failure.take()
    }

    pub fn uniforms(&self) -> &UniformSet {
        &self.uniforms
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn loop_state(&self) -> LoopState {
        self.driver.state()
    }

    pub fn is_running(&self) -> bool {
        self.driver.is_running()
    }

    pub fn frames(&self) -> u64 {
        self.driver.frames()
    }

    /// Recomputes the resize-driven uniforms and resizes the surface.
    pub fn handle_resize<T: DrawTarget>(
        &mut self,
        viewport: Viewport,
        target: &mut T,
    ) -> Option<SurfaceGeometry> {
        let geometry = handlers::apply_resize(&mut self.uniforms, &self.anchor, &viewport)?;
        self.viewport = viewport;
        target.resize(&viewport);
        Some(geometry)
    }

    /// Re-derives the geometry for a new device pixel ratio at the current
    /// surface size; pixel anchors scale with it.
    pub fn handle_scale_factor<T: DrawTarget>(
        &mut self,
        scale_factor: f64,
        target: &mut T,
    ) -> Option<SurfaceGeometry> {
        let viewport = Viewport::new(self.viewport.width, self.viewport.height, scale_factor);
        self.handle_resize(viewport, target)
    }

    pub fn handle_pointer_move(&mut self, x: f64, y: f64) {
        handlers::apply_pointer_move(&mut self.uniforms, x, y, &self.viewport);
    }

    /// Completes the `Loading → Ready` transition and starts the frame loop.
    ///
    /// Returns `true` when the caller should reveal the surface. A second
    /// call, or a call after a failure or `stop`, is ignored. A pause
    /// requested while loading leaves the new loop paused.
    pub fn texture_loaded<T: DrawTarget>(&mut self, viewport: Viewport, target: &mut T) -> bool {
        if self.lifecycle != Lifecycle::Loading {
            warn!(lifecycle = ?self.lifecycle, "ignoring texture load outside the loading phase");
            return false;
        }
        if self.stopped {
            debug!("ignoring texture load after the frame loop was stopped");
            return false;
        }

        self.handle_resize(viewport, target);
        let start_ms = self.driver.now_ms();
        self.ramp = Some(EntryRamp::new(
            start_ms,
            self.settings.entry_duration,
            self.settings.ease_power,
        ));
        self.lifecycle = Lifecycle::Ready;
        self.driver.start();
        if self.start_paused {
            self.driver.pause();
        }
        info!(
            width = viewport.width,
            height = viewport.height,
            entry_ms = self.settings.entry_duration.as_millis() as u64,
            "texture ready; starting frame loop"
        );
        true
    }

    /// Moves to `Failed`; the surface stays hidden and the loop never starts.
    pub fn texture_failed(&mut self, failure: ResourceLoadError) {
        if self.lifecycle != Lifecycle::Loading {
            warn!(lifecycle = ?self.lifecycle, error = %failure, "ignoring late texture failure");
            return;
        }
        error!(error = %failure, url = %failure.source_url, "background texture failed to load");
        self.lifecycle = Lifecycle::Failed;
        self.failure = Some(failure);
        self.driver.stop();
    }

    /// Runs one frame: ramp intensity, step time, draw once.
    pub fn frame<T: DrawTarget>(&mut self, target: &mut T) -> Result<FrameOutcome, T::Error> {
        let Some(ramp) = self.ramp else {
            return Ok(FrameOutcome::Skipped);
        };
        let Some(now_ms) = self.driver.begin_frame() else {
            return Ok(FrameOutcome::Skipped);
        };

        let was_saturated = self.uniforms.is_saturated();
        handlers::advance_frame(&mut self.uniforms, &ramp, now_ms, self.settings.time_step);
        if !was_saturated && self.uniforms.is_saturated() {
            debug!(frames = self.driver.frames(), "entry animation finished");
        }

        target.draw(&self.uniforms)?;
        Ok(FrameOutcome::Drawn)
    }

    /// Pauses the loop, or remembers the request until the texture arrives.
    pub fn pause(&mut self) {
        if self.lifecycle == Lifecycle::Loading {
            self.start_paused = true;
            return;
        }
        if self.driver.is_running() {
            debug!("pausing frame loop");
        }
        self.driver.pause();
    }

    pub fn resume(&mut self) {
        if self.lifecycle == Lifecycle::Loading {
            self.start_paused = false;
            return;
        }
        if self.driver.state() == LoopState::Paused {
            debug!("resuming frame loop");
        }
        self.driver.resume();
    }

    /// Stops the frame loop for good, including one that has not started yet.
    pub fn stop(&mut self) {
        if self.driver.state() != LoopState::Stopped {
            info!(frames = self.driver.frames(), "stopping frame loop");
        }
        self.stopped = true;
        self.driver.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::ManualFrameSource;
    use crate::geometry::{AnchorSpec, Rect};

    #[derive(Default)]
    struct RecordingTarget {
        draws: Vec<UniformSet>,
        resizes: Vec<Viewport>,
    }

    impl DrawTarget for RecordingTarget {
        type Error = &'static str;

        fn resize(&mut self, viewport: &Viewport) {
            self.resizes.push(*viewport);
        }

        fn draw(&mut self, uniforms: &UniformSet) -> Result<(), Self::Error> {
            self.draws.push(uniforms.clone());
            Ok(())
        }
    }

    struct FailingTarget;

    impl DrawTarget for FailingTarget {
        type Error = &'static str;

        fn resize(&mut self, _viewport: &Viewport) {}

        fn draw(&mut self, _uniforms: &UniformSet) -> Result<(), Self::Error> {
            Err("surface lost")
        }
    }

    fn full_hd() -> Viewport {
        Viewport::new(1920, 1080, 1.0)
    }

    fn controller(
        clock: &ManualFrameSource,
    ) -> BackgroundController<AnchorSpec, ManualFrameSource> {
        BackgroundController::new(
            AnchorSpec::default(),
            MotionSettings::default(),
            clock.clone(),
            full_hd(),
        )
    }

    #[test]
    fn frames_are_skipped_until_texture_loads() {
        let clock = ManualFrameSource::starting_at(100.0);
        let mut controller = controller(&clock);
        let mut target = RecordingTarget::default();

        assert_eq!(controller.lifecycle(), Lifecycle::Loading);
        assert_eq!(controller.frame(&mut target).unwrap(), FrameOutcome::Skipped);
        assert!(target.draws.is_empty());
        assert_eq!(controller.uniforms().time(), 0.0);
    }

    #[test]
    fn texture_load_syncs_geometry_and_starts_loop() {
        let clock = ManualFrameSource::starting_at(100.0);
        let mut controller = controller(&clock);
        let mut target = RecordingTarget::default();

        assert!(controller.texture_loaded(full_hd(), &mut target));
        assert_eq!(controller.lifecycle(), Lifecycle::Ready);
        assert!(controller.is_running());
        assert_eq!(target.resizes, vec![full_hd()]);
        assert_eq!(controller.uniforms().exclusion_center(), [0.0, 0.0]);

        assert!(!controller.texture_loaded(full_hd(), &mut target));
        assert_eq!(target.resizes.len(), 1);
    }

    #[test]
    fn intensity_is_three_quarters_halfway_through_entry() {
        let clock = ManualFrameSource::starting_at(2_000.0);
        let mut controller = controller(&clock);
        let mut target = RecordingTarget::default();
        controller.texture_loaded(full_hd(), &mut target);

        clock.advance(Duration::from_millis(628));
        controller.frame(&mut target).unwrap();
        assert!((controller.uniforms().intensity() - 0.75).abs() < 1e-6);

        clock.advance(Duration::from_millis(628));
        controller.frame(&mut target).unwrap();
        assert_eq!(controller.uniforms().intensity(), 1.0);

        clock.advance(Duration::from_secs(60));
        controller.frame(&mut target).unwrap();
        assert_eq!(controller.uniforms().intensity(), 1.0);
    }

    #[test]
    fn each_frame_draws_once_and_steps_time() {
        let clock = ManualFrameSource::new();
        let mut controller = controller(&clock);
        let mut target = RecordingTarget::default();
        controller.texture_loaded(full_hd(), &mut target);

        for _ in 0..40 {
            clock.advance(Duration::from_millis(16));
            assert_eq!(controller.frame(&mut target).unwrap(), FrameOutcome::Drawn);
        }
        assert_eq!(target.draws.len(), 40);
        assert_eq!(controller.frames(), 40);
        assert!((controller.uniforms().time() - 40.0 * TIME_STEP).abs() < 1e-9);

        let intensities: Vec<f32> = target.draws.iter().map(UniformSet::intensity).collect();
        assert!(intensities.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn failure_keeps_loop_stopped() {
        let clock = ManualFrameSource::new();
        let mut controller = controller(&clock);
        let mut target = RecordingTarget::default();

        controller.texture_failed(ResourceLoadError::new("https://example.invalid/t.jpg", "404"));
        assert_eq!(controller.lifecycle(), Lifecycle::Failed);
        assert_eq!(
            controller.failure().map(|err| err.source_url.as_str()),
            Some("https://example.invalid/t.jpg")
        );

        assert!(!controller.texture_loaded(full_hd(), &mut target));
        assert_eq!(controller.frame(&mut target).unwrap(), FrameOutcome::Skipped);
        assert!(target.draws.is_empty());

        assert!(controller.take_failure().is_some());
        assert!(controller.failure().is_none());
        assert_eq!(controller.lifecycle(), Lifecycle::Failed);
    }

    #[test]
    fn pause_and_stop_halt_time() {
        let clock = ManualFrameSource::new();
        let mut controller = controller(&clock);
        let mut target = RecordingTarget::default();
        controller.texture_loaded(full_hd(), &mut target);
        controller.frame(&mut target).unwrap();

        controller.pause();
        assert_eq!(controller.frame(&mut target).unwrap(), FrameOutcome::Skipped);
        controller.resume();
        assert_eq!(controller.frame(&mut target).unwrap(), FrameOutcome::Drawn);

        controller.stop();
        controller.resume();
        assert_eq!(controller.frame(&mut target).unwrap(), FrameOutcome::Skipped);
        assert!((controller.uniforms().time() - 2.0 * TIME_STEP).abs() < 1e-9);
    }

    #[test]
    fn resize_and_pointer_update_uniforms_before_ready() {
        let clock = ManualFrameSource::new();
        let anchor = Rect::new(0.0, 0.0, 480.0, 270.0);
        let mut controller =
            BackgroundController::new(anchor, MotionSettings::default(), clock, full_hd());
        let mut target = RecordingTarget::default();

        let geometry = controller
            .handle_resize(Viewport::new(960, 540, 1.0), &mut target)
            .expect("geometry");
        assert_eq!(geometry.viewport_size, [960.0, 540.0]);
        assert_eq!(geometry.exclusion_center, [-0.5, 0.5]);
        assert_eq!(geometry.exclusion_size, 0.5);

        controller.handle_pointer_move(960.0, 540.0);
        assert_eq!(controller.uniforms().pointer_center(), [1.0, -1.0]);
    }

    #[test]
    fn pause_while_loading_starts_the_loop_paused() {
        let clock = ManualFrameSource::new();
        let mut controller = controller(&clock);
        let mut target = RecordingTarget::default();

        controller.pause();
        assert!(controller.texture_loaded(full_hd(), &mut target));
        assert_eq!(controller.lifecycle(), Lifecycle::Ready);
        assert_eq!(controller.loop_state(), LoopState::Paused);
        assert_eq!(controller.frame(&mut target).unwrap(), FrameOutcome::Skipped);
        assert!(target.draws.is_empty());

        controller.resume();
        assert_eq!(controller.frame(&mut target).unwrap(), FrameOutcome::Drawn);
    }

    #[test]
    fn resume_while_loading_cancels_the_pending_pause() {
        let clock = ManualFrameSource::new();
        let mut controller = controller(&clock);
        let mut target = RecordingTarget::default();

        controller.pause();
        controller.resume();
        controller.texture_loaded(full_hd(), &mut target);
        assert_eq!(controller.loop_state(), LoopState::Running);
    }

    #[test]
    fn stop_while_loading_is_final() {
        let clock = ManualFrameSource::new();
        let mut controller = controller(&clock);
        let mut target = RecordingTarget::default();

        controller.stop();
        assert!(!controller.texture_loaded(full_hd(), &mut target));
        assert_eq!(controller.loop_state(), LoopState::Stopped);
        assert!(!controller.is_running());
        assert_eq!(controller.frame(&mut target).unwrap(), FrameOutcome::Skipped);
        assert!(target.draws.is_empty());
        assert!(target.resizes.is_empty());
    }

    #[test]
    fn scale_factor_change_rescales_pixel_anchor() {
        let clock = ManualFrameSource::new();
        let anchor = AnchorSpec::Pixels {
            x: 0.0,
            y: 0.0,
            width: 480.0,
            height: 270.0,
        };
        let mut controller =
            BackgroundController::new(anchor, MotionSettings::default(), clock, full_hd());
        let mut target = RecordingTarget::default();
        controller.handle_resize(full_hd(), &mut target);
        assert_eq!(controller.uniforms().exclusion_size(), 0.25);

        let geometry = controller
            .handle_scale_factor(2.0, &mut target)
            .expect("geometry");
        assert_eq!(geometry.exclusion_size, 0.5);
        assert_eq!(geometry.exclusion_center, [-0.5, 0.5]);
        assert_eq!(geometry.viewport_size, [1920.0, 1080.0]);
        assert_eq!(controller.viewport().scale_factor, 2.0);
    }

    #[test]
    fn draw_errors_propagate() {
        let clock = ManualFrameSource::new();
        let mut controller = controller(&clock);
        controller.texture_loaded(full_hd(), &mut FailingTarget);
        assert_eq!(controller.frame(&mut FailingTarget), Err("surface lost"));
    }
}

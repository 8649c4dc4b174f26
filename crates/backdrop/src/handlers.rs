//! Event handlers operating on an explicitly passed [`UniformSet`].
//!
//! Each handler takes the state it mutates as an argument, so a test can run
//! any of them against a fresh set without a controller or a window.

use tracing::trace;

use crate::easing::EntryRamp;
use crate::geometry::{to_ndc, Anchor, Viewport};
use crate::uniforms::{SurfaceGeometry, UniformSet};

/// Computes the resize-driven uniforms for `viewport` without mutating anything.
pub fn surface_geometry<A: Anchor + ?Sized>(anchor: &A, viewport: &Viewport) -> SurfaceGeometry {
    let bounds = anchor.bounds(viewport);
    let (center_x, center_y) = bounds.center();
    SurfaceGeometry {
        viewport_size: viewport.size(),
        exclusion_center: to_ndc(center_x, center_y, viewport),
        exclusion_size: (bounds.width / f64::from(viewport.width.max(1))) as f32,
    }
}

/// Recomputes viewport size, exclusion center and exclusion size.
///
/// Returns `None` for an empty viewport (minimized window); the previous
/// geometry stays in place.
pub fn apply_resize<A: Anchor + ?Sized>(
    uniforms: &mut UniformSet,
    anchor: &A,
    viewport: &Viewport,
) -> Option<SurfaceGeometry> {
    if viewport.is_empty() {
        return None;
    }
    let geometry = surface_geometry(anchor, viewport);
    uniforms.replace_geometry(geometry);
    trace!(?geometry, "surface geometry updated");
    Some(geometry)
}

/// Stores the pointer position, given in surface pixels, as NDC.
pub fn apply_pointer_move(uniforms: &mut UniformSet, x: f64, y: f64, viewport: &Viewport) {
    uniforms.set_pointer_center(to_ndc(x, y, viewport));
}

/// One frame's worth of uniform updates: ramp intensity, then step time.
pub fn advance_frame(uniforms: &mut UniformSet, ramp: &EntryRamp, now_ms: f64, time_step: f64) {
    if !uniforms.is_saturated() {
        uniforms.raise_intensity(ramp.intensity(now_ms));
    }
    uniforms.advance_time(time_step);
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use proptest::prelude::*;

    use super::*;
    use crate::geometry::{AnchorSpec, Rect};
    use crate::{DEFAULT_EASE_POWER, ENTRY_DURATION, TIME_STEP};

    fn full_hd() -> Viewport {
        Viewport::new(1920, 1080, 1.0)
    }

    #[test]
    fn anchor_centered_on_screen_has_origin_exclusion() {
        let mut uniforms = UniformSet::new([0.0, 0.0]);
        let anchor = Rect::new(860.0, 490.0, 200.0, 100.0);
        let geometry = apply_resize(&mut uniforms, &anchor, &full_hd()).expect("geometry");
        assert_eq!(geometry.exclusion_center, [0.0, 0.0]);
        assert_eq!(uniforms.exclusion_center(), [0.0, 0.0]);
        assert!((uniforms.exclusion_size() - 200.0 / 1920.0).abs() < 1e-6);
    }

    #[test]
    fn resize_replaces_all_geometry_fields_together() {
        let mut uniforms = UniformSet::new([640.0, 480.0]);
        let anchor = AnchorSpec::Relative {
            center_x: 0.25,
            center_y: 0.75,
            width: 0.5,
            height: 0.5,
        };
        let before = uniforms.geometry();
        apply_resize(&mut uniforms, &anchor, &full_hd());
        let after = uniforms.geometry();

        assert_ne!(before, after);
        assert_eq!(after, surface_geometry(&anchor, &full_hd()));
        assert_eq!(after.viewport_size, [1920.0, 1080.0]);
        assert_eq!(after.exclusion_center, [-0.5, -0.5]);
        assert_eq!(after.exclusion_size, 0.5);
    }

    #[test]
    fn empty_viewport_keeps_previous_geometry() {
        let mut uniforms = UniformSet::new([1920.0, 1080.0]);
        let before = uniforms.geometry();
        let result = apply_resize(&mut uniforms, &AnchorSpec::default(), &Viewport::new(0, 0, 1.0));
        assert!(result.is_none());
        assert_eq!(uniforms.geometry(), before);
    }

    #[test]
    fn pointer_at_origin_maps_to_top_left() {
        let mut uniforms = UniformSet::new([1920.0, 1080.0]);
        apply_pointer_move(&mut uniforms, 0.0, 0.0, &full_hd());
        assert_eq!(uniforms.pointer_center(), [-1.0, 1.0]);
    }

    #[test]
    fn pointer_move_leaves_everything_else_alone() {
        let mut uniforms = UniformSet::new([1920.0, 1080.0]);
        let before = uniforms.clone();
        apply_pointer_move(&mut uniforms, 480.0, 270.0, &full_hd());
        assert_eq!(uniforms.pointer_center(), [-0.5, 0.5]);
        assert_eq!(uniforms.geometry(), before.geometry());
        assert_eq!(uniforms.time(), before.time());
        assert_eq!(uniforms.intensity(), before.intensity());
    }

    #[test]
    fn time_after_n_frames_is_n_steps() {
        let mut uniforms = UniformSet::new([1.0, 1.0]);
        let ramp = EntryRamp::new(0.0, ENTRY_DURATION, DEFAULT_EASE_POWER);
        for frame in 0..1_000 {
            advance_frame(&mut uniforms, &ramp, f64::from(frame) * 16.0, TIME_STEP);
        }
        assert!((uniforms.time() - 1_000.0 * TIME_STEP).abs() < 1e-9);
    }

    #[test]
    fn intensity_pins_at_one_after_entry() {
        let mut uniforms = UniformSet::new([1.0, 1.0]);
        let ramp = EntryRamp::new(500.0, ENTRY_DURATION, DEFAULT_EASE_POWER);
        advance_frame(&mut uniforms, &ramp, 500.0 + 1256.0, TIME_STEP);
        assert_eq!(uniforms.intensity(), 1.0);
        for later in [2_000.0, 10_000.0, 1e9] {
            advance_frame(&mut uniforms, &ramp, later, TIME_STEP);
            assert_eq!(uniforms.intensity(), 1.0);
        }
    }

    proptest! {
        #[test]
        fn intensity_is_bounded_and_never_decreases(
            elapsed in proptest::collection::vec(0.0f64..5_000.0, 1..64)
        ) {
            let mut uniforms = UniformSet::new([1.0, 1.0]);
            let ramp = EntryRamp::new(0.0, Duration::from_millis(1256), 2);
            let mut previous = uniforms.intensity();
            for now in elapsed {
                advance_frame(&mut uniforms, &ramp, now, TIME_STEP);
                let current = uniforms.intensity();
                prop_assert!(current >= previous);
                prop_assert!((0.0..=1.0).contains(&current));
                previous = current;
            }
        }
    }
}

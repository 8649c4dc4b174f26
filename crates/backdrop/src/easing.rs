use std::time::Duration;

/// Exponent used by the entry animation.
pub const DEFAULT_EASE_POWER: i32 = 2;

/// Ease-out curve `1 - (1 - p)^power`.
///
/// `progress` is clamped to `[0, 1]`, so the result is always within `[0, 1]`
/// for any positive power.
pub fn ease_out(progress: f32, power: i32) -> f32 {
    let clamped = progress.clamp(0.0, 1.0);
    1.0 - (1.0 - clamped).powi(power)
}

/// Entry animation anchored at the moment the texture finished loading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntryRamp {
    start_ms: f64,
    duration_ms: f64,
    power: i32,
}

impl EntryRamp {
    pub fn new(start_ms: f64, duration: Duration, power: i32) -> Self {
        Self {
            start_ms,
            duration_ms: duration.as_nanos() as f64 / 1_000_000.0,
            power: power.max(1),
        }
    }

    /// Fraction of the entry duration elapsed at `now_ms`, clamped to `[0, 1]`.
    pub fn progress(&self, now_ms: f64) -> f32 {
        if self.duration_ms <= 0.0 {
            return 1.0;
        }
        let elapsed = now_ms - self.start_ms;
        (elapsed / self.duration_ms).clamp(0.0, 1.0) as f32
    }

    pub fn intensity(&self, now_ms: f64) -> f32 {
        ease_out(self.progress(now_ms), self.power)
    }
}

use rand::Rng;

/// Where the pointer sits before the first move event: far outside the
/// viewport so the shader's pointer highlight stays invisible.
const PARKED_POINTER: [f32; 2] = [10.0, 10.0];

/// Exclusion diameter, as a ratio of viewport width, until the first resize.
const DEFAULT_EXCLUSION_SIZE: f32 = 0.2;

/// Upper bound of the random start offset applied to `time`.
const MAX_RANDOM_START: f64 = 12.0;

/// Resize-driven part of the uniform set.
///
/// The three values are always replaced together, so a reader never sees a
/// viewport size from one resize next to an exclusion zone from another.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceGeometry {
    pub viewport_size: [f32; 2],
    pub exclusion_center: [f32; 2],
    pub exclusion_size: f32,
}

/// Values fed to the fragment shader every frame.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformSet {
    time: f64,
    intensity: f32,
    pointer_center: [f32; 2],
    geometry: SurfaceGeometry,
}

impl UniformSet {
    pub fn new(viewport_size: [f32; 2]) -> Self {
        Self {
            time: 0.0,
            intensity: 0.0,
            pointer_center: PARKED_POINTER,
            geometry: SurfaceGeometry {
                viewport_size,
                exclusion_center: [0.0, 0.0],
                exclusion_size: DEFAULT_EXCLUSION_SIZE,
            },
        }
    }

    /// Starts `time` at a random point so each launch shows a different
    /// phase of the animation.
    pub fn with_random_start<R: Rng + ?Sized>(mut self, rng: &mut R) -> Self {
        let outer: f64 = rng.gen();
        let inner: f64 = rng.gen();
        self.time = outer * (inner * MAX_RANDOM_START);
        self
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    pub fn pointer_center(&self) -> [f32; 2] {
        self.pointer_center
    }

    pub fn geometry(&self) -> SurfaceGeometry {
        self.geometry
    }

    pub fn viewport_size(&self) -> [f32; 2] {
        self.geometry.viewport_size
    }

    pub fn exclusion_center(&self) -> [f32; 2] {
        self.geometry.exclusion_center
    }

    pub fn exclusion_size(&self) -> f32 {
        self.geometry.exclusion_size
    }

    pub fn is_saturated(&self) -> bool {
        self.intensity >= 1.0
    }

    pub(crate) fn advance_time(&mut self, step: f64) {
        self.time += step;
    }

    /// Raises intensity towards `target`; never lowers it and never exceeds 1.
    pub(crate) fn raise_intensity(&mut self, target: f32) {
        self.intensity = self.intensity.max(target.clamp(0.0, 1.0));
    }

    pub(crate) fn set_pointer_center(&mut self, center: [f32; 2]) {
        self.pointer_center = center;
    }

    pub(crate) fn replace_geometry(&mut self, geometry: SurfaceGeometry) {
        self.geometry = geometry;
    }
}

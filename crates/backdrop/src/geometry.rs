use crate::error::InitializationError;

/// Current size of the render surface in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    /// Physical pixels per logical pixel (the device pixel ratio).
    pub scale_factor: f64,
}

impl Viewport {
    pub fn new(width: u32, height: u32, scale_factor: f64) -> Self {
        Self {
            width,
            height,
            scale_factor,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn size(&self) -> [f32; 2] {
        [self.width as f32, self.height as f32]
    }
}

/// Axis-aligned rectangle in physical pixels, origin at the top-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Maps a point in surface pixels to normalized device coordinates.
///
/// `(0, 0)` is the top-left corner and maps to `(-1, 1)`; y grows downward in
/// pixels and upward in NDC.
pub fn to_ndc(x: f64, y: f64, viewport: &Viewport) -> [f32; 2] {
    let width = f64::from(viewport.width.max(1));
    let height = f64::from(viewport.height.max(1));
    [
        ((x / width) * 2.0 - 1.0) as f32,
        (-(y / height) * 2.0 + 1.0) as f32,
    ]
}

/// Something on screen whose bounding box defines the exclusion zone.
pub trait Anchor {
    /// Bounding box for the given viewport, in physical pixels.
    fn bounds(&self, viewport: &Viewport) -> Rect;
}

/// Anchor region as configured by the user.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnchorSpec {
    /// Fixed box in logical pixels, scaled by the viewport's scale factor.
    Pixels {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    /// Box expressed as fractions of the viewport, so it follows resizes.
    Relative {
        center_x: f64,
        center_y: f64,
        width: f64,
        height: f64,
    },
}

impl Default for AnchorSpec {
    /// A centered hero box a fifth of the viewport wide.
    fn default() -> Self {
        Self::Relative {
            center_x: 0.5,
            center_y: 0.5,
            width: 0.2,
            height: 0.2,
        }
    }
}

impl AnchorSpec {
    /// Rejects anchors that cannot produce a usable exclusion zone.
    pub fn validate(self) -> Result<Self, InitializationError> {
        let (width, height) = match self {
            AnchorSpec::Pixels { width, height, .. } => (width, height),
            AnchorSpec::Relative {
                center_x,
                center_y,
                width,
                height,
            } => {
                for (field, value) in [
                    ("center_x", center_x),
                    ("center_y", center_y),
                    ("width", width),
                    ("height", height),
                ] {
                    if !(0.0..=1.0).contains(&value) {
                        return Err(InitializationError::AnchorOutOfRange { field, value });
                    }
                }
                (width, height)
            }
        };
        if !(width > 0.0 && height > 0.0) {
            return Err(InitializationError::DegenerateAnchor { width, height });
        }
        Ok(self)
    }
}

impl Anchor for AnchorSpec {
    fn bounds(&self, viewport: &Viewport) -> Rect {
        match *self {
            AnchorSpec::Pixels {
                x,
                y,
                width,
                height,
            } => {
                let scale = viewport.scale_factor;
                Rect::new(x * scale, y * scale, width * scale, height * scale)
            }
            AnchorSpec::Relative {
                center_x,
                center_y,
                width,
                height,
            } => {
                let vw = f64::from(viewport.width);
                let vh = f64::from(viewport.height);
                let w = width * vw;
                let h = height * vh;
                Rect::new(center_x * vw - w / 2.0, center_y * vh - h / 2.0, w, h)
            }
        }
    }
}

impl Anchor for Rect {
    fn bounds(&self, _viewport: &Viewport) -> Rect {
        *self
    }
}

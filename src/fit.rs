//! Aspect-ratio fitting of the display surface.

use glam::Vec3;

/// Half-depth of the collision box around the flat display surface
pub const SHAPE_HALF_DEPTH: f32 = 0.05;

/// Extent the host geometry falls back to for a side that was never declared
pub const DEFAULT_GEOMETRY_EXTENT: f32 = 1.0;

/// Pixel size of the loaded media. `None` means the size is unknown.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IntrinsicSize {
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl IntrinsicSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
        }
    }

    /// Whether at least one side has a usable, non-zero size
    pub fn is_known(&self) -> bool {
        usable(self.width).is_some() || usable(self.height).is_some()
    }

    /// Height over width. An unknown or zero side counts as 1.
    pub fn aspect_ratio(&self) -> f32 {
        let width = usable(self.width).unwrap_or(1.0);
        let height = usable(self.height).unwrap_or(1.0);
        height / width
    }
}

fn usable(side: Option<u32>) -> Option<f32> {
    side.filter(|&v| v > 0).map(|v| v as f32)
}

/// Declared size of the host's plane geometry
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Geometry {
    pub width: Option<f32>,
    pub height: Option<f32>,
}

impl Geometry {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
        }
    }

    fn declared_width(&self) -> Option<f32> {
        self.width.filter(|&w| w > 0.0)
    }

    fn declared_height(&self) -> Option<f32> {
        self.height.filter(|&h| h > 0.0)
    }
}

/// Display size derived from media and geometry
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FitResult {
    pub width: f32,
    pub height: f32,
}

impl FitResult {
    /// Collision box half-extents matching the display size
    pub fn half_extents(&self) -> Vec3 {
        Vec3::new(self.width / 2.0, self.height / 2.0, SHAPE_HALF_DEPTH)
    }
}

/// Fit media of `size` into `geometry`, preserving the media's aspect ratio.
///
/// A declared width is kept and the height follows the ratio, except for
/// portrait media in a fully declared geometry, where the height is kept and
/// the width shrinks. With no declared geometry the result fits in a unit square.
pub fn fit(size: IntrinsicSize, geometry: Geometry) -> FitResult {
    let ratio = size.aspect_ratio();

    match (geometry.declared_width(), geometry.declared_height()) {
        (Some(width), Some(height)) if ratio > 1.0 => FitResult {
            width: width / ratio,
            height,
        },
        (Some(width), height) => FitResult {
            width,
            height: height.unwrap_or(DEFAULT_GEOMETRY_EXTENT) * ratio,
        },
        (None, Some(height)) => FitResult {
            width: DEFAULT_GEOMETRY_EXTENT / ratio,
            height,
        },
        (None, None) => FitResult {
            width: (1.0 / ratio).min(1.0),
            height: ratio.min(1.0),
        },
    }
}

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

/// Reusable RGBA drawing surface backing an animated texture
#[derive(Clone, Debug)]
pub struct DrawingSurface {
    pixels: RgbaImage,
}

impl DrawingSurface {
    /// A fully transparent surface
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::new(width, height),
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Clear the whole surface to transparent
    pub fn clear(&mut self) {
        for pixel in self.pixels.pixels_mut() {
            *pixel = Rgba([0, 0, 0, 0]);
        }
    }

    /// Alpha-blend `frame` over the surface at the origin, stretched to the surface size
    pub fn draw(&mut self, frame: &RgbaImage) {
        if frame.dimensions() == self.pixels.dimensions() {
            imageops::overlay(&mut self.pixels, frame, 0, 0);
        } else {
            let scaled = imageops::resize(frame, self.width(), self.height(), FilterType::Nearest);
            imageops::overlay(&mut self.pixels, &scaled, 0, 0);
        }
    }

    pub fn snapshot(&self) -> RgbaImage {
        self.pixels.clone()
    }

    /// Put back a snapshot taken from this surface
    pub fn restore(&mut self, snapshot: RgbaImage) {
        if snapshot.dimensions() == self.pixels.dimensions() {
            self.pixels = snapshot;
        } else {
            log::warn!(
                "Ignoring surface snapshot of {:?}, surface is {:?}",
                snapshot.dimensions(),
                self.pixels.dimensions()
            );
        }
    }
}

//! Small GIF streams built in memory with the gif crate's encoder

use gif::{DisposalMethod, Encoder, Frame, Repeat};
use std::borrow::Cow;

pub const RED: [u8; 3] = [255, 0, 0];
pub const GREEN: [u8; 3] = [0, 255, 0];
pub const BLUE: [u8; 3] = [0, 0, 255];

/// One frame of a fixture. `None` pixels are transparent.
#[derive(Clone)]
pub struct FixtureFrame {
    pub left: u16,
    pub top: u16,
    pub width: u16,
    pub height: u16,
    pub pixels: Vec<Option<[u8; 3]>>,
    /// Hundredths of a second
    pub delay: u16,
    pub dispose: DisposalMethod,
}

impl FixtureFrame {
    pub fn solid(width: u16, height: u16, color: [u8; 3]) -> Self {
        Self {
            left: 0,
            top: 0,
            width,
            height,
            pixels: vec![Some(color); width as usize * height as usize],
            delay: 10,
            dispose: DisposalMethod::Keep,
        }
    }

    pub fn at(mut self, left: u16, top: u16) -> Self {
        self.left = left;
        self.top = top;
        self
    }

    pub fn delay(mut self, delay: u16) -> Self {
        self.delay = delay;
        self
    }

    pub fn dispose(mut self, dispose: DisposalMethod) -> Self {
        self.dispose = dispose;
        self
    }

    /// Make the pixel at (x, y) transparent
    pub fn hole(mut self, x: u16, y: u16) -> Self {
        let index = y as usize * self.width as usize + x as usize;
        self.pixels[index] = None;
        self
    }
}

/// Encode `frames` onto a `width`x`height` logical screen
pub fn encode_gif(width: u16, height: u16, frames: &[FixtureFrame]) -> Vec<u8> {
    let mut bytes = Vec::new();
    {
        let mut encoder = Encoder::new(&mut bytes, width, height, &[]).expect("create encoder");
        encoder.set_repeat(Repeat::Infinite).expect("set repeat");

        for fixture in frames {
            // Index 0 is reserved for transparency, colors follow in first-seen order
            let mut palette: Vec<[u8; 3]> = vec![[0, 0, 0]];
            let indices: Vec<u8> = fixture
                .pixels
                .iter()
                .map(|pixel| match pixel {
                    None => 0,
                    Some(color) => match palette.iter().position(|c| c == color) {
                        Some(i) => i as u8,
                        None => {
                            palette.push(*color);
                            (palette.len() - 1) as u8
                        }
                    },
                })
                .collect();

            let frame = Frame {
                left: fixture.left,
                top: fixture.top,
                width: fixture.width,
                height: fixture.height,
                delay: fixture.delay,
                dispose: fixture.dispose,
                transparent: Some(0),
                palette: Some(palette.concat()),
                buffer: Cow::Owned(indices),
                ..Frame::default()
            };
            encoder.write_frame(&frame).expect("write frame");
        }
    }
    bytes
}

pub mod materialize;
pub mod worker;

#[cfg(test)]
pub(crate) mod fixtures;

use crate::error::DecodeError;
use image::RgbaImage;

/// What to do with the canvas once a frame's display time is over
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Disposal {
    /// No disposal specified (code 0)
    #[default]
    Unspecified,
    /// Leave the frame in place (code 1)
    Keep,
    /// Clear the canvas (code 2)
    RestoreBackground,
    /// Put back what was on the canvas before the frame was drawn (code 3)
    RestorePrevious,
}

impl From<gif::DisposalMethod> for Disposal {
    fn from(method: gif::DisposalMethod) -> Self {
        match method {
            gif::DisposalMethod::Any => Disposal::Unspecified,
            gif::DisposalMethod::Keep => Disposal::Keep,
            gif::DisposalMethod::Background => Disposal::RestoreBackground,
            gif::DisposalMethod::Previous => Disposal::RestorePrevious,
        }
    }
}

/// One decoded frame as it leaves the worker: a logical-screen sized RGBA
/// canvas with the frame's pixels placed at its offset
#[derive(Clone)]
pub struct FramePayload {
    pub rgba_data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Successful result of a GIF decode.
///
/// Frames, delays and disposals always have the same, non-zero length.
pub struct DecodedFrameSet {
    frames: Vec<FramePayload>,
    delays: Vec<u32>,
    disposals: Vec<Disposal>,
}

impl DecodedFrameSet {
    pub fn new(
        frames: Vec<FramePayload>,
        delays: Vec<u32>,
        disposals: Vec<Disposal>,
    ) -> Result<Self, DecodeError> {
        if frames.len() != delays.len() || frames.len() != disposals.len() {
            return Err(DecodeError::LengthMismatch {
                frames: frames.len(),
                delays: delays.len(),
                disposals: disposals.len(),
            });
        }
        if frames.is_empty() {
            return Err(DecodeError::Empty);
        }

        Ok(Self {
            frames,
            delays,
            disposals,
        })
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frames(&self) -> &[FramePayload] {
        &self.frames
    }

    /// Per-frame display durations in milliseconds
    pub fn delays(&self) -> &[u32] {
        &self.delays
    }

    pub fn disposals(&self) -> &[Disposal] {
        &self.disposals
    }

    pub fn into_parts(self) -> (Vec<FramePayload>, Vec<u32>, Vec<Disposal>) {
        (self.frames, self.delays, self.disposals)
    }
}

/// The single message a decode worker posts back
pub type WorkerResponse = Result<DecodedFrameSet, DecodeError>;

/// A decoded frame set whose frames are all drawable.
///
/// Only built by the materializer, and only once every frame is ready.
pub struct MaterializedFrameSet {
    frames: Vec<RgbaImage>,
    delays: Vec<u32>,
    disposals: Vec<Disposal>,
}

impl MaterializedFrameSet {
    pub(crate) fn new(frames: Vec<RgbaImage>, delays: Vec<u32>, disposals: Vec<Disposal>) -> Self {
        debug_assert!(!frames.is_empty());
        debug_assert_eq!(frames.len(), delays.len());
        debug_assert_eq!(frames.len(), disposals.len());
        Self {
            frames,
            delays,
            disposals,
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frames(&self) -> &[RgbaImage] {
        &self.frames
    }

    pub fn delays(&self) -> &[u32] {
        &self.delays
    }

    pub fn disposals(&self) -> &[Disposal] {
        &self.disposals
    }

    /// Pixel size of the first frame, used to size the drawing surface
    pub fn first_frame_size(&self) -> (u32, u32) {
        self.frames.first().map(|f| f.dimensions()).unwrap_or((0, 0))
    }

    pub fn into_parts(self) -> (Vec<RgbaImage>, Vec<u32>, Vec<Disposal>) {
        (self.frames, self.delays, self.disposals)
    }
}

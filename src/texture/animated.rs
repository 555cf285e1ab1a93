use super::surface::DrawingSurface;
use crate::decoder::{Disposal, MaterializedFrameSet};
use image::RgbaImage;
use std::time::{Duration, Instant};

/// Frame data and timing for a texture that is playing
struct Playback {
    frames: Vec<RgbaImage>,
    delays: Vec<u32>,
    disposals: Vec<Disposal>,
    current_frame: usize,
    frame_start: Instant,
    surface: DrawingSurface,
    /// Surface contents saved before drawing a restore-to-previous frame
    previous: Option<RgbaImage>,
}

impl Playback {
    fn current_delay(&self) -> Duration {
        Duration::from_millis(u64::from(self.delays[self.current_frame]))
    }

    /// Draw the current frame, saving the surface first if the frame will
    /// have to be undone
    fn composite_current(&mut self) {
        if self.disposals[self.current_frame] == Disposal::RestorePrevious {
            self.previous = Some(self.surface.snapshot());
        }
        self.surface.draw(&self.frames[self.current_frame]);
    }

    fn dispose_current(&mut self) {
        match self.disposals[self.current_frame] {
            Disposal::RestoreBackground => self.surface.clear(),
            Disposal::RestorePrevious => {
                if let Some(previous) = self.previous.take() {
                    self.surface.restore(previous);
                }
            }
            Disposal::Unspecified | Disposal::Keep => {}
        }
    }
}

enum TextureState {
    /// No frame data yet
    Idle,
    Playing(Playback),
}

/// Texture that cycles through GIF frames as wall-clock time passes.
///
/// The host calls [`AnimatedTexture::update`] once per render pass. Each call
/// advances at most one frame, so a starved render loop slows the animation
/// down instead of skipping frames.
pub struct AnimatedTexture {
    state: TextureState,
    needs_update: bool,
}

impl Default for AnimatedTexture {
    fn default() -> Self {
        Self {
            state: TextureState::Idle,
            needs_update: false,
        }
    }
}

impl AnimatedTexture {
    /// Create a texture already playing `frames` from `now`
    pub fn playing(frames: MaterializedFrameSet, now: Instant) -> Self {
        let mut texture = Self::default();
        texture.attach(frames, now);
        texture
    }

    /// Start playing `frames`. Frame 0 becomes visible at `now`.
    pub fn attach(&mut self, frames: MaterializedFrameSet, now: Instant) {
        let (width, height) = frames.first_frame_size();
        let (frames, delays, disposals) = frames.into_parts();

        let mut playback = Playback {
            frames,
            delays,
            disposals,
            current_frame: 0,
            frame_start: now,
            surface: DrawingSurface::new(width, height),
            previous: None,
        };
        playback.composite_current();

        log::debug!(
            "Animated texture attached: {} frames, {}x{}",
            playback.frames.len(),
            width,
            height
        );

        self.state = TextureState::Playing(playback);
        self.needs_update = true;
    }

    /// Advance to the next frame if the current one has been shown longer
    /// than its delay. Returns whether a new frame was composited.
    pub fn update(&mut self, now: Instant) -> bool {
        let TextureState::Playing(playback) = &mut self.state else {
            return false;
        };

        let elapsed = now.saturating_duration_since(playback.frame_start);
        if elapsed <= playback.current_delay() {
            return false;
        }

        playback.dispose_current();
        playback.current_frame = (playback.current_frame + 1) % playback.frames.len();
        playback.frame_start = now;
        playback.composite_current();

        self.needs_update = true;
        true
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.state, TextureState::Playing(_))
    }

    pub fn current_frame(&self) -> Option<usize> {
        match &self.state {
            TextureState::Playing(playback) => Some(playback.current_frame),
            TextureState::Idle => None,
        }
    }

    /// When the current frame became visible
    pub fn frame_start(&self) -> Option<Instant> {
        match &self.state {
            TextureState::Playing(playback) => Some(playback.frame_start),
            TextureState::Idle => None,
        }
    }

    pub fn frame_count(&self) -> usize {
        match &self.state {
            TextureState::Playing(playback) => playback.frames.len(),
            TextureState::Idle => 0,
        }
    }

    /// Composited pixels to upload to the renderer
    pub fn image(&self) -> Option<&RgbaImage> {
        match &self.state {
            TextureState::Playing(playback) => Some(playback.surface.pixels()),
            TextureState::Idle => None,
        }
    }

    /// Whether the pixels changed since the renderer last uploaded them
    pub fn needs_update(&self) -> bool {
        self.needs_update
    }

    /// Called by the renderer after uploading [`AnimatedTexture::image`]
    pub fn mark_uploaded(&mut self) {
        self.needs_update = false;
    }
}

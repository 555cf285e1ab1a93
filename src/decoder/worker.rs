use super::{DecodedFrameSet, Disposal, FramePayload, WorkerResponse};
use crate::error::DecodeError;
use anyhow::{bail, Context, Result};
use image::{imageops, RgbaImage};
use smol::channel::{self, Receiver};
use std::io::Cursor;
use std::thread;
use std::time::Instant;

/// GIF frame delays are stored in hundredths of a second
const DELAY_UNIT_MS: u32 = 10;

/// Upper bounds on how much memory one GIF may expand to once decoded.
///
/// The logical screen size comes straight from the header, so a tiny file
/// can declare a huge screen and have every frame expanded onto it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecodeLimits {
    /// Bytes of a single logical-screen RGBA canvas
    pub max_canvas_bytes: u64,
    /// Bytes of all frame canvases together
    pub max_total_bytes: u64,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_canvas_bytes: 64 * 1024 * 1024,
            max_total_bytes: 512 * 1024 * 1024,
        }
    }
}

/// Frames, delays and disposals read from a GIF stream, in stream order
struct RawFrames {
    frames: Vec<FramePayload>,
    delays: Vec<u32>,
    disposals: Vec<Disposal>,
}

/// Decode a complete GIF stream into per-frame canvases, delays and disposal codes.
///
/// Each frame is placed onto its own transparent canvas the size of the
/// logical screen. Compositing frames on top of each other is left to the
/// texture engine, which also applies the disposal codes.
pub fn decode_gif(bytes: &[u8]) -> WorkerResponse {
    decode_gif_with_limits(bytes, DecodeLimits::default())
}

/// [`decode_gif`] with explicit memory bounds; exceeding them is a malformed stream
pub fn decode_gif_with_limits(bytes: &[u8], limits: DecodeLimits) -> WorkerResponse {
    let raw = read_frames(bytes, limits).map_err(|e| DecodeError::Malformed {
        reason: format!("{:#}", e),
    })?;
    DecodedFrameSet::new(raw.frames, raw.delays, raw.disposals)
}

fn read_frames(bytes: &[u8], limits: DecodeLimits) -> Result<RawFrames> {
    let start = Instant::now();

    let mut options = gif::DecodeOptions::new();
    options.set_color_output(gif::ColorOutput::RGBA);

    let mut decoder = options
        .read_info(Cursor::new(bytes))
        .context("Failed to read GIF header")?;

    let width = u32::from(decoder.width());
    let height = u32::from(decoder.height());
    log::info!("GIF logical screen: {}x{}, {} bytes", width, height, bytes.len());

    let canvas_bytes = u64::from(width) * u64::from(height) * 4;
    if canvas_bytes > limits.max_canvas_bytes {
        bail!(
            "Logical screen {}x{} needs {} bytes per frame, limit is {}",
            width,
            height,
            canvas_bytes,
            limits.max_canvas_bytes
        );
    }
    let mut decoded_bytes = 0u64;

    let mut raw = RawFrames {
        frames: Vec::new(),
        delays: Vec::new(),
        disposals: Vec::new(),
    };

    loop {
        let index = raw.frames.len();
        let Some(frame) = decoder
            .read_next_frame()
            .with_context(|| format!("Failed to decode frame {}", index))?
        else {
            break;
        };

        let patch = RgbaImage::from_raw(
            u32::from(frame.width),
            u32::from(frame.height),
            frame.buffer.to_vec(),
        )
        .with_context(|| format!("Frame {} has a truncated pixel buffer", index))?;

        decoded_bytes += canvas_bytes;
        if decoded_bytes > limits.max_total_bytes {
            bail!(
                "Frame {} takes decoded size past the {} byte limit",
                index,
                limits.max_total_bytes
            );
        }

        // Frames may be smaller than the screen and sit at an offset
        let mut canvas = RgbaImage::new(width, height);
        imageops::replace(&mut canvas, &patch, i64::from(frame.left), i64::from(frame.top));

        let delay_ms = u32::from(frame.delay) * DELAY_UNIT_MS;
        let disposal = Disposal::from(frame.dispose);

        log::debug!(
            "Frame {}: {}x{} at ({}, {}), delay {}ms, disposal {:?}",
            index,
            frame.width,
            frame.height,
            frame.left,
            frame.top,
            delay_ms,
            disposal
        );

        raw.frames.push(FramePayload {
            rgba_data: canvas.into_raw(),
            width,
            height,
        });
        raw.delays.push(delay_ms);
        raw.disposals.push(disposal);
    }

    log::info!("Decoded {} GIF frames in {:?}", raw.frames.len(), start.elapsed());

    Ok(raw)
}

/// A GIF decode running on its own thread.
///
/// One request (the bytes, moved in) and one response. A worker is never
/// reused; every load spawns a fresh one.
pub struct GifWorker {
    response: Receiver<WorkerResponse>,
}

impl GifWorker {
    pub fn spawn(bytes: Vec<u8>) -> Self {
        let (sender, receiver) = channel::bounded(1);

        thread::spawn(move || {
            let response = decode_gif(&bytes);
            drop(bytes);
            // Receiver may be gone if the load was abandoned
            let _ = sender.send_blocking(response);
        });

        Self { response: receiver }
    }

    /// Wait for the worker's single response
    pub async fn response(self) -> WorkerResponse {
        self.response
            .recv()
            .await
            .unwrap_or(Err(DecodeError::WorkerLost))
    }
}

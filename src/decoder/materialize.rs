//! Turns the worker's raw frame payloads into drawable images.

use super::{DecodedFrameSet, FramePayload, MaterializedFrameSet};
use crate::error::MaterializeError;
use image::RgbaImage;
use smol::channel::Receiver;
use std::time::Instant;

/// Realize every frame of `set` into an `RgbaImage`.
///
/// Frames are realized concurrently on the blocking pool and may finish in
/// any order. The result is published only once every frame is ready; the
/// first frame that cannot be realized fails the whole set.
pub async fn materialize(set: DecodedFrameSet) -> Result<MaterializedFrameSet, MaterializeError> {
    let start = Instant::now();
    let (payloads, delays, disposals) = set.into_parts();
    let total = payloads.len();

    let (sender, receiver) = smol::channel::unbounded();
    for (index, payload) in payloads.into_iter().enumerate() {
        let sender = sender.clone();
        smol::spawn(async move {
            let realized = smol::unblock(move || realize_frame(index, payload)).await;
            let _ = sender.send((index, realized)).await;
        })
        .detach();
    }
    drop(sender);

    let frames = collect_frames(receiver, total).await?;

    log::info!("Materialized {} frames in {:?}", total, start.elapsed());

    Ok(MaterializedFrameSet::new(frames, delays, disposals))
}

/// Gather `total` realized frames from `receiver` into stream order.
async fn collect_frames(
    receiver: Receiver<(usize, Result<RgbaImage, MaterializeError>)>,
    total: usize,
) -> Result<Vec<RgbaImage>, MaterializeError> {
    let mut slots: Vec<Option<RgbaImage>> = vec![None; total];
    let mut completed = 0;
    while completed < total {
        // Channel closes early only if a frame task died without reporting
        let Ok((index, realized)) = receiver.recv().await else {
            break;
        };
        slots[index] = Some(realized?);
        completed += 1;
        log::debug!("Realized frame {} ({}/{})", index, completed, total);
    }

    if let Some(index) = slots.iter().position(Option::is_none) {
        return Err(MaterializeError::Incomplete { index });
    }
    Ok(slots.into_iter().flatten().collect())
}

fn realize_frame(index: usize, payload: FramePayload) -> Result<RgbaImage, MaterializeError> {
    let FramePayload {
        rgba_data,
        width,
        height,
    } = payload;
    let len = rgba_data.len();

    RgbaImage::from_raw(width, height, rgba_data).ok_or(MaterializeError::BufferSize {
        index,
        len,
        width,
        height,
    })
}

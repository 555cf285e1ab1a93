//! Sequences a load: resolve, check the content type, then the static or animated path.

use crate::decoder::materialize::materialize;
use crate::decoder::worker::GifWorker;
use crate::decoder::MaterializedFrameSet;
use crate::error::{LoadError, Result};
use crate::fetch::{is_gif, MediaFetcher};
use smol::channel::{self, Receiver, TryRecvError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counter identifying the most recent load.
///
/// Shared with in-flight pipelines so they can tell they were superseded.
#[derive(Clone, Debug, Default)]
pub struct LoadGeneration(Arc<AtomicU64>);

impl LoadGeneration {
    /// Start a new generation, invalidating every earlier one
    pub fn advance(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn current(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.current() == generation
    }
}

/// Message from the animated pipeline to the main context
pub enum PipelineMessage {
    /// Every frame is drawable
    Ready(MaterializedFrameSet),
    Failed(LoadError),
}

/// An animated load whose decode has been started
pub struct PendingAnimation {
    generation: u64,
    receiver: Receiver<PipelineMessage>,
}

impl PendingAnimation {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Non-blocking check for the pipeline's message
    pub fn try_recv(&self) -> std::result::Result<PipelineMessage, TryRecvError> {
        self.receiver.try_recv()
    }
}

/// What a finished load asks the display to do
pub enum LoadOutcome {
    /// Show the image at `url` directly
    Static { url: String },
    /// Decode is running; frames arrive later through the pending handle
    Animated(PendingAnimation),
}

pub struct Loader {
    fetcher: Arc<dyn MediaFetcher>,
    generation: LoadGeneration,
}

impl Loader {
    pub fn new(fetcher: Arc<dyn MediaFetcher>) -> Self {
        Self {
            fetcher,
            generation: LoadGeneration::default(),
        }
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.generation.is_current(generation)
    }

    /// Drop interest in every load started so far
    pub fn invalidate(&self) {
        self.generation.advance();
    }

    /// Resolve `src`, look up its content type and pick a display path.
    ///
    /// For GIFs this returns as soon as the decode has been started.
    pub async fn load(&self, src: &str) -> Result<LoadOutcome> {
        let generation = self.generation.advance();
        log::info!("Load #{} started for {}", generation, src);

        let fetcher = self.fetcher.clone();
        let src = src.to_string();
        let url = smol::unblock(move || fetcher.resolve(&src)).await?;

        let fetcher = self.fetcher.clone();
        let head_url = url.clone();
        let content_type = smol::unblock(move || fetcher.content_type(&head_url)).await?;

        if !is_gif(content_type.as_deref()) {
            log::info!("Load #{}: static image ({:?})", generation, content_type);
            return Ok(LoadOutcome::Static { url });
        }

        let fetcher = self.fetcher.clone();
        let bytes = smol::unblock(move || fetcher.fetch_bytes(&url)).await?;

        log::info!("Load #{}: decoding {} byte GIF", generation, bytes.len());
        Ok(LoadOutcome::Animated(self.start_animation(generation, bytes)))
    }

    fn start_animation(&self, generation: u64, bytes: Vec<u8>) -> PendingAnimation {
        let worker = GifWorker::spawn(bytes);
        let (sender, receiver) = channel::bounded(1);
        let current = self.generation.clone();

        smol::spawn(async move {
            let message = match worker.response().await {
                Ok(_) if !current.is_current(generation) => {
                    log::debug!("Load #{} superseded, skipping materialization", generation);
                    return;
                }
                Ok(frames) => match materialize(frames).await {
                    Ok(frames) => PipelineMessage::Ready(frames),
                    Err(e) => PipelineMessage::Failed(e.into()),
                },
                Err(e) => PipelineMessage::Failed(e.into()),
            };
            // Receiver is gone if the component moved on
            let _ = sender.send(message).await;
        })
        .detach();

        PendingAnimation {
            generation,
            receiver,
        }
    }
}

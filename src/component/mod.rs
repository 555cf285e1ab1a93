//! The image surface component: loads `src` onto a scene object and keeps its
//! size and texture up to date.

pub mod host;
pub mod loader;

pub use host::{BillboardFrame, HeadlessHost, SceneHost};
pub use loader::{LoadGeneration, LoadOutcome, Loader, PendingAnimation, PipelineMessage};

use crate::config::ImagePlusConfig;
use crate::error::Result;
use crate::fetch::MediaFetcher;
use crate::fit::{fit, IntrinsicSize};
use crate::texture::AnimatedTexture;
use smol::channel::TryRecvError;
use std::sync::Arc;
use std::time::Instant;

/// Notifications from the host scene
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// The material finished loading a static image
    MaterialTextureLoaded {
        width: Option<u32>,
        height: Option<u32>,
    },
    /// The material has video data; video dimensions win when present
    MaterialVideoLoaded {
        video_width: Option<u32>,
        video_height: Option<u32>,
        width: Option<u32>,
        height: Option<u32>,
    },
    GrabStart,
}

pub struct ImagePlus<H: SceneHost> {
    config: ImagePlusConfig,
    host: H,
    loader: Loader,
    pending: Option<PendingAnimation>,
    texture: Option<AnimatedTexture>,
}

impl<H: SceneHost> ImagePlus<H> {
    /// Attach to `host`, placing the object in front of the billboard reference
    pub fn new(config: ImagePlusConfig, mut host: H, fetcher: Arc<dyn MediaFetcher>) -> Self {
        let billboard = host.billboard();
        host.set_transform(billboard.local_to_world(config.initial_offset), billboard.rotation);

        Self {
            config,
            host,
            loader: Loader::new(fetcher),
            pending: None,
            texture: None,
        }
    }

    pub fn config(&self) -> &ImagePlusConfig {
        &self.config
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Change the resource. Takes effect on the next [`ImagePlus::update`].
    pub fn set_src(&mut self, src: impl Into<String>) {
        self.config.src = src.into();
    }

    /// Load `config.src`.
    ///
    /// Static images are applied before this returns. For GIFs this returns
    /// once the decode has started; the texture is attached by a later
    /// [`ImagePlus::tick`]. On error nothing on the display changes.
    pub async fn update(&mut self) -> Result<()> {
        self.config.validate()?;

        match self.loader.load(&self.config.src).await? {
            LoadOutcome::Static { url } => {
                self.pending = None;
                self.texture = None;
                self.host.set_material_source(&url);
            }
            LoadOutcome::Animated(pending) => {
                self.pending = Some(pending);
            }
        }
        Ok(())
    }

    pub fn handle_event(&mut self, event: LifecycleEvent) {
        match event {
            LifecycleEvent::MaterialTextureLoaded { width, height } => {
                self.on_material_loaded(IntrinsicSize { width, height });
            }
            LifecycleEvent::MaterialVideoLoaded {
                video_width,
                video_height,
                width,
                height,
            } => {
                let size = IntrinsicSize {
                    width: video_width.filter(|&w| w > 0).or(width),
                    height: video_height.filter(|&h| h > 0).or(height),
                };
                self.on_material_loaded(size);
            }
            LifecycleEvent::GrabStart => {
                if self.config.reorient_on_grab {
                    let rotation = self.host.billboard().rotation;
                    self.host.set_body_orientation(rotation);
                }
            }
        }
    }

    fn on_material_loaded(&mut self, size: IntrinsicSize) {
        if size.is_known() {
            self.apply_fit(size);
        }
    }

    fn apply_fit(&mut self, size: IntrinsicSize) {
        let result = fit(size, self.host.geometry());
        log::debug!(
            "Fit {:?}x{:?} media to {}x{}",
            size.width,
            size.height,
            result.width,
            result.height
        );
        self.host.set_geometry(result.width, result.height);
        self.host.set_shape_half_extents(result.half_extents());
    }

    /// Per render pass: pick up a finished animated load, then advance the texture
    pub fn tick(&mut self, now: Instant) {
        self.process_pipeline_messages(now);

        if let Some(texture) = &mut self.texture {
            texture.update(now);
        }
    }

    fn process_pipeline_messages(&mut self, now: Instant) {
        let Some(pending) = &self.pending else {
            return;
        };
        let generation = pending.generation();
        let message = match pending.try_recv() {
            Ok(message) => message,
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Closed) => {
                // Pipeline gave up without a result (superseded)
                self.pending = None;
                return;
            }
        };
        self.pending = None;

        if !self.loader.is_current(generation) {
            log::debug!("Dropping result of stale load #{}", generation);
            return;
        }

        match message {
            PipelineMessage::Ready(frames) => {
                let (width, height) = frames.first_frame_size();
                log::info!(
                    "Load #{}: playing {} frames at {}x{}",
                    generation,
                    frames.len(),
                    width,
                    height
                );
                self.texture = Some(AnimatedTexture::playing(frames, now));
                self.host.set_material_texture(width, height);
                self.apply_fit(IntrinsicSize::new(width, height));
            }
            PipelineMessage::Failed(e) => {
                log::error!("Failed to load animated image: {}", e);
            }
        }
    }

    /// Whether an animated load is still being decoded
    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    pub fn texture(&self) -> Option<&AnimatedTexture> {
        self.texture.as_ref()
    }

    pub fn texture_mut(&mut self) -> Option<&mut AnimatedTexture> {
        self.texture.as_mut()
    }

    /// Detach from the host: in-flight loads are abandoned and the texture dropped
    pub fn remove(&mut self) {
        self.loader.invalidate();
        self.pending = None;
        self.texture = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::fixtures::{encode_gif, FixtureFrame, BLUE, GREEN, RED};
    use crate::error::LoadError;
    use crate::fit::Geometry;
    use glam::{Quat, Vec3};
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::thread;
    use std::time::Duration;

    struct Media {
        url: String,
        content_type: Option<String>,
        bytes: Vec<u8>,
    }

    /// In-memory media service recording every call
    #[derive(Default)]
    struct MockFetcher {
        media: HashMap<String, Media>,
        calls: Mutex<Vec<String>>,
    }

    impl MockFetcher {
        fn with_media(mut self, src: &str, url: &str, content_type: Option<&str>, bytes: Vec<u8>) -> Self {
            self.media.insert(
                src.to_string(),
                Media {
                    url: url.to_string(),
                    content_type: content_type.map(str::to_owned),
                    bytes,
                },
            );
            self
        }

        fn find(&self, url: &str) -> Result<&Media> {
            self.media
                .values()
                .find(|m| m.url == url)
                .ok_or_else(|| LoadError::Network {
                    url: url.to_string(),
                    reason: "HTTP error: 404 Not Found".to_string(),
                })
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().clone()
        }
    }

    impl MediaFetcher for MockFetcher {
        fn resolve(&self, src: &str) -> Result<String> {
            self.calls.lock().push(format!("resolve {}", src));
            self.media
                .get(src)
                .map(|m| m.url.clone())
                .ok_or_else(|| LoadError::Resolve {
                    src: src.to_string(),
                    reason: "unknown media".to_string(),
                })
        }

        fn content_type(&self, url: &str) -> Result<Option<String>> {
            self.calls.lock().push(format!("head {}", url));
            Ok(self.find(url)?.content_type.clone())
        }

        fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
            self.calls.lock().push(format!("get {}", url));
            Ok(self.find(url)?.bytes.clone())
        }
    }

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn animated_gif() -> Vec<u8> {
        encode_gif(
            4,
            2,
            &[
                FixtureFrame::solid(4, 2, RED).delay(2),
                FixtureFrame::solid(4, 2, GREEN).delay(2),
                FixtureFrame::solid(4, 2, BLUE).delay(2),
            ],
        )
    }

    fn fetcher() -> Arc<MockFetcher> {
        Arc::new(
            MockFetcher::default()
                .with_media("cat", "https://cdn.test/cat.gif", Some("image/gif"), animated_gif())
                .with_media("dog", "https://cdn.test/dog.png", Some("image/png"), Vec::new())
                .with_media("broken", "https://cdn.test/broken.gif", Some("image/gif"), b"GIF89a".to_vec())
                .with_media("mystery", "https://cdn.test/mystery", None, Vec::new()),
        )
    }

    fn component(src: &str, fetcher: Arc<MockFetcher>) -> ImagePlus<HeadlessHost> {
        ImagePlus::new(ImagePlusConfig::new(src), HeadlessHost::default(), fetcher)
    }

    /// Tick until the animated pipeline reports back
    fn settle(component: &mut ImagePlus<HeadlessHost>) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while component.is_loading() {
            assert!(Instant::now() < deadline, "animated load did not finish");
            component.tick(Instant::now());
            thread::sleep(Duration::from_millis(2));
        }
    }

    #[test]
    fn test_placed_in_front_of_billboard() {
        let billboard = BillboardFrame::new(Vec3::new(0.0, 1.6, 0.0), Quat::IDENTITY);
        let image = ImagePlus::new(
            ImagePlusConfig::new("cat"),
            HeadlessHost::with_billboard(billboard),
            fetcher(),
        );

        assert_eq!(image.host().position, Vec3::new(0.0, 1.6, -1.5));
        assert_eq!(image.host().rotation, Quat::IDENTITY);
    }

    #[test]
    fn test_static_image_sets_material_source() {
        init_logging();
        let fetcher = fetcher();
        let mut image = component("dog", fetcher.clone());

        smol::block_on(image.update()).unwrap();

        assert_eq!(image.host().material_source.as_deref(), Some("https://cdn.test/dog.png"));
        assert!(!image.is_loading());
        assert!(image.texture().is_none());
        // No download, so no worker
        assert_eq!(
            fetcher.calls(),
            vec!["resolve dog".to_string(), "head https://cdn.test/dog.png".to_string()]
        );
    }

    #[test]
    fn test_missing_content_type_is_static() {
        let mut image = component("mystery", fetcher());
        smol::block_on(image.update()).unwrap();
        assert_eq!(image.host().material_source.as_deref(), Some("https://cdn.test/mystery"));
    }

    #[test]
    fn test_static_image_fits_on_texture_loaded() {
        let mut image = component("dog", fetcher());
        smol::block_on(image.update()).unwrap();

        image.handle_event(LifecycleEvent::MaterialTextureLoaded {
            width: Some(200),
            height: Some(100),
        });

        assert_eq!(image.host().geometry, Geometry::new(1.0, 0.5));
        assert_eq!(image.host().half_extents, Some(Vec3::new(0.5, 0.25, 0.05)));
    }

    #[test]
    fn test_unknown_size_does_not_fit() {
        let mut image = component("dog", fetcher());
        image.handle_event(LifecycleEvent::MaterialTextureLoaded {
            width: None,
            height: Some(0),
        });
        assert_eq!(image.host().half_extents, None);
    }

    #[test]
    fn test_video_dimensions_preferred() {
        let mut image = component("dog", fetcher());
        image.handle_event(LifecycleEvent::MaterialVideoLoaded {
            video_width: Some(100),
            video_height: Some(400),
            width: Some(300),
            height: Some(150),
        });

        assert_eq!(image.host().geometry, Geometry::new(0.25, 1.0));
    }

    #[test]
    fn test_gif_plays_after_materialization() {
        init_logging();
        let fetcher = fetcher();
        let mut image = component("cat", fetcher.clone());

        smol::block_on(image.update()).unwrap();
        assert!(fetcher.calls().contains(&"get https://cdn.test/cat.gif".to_string()));

        settle(&mut image);

        let texture = image.texture().expect("texture attached");
        assert!(texture.is_playing());
        assert_eq!(texture.frame_count(), 3);
        assert_eq!(texture.current_frame(), Some(0));
        assert_eq!(texture.image().unwrap().dimensions(), (4, 2));
        // Fitted from the first frame: 4x2 into a unit square
        assert_eq!(image.host().geometry, Geometry::new(1.0, 0.5));
        assert_eq!(image.host().half_extents, Some(Vec3::new(0.5, 0.25, 0.05)));
    }

    #[test]
    fn test_gif_replaces_static_material() {
        let mut image = component("dog", fetcher());
        smol::block_on(image.update()).unwrap();
        assert_eq!(image.host().material_source.as_deref(), Some("https://cdn.test/dog.png"));

        image.set_src("cat");
        smol::block_on(image.update()).unwrap();
        // Still showing the PNG while the GIF decodes
        assert_eq!(image.host().material_source.as_deref(), Some("https://cdn.test/dog.png"));

        settle(&mut image);

        assert_eq!(image.host().material_source, None);
        assert_eq!(image.host().material_texture, Some((4, 2)));
        assert!(image.texture().is_some());
    }

    #[test]
    fn test_gif_advances_on_tick() {
        let mut image = component("cat", fetcher());
        smol::block_on(image.update()).unwrap();
        settle(&mut image);

        let start = image.texture().unwrap().frame_start().unwrap();
        image.texture_mut().unwrap().mark_uploaded();

        image.tick(start + Duration::from_millis(10));
        assert_eq!(image.texture().unwrap().current_frame(), Some(0));
        assert!(!image.texture().unwrap().needs_update());

        image.tick(start + Duration::from_millis(21));
        assert_eq!(image.texture().unwrap().current_frame(), Some(1));
        assert!(image.texture().unwrap().needs_update());
    }

    #[test]
    fn test_failed_decode_keeps_prior_display() {
        init_logging();
        let mut image = component("dog", fetcher());
        smol::block_on(image.update()).unwrap();

        image.set_src("broken");
        smol::block_on(image.update()).unwrap();
        settle(&mut image);

        assert!(image.texture().is_none());
        assert_eq!(image.host().material_source.as_deref(), Some("https://cdn.test/dog.png"));
    }

    #[test]
    fn test_failed_decode_keeps_playing_texture() {
        let mut image = component("cat", fetcher());
        smol::block_on(image.update()).unwrap();
        settle(&mut image);

        image.set_src("broken");
        smol::block_on(image.update()).unwrap();
        settle(&mut image);

        assert_eq!(image.texture().map(|t| t.frame_count()), Some(3));
    }

    #[test]
    fn test_network_failure_propagates() {
        let mut image = component("nowhere", fetcher());

        let result = smol::block_on(image.update());

        assert!(matches!(result, Err(LoadError::Resolve { .. })));
        assert!(image.host().material_source.is_none());
        assert!(!image.is_loading());
    }

    #[test]
    fn test_newer_load_supersedes_animation() {
        let mut image = component("cat", fetcher());
        smol::block_on(image.update()).unwrap();
        assert!(image.is_loading());

        image.set_src("dog");
        smol::block_on(image.update()).unwrap();

        // Give the superseded decode time to finish, then keep ticking
        thread::sleep(Duration::from_millis(100));
        for _ in 0..5 {
            image.tick(Instant::now());
        }

        assert!(image.texture().is_none());
        assert_eq!(image.host().material_source.as_deref(), Some("https://cdn.test/dog.png"));
    }

    #[test]
    fn test_remove_abandons_pending_load() {
        let mut image = component("cat", fetcher());
        smol::block_on(image.update()).unwrap();

        image.remove();
        thread::sleep(Duration::from_millis(100));
        image.tick(Instant::now());

        assert!(!image.is_loading());
        assert!(image.texture().is_none());
    }

    #[test]
    fn test_grab_reorients_when_enabled() {
        let billboard = BillboardFrame::new(Vec3::ZERO, Quat::from_rotation_y(0.5));

        let mut config = ImagePlusConfig::new("cat");
        config.reorient_on_grab = true;
        let mut image = ImagePlus::new(config, HeadlessHost::with_billboard(billboard), fetcher());

        // The viewer turned since the surface was placed
        image.host_mut().billboard.rotation = Quat::from_rotation_y(1.2);
        image.handle_event(LifecycleEvent::GrabStart);

        assert_eq!(image.host().body_rotation, Some(Quat::from_rotation_y(1.2)));
    }

    #[test]
    fn test_grab_ignored_by_default() {
        let mut image = component("cat", fetcher());
        image.handle_event(LifecycleEvent::GrabStart);
        assert_eq!(image.host().body_rotation, None);
    }
}

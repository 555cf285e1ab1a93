//! image-plus - remote image surfaces for 3D scenes
//!
//! Loads a remote image onto a scene object, sizes the surface to the image's
//! aspect ratio and plays animated GIFs back as a looping texture. GIF decoding
//! runs on a worker thread, frames are realized concurrently, and the host
//! drives playback by calling [`ImagePlus::tick`] once per render pass.

pub mod component;
pub mod config;
pub mod decoder;
pub mod error;
pub mod fetch;
pub mod fit;
pub mod texture;

pub use component::{BillboardFrame, HeadlessHost, ImagePlus, LifecycleEvent, SceneHost};
pub use config::ImagePlusConfig;
pub use error::{LoadError, Result};
pub use fetch::{HttpFetcher, MediaFetcher};
pub use fit::{fit, FitResult, Geometry, IntrinsicSize};
pub use texture::AnimatedTexture;

//! Component configuration.

use crate::error::ConfigError;
use glam::Vec3;
use serde::{Deserialize, Deserializer};
use std::path::Path;

/// Where the surface is placed, relative to the billboard reference frame
pub const DEFAULT_INITIAL_OFFSET: Vec3 = Vec3::new(0.0, 0.0, -1.5);

/// Media resolution service used when none is configured
pub const DEFAULT_MEDIA_ENDPOINT: &str = "https://smoke-dev.reticulum.io/api/v1/media";

/// Configuration of one image surface.
///
/// Deserializes from JSON with camelCase keys, e.g.
/// `{"src": "https://example.com/cat.gif", "initialOffset": {"x": 0, "y": 1, "z": -2}}`.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImagePlusConfig {
    /// Resource locator handed to the media service
    pub src: String,

    #[serde(default = "default_initial_offset", deserialize_with = "deserialize_point")]
    pub initial_offset: Vec3,

    /// Copy the viewer's orientation onto the body when grabbed
    #[serde(default)]
    pub reorient_on_grab: bool,

    #[serde(default = "default_media_endpoint")]
    pub media_endpoint: String,
}

impl ImagePlusConfig {
    pub fn new(src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            initial_offset: DEFAULT_INITIAL_OFFSET,
            reorient_on_grab: false,
            media_endpoint: default_media_endpoint(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        log::info!("Loading configuration from {:?}", path.as_ref());
        let json = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.src.trim().is_empty() {
            return Err(ConfigError::MissingSrc);
        }
        Ok(())
    }
}

#[derive(Deserialize)]
struct Point3 {
    #[serde(default)]
    x: f32,
    #[serde(default)]
    y: f32,
    #[serde(default)]
    z: f32,
}

fn deserialize_point<'de, D>(deserializer: D) -> Result<Vec3, D::Error>
where
    D: Deserializer<'de>,
{
    let Point3 { x, y, z } = Point3::deserialize(deserializer)?;
    Ok(Vec3::new(x, y, z))
}

fn default_initial_offset() -> Vec3 {
    DEFAULT_INITIAL_OFFSET
}

fn default_media_endpoint() -> String {
    DEFAULT_MEDIA_ENDPOINT.to_string()
}

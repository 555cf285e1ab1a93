//! Error types for image loading
//!
//! Every failure here is local to one load: the component logs or returns it
//! and the display keeps whatever it showed before.

use thiserror::Error;

/// Result type alias for load operations
pub type Result<T> = std::result::Result<T, LoadError>;

/// Top-level error for a single image load
#[derive(Error, Debug)]
pub enum LoadError {
    /// Transport failure or non-success HTTP status
    #[error("Network error loading '{url}': {reason}")]
    Network { url: String, reason: String },

    /// The media service answered, but not with a usable media URL
    #[error("Failed to resolve media for '{src}': {reason}")]
    Resolve { src: String, reason: String },

    /// The GIF worker reported failure
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// A decoded frame could not be turned into a drawable image
    #[error("Materialize error: {0}")]
    Materialize(#[from] MaterializeError),

    /// Invalid component configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Failures reported by the GIF decode worker
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Malformed GIF stream: {reason}")]
    Malformed { reason: String },

    #[error("GIF stream contains no frames")]
    Empty,

    #[error("Frame list mismatch: {frames} frames, {delays} delays, {disposals} disposals")]
    LengthMismatch {
        frames: usize,
        delays: usize,
        disposals: usize,
    },

    /// The worker thread went away without posting its response
    #[error("Decode worker exited without a response")]
    WorkerLost,
}

/// Failures while realizing decoded frames into drawable images
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MaterializeError {
    #[error("Frame {index}: pixel buffer of {len} bytes does not match {width}x{height} RGBA")]
    BufferSize {
        index: usize,
        len: usize,
        width: u32,
        height: u32,
    },

    #[error("Frame {index} was never realized")]
    Incomplete { index: usize },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required property 'src'")]
    MissingSrc,

    #[error("Invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
}

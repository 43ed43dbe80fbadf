//! Crate-level error types.

use std::fmt;

use crate::gpu::render_context::RenderContextError;
use crate::scene::{ModelId, PartKey};

/// Errors produced by the strata crate.
#[derive(Debug)]
pub enum StrataError {
    /// A model failed to decode, or the loader thread died before reaching
    /// it. Reported per model; sibling loads continue.
    LoadFailure {
        /// The model whose load failed.
        model: ModelId,
        /// Decoder-supplied reason.
        reason: String,
    },
    /// The 24-bit picking color space has no free entry left.
    PickColorsExhausted,
    /// An operation reached a container that is uninitialized or torn down:
    /// a model registered twice, or a load queued after loader shutdown.
    InvalidState(&'static str),
    /// A live part has no merged index range (composition invariant broken).
    MissingRange(PartKey),
    /// GPU context initialization failure.
    Gpu(RenderContextError),
    /// GPU pixel readback failed.
    Readback(String),
    /// WGSL composition failed.
    Shader(String),
    /// Generic I/O failure.
    Io(std::io::Error),
    /// Failed to spawn the loader thread.
    ThreadSpawn(std::io::Error),
    /// TOML options parsing/serialization failure.
    OptionsParse(String),
}

impl fmt::Display for StrataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LoadFailure { model, reason } => {
                write!(f, "failed to load {model}: {reason}")
            }
            Self::PickColorsExhausted => {
                write!(f, "picking color space exhausted")
            }
            Self::InvalidState(what) => write!(f, "invalid state: {what}"),
            Self::MissingRange(key) => {
                write!(f, "part {key:?} has no merged index range")
            }
            Self::Gpu(e) => write!(f, "GPU error: {e}"),
            Self::Readback(msg) => write!(f, "pick readback failed: {msg}"),
            Self::Shader(msg) => write!(f, "shader composition failed: {msg}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::ThreadSpawn(e) => {
                write!(f, "failed to spawn thread: {e}")
            }
            Self::OptionsParse(msg) => {
                write!(f, "options parse error: {msg}")
            }
        }
    }
}

impl std::error::Error for StrataError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Gpu(e) => Some(e),
            Self::Io(e) | Self::ThreadSpawn(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RenderContextError> for StrataError {
    fn from(e: RenderContextError) -> Self {
        Self::Gpu(e)
    }
}

impl From<std::io::Error> for StrataError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

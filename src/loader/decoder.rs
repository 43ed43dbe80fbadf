use glam::Mat4;

use crate::scene::{Appearance, Geometry};

/// Raw bytes of one model file plus the metadata the host knows about it.
#[derive(Debug, Clone)]
pub struct ModelSource {
    /// Globally unique id of the source file.
    pub guid: String,
    /// Display name.
    pub name: String,
    /// Undecoded file contents.
    pub data: Vec<u8>,
}

/// One decoded primitive, in model space.
#[derive(Debug, Clone)]
pub struct DecodedPart {
    /// Local part name; need not be unique.
    pub name: String,
    /// Model-space geometry.
    pub geometry: Geometry,
    /// Base appearance from the file.
    pub appearance: Appearance,
    /// Model-to-world transform.
    pub transform: Mat4,
}

/// Output of a decoder for one file.
#[derive(Debug, Clone, Default)]
pub struct DecodedModel {
    /// Every primitive in the file.
    pub parts: Vec<DecodedPart>,
}

/// File-format decoder run on the loader thread.
///
/// Any `FnMut(&ModelSource) -> Result<DecodedModel, String>` closure that
/// can be sent to another thread is a decoder.
pub trait ModelDecoder: Send + 'static {
    /// Decode one file. The error string becomes the `LoadFailure` reason.
    ///
    /// # Errors
    ///
    /// Returns a human-readable reason when the file cannot be decoded.
    fn decode(&mut self, source: &ModelSource) -> Result<DecodedModel, String>;
}

impl<F> ModelDecoder for F
where
    F: FnMut(&ModelSource) -> Result<DecodedModel, String> + Send + 'static,
{
    fn decode(&mut self, source: &ModelSource) -> Result<DecodedModel, String> {
        self(source)
    }
}

//! Asynchronous, strictly serialized model loading.

mod decoder;
mod queue;

pub use decoder::{DecodedModel, DecodedPart, ModelDecoder, ModelSource};
pub use queue::{LoadQueue, LoadResult, PreparedModel};

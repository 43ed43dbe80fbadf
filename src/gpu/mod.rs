//! GPU resource management.
//!
//! Headless wgpu device setup, growable buffers, shader composition, the
//! GPU mirrors of the merged geometry and the preview proxies, and the
//! offscreen pick target.

/// Growable GPU buffers with automatic reallocation.
pub mod dynamic_buffer;
/// Upload of merged batches and their color patches.
pub mod merged_upload;
/// 1×1 offscreen pick target.
pub mod pick_target;
/// Upload of the fast-preview proxies.
pub mod preview_upload;
/// Shared wgpu boilerplate for the mesh and picking pipelines.
pub mod pipeline_helpers;
/// wgpu device and queue initialization.
pub mod render_context;
/// WGSL shader composition with `#import` support via naga-oil.
pub mod shader_composer;

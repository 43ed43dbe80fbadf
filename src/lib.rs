// -- Lint policy ---------------------------------------------------------
// This is the single source of truth for crate-wide lints.

// Broad lint groups
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
// Documentation
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::bare_urls)]
// No panicking in library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
// No debug/print artifacts
#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
// Import hygiene
#![deny(clippy::wildcard_imports)]
// Complexity limits (thresholds in clippy.toml)
#![deny(clippy::cognitive_complexity)]
#![deny(clippy::too_many_lines)]
#![deny(clippy::excessive_nesting)]
// Function signature hygiene
#![deny(clippy::too_many_arguments)]
#![deny(clippy::fn_params_excessive_bools)]
// Clone / pass-by-value hygiene
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::implicit_clone)]
// String hygiene
#![deny(clippy::inefficient_to_string)]
#![deny(clippy::redundant_closure_for_method_calls)]
#![deny(clippy::manual_string_new)]
#![deny(clippy::str_to_string)]
// Cargo lints (warn, not deny since cargo lints can be noisy)
#![warn(clippy::cargo)]
// Unused / redundant code
#![deny(unused_results)]
#![deny(unused_qualifications)]
// Cast hygiene
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]

//! Scene composition and GPU picking for large static building models.
//!
//! Strata keeps thousands of independently addressable parts drawable as a
//! handful of merged batches, re-encodes per-part state (selection,
//! isolation, highlight, custom colors, visibility) in place, and resolves
//! screen pixels back to parts through a color-coded 1×1 offscreen pass.
//!
//! # Key entry points
//!
//! - [`engine::Viewer`] - the facade owning registry, state, merged
//!   geometry, picking scene, preview proxies and the loader
//! - [`engine::ViewerCommand`] - the state-mutation vocabulary
//! - [`options::Options`] - runtime configuration (display, interaction,
//!   merge, preview)
//! - [`loader::ModelDecoder`] - the hook turning raw model bytes into parts
//! - [`picking::PickTarget`] - the offscreen surface a pick renders into
//!
//! # Architecture
//!
//! Models are decoded on a background [`loader::LoadQueue`] thread, which
//! also bakes transforms and computes the per-model preview proxy. The
//! caller's thread folds finished loads in with [`engine::Viewer::poll`],
//! registers parts, builds merged batches and tags every part with a pick
//! color. State commands only mark parts dirty; the merged color bytes of
//! exactly those parts are rewritten and the GPU mirror
//! ([`gpu::merged_upload::GpuMergedScene`]) uploads just those ranges.

pub mod camera;
pub mod engine;
pub mod error;
pub mod gpu;
pub mod input;
pub mod loader;
pub mod merge;
pub mod options;
pub mod picking;
pub mod preview;
pub mod scene;
pub mod state;

pub use engine::{Outcome, Viewer, ViewerCommand, ViewerEvent};
pub use error::StrataError;
pub use options::Options;

//! Pointer interpretation: drag detection, second-trigger disambiguation
//! and hover debouncing.
//!
//! All timing is deadline based. Callers pass the current instant with
//! every event and poll pending deadlines from their frame loop.

/// Modifier-key state.
pub mod event;
/// Debounced hover picking.
pub mod hover;
/// Single versus second trigger resolution.
pub mod trigger;

pub use event::Modifiers;
pub use hover::HoverDebouncer;
pub use trigger::{TriggerAction, TriggerResolver};

//! Interactive element picking
//!
//! - [`synthesizer`] turns a picked element into a selector
//! - [`highlight`] scopes the hover highlight
//! - [`session`] is the pointer-driven state machine tying them together

pub mod highlight;
pub mod session;
pub mod synthesizer;

pub use highlight::{HighlightStyle, StyleOverride};
pub use session::{EventOutcome, PickListener, PickMode, PickingSession, SessionState};
pub use synthesizer::{synthesize, synthesize_absolute, synthesize_relative};

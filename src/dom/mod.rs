//! Document model used by the picker
//!
//! The synthesizer and the picking session only see the capability traits in
//! [`handle`]; [`page`] provides the concrete HTML-backed implementation.

pub mod handle;
pub mod page;
pub mod source;

pub use handle::{DocumentHandle, ElementHandle, EventKind};
pub use page::{Page, PageElement};
pub use source::load_html;

//! Page context: the isolated side that owns the document
//!
//! The UI side only ever talks to it through [`client::ContextTransport`].

pub mod client;
pub mod messages;
pub mod page_context;

pub use client::{spawn_page_context, ContextClient, ContextTransport};
pub use messages::{PointerInput, PointerKind, PointerReply, Push, Request, Response};
pub use page_context::PageContext;

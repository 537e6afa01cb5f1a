//! Inspector Web UI Module
//!
//! Serves the picker UI over HTTP:
//! - Form editing with persisted state
//! - Point-and-click picks through pointer input
//! - Parsing and result preview
//! - CSV/JSON/Excel downloads

pub mod api;
pub mod server;

pub use server::{InspectorConfig, InspectorServer};

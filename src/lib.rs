pub mod context;
pub mod controller;
pub mod dom;
pub mod error;
pub mod export;
pub mod extractor;
pub mod inspector;
pub mod picker;
pub mod utils;

// Re-export common items
pub use context::spawn_page_context;
pub use error::{PickerError, Result};
pub use extractor::extract;
pub use picker::synthesize;

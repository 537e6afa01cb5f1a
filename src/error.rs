use thiserror::Error;

/// Errors surfaced by the picker, the extractor and the page-context RPC layer
#[derive(Debug, Error)]
pub enum PickerError {
    /// The base selector matched nothing on the page
    #[error("No elements found with the base selector")]
    NoBaseMatch,

    /// A selector string could not be parsed
    #[error("Invalid selector '{selector}': {message}")]
    SelectorSyntax { selector: String, message: String },

    /// The page context did not answer (closed, navigated away, or timed out)
    #[error("Page context unreachable: {0}")]
    ContextUnreachable(String),

    /// The user submitted without the required inputs
    #[error("{0}")]
    MissingInput(String),

    /// A pointer event named a target that is not on the page
    #[error("No element found for pointer target '{0}'")]
    NoTarget(String),

    /// An error message reported back by the page context
    #[error("{0}")]
    Page(String),

    #[error("Unknown export format: {0}")]
    UnknownFormat(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to fetch page: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error("CSV writer failed: {0}")]
    Csv(#[from] csv::Error),
}

impl PickerError {
    pub fn selector_syntax(selector: &str, message: impl ToString) -> Self {
        PickerError::SelectorSyntax {
            selector: selector.to_string(),
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PickerError>;

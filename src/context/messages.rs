//! Message contract between the UI side and the page context

use serde::{Deserialize, Serialize};

use crate::dom::EventKind;
use crate::error::PickerError;
use crate::extractor::{Field, Record, ResultSet};
use crate::picker::EventOutcome;

/// Requests the UI sends to the page context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Request {
    #[serde(rename_all = "camelCase")]
    ParseData {
        base_selector: String,
        fields: Vec<Field>,
    },
    #[serde(rename_all = "camelCase")]
    StartPicking {
        #[serde(default)]
        base_selector: Option<String>,
    },
    StopPicking,
}

/// Page context replies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    Parsed {
        success: bool,
        count: usize,
        data: Vec<Record>,
    },
    Error {
        error: String,
    },
    Status {
        status: String,
    },
}

impl Response {
    pub fn parsed(results: ResultSet) -> Self {
        Response::Parsed {
            success: true,
            count: results.count(),
            data: results.into_records(),
        }
    }

    pub fn error(error: &PickerError) -> Self {
        Response::Error {
            error: error.to_string(),
        }
    }

    pub fn status(status: &str) -> Self {
        Response::Status {
            status: status.to_string(),
        }
    }
}

/// Pushed unsolicited from the page context when a pick completes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Push {
    ElementSelected { selector: String },
}

/// Pointer input delivered to the page, targeting the first match of `target`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointerInput {
    pub kind: PointerKind,
    pub target: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PointerKind {
    PointerEnter,
    PointerLeave,
    Click,
}

impl From<PointerKind> for EventKind {
    fn from(kind: PointerKind) -> Self {
        match kind {
            PointerKind::PointerEnter => EventKind::PointerEnter,
            PointerKind::PointerLeave => EventKind::PointerLeave,
            PointerKind::Click => EventKind::Click,
        }
    }
}

/// Reply to a pointer input
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PointerReply {
    Handled(EventOutcome),
    Error { error: String },
}

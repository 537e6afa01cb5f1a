use crate::error::Result;
use std::fmt::Debug;

/// Pointer events the picker listens for on the document (capture phase)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventKind {
    PointerEnter,
    PointerLeave,
    Click,
}

impl EventKind {
    pub const ALL: [EventKind; 3] = [
        EventKind::PointerEnter,
        EventKind::PointerLeave,
        EventKind::Click,
    ];
}

/// Element capability used by the selector synthesizer and the picking session
///
/// Implementations decide how the tree is stored. Two handles compare equal when
/// they refer to the same node of the same document.
pub trait ElementHandle: Clone + PartialEq + Debug {
    /// Lowercase tag name
    fn tag_name(&self) -> String;

    /// Raw attribute value, if present
    fn attribute(&self, name: &str) -> Option<String>;

    /// Parent element (None at the root element)
    fn parent(&self) -> Option<Self>;

    /// Element children in document order
    fn children(&self) -> Vec<Self>;

    /// Concatenated text content (untrimmed)
    fn text(&self) -> String;

    /// Serialized outer HTML
    fn outer_html(&self) -> String;

    /// All descendants matching `selector`, in document order
    fn query_all(&self, selector: &str) -> Result<Vec<Self>>;

    /// Whether this element matches `selector`
    fn matches(&self, selector: &str) -> Result<bool>;

    /// Inline style property value, None when unset
    fn style_prop(&self, name: &str) -> Option<String>;

    /// Set an inline style property; `None` removes it
    fn set_style_prop(&self, name: &str, value: Option<&str>);

    /// Non-empty id attribute
    fn id(&self) -> Option<String> {
        self.attribute("id").filter(|id| !id.is_empty())
    }

    /// Class list split on whitespace, empty fragments dropped
    fn class_list(&self) -> Vec<String> {
        self.attribute("class")
            .map(|classes| classes.split_whitespace().map(String::from).collect())
            .unwrap_or_default()
    }

    fn query_first(&self, selector: &str) -> Result<Option<Self>> {
        Ok(self.query_all(selector)?.into_iter().next())
    }

    /// Nearest inclusive ancestor matching `selector`
    fn closest(&self, selector: &str) -> Result<Option<Self>> {
        let mut current = Some(self.clone());
        while let Some(element) = current {
            if element.matches(selector)? {
                return Ok(Some(element));
            }
            current = element.parent();
        }
        Ok(None)
    }

    fn is_body(&self) -> bool {
        self.tag_name() == "body"
    }
}

/// Document capability: whole-page queries plus the capture listener registry
pub trait DocumentHandle {
    type Element: ElementHandle;

    /// All elements matching `selector` in document order
    fn query_all(&self, selector: &str) -> Result<Vec<Self::Element>>;

    /// The top-level body container
    fn body(&self) -> Option<Self::Element>;

    /// Register a capture-phase listener. Registering the same kind twice is a no-op.
    fn add_capture_listener(&self, kind: EventKind);

    fn remove_capture_listener(&self, kind: EventKind);

    fn has_listener(&self, kind: EventKind) -> bool;

    fn listener_count(&self) -> usize;

    fn query_first(&self, selector: &str) -> Result<Option<Self::Element>> {
        Ok(self.query_all(selector)?.into_iter().next())
    }
}

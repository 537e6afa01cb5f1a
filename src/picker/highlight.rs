use crate::dom::ElementHandle;

const BORDER: &str = "border";
const OUTLINE: &str = "outline";

/// Inline style applied to the hovered element
#[derive(Debug, Clone, PartialEq)]
pub struct HighlightStyle {
    pub border: String,
    pub outline: String,
}

impl Default for HighlightStyle {
    fn default() -> Self {
        Self {
            border: "2px solid #ff0000".to_string(),
            outline: "1px solid #ff0000".to_string(),
        }
    }
}

/// Scoped highlight on one element
///
/// Acquiring snapshots the element's inline `border`/`outline` and applies the
/// highlight. The snapshot is written back by [`StyleOverride::release`] or on
/// drop, whichever comes first.
#[derive(Debug)]
pub struct StyleOverride<E: ElementHandle> {
    element: E,
    saved_border: Option<String>,
    saved_outline: Option<String>,
    released: bool,
}

impl<E: ElementHandle> StyleOverride<E> {
    pub fn acquire(element: E, style: &HighlightStyle) -> Self {
        let saved_border = element.style_prop(BORDER);
        let saved_outline = element.style_prop(OUTLINE);

        element.set_style_prop(BORDER, Some(&style.border));
        element.set_style_prop(OUTLINE, Some(&style.outline));

        Self {
            element,
            saved_border,
            saved_outline,
            released: false,
        }
    }

    pub fn element(&self) -> &E {
        &self.element
    }

    /// Restore the snapshot
    pub fn release(mut self) {
        self.restore();
    }

    fn restore(&mut self) {
        if self.released {
            return;
        }
        self.element
            .set_style_prop(BORDER, self.saved_border.as_deref());
        self.element
            .set_style_prop(OUTLINE, self.saved_outline.as_deref());
        self.released = true;
    }
}

impl<E: ElementHandle> Drop for StyleOverride<E> {
    fn drop(&mut self) {
        self.restore();
    }
}

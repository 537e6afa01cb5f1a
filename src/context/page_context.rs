//! Page-side request handling
//!
//! `PageContext` owns the page and at most one picking session. The session is
//! created on the first `startPicking` and reused afterwards, so a repeated
//! start rebinds the existing session instead of stacking listeners.

use log::{debug, info, warn};
use tokio::sync::mpsc;

use super::messages::{PointerInput, PointerReply, Push, Request, Response};
use crate::dom::{DocumentHandle, Page};
use crate::error::{PickerError, Result};
use crate::extractor::extract;
use crate::picker::{EventOutcome, HighlightStyle, PickListener, PickMode, PickingSession};

/// Forwards completed picks to the UI side as `elementSelected` pushes
pub struct PushSink {
    sender: mpsc::UnboundedSender<Push>,
}

impl PickListener for PushSink {
    fn element_selected(&mut self, selector: &str) {
        let push = Push::ElementSelected {
            selector: selector.to_string(),
        };
        if self.sender.send(push).is_err() {
            warn!("UI context is gone, dropping selection {}", selector);
        }
    }
}

pub struct PageContext {
    page: Page,
    pushes: mpsc::UnboundedSender<Push>,
    highlight: HighlightStyle,
    picker: Option<PickingSession<Page, PushSink>>,
}

impl PageContext {
    pub fn new(page: Page, pushes: mpsc::UnboundedSender<Push>, highlight: HighlightStyle) -> Self {
        Self {
            page,
            pushes,
            highlight,
            picker: None,
        }
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn picker(&self) -> Option<&PickingSession<Page, PushSink>> {
        self.picker.as_ref()
    }

    /// Existing session, or a new one on first use
    fn install_picker(&mut self) -> &mut PickingSession<Page, PushSink> {
        if self.picker.is_none() {
            debug!("Installing element picker");
        }
        self.picker.get_or_insert_with(|| {
            PickingSession::new(
                self.page.clone(),
                PushSink {
                    sender: self.pushes.clone(),
                },
                self.highlight.clone(),
            )
        })
    }

    /// Handle one request. Failures become `{error}` replies.
    pub fn handle_request(&mut self, request: Request) -> Response {
        match request {
            Request::ParseData {
                base_selector,
                fields,
            } => match extract(&self.page, &base_selector, &fields) {
                Ok(results) => {
                    info!("Extracted {} records for '{}'", results.count(), base_selector);
                    Response::parsed(results)
                }
                Err(e) => {
                    warn!("Extraction failed: {}", e);
                    Response::error(&e)
                }
            },
            Request::StartPicking { base_selector } => {
                let base_selector = base_selector.filter(|base| !base.trim().is_empty());
                let mode = PickMode::for_base_context(base_selector.as_deref());
                self.install_picker().start(mode, base_selector);
                Response::status("started")
            }
            Request::StopPicking => {
                if let Some(picker) = self.picker.as_mut() {
                    picker.stop();
                }
                Response::status("stopped")
            }
        }
    }

    /// Deliver pointer input to the first element matching its target
    pub fn handle_pointer(&mut self, input: &PointerInput) -> Result<EventOutcome> {
        let target = self
            .page
            .query_first(&input.target)?
            .ok_or_else(|| PickerError::NoTarget(input.target.clone()))?;

        match self.picker.as_mut() {
            Some(picker) => picker.handle_event(input.kind.into(), &target),
            None => Ok(EventOutcome::passthrough()),
        }
    }

    pub fn pointer_reply(&mut self, input: &PointerInput) -> PointerReply {
        match self.handle_pointer(input) {
            Ok(outcome) => PointerReply::Handled(outcome),
            Err(e) => PointerReply::Error {
                error: e.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::messages::PointerKind;
    use crate::dom::ElementHandle;
    use crate::extractor::Field;

    const HTML: &str = r#"
        <html><body>
            <div class="product"><span class="title">Lamp</span><span class="price">$10</span></div>
            <div class="product"><span class="title">Chair</span></div>
        </body></html>
    "#;

    fn context() -> (PageContext, mpsc::UnboundedReceiver<Push>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            PageContext::new(Page::parse(HTML), sender, HighlightStyle::default()),
            receiver,
        )
    }

    fn pointer(kind: PointerKind, target: &str) -> PointerInput {
        PointerInput {
            kind,
            target: target.to_string(),
        }
    }

    #[test]
    fn test_parse_data_end_to_end() {
        let (mut context, _pushes) = context();
        let response = context.handle_request(Request::ParseData {
            base_selector: ".product".into(),
            fields: vec![Field::new("title", ".title"), Field::new("price", ".price")],
        });

        match response {
            Response::Parsed {
                success,
                count,
                data,
            } => {
                assert!(success);
                assert_eq!(count, 2);
                assert_eq!(data[1]["title"], "Chair");
                assert_eq!(data[1]["price"], "");
            }
            other => panic!("unexpected response {:?}", other),
        }
    }

    #[test]
    fn test_parse_errors_become_error_replies() {
        let (mut context, _pushes) = context();
        let response = context.handle_request(Request::ParseData {
            base_selector: ".nothing".into(),
            fields: vec![Field::new("title", ".title")],
        });
        assert_eq!(
            response,
            Response::Error {
                error: "No elements found with the base selector".into()
            }
        );

        let response = context.handle_request(Request::ParseData {
            base_selector: "][".into(),
            fields: vec![],
        });
        assert!(matches!(response, Response::Error { .. }));
    }

    #[test]
    fn test_picker_is_installed_once() {
        let (mut context, mut pushes) = context();
        assert!(context.picker().is_none());

        context.handle_request(Request::StartPicking {
            base_selector: Some(".product".into()),
        });
        context.handle_request(Request::StartPicking {
            base_selector: Some(".product".into()),
        });
        assert_eq!(context.page().listener_count(), 3);

        let outcome = context
            .handle_pointer(&pointer(PointerKind::Click, ".price"))
            .unwrap();
        assert!(outcome.default_prevented);
        assert_eq!(
            pushes.try_recv().unwrap(),
            Push::ElementSelected {
                selector: ".price".into()
            }
        );
        assert!(pushes.try_recv().is_err());
        assert_eq!(context.page().listener_count(), 0);
    }

    #[test]
    fn test_stop_before_any_start() {
        let (mut context, _pushes) = context();
        assert_eq!(
            context.handle_request(Request::StopPicking),
            Response::status("stopped")
        );
        assert!(context.picker().is_none());
    }

    #[test]
    fn test_pointer_without_picker_passes_through() {
        let (mut context, _pushes) = context();
        let outcome = context
            .handle_pointer(&pointer(PointerKind::Click, ".title"))
            .unwrap();
        assert_eq!(outcome, EventOutcome::passthrough());
    }

    #[test]
    fn test_pointer_target_missing() {
        let (mut context, _pushes) = context();
        let reply = context.pointer_reply(&pointer(PointerKind::PointerEnter, "#ghost"));
        assert_eq!(
            reply,
            PointerReply::Error {
                error: "No element found for pointer target '#ghost'".into()
            }
        );
    }

    #[test]
    fn test_stop_picking_restores_highlight() {
        let (mut context, _pushes) = context();
        context.handle_request(Request::StartPicking {
            base_selector: None,
        });
        context
            .handle_pointer(&pointer(PointerKind::PointerEnter, ".title"))
            .unwrap();
        let title = context.page().query_first(".title").unwrap().unwrap();
        assert!(title.style_prop("border").is_some());

        context.handle_request(Request::StopPicking);
        assert_eq!(title.attribute("style"), None);
    }
}

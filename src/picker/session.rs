//! Picking session state machine
//!
//! `Idle -> Active(mode, base_context) -> Idle`. While active, the session owns
//! the document's capture listeners, highlights the hovered element and turns
//! the next click into a synthesized selector.

use log::{debug, info, warn};
use serde::Serialize;
use std::fmt;

use super::highlight::{HighlightStyle, StyleOverride};
use super::synthesizer::synthesize;
use crate::dom::{DocumentHandle, ElementHandle, EventKind};
use crate::error::Result;

const CURSOR: &str = "cursor";
const CURSOR_ACTIVE: &str = "crosshair";
const CURSOR_IDLE: &str = "default";

/// What the user is picking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PickMode {
    Base,
    Field,
}

impl PickMode {
    /// Base picks carry no base context; field picks do
    pub fn for_base_context(base_context: Option<&str>) -> Self {
        match base_context {
            Some(base) if !base.trim().is_empty() => PickMode::Field,
            _ => PickMode::Base,
        }
    }
}

impl fmt::Display for PickMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PickMode::Base => write!(f, "base"),
            PickMode::Field => write!(f, "field"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Idle,
    Active {
        mode: PickMode,
        base_context: Option<String>,
    },
}

/// How a dispatched pointer event was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventOutcome {
    /// Whether the event reached page-level handlers
    pub propagated: bool,
    pub default_prevented: bool,
}

impl EventOutcome {
    pub fn passthrough() -> Self {
        Self {
            propagated: true,
            default_prevented: false,
        }
    }

    fn stopped() -> Self {
        Self {
            propagated: false,
            default_prevented: false,
        }
    }

    fn cancelled() -> Self {
        Self {
            propagated: false,
            default_prevented: true,
        }
    }
}

/// Receiver of completed picks
pub trait PickListener {
    fn element_selected(&mut self, selector: &str);
}

pub struct PickingSession<D: DocumentHandle, L: PickListener> {
    document: D,
    listener: L,
    highlight: HighlightStyle,
    state: SessionState,
    hovered: Option<StyleOverride<D::Element>>,
}

impl<D: DocumentHandle, L: PickListener> PickingSession<D, L> {
    pub fn new(document: D, listener: L, highlight: HighlightStyle) -> Self {
        Self {
            document,
            listener,
            highlight,
            state: SessionState::Idle,
            hovered: None,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, SessionState::Active { .. })
    }

    /// Currently highlighted element
    pub fn hovered(&self) -> Option<&D::Element> {
        self.hovered.as_ref().map(StyleOverride::element)
    }

    pub fn listener(&self) -> &L {
        &self.listener
    }

    /// Arm the session. Starting an active session rebinds mode and base context.
    pub fn start(&mut self, mode: PickMode, base_context: Option<String>) {
        let rearm = self.is_active();
        self.state = SessionState::Active {
            mode,
            base_context: base_context.clone(),
        };

        if let Some(body) = self.document.body() {
            body.set_style_prop(CURSOR, Some(CURSOR_ACTIVE));
        }
        for kind in EventKind::ALL {
            self.document.add_capture_listener(kind);
        }

        if rearm {
            info!("Element picker re-armed for {} element", mode);
        } else {
            info!("Element picker enabled for {} element", mode);
        }
        if let Some(base) = base_context {
            debug!("Base context: {}", base);
        }
    }

    /// Disarm the session and restore any highlight. No-op when idle.
    pub fn stop(&mut self) {
        if !self.is_active() && self.hovered.is_none() {
            return;
        }

        for kind in EventKind::ALL {
            self.document.remove_capture_listener(kind);
        }
        if let Some(body) = self.document.body() {
            body.set_style_prop(CURSOR, Some(CURSOR_IDLE));
        }
        if let Some(guard) = self.hovered.take() {
            guard.release();
        }
        self.state = SessionState::Idle;

        info!("Element picker disabled");
    }

    /// Dispatch a pointer event targeted at `target`
    ///
    /// A click completes the pick: the selector is sent to the listener and the
    /// session returns to idle. If synthesis fails the session still stops and
    /// the error is returned instead of a selection.
    pub fn handle_event(&mut self, kind: EventKind, target: &D::Element) -> Result<EventOutcome> {
        if !self.is_active() || !self.document.has_listener(kind) {
            return Ok(EventOutcome::passthrough());
        }

        match kind {
            EventKind::PointerEnter => {
                self.highlight_element(target);
                Ok(EventOutcome::stopped())
            }
            EventKind::PointerLeave => {
                if self.hovered() == Some(target) {
                    if let Some(guard) = self.hovered.take() {
                        guard.release();
                    }
                }
                Ok(EventOutcome::stopped())
            }
            EventKind::Click => {
                self.pick(target)?;
                Ok(EventOutcome::cancelled())
            }
        }
    }

    fn highlight_element(&mut self, target: &D::Element) {
        if self.hovered() == Some(target) {
            return;
        }
        if let Some(previous) = self.hovered.take() {
            previous.release();
        }
        self.hovered = Some(StyleOverride::acquire(target.clone(), &self.highlight));
    }

    fn pick(&mut self, target: &D::Element) -> Result<String> {
        let (mode, base_context) = match &self.state {
            SessionState::Active { mode, base_context } => (*mode, base_context.clone()),
            SessionState::Idle => (PickMode::Base, None),
        };

        match synthesize(&self.document, target, base_context.as_deref()) {
            Ok(selector) => {
                info!("{} element picked: {}", mode, selector);
                debug!("Element text: {}", target.text().trim());
                debug!("Element HTML: {}", target.outer_html());
                if let Some(base) = &base_context {
                    debug!("Base selector: {}", base);
                }
                self.listener.element_selected(&selector);
                self.stop();
                Ok(selector)
            }
            Err(e) => {
                warn!("Failed to synthesize selector: {}", e);
                self.stop();
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{Page, PageElement};
    use crate::error::PickerError;

    impl PickListener for Vec<String> {
        fn element_selected(&mut self, selector: &str) {
            self.push(selector.to_string());
        }
    }

    const HTML: &str = r#"
        <html><body>
            <div class="item"><a class="link">one</a><span>1</span><span>2</span></div>
            <div class="item"><a class="link" style="border: 3px double black">two</a></div>
        </body></html>
    "#;

    fn session(page: &Page) -> PickingSession<Page, Vec<String>> {
        PickingSession::new(page.clone(), Vec::new(), HighlightStyle::default())
    }

    fn find(page: &Page, selector: &str) -> PageElement {
        page.query_first(selector).unwrap().unwrap()
    }

    #[test]
    fn test_start_attaches_listeners_and_cursor() {
        let page = Page::parse(HTML);
        let mut session = session(&page);
        session.start(PickMode::Base, None);

        assert!(session.is_active());
        assert_eq!(page.listener_count(), 3);
        let body = page.body().unwrap();
        assert_eq!(body.style_prop("cursor").as_deref(), Some("crosshair"));
    }

    #[test]
    fn test_events_while_idle_pass_through() {
        let page = Page::parse(HTML);
        let mut session = session(&page);
        let link = find(&page, "a");

        let outcome = session.handle_event(EventKind::Click, &link).unwrap();
        assert_eq!(outcome, EventOutcome::passthrough());
        assert!(session.listener().is_empty());
    }

    #[test]
    fn test_hover_highlights_and_leave_restores() {
        let page = Page::parse(HTML);
        let mut session = session(&page);
        session.start(PickMode::Base, None);
        let links = page.query_all("a").unwrap();

        let outcome = session.handle_event(EventKind::PointerEnter, &links[1]).unwrap();
        assert!(!outcome.propagated);
        assert_eq!(
            links[1].style_prop("border").as_deref(),
            Some("2px solid #ff0000")
        );

        // leaving some other node leaves the highlight in place
        session.handle_event(EventKind::PointerLeave, &links[0]).unwrap();
        assert_eq!(session.hovered(), Some(&links[1]));

        session.handle_event(EventKind::PointerLeave, &links[1]).unwrap();
        assert_eq!(session.hovered(), None);
        assert_eq!(
            links[1].style_prop("border").as_deref(),
            Some("3px double black")
        );
        assert_eq!(links[1].style_prop("outline"), None);
    }

    #[test]
    fn test_only_one_node_highlighted() {
        let page = Page::parse(HTML);
        let mut session = session(&page);
        session.start(PickMode::Base, None);
        let links = page.query_all("a").unwrap();

        session.handle_event(EventKind::PointerEnter, &links[0]).unwrap();
        session.handle_event(EventKind::PointerEnter, &links[1]).unwrap();

        assert_eq!(links[0].attribute("style"), None);
        assert_eq!(session.hovered(), Some(&links[1]));
    }

    #[test]
    fn test_click_emits_selector_and_stops() {
        let page = Page::parse(HTML);
        let mut session = session(&page);
        session.start(PickMode::Field, Some(".item".to_string()));
        let second_span = page.query_all("span").unwrap()[1].clone();

        session
            .handle_event(EventKind::PointerEnter, &second_span)
            .unwrap();
        let outcome = session.handle_event(EventKind::Click, &second_span).unwrap();

        assert!(outcome.default_prevented);
        assert!(!outcome.propagated);
        assert_eq!(session.listener(), &vec!["span:nth-of-type(2)".to_string()]);
        assert_eq!(session.state(), &SessionState::Idle);
        assert_eq!(page.listener_count(), 0);
        assert_eq!(second_span.attribute("style"), None);
        assert_eq!(
            page.body().unwrap().style_prop("cursor").as_deref(),
            Some("default")
        );
    }

    #[test]
    fn test_restart_rebinds_without_duplicate_listeners() {
        let page = Page::parse(HTML);
        let mut session = session(&page);
        session.start(PickMode::Field, Some(".item".to_string()));
        session.start(PickMode::Base, None);

        assert_eq!(page.listener_count(), 3);
        assert_eq!(
            session.state(),
            &SessionState::Active {
                mode: PickMode::Base,
                base_context: None
            }
        );

        let link = find(&page, "a");
        session.handle_event(EventKind::Click, &link).unwrap();
        // a second delivery of the same click finds no listener
        let outcome = session.handle_event(EventKind::Click, &link).unwrap();

        assert_eq!(outcome, EventOutcome::passthrough());
        assert_eq!(session.listener().len(), 1);
        assert_eq!(session.listener()[0], "div:nth-child(1) > a:nth-child(1)");
    }

    #[test]
    fn test_stop_is_idempotent() {
        let page = Page::parse(HTML);
        let mut session = session(&page);
        session.stop();
        assert_eq!(session.state(), &SessionState::Idle);

        session.start(PickMode::Base, None);
        let link = find(&page, "a");
        session.handle_event(EventKind::PointerEnter, &link).unwrap();
        session.stop();
        session.stop();

        assert_eq!(page.listener_count(), 0);
        assert_eq!(link.attribute("style"), None);
    }

    #[test]
    fn test_failed_synthesis_stops_without_emitting() {
        let page = Page::parse(HTML);
        let mut session = session(&page);
        session.start(PickMode::Field, Some("div[".to_string()));
        let link = find(&page, "a");
        session.handle_event(EventKind::PointerEnter, &link).unwrap();

        let err = session.handle_event(EventKind::Click, &link).unwrap_err();
        assert!(matches!(err, PickerError::SelectorSyntax { .. }));
        assert!(session.listener().is_empty());
        assert!(!session.is_active());
        assert_eq!(link.attribute("style"), None);
    }

    #[test]
    fn test_pick_mode_from_base_context() {
        assert_eq!(PickMode::for_base_context(None), PickMode::Base);
        assert_eq!(PickMode::for_base_context(Some(" ")), PickMode::Base);
        assert_eq!(PickMode::for_base_context(Some(".item")), PickMode::Field);
    }
}

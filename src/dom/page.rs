//! In-memory page backed by `scraper`
//!
//! The parsed tree is immutable; inline style edits and the capture listener
//! registry are kept in side tables keyed by node id so the picker can mutate
//! presentation without touching the parsed markup.

use ego_tree::NodeId;
use scraper::{ElementRef, Html, Selector};
use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::rc::Rc;

use super::handle::{DocumentHandle, ElementHandle, EventKind};
use crate::error::{PickerError, Result};

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| PickerError::selector_syntax(selector, e))
}

/// Parsed `style` attribute, declaration order preserved
#[derive(Debug, Clone, Default, PartialEq)]
struct InlineStyle {
    props: Vec<(String, String)>,
}

impl InlineStyle {
    fn parse(attr: &str) -> Self {
        let props = split_declarations(attr)
            .into_iter()
            .filter_map(|decl| {
                let (name, value) = decl.split_once(':')?;
                let name = name.trim().to_ascii_lowercase();
                let value = value.trim();
                if name.is_empty() || value.is_empty() {
                    None
                } else {
                    Some((name, value.to_string()))
                }
            })
            .collect();
        Self { props }
    }

    fn get(&self, name: &str) -> Option<&str> {
        self.props
            .iter()
            .find(|(prop, _)| prop == name)
            .map(|(_, value)| value.as_str())
    }

    fn set(&mut self, name: &str, value: Option<&str>) {
        let name = name.to_ascii_lowercase();
        match value.map(str::trim).filter(|v| !v.is_empty()) {
            Some(value) => {
                if let Some(slot) = self.props.iter_mut().find(|(prop, _)| *prop == name) {
                    slot.1 = value.to_string();
                } else {
                    self.props.push((name, value.to_string()));
                }
            }
            None => self.props.retain(|(prop, _)| *prop != name),
        }
    }

    fn to_css(&self) -> Option<String> {
        if self.props.is_empty() {
            return None;
        }
        Some(
            self.props
                .iter()
                .map(|(name, value)| format!("{}: {};", name, value))
                .collect::<Vec<_>>()
                .join(" "),
        )
    }
}

/// Split on `;` outside quoted strings, parentheses and escapes
fn split_declarations(attr: &str) -> Vec<&str> {
    let mut declarations = Vec::new();
    let mut quote: Option<char> = None;
    let mut depth = 0usize;
    let mut escaped = false;
    let mut start = 0;

    for (i, c) in attr.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '"' | '\'' if quote == Some(c) => quote = None,
            '"' | '\'' if quote.is_none() => quote = Some(c),
            _ if quote.is_some() => {}
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ';' if depth == 0 => {
                declarations.push(&attr[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    declarations.push(&attr[start..]);
    declarations
}

struct PageInner {
    html: Html,
    styles: RefCell<HashMap<NodeId, InlineStyle>>,
    listeners: RefCell<BTreeSet<EventKind>>,
}

/// A loaded HTML document
#[derive(Clone)]
pub struct Page {
    inner: Rc<PageInner>,
}

impl Page {
    /// Parse a full HTML document
    pub fn parse(html: &str) -> Self {
        Self {
            inner: Rc::new(PageInner {
                html: Html::parse_document(html),
                styles: RefCell::new(HashMap::new()),
                listeners: RefCell::new(BTreeSet::new()),
            }),
        }
    }

    fn wrap(&self, element: ElementRef<'_>) -> PageElement {
        PageElement {
            page: Rc::clone(&self.inner),
            node: element.id(),
        }
    }
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("listeners", &self.inner.listeners.borrow())
            .finish()
    }
}

impl DocumentHandle for Page {
    type Element = PageElement;

    fn query_all(&self, selector: &str) -> Result<Vec<PageElement>> {
        let selector = parse_selector(selector)?;
        Ok(self
            .inner
            .html
            .select(&selector)
            .map(|el| self.wrap(el))
            .collect())
    }

    fn body(&self) -> Option<PageElement> {
        self.query_first("body").ok().flatten()
    }

    fn add_capture_listener(&self, kind: EventKind) {
        self.inner.listeners.borrow_mut().insert(kind);
    }

    fn remove_capture_listener(&self, kind: EventKind) {
        self.inner.listeners.borrow_mut().remove(&kind);
    }

    fn has_listener(&self, kind: EventKind) -> bool {
        self.inner.listeners.borrow().contains(&kind)
    }

    fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }
}

/// Handle to one element of a [`Page`]
#[derive(Clone)]
pub struct PageElement {
    page: Rc<PageInner>,
    node: NodeId,
}

impl PageElement {
    fn element_ref(&self) -> ElementRef<'_> {
        self.page
            .html
            .tree
            .get(self.node)
            .and_then(ElementRef::wrap)
            .expect("element handle always points at an element of its own page")
    }

    fn wrap(&self, element: ElementRef<'_>) -> PageElement {
        PageElement {
            page: Rc::clone(&self.page),
            node: element.id(),
        }
    }
}

impl PartialEq for PageElement {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.page, &other.page) && self.node == other.node
    }
}

impl fmt::Debug for PageElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageElement")
            .field("tag", &self.tag_name())
            .field("node", &self.node)
            .finish()
    }
}

impl ElementHandle for PageElement {
    fn tag_name(&self) -> String {
        self.element_ref().value().name().to_ascii_lowercase()
    }

    fn attribute(&self, name: &str) -> Option<String> {
        if name.eq_ignore_ascii_case("style") {
            if let Some(style) = self.page.styles.borrow().get(&self.node) {
                return style.to_css();
            }
        }
        self.element_ref().value().attr(name).map(String::from)
    }

    fn parent(&self) -> Option<Self> {
        self.element_ref()
            .parent()
            .and_then(ElementRef::wrap)
            .map(|el| self.wrap(el))
    }

    fn children(&self) -> Vec<Self> {
        self.element_ref()
            .children()
            .filter_map(ElementRef::wrap)
            .map(|el| self.wrap(el))
            .collect()
    }

    fn text(&self) -> String {
        self.element_ref().text().collect()
    }

    fn outer_html(&self) -> String {
        self.element_ref().html()
    }

    fn query_all(&self, selector: &str) -> Result<Vec<Self>> {
        let selector = parse_selector(selector)?;
        Ok(self
            .element_ref()
            .select(&selector)
            .map(|el| self.wrap(el))
            .collect())
    }

    fn matches(&self, selector: &str) -> Result<bool> {
        let selector = parse_selector(selector)?;
        Ok(selector.matches(&self.element_ref()))
    }

    fn style_prop(&self, name: &str) -> Option<String> {
        let name = name.to_ascii_lowercase();
        if let Some(style) = self.page.styles.borrow().get(&self.node) {
            return style.get(&name).map(String::from);
        }
        self.element_ref()
            .value()
            .attr("style")
            .map(InlineStyle::parse)
            .and_then(|style| style.get(&name).map(String::from))
    }

    fn set_style_prop(&self, name: &str, value: Option<&str>) {
        let mut styles = self.page.styles.borrow_mut();
        let style = styles.entry(self.node).or_insert_with(|| {
            self.element_ref()
                .value()
                .attr("style")
                .map(InlineStyle::parse)
                .unwrap_or_default()
        });
        style.set(name, value);

        // Back to the parsed markup: drop the override so the original text is served again
        let original = self
            .element_ref()
            .value()
            .attr("style")
            .map(InlineStyle::parse)
            .unwrap_or_default();
        if *style == original {
            styles.remove(&self.node);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HTML: &str = r#"
        <html><body>
            <div id="main" class="wrap  outer">
                <p style="color: red; border: 1px dashed blue">First <b>bold</b></p>
                <p>Second</p>
            </div>
        </body></html>
    "#;

    #[test]
    fn test_query_and_navigation() {
        let page = Page::parse(HTML);
        let paragraphs = page.query_all("p").unwrap();
        assert_eq!(paragraphs.len(), 2);

        let parent = paragraphs[0].parent().unwrap();
        assert_eq!(parent.id().as_deref(), Some("main"));
        assert_eq!(parent.class_list(), vec!["wrap", "outer"]);
        assert_eq!(parent.children().len(), 2);
        assert_eq!(parent.children()[1], paragraphs[1]);
        assert_eq!(paragraphs[0].text().trim(), "First bold");
    }

    #[test]
    fn test_element_query_is_scoped_to_descendants() {
        let page = Page::parse(HTML);
        let main = page.query_first("#main").unwrap().unwrap();
        assert_eq!(main.query_all("b").unwrap().len(), 1);
        assert!(main.query_all("div").unwrap().is_empty());
    }

    #[test]
    fn test_closest_is_inclusive() {
        let page = Page::parse(HTML);
        let bold = page.query_first("b").unwrap().unwrap();
        let main = page.query_first("#main").unwrap().unwrap();
        assert_eq!(bold.closest(".wrap").unwrap(), Some(main.clone()));
        assert_eq!(main.closest("#main").unwrap(), Some(main));
        assert_eq!(bold.closest("table").unwrap(), None);
    }

    #[test]
    fn test_invalid_selector_is_reported() {
        let page = Page::parse(HTML);
        let err = page.query_all("p[").unwrap_err();
        assert!(matches!(err, PickerError::SelectorSyntax { .. }));
    }

    #[test]
    fn test_inline_style_round_trip() {
        let page = Page::parse(HTML);
        let first = page.query_first("p").unwrap().unwrap();
        assert_eq!(first.style_prop("border").as_deref(), Some("1px dashed blue"));
        assert_eq!(first.style_prop("outline"), None);

        first.set_style_prop("border", Some("2px solid #ff0000"));
        first.set_style_prop("outline", Some("1px solid #ff0000"));
        assert_eq!(first.style_prop("border").as_deref(), Some("2px solid #ff0000"));
        assert_eq!(
            first.attribute("style").as_deref(),
            Some("color: red; border: 2px solid #ff0000; outline: 1px solid #ff0000;")
        );

        first.set_style_prop("border", Some("1px dashed blue"));
        first.set_style_prop("outline", None);
        assert_eq!(
            first.attribute("style").as_deref(),
            Some("color: red; border: 1px dashed blue")
        );
    }

    #[test]
    fn test_inline_style_keeps_quoted_and_parenthesized_values() {
        let page = Page::parse(
            r#"<body><p style="background: url('data:image/png;base64,AAAA'); content: &quot;a;b&quot;; border: 1px solid blue">x</p></body>"#,
        );
        let p = page.query_first("p").unwrap().unwrap();
        assert_eq!(
            p.style_prop("background").as_deref(),
            Some("url('data:image/png;base64,AAAA')")
        );
        assert_eq!(p.style_prop("content").as_deref(), Some("\"a;b\""));

        p.set_style_prop("border", Some("2px solid #ff0000"));
        assert_eq!(
            p.attribute("style").as_deref(),
            Some("background: url('data:image/png;base64,AAAA'); content: \"a;b\"; border: 2px solid #ff0000;")
        );
    }

    #[test]
    fn test_split_declarations() {
        assert_eq!(
            split_declarations("a: url(x;y); b: 'c;d'; e: f\\;g"),
            vec!["a: url(x;y)", " b: 'c;d'", " e: f\\;g"]
        );
    }

    #[test]
    fn test_outer_html() {
        let page = Page::parse(HTML);
        let bold = page.query_first("b").unwrap().unwrap();
        assert_eq!(bold.outer_html(), "<b>bold</b>");
    }

    #[test]
    fn test_listener_registry_is_a_set() {
        let page = Page::parse(HTML);
        page.add_capture_listener(EventKind::Click);
        page.add_capture_listener(EventKind::Click);
        assert_eq!(page.listener_count(), 1);
        page.remove_capture_listener(EventKind::Click);
        assert!(!page.has_listener(EventKind::Click));
    }
}

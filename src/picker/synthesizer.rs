//! Selector synthesis
//!
//! Computes a structural CSS selector for a picked element.
//!
//! # Modes
//! - **Absolute** (no base context): `#id`, then a document-unique class
//!   compound, then a `tag:nth-child(i)` path from below `<body>`.
//! - **Relative** (base context given): a path of local tokens from just below
//!   the nearest ancestor matching the base context down to the element. The
//!   result is meant to be evaluated from that ancestor, not from the document.

use log::debug;

use crate::dom::{DocumentHandle, ElementHandle};
use crate::error::Result;

/// Separator between path steps
const CHILD_COMBINATOR: &str = " > ";

/// Synthesize a selector for `node`
///
/// A blank `base_context` is treated as absent.
pub fn synthesize<D: DocumentHandle>(
    document: &D,
    node: &D::Element,
    base_context: Option<&str>,
) -> Result<String> {
    match base_context.map(str::trim).filter(|base| !base.is_empty()) {
        Some(base) => synthesize_relative(document, node, base),
        None => synthesize_absolute(document, node),
    }
}

/// Selector evaluated against the whole document
pub fn synthesize_absolute<D: DocumentHandle>(document: &D, node: &D::Element) -> Result<String> {
    if let Some(id) = node.id() {
        return Ok(id_token(&id));
    }

    if let Some(classes) = class_token(node) {
        if document.query_all(&classes)?.len() == 1 {
            return Ok(classes);
        }
    }

    Ok(positional_path(node))
}

/// Selector evaluated from the nearest ancestor matching `base_context`
///
/// Falls back to [`synthesize_absolute`] when no ancestor matches, or when the
/// node is itself the base match (an empty path selects nothing).
pub fn synthesize_relative<D: DocumentHandle>(
    document: &D,
    node: &D::Element,
    base_context: &str,
) -> Result<String> {
    let Some(base) = node.closest(base_context)? else {
        debug!("No ancestor matches '{}', using absolute selector", base_context);
        return synthesize_absolute(document, node);
    };

    let mut path = Vec::new();
    let mut current = Some(node.clone());
    while let Some(element) = current {
        if element == base {
            break;
        }
        path.push(local_token(document, &element)?);
        current = element.parent();
    }

    if path.is_empty() {
        debug!("Picked node is the base match itself, using absolute selector");
        return synthesize_absolute(document, node);
    }

    path.reverse();
    Ok(path.join(CHILD_COMBINATOR))
}

/// Id or class token when it is document-unique, otherwise tag + same-tag index
fn local_token<D: DocumentHandle>(document: &D, element: &D::Element) -> Result<String> {
    let candidate = match element.id() {
        Some(id) => Some(id_token(&id)),
        None => class_token(element),
    };

    // Uniqueness is checked document-wide even though the token is used relative to the base
    if let Some(token) = candidate {
        if document.query_all(&token)?.len() == 1 {
            return Ok(token);
        }
    }

    let tag = element.tag_name();
    let same_tag: Vec<D::Element> = element
        .parent()
        .map(|parent| {
            parent
                .children()
                .into_iter()
                .filter(|child| child.tag_name() == tag)
                .collect()
        })
        .unwrap_or_default();

    if same_tag.len() > 1 {
        if let Some(position) = same_tag.iter().position(|sibling| sibling == element) {
            return Ok(format!("{}:nth-of-type({})", tag, position + 1));
        }
    }
    Ok(tag)
}

/// `tag:nth-child(i)` steps from just below `<body>` down to `node`
fn positional_path<E: ElementHandle>(node: &E) -> String {
    let mut path = Vec::new();
    let mut current = Some(node.clone());

    while let Some(element) = current {
        if element.is_body() {
            break;
        }

        let mut step = element.tag_name();
        let parent = element.parent();
        if let Some(parent) = &parent {
            let siblings = parent.children();
            if siblings.len() > 1 {
                if let Some(position) = siblings.iter().position(|sibling| *sibling == element) {
                    step = format!("{}:nth-child({})", step, position + 1);
                }
            }
        }

        path.push(step);
        current = parent;
    }

    if path.is_empty() {
        return "body".to_string();
    }
    path.reverse();
    path.join(CHILD_COMBINATOR)
}

fn id_token(id: &str) -> String {
    format!("#{}", escape_ident(id))
}

fn class_token<E: ElementHandle>(element: &E) -> Option<String> {
    let classes = element.class_list();
    if classes.is_empty() {
        return None;
    }
    Some(
        classes
            .iter()
            .map(|class| format!(".{}", escape_ident(class)))
            .collect(),
    )
}

/// Escape a CSS identifier the way `CSS.escape` does
pub fn escape_ident(ident: &str) -> String {
    let chars: Vec<char> = ident.chars().collect();
    let mut out = String::with_capacity(ident.len());

    for (i, &c) in chars.iter().enumerate() {
        match c {
            '\0' => out.push('\u{FFFD}'),
            '\u{1}'..='\u{1f}' | '\u{7f}' => out.push_str(&format!("\\{:x} ", c as u32)),
            '0'..='9' if i == 0 || (i == 1 && chars[0] == '-') => {
                out.push_str(&format!("\\{:x} ", c as u32))
            }
            '-' if i == 0 && chars.len() == 1 => out.push_str("\\-"),
            c if c as u32 >= 0x80 || c == '-' || c == '_' || c.is_ascii_alphanumeric() => {
                out.push(c)
            }
            c => {
                out.push('\\');
                out.push(c);
            }
        }
    }

    out
}

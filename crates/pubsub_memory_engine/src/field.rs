//! Uniform value access across plain inputs, contenteditable elements and
//! editor shells backed by a hidden textarea.

use crate::dom::{Dom, DomError, DomEvent};

pub fn is_content_editable<D: Dom>(dom: &D, node: &D::Node) -> bool {
    dom.attribute(node, "contenteditable").as_deref() == Some("true")
}

/// Current value of `node`: the `value` property, else contenteditable text,
/// else trimmed text content.
pub fn get_value<D: Dom>(dom: &D, node: &D::Node) -> String {
    if let Some(value) = dom.value(node) {
        return value;
    }
    if is_content_editable(dom, node) {
        return dom.inner_text(node);
    }
    dom.text_content(node).trim().to_string()
}

/// Write `text` into `node` and notify the host's bindings with bubbling
/// `input` and `change` events.
///
/// Elements that are neither value-bearing nor contenteditable are left alone.
pub fn set_value<D: Dom>(dom: &D, node: &D::Node, text: &str) -> Result<(), DomError> {
    if dom.value(node).is_some() {
        dom.set_value(node, text)?;
    } else if is_content_editable(dom, node) {
        dom.set_inner_text(node, text)?;
    } else {
        return Err(DomError::NotEditable);
    }
    dom.dispatch(node, DomEvent::Input)?;
    dom.dispatch(node, DomEvent::Change)
}

//! Layered heuristics for finding the publish dialog's widgets.
//!
//! Every locator is an ordered list of strategies scoped to a candidate
//! dialog root. A strategy returns a match or nothing and the first match
//! wins; later strategies are looser and only run when the precise ones fail.

use engine_logging::engine_trace;

use crate::dom::{Dom, CLICKABLE_SELECTOR};
use crate::field::get_value;
use crate::types::AttributeSet;

/// Containers the host renders dialogs and overlays into.
pub const DIALOG_ROOT_SELECTOR: &str =
    r#"[role="dialog"], dialog, .cdk-overlay-container, .cdk-overlay-pane"#;

const ROW_COMPONENT_SELECTOR: &str = "cfc-form-stack-row";
const ROW_KEY_SELECTOR: &str = r#"input.cps-attribute-key-input, input[formcontrolname="key"]"#;
const ROW_VALUE_SELECTOR: &str =
    r#"input.cps-attribute-value-input, input[formcontrolname="value"]"#;

/// Maximum number of tree levels (node included) walked on each side when
/// pairing a key input with a value input.
pub const PAIRING_DEPTH: usize = 4;

pub type Strategy<D> = fn(&D, &<D as Dom>::Node) -> Option<<D as Dom>::Node>;
pub type RowStrategy<D> = fn(&D, &<D as Dom>::Node) -> Vec<AttributeRow<<D as Dom>::Node>>;

pub struct Named<F> {
    pub name: &'static str,
    pub run: F,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeRow<N> {
    pub key: N,
    pub value: N,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeRows<N> {
    pub rows: Vec<AttributeRow<N>>,
    pub add_button: Option<N>,
}

pub fn message_input_strategies<D: Dom>() -> [Named<Strategy<D>>; 4] {
    [
        Named {
            name: "textarea",
            run: textarea_input::<D>,
        },
        Named {
            name: "contenteditable",
            run: content_editable_input::<D>,
        },
        Named {
            name: "editor-backing-textarea",
            run: editor_backing_input::<D>,
        },
        Named {
            name: "any-input",
            run: any_input::<D>,
        },
    ]
}

pub fn attribute_row_strategies<D: Dom>() -> [Named<RowStrategy<D>>; 2] {
    [
        Named {
            name: "row-component",
            run: component_rows::<D>,
        },
        Named {
            name: "label-proximity",
            run: label_paired_rows::<D>,
        },
    ]
}

pub fn find_message_input<D: Dom>(dom: &D, root: &D::Node) -> Option<D::Node> {
    message_input_strategies::<D>()
        .iter()
        .find_map(|strategy| {
            let found = (strategy.run)(dom, root);
            if found.is_some() {
                engine_trace!("Message input located by {}", strategy.name);
            }
            found
        })
}

/// Multi-line text areas, preferring one whose placeholder mentions "message".
pub fn textarea_input<D: Dom>(dom: &D, root: &D::Node) -> Option<D::Node> {
    let textareas = dom.query_all(root, "textarea");
    let labelled = textareas.iter().find(|textarea| {
        dom.attribute(textarea, "placeholder")
            .is_some_and(|placeholder| placeholder.to_lowercase().contains("message"))
    });
    labelled.or(textareas.first()).cloned()
}

pub fn content_editable_input<D: Dom>(dom: &D, root: &D::Node) -> Option<D::Node> {
    dom.query_first(root, r#"[contenteditable="true"]"#)
}

/// The hidden text area a code editor shell keeps for keyboard input.
pub fn editor_backing_input<D: Dom>(dom: &D, root: &D::Node) -> Option<D::Node> {
    let shell = dom.query_first(root, ".monaco-editor")?;
    dom.query_first(&shell, "textarea.inputarea")
}

pub fn any_input<D: Dom>(dom: &D, root: &D::Node) -> Option<D::Node> {
    dom.query_first(root, "input")
}

fn clickable_text<D: Dom>(dom: &D, node: &D::Node) -> String {
    dom.text_content(node).trim().to_lowercase()
}

fn aria_label<D: Dom>(dom: &D, node: &D::Node) -> String {
    dom.attribute(node, "aria-label")
        .unwrap_or_default()
        .to_lowercase()
}

/// First clickable whose text mentions "publish".
pub fn find_publish_button<D: Dom>(dom: &D, root: &D::Node) -> Option<D::Node> {
    dom.query_all(root, CLICKABLE_SELECTOR)
        .into_iter()
        .find(|candidate| {
            let text = clickable_text(dom, candidate);
            !text.is_empty() && text.contains("publish")
        })
}

/// Whether a clicked control inside a dialog is the publish action.
pub fn is_publish_action<D: Dom>(dom: &D, clickable: &D::Node) -> bool {
    clickable_text(dom, clickable).contains("publish")
        || aria_label(dom, clickable).contains("publish")
}

/// Whether a clicked control is the page-level "Publish message" trigger.
pub fn is_publish_trigger<D: Dom>(dom: &D, clickable: &D::Node) -> bool {
    clickable_text(dom, clickable).contains("publish message")
        || aria_label(dom, clickable).contains("publish message")
}

pub fn find_add_attribute_button<D: Dom>(dom: &D, root: &D::Node) -> Option<D::Node> {
    dom.query_all(root, CLICKABLE_SELECTOR)
        .into_iter()
        .find(|candidate| {
            let text = clickable_text(dom, candidate);
            let by_text = text.contains("add attribute")
                || (text.contains("add") && text.contains("attribute"));
            by_text || aria_label(dom, candidate).contains("add attribute")
        })
}

pub fn find_attribute_rows<D: Dom>(dom: &D, root: &D::Node) -> AttributeRows<D::Node> {
    let rows = attribute_row_strategies::<D>()
        .iter()
        .find_map(|strategy| {
            let rows = (strategy.run)(dom, root);
            if rows.is_empty() {
                None
            } else {
                engine_trace!("{} attribute rows located by {}", rows.len(), strategy.name);
                Some(rows)
            }
        })
        .unwrap_or_default();

    AttributeRows {
        rows,
        add_button: find_add_attribute_button(dom, root),
    }
}

/// Rows rendered by the host's repeating form-row component.
pub fn component_rows<D: Dom>(dom: &D, root: &D::Node) -> Vec<AttributeRow<D::Node>> {
    dom.query_all(root, ROW_COMPONENT_SELECTOR)
        .into_iter()
        .filter_map(|row| {
            let key = dom.query_first(&row, ROW_KEY_SELECTOR)?;
            let value = dom.query_first(&row, ROW_VALUE_SELECTOR)?;
            Some(AttributeRow { key, value })
        })
        .collect()
}

/// Lowercased accessible label of an input: placeholder, aria-label, or the
/// text of a `<label for=...>` pointing at its id.
pub fn input_label<D: Dom>(dom: &D, input: &D::Node) -> String {
    let non_empty = |name: &str| {
        dom.attribute(input, name)
            .map(|text| text.to_lowercase())
            .filter(|text| !text.is_empty())
    };
    if let Some(label) = non_empty("placeholder").or_else(|| non_empty("aria-label")) {
        return label;
    }
    let Some(id) = dom.attribute(input, "id").filter(|id| !id.is_empty()) else {
        return String::new();
    };
    dom.query_all(&dom.document_root(), "label")
        .into_iter()
        .find(|label| dom.attribute(label, "for").as_deref() == Some(id.as_str()))
        .map(|label| dom.text_content(&label).to_lowercase())
        .unwrap_or_default()
}

fn is_key_label(label: &str) -> bool {
    label.contains("key") || (label.contains("attribute") && label.contains("name"))
}

fn is_value_label(label: &str) -> bool {
    label.contains("value")
}

/// Pairs key-like and value-like inputs that sit close together in the tree.
///
/// Candidates are visited in document order; each key takes the first unused
/// value that shares an ancestor within [`PAIRING_DEPTH`].
pub fn label_paired_rows<D: Dom>(dom: &D, root: &D::Node) -> Vec<AttributeRow<D::Node>> {
    let mut keys = Vec::new();
    let mut values = Vec::new();
    for input in dom.query_all(root, "input") {
        let label = input_label(dom, &input);
        if label.is_empty() {
            continue;
        }
        if is_key_label(&label) {
            keys.push(input.clone());
        }
        if is_value_label(&label) {
            values.push(input);
        }
    }

    let mut used = vec![false; values.len()];
    let mut rows = Vec::new();
    for key in keys {
        let paired = (0..values.len()).find(|&idx| {
            !used[idx]
                && values[idx] != key
                && shares_ancestor_within(dom, &key, &values[idx], PAIRING_DEPTH)
        });
        if let Some(idx) = paired {
            used[idx] = true;
            rows.push(AttributeRow {
                key,
                value: values[idx].clone(),
            });
        }
    }
    rows
}

/// Whether some node among `a` and its first `depth - 1` ancestors is also
/// among `b` and its first `depth - 1` ancestors.
pub fn shares_ancestor_within<D: Dom>(dom: &D, a: &D::Node, b: &D::Node, depth: usize) -> bool {
    let lineage = |start: &D::Node| {
        std::iter::successors(Some(start.clone()), |node| dom.parent(node))
            .take(depth)
            .collect::<Vec<_>>()
    };
    let b_lineage = lineage(b);
    lineage(a).iter().any(|ancestor| b_lineage.contains(ancestor))
}

/// Current key/value pairs of the dialog; rows with a blank key are skipped.
pub fn read_attributes<D: Dom>(dom: &D, root: &D::Node) -> AttributeSet {
    find_attribute_rows(dom, root)
        .rows
        .iter()
        .filter_map(|row| {
            let key = get_value(dom, &row.key).trim().to_string();
            let value = get_value(dom, &row.value).trim().to_string();
            (!key.is_empty()).then_some((key, value))
        })
        .collect()
}

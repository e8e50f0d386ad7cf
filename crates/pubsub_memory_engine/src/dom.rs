use std::fmt::Debug;
use std::rc::Rc;

use thiserror::Error;

/// Selector for anything the host renders as clickable.
pub const CLICKABLE_SELECTOR: &str = r#"button, [role="button"]"#;

/// Invoked with the click target when a capture-phase click reaches the node
/// the listener was installed on.
pub type ClickListener<N> = Rc<dyn Fn(&N)>;

/// Invoked after the host page changed its location.
pub type NavigationListener = Rc<dyn Fn()>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    #[error("node is no longer part of the document")]
    MissingNode,
    #[error("element is not editable")]
    NotEditable,
    #[error("host exception: {0}")]
    Host(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomEvent {
    Input,
    Change,
}

impl DomEvent {
    pub fn name(self) -> &'static str {
        match self {
            DomEvent::Input => "input",
            DomEvent::Change => "change",
        }
    }
}

/// The slice of the host document the memory needs: scoped queries, a few
/// element properties, synthetic events and listener registration.
///
/// Handles are cheap clones of host-owned nodes; implementations use
/// interior mutability, as the browser DOM does.
pub trait Dom: Clone + 'static {
    type Node: Clone + PartialEq + Debug + 'static;

    /// The document element; the scope of document-wide searches.
    fn document_root(&self) -> Self::Node;

    /// Descendants of `scope` (excluding `scope` itself) matching `selector`, in document order.
    fn query_all(&self, scope: &Self::Node, selector: &str) -> Vec<Self::Node>;

    fn query_first(&self, scope: &Self::Node, selector: &str) -> Option<Self::Node> {
        self.query_all(scope, selector).into_iter().next()
    }

    /// Nearest inclusive ancestor matching `selector`.
    fn closest(&self, node: &Self::Node, selector: &str) -> Option<Self::Node>;

    /// Parent element, if any.
    fn parent(&self, node: &Self::Node) -> Option<Self::Node>;

    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;

    fn text_content(&self, node: &Self::Node) -> String;

    fn inner_text(&self, node: &Self::Node) -> String;

    fn set_inner_text(&self, node: &Self::Node, text: &str) -> Result<(), DomError>;

    /// The `value` property, or `None` for elements that have none.
    fn value(&self, node: &Self::Node) -> Option<String>;

    fn set_value(&self, node: &Self::Node, value: &str) -> Result<(), DomError>;

    /// Dispatch a bubbling synthetic event.
    fn dispatch(&self, node: &Self::Node, event: DomEvent) -> Result<(), DomError>;

    fn click(&self, node: &Self::Node) -> Result<(), DomError>;

    fn is_connected(&self, node: &Self::Node) -> bool;

    fn location_href(&self) -> String;

    fn add_capture_click_listener(
        &self,
        node: &Self::Node,
        listener: ClickListener<Self::Node>,
    ) -> Result<(), DomError>;

    fn subscribe_navigation(&self, listener: NavigationListener) -> Result<(), DomError>;
}

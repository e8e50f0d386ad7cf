use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use ego_tree::{NodeId, NodeRef, Tree};
use engine_logging::engine_warn;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};

use crate::dom::{ClickListener, Dom, DomError, DomEvent, NavigationListener};

type ClickAction = Rc<dyn Fn(&SnapshotDom)>;

/// A [`Dom`] over a parsed HTML snapshot.
///
/// Form values and contenteditable text live in overlays keyed by node, the
/// way the browser keeps them as properties rather than markup. Structural
/// changes (appended fragments, detached subtrees) edit the tree itself.
/// Host reactions to clicks, such as rendering a new attribute row, are
/// modelled with [`SnapshotDom::on_click`].
#[derive(Clone)]
pub struct SnapshotDom {
    state: Rc<RefCell<SnapshotState>>,
}

struct SnapshotState {
    html: Html,
    href: String,
    values: HashMap<NodeId, String>,
    texts: HashMap<NodeId, String>,
    events: Vec<(NodeId, DomEvent)>,
    clicks: HashMap<NodeId, usize>,
    click_listeners: Vec<(NodeId, ClickListener<NodeId>)>,
    click_actions: HashMap<NodeId, ClickAction>,
    navigation_listeners: Vec<NavigationListener>,
}

impl SnapshotDom {
    pub fn parse(href: impl Into<String>, html: &str) -> Self {
        Self {
            state: Rc::new(RefCell::new(SnapshotState {
                html: Html::parse_document(html),
                href: href.into(),
                values: HashMap::new(),
                texts: HashMap::new(),
                events: Vec::new(),
                clicks: HashMap::new(),
                click_listeners: Vec::new(),
                click_actions: HashMap::new(),
                navigation_listeners: Vec::new(),
            })),
        }
    }

    /// First element in the document matching `selector`.
    pub fn find(&self, selector: &str) -> Option<NodeId> {
        self.query_first(&self.document_root(), selector)
    }

    pub fn find_all(&self, selector: &str) -> Vec<NodeId> {
        self.query_all(&self.document_root(), selector)
    }

    /// Set a form value the way typing would, without synthetic events.
    pub fn type_value(&self, node: NodeId, value: &str) {
        self.state
            .borrow_mut()
            .values
            .insert(node, value.to_string());
    }

    /// Events dispatched on `node`, in order.
    pub fn events_for(&self, node: NodeId) -> Vec<DomEvent> {
        self.state
            .borrow()
            .events
            .iter()
            .filter(|(target, _)| *target == node)
            .map(|(_, event)| *event)
            .collect()
    }

    pub fn click_count(&self, node: NodeId) -> usize {
        self.state.borrow().clicks.get(&node).copied().unwrap_or(0)
    }

    pub fn capture_listener_count(&self, node: NodeId) -> usize {
        self.state
            .borrow()
            .click_listeners
            .iter()
            .filter(|(target, _)| *target == node)
            .count()
    }

    /// Register the host's own reaction to a click on `node`, run after capture listeners.
    pub fn on_click(&self, node: NodeId, action: impl Fn(&SnapshotDom) + 'static) {
        self.state
            .borrow_mut()
            .click_actions
            .insert(node, Rc::new(action));
    }

    /// Parse `fragment` and append its top-level nodes to `parent`; returns the new element ids.
    pub fn append_html(&self, parent: NodeId, fragment: &str) -> Result<Vec<NodeId>, DomError> {
        let source = Html::parse_fragment(fragment);
        let mut state = self.state.borrow_mut();
        if state.html.tree.get(parent).is_none() {
            return Err(DomError::MissingNode);
        }
        let appended = graft(&mut state.html.tree, parent, *source.root_element());
        Ok(appended
            .into_iter()
            .filter(|id| {
                state
                    .html
                    .tree
                    .get(*id)
                    .and_then(ElementRef::wrap)
                    .is_some()
            })
            .collect())
    }

    /// Remove `node` and its subtree from the document, as a host re-render would.
    pub fn detach(&self, node: NodeId) -> Result<(), DomError> {
        let mut state = self.state.borrow_mut();
        let mut node = state.html.tree.get_mut(node).ok_or(DomError::MissingNode)?;
        node.detach();
        Ok(())
    }

    /// Change the location and notify navigation subscribers.
    pub fn navigate(&self, href: impl Into<String>) {
        let listeners = {
            let mut state = self.state.borrow_mut();
            state.href = href.into();
            state.navigation_listeners.clone()
        };
        for listener in listeners {
            listener();
        }
    }

    fn with_element<T>(&self, node: NodeId, f: impl FnOnce(ElementRef<'_>) -> T) -> Option<T> {
        let state = self.state.borrow();
        let element = state.html.tree.get(node).and_then(ElementRef::wrap)?;
        Some(f(element))
    }

    fn parse_selector(selector: &str) -> Option<Selector> {
        match Selector::parse(selector) {
            Ok(parsed) => Some(parsed),
            Err(err) => {
                engine_warn!("Ignoring invalid selector {:?}: {:?}", selector, err);
                None
            }
        }
    }
}

fn graft(tree: &mut Tree<Node>, parent: NodeId, source: NodeRef<'_, Node>) -> Vec<NodeId> {
    let mut appended = Vec::new();
    for child in source.children() {
        let Some(mut parent_mut) = tree.get_mut(parent) else {
            break;
        };
        let id = parent_mut.append(child.value().clone()).id();
        graft(tree, id, child);
        appended.push(id);
    }
    appended
}

fn default_value(element: ElementRef<'_>) -> Option<String> {
    match element.value().name() {
        "input" => Some(element.value().attr("value").unwrap_or_default().to_string()),
        "textarea" => Some(element.text().collect()),
        "select" => Some(String::new()),
        _ => None,
    }
}

impl Dom for SnapshotDom {
    type Node = NodeId;

    fn document_root(&self) -> NodeId {
        self.state.borrow().html.root_element().id()
    }

    fn query_all(&self, scope: &NodeId, selector: &str) -> Vec<NodeId> {
        let Some(selector) = Self::parse_selector(selector) else {
            return Vec::new();
        };
        self.with_element(*scope, |element| {
            element.select(&selector).map(|found| found.id()).collect()
        })
        .unwrap_or_default()
    }

    fn closest(&self, node: &NodeId, selector: &str) -> Option<NodeId> {
        let selector = Self::parse_selector(selector)?;
        let state = self.state.borrow();
        let start = state.html.tree.get(*node)?;
        let found = std::iter::once(start)
            .chain(start.ancestors())
            .filter_map(ElementRef::wrap)
            .find(|element| selector.matches(element))
            .map(|element| element.id());
        found
    }

    fn parent(&self, node: &NodeId) -> Option<NodeId> {
        let state = self.state.borrow();
        let parent = state.html.tree.get(*node)?.parent()?;
        ElementRef::wrap(parent).map(|element| element.id())
    }

    fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
        self.with_element(*node, |element| element.value().attr(name).map(str::to_string))
            .flatten()
    }

    fn text_content(&self, node: &NodeId) -> String {
        if let Some(text) = self.state.borrow().texts.get(node) {
            return text.clone();
        }
        self.with_element(*node, |element| element.text().collect())
            .unwrap_or_default()
    }

    fn inner_text(&self, node: &NodeId) -> String {
        self.text_content(node)
    }

    fn set_inner_text(&self, node: &NodeId, text: &str) -> Result<(), DomError> {
        let mut state = self.state.borrow_mut();
        if state.html.tree.get(*node).is_none() {
            return Err(DomError::MissingNode);
        }
        state.texts.insert(*node, text.to_string());
        Ok(())
    }

    fn value(&self, node: &NodeId) -> Option<String> {
        if let Some(value) = self.state.borrow().values.get(node) {
            return Some(value.clone());
        }
        self.with_element(*node, default_value).flatten()
    }

    fn set_value(&self, node: &NodeId, value: &str) -> Result<(), DomError> {
        let editable = self
            .with_element(*node, |element| default_value(element).is_some())
            .ok_or(DomError::MissingNode)?;
        if !editable {
            return Err(DomError::NotEditable);
        }
        self.type_value(*node, value);
        Ok(())
    }

    fn dispatch(&self, node: &NodeId, event: DomEvent) -> Result<(), DomError> {
        let mut state = self.state.borrow_mut();
        if state.html.tree.get(*node).is_none() {
            return Err(DomError::MissingNode);
        }
        state.events.push((*node, event));
        Ok(())
    }

    fn click(&self, node: &NodeId) -> Result<(), DomError> {
        let (listeners, action) = {
            let mut state = self.state.borrow_mut();
            let target = state.html.tree.get(*node).ok_or(DomError::MissingNode)?;
            // Capture phase runs outermost first.
            let mut path: Vec<NodeId> = target.ancestors().map(|n| n.id()).collect();
            path.reverse();
            path.push(*node);

            let listeners: Vec<ClickListener<NodeId>> = path
                .iter()
                .flat_map(|id| {
                    state
                        .click_listeners
                        .iter()
                        .filter(move |(owner, _)| owner == id)
                        .map(|(_, listener)| listener.clone())
                })
                .collect();
            let action = state.click_actions.get(node).cloned();
            *state.clicks.entry(*node).or_insert(0) += 1;
            (listeners, action)
        };

        for listener in listeners {
            listener(node);
        }
        if let Some(action) = action {
            action(self);
        }
        Ok(())
    }

    fn is_connected(&self, node: &NodeId) -> bool {
        let state = self.state.borrow();
        let root = state.html.tree.root().id();
        state
            .html
            .tree
            .get(*node)
            .is_some_and(|n| n.id() == root || n.ancestors().any(|a| a.id() == root))
    }

    fn location_href(&self) -> String {
        self.state.borrow().href.clone()
    }

    fn add_capture_click_listener(
        &self,
        node: &NodeId,
        listener: ClickListener<NodeId>,
    ) -> Result<(), DomError> {
        let mut state = self.state.borrow_mut();
        if state.html.tree.get(*node).is_none() {
            return Err(DomError::MissingNode);
        }
        state.click_listeners.push((*node, listener));
        Ok(())
    }

    fn subscribe_navigation(&self, listener: NavigationListener) -> Result<(), DomError> {
        self.state
            .borrow_mut()
            .navigation_listeners
            .push(listener);
        Ok(())
    }
}

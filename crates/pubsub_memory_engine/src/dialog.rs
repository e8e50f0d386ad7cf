use std::cell::RefCell;
use std::rc::Rc;

use engine_logging::{engine_debug, engine_info, engine_warn};
use pubsub_memory_core::{topic_from_href, MemorySettings, Topic};

use crate::dom::{ClickListener, Dom, CLICKABLE_SELECTOR};
use crate::field::get_value;
use crate::locate::{
    find_message_input, find_publish_button, is_publish_action, read_attributes,
    DIALOG_ROOT_SELECTOR,
};
use crate::memory::MessageMemory;
use crate::prefill::Prefiller;
use crate::schedule::Scheduler;
use crate::store::KeyValueStore;

/// A located publish dialog.
///
/// `publish_button` is not used for wiring: publish clicks are recognized at
/// capture time from the click target, since the host may re-render the
/// button. It is kept for callers inspecting what the locator found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishDialog<N> {
    pub root: N,
    pub input: N,
    pub publish_button: N,
}

/// What the controller remembers about a dialog root it has wired.
#[derive(Debug, Clone)]
struct DialogSession<N> {
    root: N,
    topic: Option<Topic>,
    input: N,
}

/// Wired dialog roots, kept beside the host's nodes rather than on them.
///
/// Entries for roots that left the document are dropped on the next wire
/// attempt, so a session never outlives its node.
struct WiredDialogs<N> {
    sessions: Vec<DialogSession<N>>,
}

impl<N: PartialEq> WiredDialogs<N> {
    fn new() -> Self {
        Self {
            sessions: Vec::new(),
        }
    }

    fn get(&self, root: &N) -> Option<&DialogSession<N>> {
        self.sessions.iter().find(|session| session.root == *root)
    }

    fn insert(&mut self, session: DialogSession<N>) {
        self.sessions.push(session);
    }

    fn retain_connected(&mut self, is_connected: impl Fn(&N) -> bool) {
        self.sessions.retain(|session| is_connected(&session.root));
    }
}

/// Detects the open publish dialog, prefills it and captures its values on publish.
pub struct DialogController<D: Dom, S, H> {
    dom: D,
    memory: MessageMemory<S>,
    prefiller: Prefiller<D, S, H>,
    scheduler: H,
    settings: Rc<MemorySettings>,
    wired: RefCell<WiredDialogs<D::Node>>,
}

impl<D, S, H> DialogController<D, S, H>
where
    D: Dom,
    S: KeyValueStore + 'static,
    H: Scheduler,
{
    pub fn new(
        dom: D,
        memory: MessageMemory<S>,
        scheduler: H,
        settings: Rc<MemorySettings>,
    ) -> Rc<Self> {
        let prefiller = Prefiller::new(
            dom.clone(),
            memory.clone(),
            scheduler.clone(),
            settings.clone(),
        );
        Rc::new(Self {
            dom,
            memory,
            prefiller,
            scheduler,
            settings,
            wired: RefCell::new(WiredDialogs::new()),
        })
    }

    pub fn prefiller(&self) -> &Prefiller<D, S, H> {
        &self.prefiller
    }

    /// First dialog container holding both a message input and a publish button.
    pub fn find_publish_dialog(&self) -> Option<PublishDialog<D::Node>> {
        let document = self.dom.document_root();
        self.dom
            .query_all(&document, DIALOG_ROOT_SELECTOR)
            .into_iter()
            .find_map(|root| {
                let input = find_message_input(&self.dom, &root)?;
                let publish_button = find_publish_button(&self.dom, &root)?;
                Some(PublishDialog {
                    root,
                    input,
                    publish_button,
                })
            })
    }

    /// Number of dialog roots currently carrying the publish-capture listener.
    pub fn wired_count(&self) -> usize {
        self.wired.borrow().sessions.len()
    }

    /// Prefill the open dialog and, once per root, attach the publish-capture
    /// listener. Returns whether a dialog was found.
    pub fn wire_up_publish_modal_if_present(self: &Rc<Self>) -> bool {
        let Some(dialog) = self.find_publish_dialog() else {
            return false;
        };
        let topic = topic_from_href(&self.dom.location_href());

        // Prefill never overwrites, so repeating it on a wired dialog is harmless.
        self.spawn_prefill(dialog.root.clone(), dialog.input.clone(), topic.clone());

        let mut wired = self.wired.borrow_mut();
        wired.retain_connected(|node| self.dom.is_connected(node));
        if wired.get(&dialog.root).is_some() {
            return true;
        }

        let controller = Rc::downgrade(self);
        let listener_root = dialog.root.clone();
        let listener: ClickListener<D::Node> = Rc::new(move |target: &D::Node| {
            if let Some(controller) = controller.upgrade() {
                controller.on_dialog_click(&listener_root, target);
            }
        });

        match self.dom.add_capture_click_listener(&dialog.root, listener) {
            Ok(()) => {
                engine_info!(
                    "Wired publish dialog (topic: {})",
                    topic.as_ref().map_or("global", Topic::as_str)
                );
                wired.insert(DialogSession {
                    root: dialog.root,
                    topic,
                    input: dialog.input,
                });
            }
            Err(err) => engine_warn!("Could not listen for publish clicks: {}", err),
        }
        true
    }

    fn spawn_prefill(&self, root: D::Node, input: D::Node, topic: Option<Topic>) {
        let prefiller = self.prefiller.clone();
        let message_topic = topic.clone();
        self.scheduler.spawn_local(Box::pin(async move {
            let outcome = prefiller.ensure_prefill(&input, message_topic.as_ref()).await;
            engine_debug!("Message prefill: {:?}", outcome);
        }));

        let prefiller = self.prefiller.clone();
        self.scheduler.spawn_local(Box::pin(async move {
            let outcome = prefiller
                .ensure_prefill_attributes(&root, topic.as_ref())
                .await;
            engine_debug!("Attribute prefill: {:?}", outcome);
        }));
    }

    fn live_scope(&self, root: &D::Node) -> D::Node {
        if self.dom.is_connected(root) {
            root.clone()
        } else {
            self.dom.document_root()
        }
    }

    fn on_dialog_click(&self, root: &D::Node, target: &D::Node) {
        let Some(clickable) = self.dom.closest(target, CLICKABLE_SELECTOR) else {
            return;
        };
        if !is_publish_action(&self.dom, &clickable) {
            return;
        }
        let Some(session) = self.wired.borrow().get(root).cloned() else {
            return;
        };

        // The host may have re-rendered the dialog since it was wired.
        let scope = self.live_scope(root);
        let input = find_message_input(&self.dom, &scope).unwrap_or(session.input);
        let message = get_value(&self.dom, &input).trim().to_string();
        let attributes = read_attributes(&self.dom, &scope);
        engine_info!(
            "Publish captured: {} message chars, {} attributes",
            message.len(),
            attributes.len()
        );

        let memory = self.memory.clone();
        let topic = session.topic;
        let save_topic = topic.clone();
        self.scheduler.spawn_local(Box::pin(async move {
            if !message.is_empty() {
                memory.save_last_message(save_topic.as_ref(), &message).await;
            }
            // Saved even when empty: the remembered set mirrors what was just published.
            memory
                .save_last_attributes(save_topic.as_ref(), &attributes)
                .await;
        }));

        // Some host flows clear the fields after publishing without closing the dialog.
        let dom = self.dom.clone();
        let prefiller = self.prefiller.clone();
        let scheduler = self.scheduler.clone();
        let delay = self.settings.republish_prefill_delay();
        let root = root.clone();
        self.scheduler.spawn_local(Box::pin(async move {
            scheduler.sleep(delay).await;
            let scope = if dom.is_connected(&root) {
                root
            } else {
                dom.document_root()
            };
            let input = find_message_input(&dom, &scope).unwrap_or(input);
            prefiller.ensure_prefill(&input, topic.as_ref()).await;
            prefiller
                .ensure_prefill_attributes(&scope, topic.as_ref())
                .await;
        }));
    }
}

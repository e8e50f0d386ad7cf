use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use engine_logging::{engine_debug, engine_info, engine_warn};
use pubsub_memory_core::{
    update, AppState, Effect, MemorySettings, Msg, PollSessionId, PollView,
};

use crate::dialog::DialogController;
use crate::dom::{ClickListener, Dom, NavigationListener, CLICKABLE_SELECTOR};
use crate::locate::is_publish_trigger;
use crate::memory::MessageMemory;
use crate::schedule::{spawn_abortable, LiveTimers, PollTimers, Scheduler};
use crate::store::KeyValueStore;

/// Runtime host for the poll lifecycle: feeds page events into the core
/// state machine and carries out the effects it returns.
pub struct MemoryAgent<D: Dom, S, H> {
    inner: Rc<AgentInner<D, S, H>>,
}

struct AgentInner<D: Dom, S, H> {
    dom: D,
    scheduler: H,
    settings: Rc<MemorySettings>,
    dialogs: Rc<DialogController<D, S, H>>,
    state: RefCell<AppState>,
    timers: RefCell<Option<PollTimers>>,
    live_timers: LiveTimers,
}

impl<D, S, H> MemoryAgent<D, S, H>
where
    D: Dom,
    S: KeyValueStore + 'static,
    H: Scheduler,
{
    pub fn new(dom: D, store: Rc<S>, scheduler: H, settings: MemorySettings) -> Self {
        let memory = MessageMemory::new(store, &settings);
        let settings = Rc::new(settings);
        let dialogs = DialogController::new(
            dom.clone(),
            memory,
            scheduler.clone(),
            settings.clone(),
        );
        Self {
            inner: Rc::new(AgentInner {
                dom,
                scheduler,
                state: RefCell::new(AppState::with_settings(settings.as_ref().clone())),
                settings,
                dialogs,
                timers: RefCell::new(None),
                live_timers: LiveTimers::default(),
            }),
        }
    }

    /// Install the page-level listeners and run the initial location check.
    pub fn start(&self) {
        let inner = &self.inner;

        let weak = Rc::downgrade(inner);
        let on_click: ClickListener<D::Node> = Rc::new(move |target: &D::Node| {
            if let Some(inner) = weak.upgrade() {
                inner.on_document_click(target);
            }
        });
        let document = inner.dom.document_root();
        if let Err(err) = inner.dom.add_capture_click_listener(&document, on_click) {
            engine_warn!("Could not listen for publish trigger clicks: {}", err);
        }

        if inner.settings.watch_navigation {
            let weak = Rc::downgrade(inner);
            let on_navigate: NavigationListener = Rc::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.defer(|dom| Msg::Navigated {
                        href: dom.location_href(),
                    });
                }
            });
            if let Err(err) = inner.dom.subscribe_navigation(on_navigate) {
                engine_warn!("Could not subscribe to navigation: {}", err);
            }
        }

        inner.dispatch(Msg::Navigated {
            href: inner.dom.location_href(),
        });
    }

    pub fn dispatch(&self, msg: Msg) {
        self.inner.dispatch(msg);
    }

    pub fn poll_view(&self) -> PollView {
        self.inner.state.borrow().view()
    }

    /// Timer tasks of poll sessions that are still alive.
    pub fn live_timer_count(&self) -> usize {
        self.inner.live_timers.get()
    }

    pub fn dialogs(&self) -> &Rc<DialogController<D, S, H>> {
        &self.inner.dialogs
    }
}

impl<D, S, H> AgentInner<D, S, H>
where
    D: Dom,
    S: KeyValueStore + 'static,
    H: Scheduler,
{
    fn dispatch(self: &Rc<Self>, msg: Msg) {
        let effects = {
            let mut state = self.state.borrow_mut();
            let (next, effects) = update(std::mem::take(&mut *state), msg);
            *state = next;
            effects
        };
        for effect in effects {
            self.run_effect(effect);
        }
    }

    /// Dispatch on a later turn of the event loop, building the message then.
    fn defer(self: &Rc<Self>, make: impl FnOnce(&D) -> Msg + 'static) {
        let weak = Rc::downgrade(self);
        self.scheduler.spawn_local(Box::pin(async move {
            if let Some(inner) = weak.upgrade() {
                let msg = make(&inner.dom);
                inner.dispatch(msg);
            }
        }));
    }

    fn on_document_click(self: &Rc<Self>, target: &D::Node) {
        let Some(clickable) = self.dom.closest(target, CLICKABLE_SELECTOR) else {
            return;
        };
        if is_publish_trigger(&self.dom, &clickable) {
            engine_debug!("Publish trigger clicked");
            self.defer(|_| Msg::PublishTriggerClicked);
        }
    }

    fn run_effect(self: &Rc<Self>, effect: Effect) {
        match effect {
            Effect::ArmPoll {
                session,
                interval,
                timeout,
            } => {
                let timers = self.arm_poll(session, interval, timeout);
                let stale = self.timers.borrow_mut().replace(timers);
                if let Some(stale) = stale {
                    stale.cancel();
                }
                engine_info!("Polling for the publish dialog (session {})", session);
            }
            Effect::CancelPoll { session } => {
                let timers = self
                    .timers
                    .borrow_mut()
                    .take_if(|timers| timers.session == session);
                if let Some(timers) = timers {
                    timers.cancel();
                }
                let ended = self.state.borrow().view().last_end;
                engine_info!("Stopped polling (session {}): {:?}", session, ended);
            }
            Effect::AttemptWire { session } => {
                let wired = self.dialogs.wire_up_publish_modal_if_present();
                self.dispatch(Msg::WireAttempted { session, wired });
            }
        }
    }

    fn arm_poll(
        self: &Rc<Self>,
        session: PollSessionId,
        interval: Duration,
        timeout: Duration,
    ) -> PollTimers {
        let weak = Rc::downgrade(self);
        let scheduler = self.scheduler.clone();
        let guard = self.live_timers.track();
        let interval_handle = spawn_abortable(&self.scheduler, async move {
            let _guard = guard;
            loop {
                scheduler.sleep(interval).await;
                let Some(inner) = weak.upgrade() else {
                    return;
                };
                inner.dispatch(Msg::PollTick { session });
            }
        });

        let weak = Rc::downgrade(self);
        let scheduler = self.scheduler.clone();
        let guard = self.live_timers.track();
        let timeout_handle = spawn_abortable(&self.scheduler, async move {
            let _guard = guard;
            scheduler.sleep(timeout).await;
            if let Some(inner) = weak.upgrade() {
                inner.dispatch(Msg::PollTimedOut { session });
            }
        });

        PollTimers::new(session, interval_handle, timeout_handle)
    }
}

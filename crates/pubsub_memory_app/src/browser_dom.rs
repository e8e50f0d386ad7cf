use engine_logging::engine_warn;
use js_sys::{Function, Reflect};
use pubsub_memory_engine::{ClickListener, Dom, DomError, DomEvent, NavigationListener};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    Document, Element, Event, EventInit, HtmlElement, HtmlInputElement, HtmlSelectElement,
    HtmlTextAreaElement, Window,
};

const NAVIGATION_EVENTS: [&str; 2] = ["popstate", "hashchange"];

/// The live page, through `web-sys`.
///
/// Listener closures are leaked and live as long as the page.
#[derive(Clone)]
pub struct BrowserDom {
    window: Window,
    root: Element,
}

impl BrowserDom {
    pub fn from_window(window: Window) -> Option<Self> {
        let document: Document = window.document()?;
        let root = document.document_element()?;
        Some(Self { window, root })
    }
}

fn host_error(err: JsValue) -> DomError {
    DomError::Host(err.as_string().unwrap_or_else(|| format!("{err:?}")))
}

impl Dom for BrowserDom {
    type Node = Element;

    fn document_root(&self) -> Element {
        self.root.clone()
    }

    fn query_all(&self, scope: &Element, selector: &str) -> Vec<Element> {
        let list = match scope.query_selector_all(selector) {
            Ok(list) => list,
            Err(err) => {
                engine_warn!("Ignoring invalid selector {:?}: {:?}", selector, err);
                return Vec::new();
            }
        };
        (0..list.length())
            .filter_map(|idx| list.item(idx))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .collect()
    }

    fn closest(&self, node: &Element, selector: &str) -> Option<Element> {
        node.closest(selector).ok().flatten()
    }

    fn parent(&self, node: &Element) -> Option<Element> {
        node.parent_element()
    }

    fn attribute(&self, node: &Element, name: &str) -> Option<String> {
        node.get_attribute(name)
    }

    fn text_content(&self, node: &Element) -> String {
        node.text_content().unwrap_or_default()
    }

    fn inner_text(&self, node: &Element) -> String {
        match node.dyn_ref::<HtmlElement>() {
            Some(element) => element.inner_text(),
            None => self.text_content(node),
        }
    }

    fn set_inner_text(&self, node: &Element, text: &str) -> Result<(), DomError> {
        let element = node.dyn_ref::<HtmlElement>().ok_or(DomError::NotEditable)?;
        element.set_inner_text(text);
        Ok(())
    }

    fn value(&self, node: &Element) -> Option<String> {
        if let Some(textarea) = node.dyn_ref::<HtmlTextAreaElement>() {
            return Some(textarea.value());
        }
        if let Some(input) = node.dyn_ref::<HtmlInputElement>() {
            return Some(input.value());
        }
        node.dyn_ref::<HtmlSelectElement>().map(HtmlSelectElement::value)
    }

    fn set_value(&self, node: &Element, value: &str) -> Result<(), DomError> {
        if let Some(textarea) = node.dyn_ref::<HtmlTextAreaElement>() {
            textarea.set_value(value);
        } else if let Some(input) = node.dyn_ref::<HtmlInputElement>() {
            input.set_value(value);
        } else if let Some(select) = node.dyn_ref::<HtmlSelectElement>() {
            select.set_value(value);
        } else {
            return Err(DomError::NotEditable);
        }
        Ok(())
    }

    fn dispatch(&self, node: &Element, event: DomEvent) -> Result<(), DomError> {
        let init = EventInit::new();
        init.set_bubbles(true);
        let event = Event::new_with_event_init_dict(event.name(), &init).map_err(host_error)?;
        node.dispatch_event(&event).map_err(host_error)?;
        Ok(())
    }

    fn click(&self, node: &Element) -> Result<(), DomError> {
        let element = node
            .dyn_ref::<HtmlElement>()
            .ok_or_else(|| DomError::Host("element cannot be clicked".into()))?;
        element.click();
        Ok(())
    }

    fn is_connected(&self, node: &Element) -> bool {
        node.is_connected()
    }

    fn location_href(&self) -> String {
        self.window.location().href().unwrap_or_default()
    }

    fn add_capture_click_listener(
        &self,
        node: &Element,
        listener: ClickListener<Element>,
    ) -> Result<(), DomError> {
        let callback = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            let target = event
                .target()
                .and_then(|target| target.dyn_into::<Element>().ok());
            if let Some(target) = target {
                listener(&target);
            }
        });
        node.add_event_listener_with_callback_and_bool(
            "click",
            callback.as_ref().unchecked_ref(),
            true,
        )
        .map_err(host_error)?;
        callback.forget();
        Ok(())
    }

    fn subscribe_navigation(&self, listener: NavigationListener) -> Result<(), DomError> {
        let callback = Closure::<dyn FnMut()>::new(move || listener());
        let function: &Function = callback.as_ref().unchecked_ref();

        for name in NAVIGATION_EVENTS {
            self.window
                .add_event_listener_with_callback(name, function)
                .map_err(host_error)?;
        }

        // The Navigation API also reports same-document navigations made with pushState.
        let navigation = Reflect::get(&self.window, &"navigation".into()).map_err(host_error)?;
        if navigation.is_object() {
            let add = Reflect::get(&navigation, &"addEventListener".into())
                .map_err(host_error)?
                .dyn_into::<Function>()
                .map_err(host_error)?;
            add.call2(&navigation, &"navigatesuccess".into(), function)
                .map_err(host_error)?;
        }

        callback.forget();
        Ok(())
    }
}

//! `wasm-bindgen` exports: build the agent from the live page and keep it alive.

use std::cell::RefCell;
use std::rc::Rc;

use engine_logging::{engine_error, engine_info, engine_warn, initialize_for_browser};
use log::LevelFilter;
use pubsub_memory_core::MemorySettings;
use pubsub_memory_engine::MemoryAgent;
use serde_json::Value;
use wasm_bindgen::prelude::*;

use crate::browser_dom::BrowserDom;
use crate::chrome_storage::ChromeStorage;
use crate::settings::settings_from_json;
use crate::timers::BrowserScheduler;

type Agent = MemoryAgent<BrowserDom, ChromeStorage, BrowserScheduler>;

thread_local! {
    // Listeners only hold weak references; the agent lives here for the page's lifetime.
    static AGENT: RefCell<Option<Agent>> = const { RefCell::new(None) };
}

fn install_panic_hook() {
    use std::sync::Once;

    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        std::panic::set_hook(Box::new(|info| {
            web_sys::console::error_1(&JsValue::from_str(&format!("pubsub_memory: {info}")));
        }));
    });
}

/// Start with the default settings.
#[wasm_bindgen]
pub fn start() {
    prepare();
    launch(MemorySettings::default());
}

/// Start with host overrides, a plain object with any subset of the settings fields.
#[wasm_bindgen(js_name = startWithSettings)]
pub fn start_with_settings(overrides: JsValue) {
    prepare();
    let settings = parse_overrides(overrides).unwrap_or_else(|err| {
        engine_warn!("Ignoring invalid settings ({}); using defaults", err);
        MemorySettings::default()
    });
    launch(settings);
}

fn prepare() {
    install_panic_hook();
    initialize_for_browser(LevelFilter::Info);
}

fn parse_overrides(overrides: JsValue) -> Result<MemorySettings, String> {
    if overrides.is_undefined() || overrides.is_null() {
        return Ok(MemorySettings::default());
    }
    let value: Value = serde_wasm_bindgen::from_value(overrides).map_err(|err| err.to_string())?;
    settings_from_json(value).map_err(|err| err.to_string())
}

fn launch(settings: MemorySettings) {
    if AGENT.with(|agent| agent.borrow().is_some()) {
        engine_warn!("Already running; start ignored");
        return;
    }
    let Some(dom) = web_sys::window().and_then(BrowserDom::from_window) else {
        engine_error!("No document to attach to");
        return;
    };
    let store = match ChromeStorage::local() {
        Ok(store) => Rc::new(store),
        Err(err) => {
            engine_error!("Extension storage unavailable: {}", err);
            return;
        }
    };

    let agent = MemoryAgent::new(dom, store, BrowserScheduler, settings);
    agent.start();
    engine_info!("Publish dialog memory started");
    AGENT.with(|slot| *slot.borrow_mut() = Some(agent));
}

//! Browser content-script host for the Pub/Sub publish-dialog memory.
//!
//! The `web-sys` bindings are only built for `wasm32`; settings parsing is
//! shared so it can be tested natively.
mod settings;

pub use settings::settings_from_json;

#[cfg(target_arch = "wasm32")]
mod browser_dom;
#[cfg(target_arch = "wasm32")]
mod chrome_storage;
#[cfg(target_arch = "wasm32")]
mod timers;
#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use wasm::{start, start_with_settings};

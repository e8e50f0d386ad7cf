use async_trait::async_trait;
use js_sys::{Array, Function, Promise, Reflect};
use pubsub_memory_engine::{KeyValueStore, StoreError};
use serde::Serialize;
use serde_json::{Map, Value};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

fn describe(err: &JsValue) -> String {
    err.as_string().unwrap_or_else(|| format!("{err:?}"))
}

/// `chrome.storage.local`, shared by every console tab.
pub struct ChromeStorage {
    area: JsValue,
}

impl ChromeStorage {
    pub fn local() -> Result<Self, StoreError> {
        let mut area: JsValue = js_sys::global().into();
        for name in ["chrome", "storage", "local"] {
            area = Reflect::get(&area, &name.into())
                .map_err(|err| StoreError::Unavailable(describe(&err)))?;
            if area.is_undefined() || area.is_null() {
                return Err(StoreError::Unavailable(format!("{name} is not available")));
            }
        }
        Ok(Self { area })
    }

    async fn call(&self, method: &str, arg: &JsValue) -> Result<JsValue, JsValue> {
        let function = Reflect::get(&self.area, &method.into())?.dyn_into::<Function>()?;
        let promise = function.call1(&self.area, arg)?.dyn_into::<Promise>()?;
        JsFuture::from(promise).await
    }
}

#[async_trait(?Send)]
impl KeyValueStore for ChromeStorage {
    async fn get(&self, keys: &[String]) -> Result<Map<String, Value>, StoreError> {
        let keys: Array = keys.iter().map(|key| JsValue::from_str(key)).collect();
        let found = self
            .call("get", &keys)
            .await
            .map_err(|err| StoreError::Unavailable(describe(&err)))?;
        serde_wasm_bindgen::from_value(found).map_err(|err| StoreError::Malformed(err.to_string()))
    }

    async fn set(&self, entries: Map<String, Value>) -> Result<(), StoreError> {
        let payload = entries
            .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
            .map_err(|err| StoreError::Malformed(err.to_string()))?;
        self.call("set", &payload)
            .await
            .map_err(|err| StoreError::Rejected(describe(&err)))?;
        Ok(())
    }
}

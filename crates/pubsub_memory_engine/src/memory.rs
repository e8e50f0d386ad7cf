use std::rc::Rc;

use engine_logging::engine_warn;
use pubsub_memory_core::{MemorySettings, Topic};
use serde_json::{Map, Value};

use crate::store::KeyValueStore;
use crate::types::AttributeSet;

const GLOBAL_SCOPE: &str = "global";

/// Per-topic message and attribute records with a global fallback.
///
/// Every save writes the topic record and the global record together. Store
/// failures are logged and swallowed: loads resolve to "nothing remembered"
/// and saves become no-ops.
pub struct MessageMemory<S> {
    store: Rc<S>,
    message_namespace: String,
    attributes_namespace: String,
}

impl<S> Clone for MessageMemory<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            message_namespace: self.message_namespace.clone(),
            attributes_namespace: self.attributes_namespace.clone(),
        }
    }
}

struct ScopedKeys {
    scoped: String,
    global: String,
}

impl ScopedKeys {
    fn new(namespace: &str, topic: Option<&Topic>) -> Self {
        let global = format!("{namespace}:{GLOBAL_SCOPE}");
        let scoped = match topic {
            Some(topic) => format!("{namespace}:{topic}"),
            None => global.clone(),
        };
        Self { scoped, global }
    }

    fn both(&self) -> Vec<String> {
        vec![self.scoped.clone(), self.global.clone()]
    }

    fn payload(&self, value: Value) -> Map<String, Value> {
        let mut payload = Map::new();
        payload.insert(self.scoped.clone(), value.clone());
        payload.insert(self.global.clone(), value);
        payload
    }
}

impl<S: KeyValueStore> MessageMemory<S> {
    pub fn new(store: Rc<S>, settings: &MemorySettings) -> Self {
        Self {
            store,
            message_namespace: settings.message_namespace.clone(),
            attributes_namespace: settings.attributes_namespace.clone(),
        }
    }

    pub fn message_key(&self, topic: Option<&Topic>) -> String {
        ScopedKeys::new(&self.message_namespace, topic).scoped
    }

    pub fn attributes_key(&self, topic: Option<&Topic>) -> String {
        ScopedKeys::new(&self.attributes_namespace, topic).scoped
    }

    /// The remembered message for `topic`, else the global one, else "".
    pub async fn load_last_message(&self, topic: Option<&Topic>) -> String {
        let keys = ScopedKeys::new(&self.message_namespace, topic);
        let Some(data) = self.fetch(&keys).await else {
            return String::new();
        };
        let remembered = [&keys.scoped, &keys.global]
            .into_iter()
            .filter_map(|key| data.get(key.as_str()).and_then(Value::as_str))
            .find(|text| !text.is_empty())
            .unwrap_or_default()
            .to_string();
        remembered
    }

    pub async fn save_last_message(&self, topic: Option<&Topic>, text: &str) {
        let keys = ScopedKeys::new(&self.message_namespace, topic);
        self.write(keys.payload(Value::String(text.to_string())))
            .await;
    }

    /// The remembered attributes for `topic`, else the global set, else empty.
    ///
    /// A stored empty set under the topic key is a deliberate clear and is
    /// returned as is; only a missing or non-object record falls back.
    pub async fn load_last_attributes(&self, topic: Option<&Topic>) -> AttributeSet {
        let keys = ScopedKeys::new(&self.attributes_namespace, topic);
        let Some(data) = self.fetch(&keys).await else {
            return AttributeSet::new();
        };
        let remembered = [&keys.scoped, &keys.global]
            .into_iter()
            .filter_map(|key| data.get(key.as_str()))
            .find(|value| value.is_object())
            .map(AttributeSet::from_json)
            .unwrap_or_default();
        remembered
    }

    /// Replace (never merge) the remembered attributes.
    pub async fn save_last_attributes(&self, topic: Option<&Topic>, attrs: &AttributeSet) {
        let keys = ScopedKeys::new(&self.attributes_namespace, topic);
        self.write(keys.payload(attrs.to_json())).await;
    }

    async fn fetch(&self, keys: &ScopedKeys) -> Option<Map<String, Value>> {
        match self.store.get(&keys.both()).await {
            Ok(data) => Some(data),
            Err(err) => {
                engine_warn!("Failed to read {:?}: {}", keys.scoped, err);
                None
            }
        }
    }

    async fn write(&self, payload: Map<String, Value>) {
        if let Err(err) = self.store.set(payload).await {
            engine_warn!("Failed to persist remembered input: {}", err);
        }
    }
}

use std::rc::Rc;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use pubsub_memory_core::{MemorySettings, Topic};
use pubsub_memory_engine::{AttributeSet, KeyValueStore, MemoryStore, MessageMemory, StoreError};
use serde_json::{json, Map, Value};

fn init_logging() {
    engine_logging::initialize_for_tests();
}

fn memory(store: &Rc<MemoryStore>) -> MessageMemory<MemoryStore> {
    MessageMemory::new(store.clone(), &MemorySettings::default())
}

fn attrs(pairs: &[(&str, &str)]) -> AttributeSet {
    pairs.iter().copied().collect()
}

async fn seed(store: &MemoryStore, entries: Value) {
    let Value::Object(entries) = entries else {
        panic!("seed expects an object");
    };
    store.set(entries).await.unwrap();
}

/// A store whose host context has gone away.
struct FailingStore;

#[async_trait(?Send)]
impl KeyValueStore for FailingStore {
    async fn get(&self, _keys: &[String]) -> Result<Map<String, Value>, StoreError> {
        Err(StoreError::Unavailable("extension context invalidated".into()))
    }

    async fn set(&self, _entries: Map<String, Value>) -> Result<(), StoreError> {
        Err(StoreError::Rejected("quota exceeded".into()))
    }
}

#[tokio::test]
async fn keys_are_namespaced_by_topic() {
    init_logging();
    let store = Rc::new(MemoryStore::new());
    let memory = memory(&store);
    let topic = Topic::new("orders");
    assert_eq!(memory.message_key(Some(&topic)), "gcp_pubsub_last_message:orders");
    assert_eq!(memory.message_key(None), "gcp_pubsub_last_message:global");
    assert_eq!(memory.attributes_key(Some(&topic)), "gcp_pubsub_last_attributes:orders");
}

#[tokio::test]
async fn saving_a_message_writes_topic_and_global_records() {
    init_logging();
    let store = Rc::new(MemoryStore::new());
    let memory = memory(&store);
    let topic = Topic::new("orders");

    memory.save_last_message(Some(&topic), "{\"id\": 7}").await;

    let mut expected = Map::new();
    expected.insert("gcp_pubsub_last_message:orders".into(), json!("{\"id\": 7}"));
    expected.insert("gcp_pubsub_last_message:global".into(), json!("{\"id\": 7}"));
    assert_eq!(store.snapshot(), expected);
    assert_eq!(memory.load_last_message(Some(&topic)).await, "{\"id\": 7}");
}

#[tokio::test]
async fn other_topics_fall_back_to_the_global_message() {
    init_logging();
    let store = Rc::new(MemoryStore::new());
    let memory = memory(&store);

    memory.save_last_message(Some(&Topic::new("orders")), "last one").await;

    assert_eq!(memory.load_last_message(Some(&Topic::new("billing"))).await, "last one");
    assert_eq!(memory.load_last_message(None).await, "last one");
}

#[tokio::test]
async fn topic_message_takes_precedence_over_global() {
    init_logging();
    let store = Rc::new(MemoryStore::new());
    let memory = memory(&store);

    memory.save_last_message(Some(&Topic::new("orders")), "for orders").await;
    memory.save_last_message(Some(&Topic::new("billing")), "for billing").await;

    assert_eq!(memory.load_last_message(Some(&Topic::new("orders"))).await, "for orders");
    assert_eq!(memory.load_last_message(Some(&Topic::new("audit"))).await, "for billing");
}

#[tokio::test]
async fn empty_topic_message_falls_through_to_global() {
    init_logging();
    let store = Rc::new(MemoryStore::new());
    seed(
        &store,
        json!({
            "gcp_pubsub_last_message:orders": "",
            "gcp_pubsub_last_message:global": "from global",
        }),
    )
    .await;
    let memory = memory(&store);
    assert_eq!(memory.load_last_message(Some(&Topic::new("orders"))).await, "from global");
}

#[tokio::test]
async fn nothing_stored_loads_empty() {
    init_logging();
    let store = Rc::new(MemoryStore::new());
    let memory = memory(&store);
    assert_eq!(memory.load_last_message(Some(&Topic::new("orders"))).await, "");
    assert!(memory.load_last_attributes(None).await.is_empty());
}

#[tokio::test]
async fn attributes_are_replaced_wholesale() {
    init_logging();
    let store = Rc::new(MemoryStore::new());
    let memory = memory(&store);
    let topic = Topic::new("orders");

    memory
        .save_last_attributes(Some(&topic), &attrs(&[("env", "prod"), ("region", "eu")]))
        .await;
    memory
        .save_last_attributes(Some(&topic), &attrs(&[("trace", "on")]))
        .await;

    assert_eq!(memory.load_last_attributes(Some(&topic)).await, attrs(&[("trace", "on")]));
    assert_eq!(
        store.snapshot().get("gcp_pubsub_last_attributes:global"),
        Some(&json!({"trace": "on"}))
    );
}

#[tokio::test]
async fn cleared_topic_attributes_stay_cleared() {
    init_logging();
    let store = Rc::new(MemoryStore::new());
    let memory = memory(&store);
    let orders = Topic::new("orders");
    let billing = Topic::new("billing");

    memory.save_last_attributes(Some(&orders), &attrs(&[("x", "1")])).await;
    memory.save_last_attributes(Some(&orders), &AttributeSet::new()).await;
    memory.save_last_attributes(Some(&billing), &attrs(&[("y", "2")])).await;

    assert_eq!(
        store.snapshot().get("gcp_pubsub_last_attributes:orders"),
        Some(&json!({}))
    );
    assert_eq!(memory.load_last_attributes(Some(&orders)).await, AttributeSet::new());
    assert_eq!(
        memory.load_last_attributes(Some(&Topic::new("unseen"))).await,
        attrs(&[("y", "2")])
    );
}

#[tokio::test]
async fn non_object_topic_attributes_fall_back_to_global() {
    init_logging();
    let store = Rc::new(MemoryStore::new());
    seed(
        &store,
        json!({
            "gcp_pubsub_last_attributes:orders": "corrupted",
            "gcp_pubsub_last_attributes:global": {"env": "staging"},
        }),
    )
    .await;
    let memory = memory(&store);
    assert_eq!(
        memory.load_last_attributes(Some(&Topic::new("orders"))).await,
        attrs(&[("env", "staging")])
    );
}

#[tokio::test]
async fn stored_attribute_order_and_odd_values_survive() {
    init_logging();
    let store = Rc::new(MemoryStore::new());
    seed(
        &store,
        json!({
            "gcp_pubsub_last_attributes:global": {"zeta": "z", "count": 3, "flag": true, "gone": null},
        }),
    )
    .await;
    let memory = memory(&store);
    assert_eq!(
        memory.load_last_attributes(None).await,
        attrs(&[("zeta", "z"), ("count", "3"), ("flag", "true"), ("gone", "")])
    );
}

#[tokio::test]
async fn store_failures_are_swallowed() {
    init_logging();
    let memory = MessageMemory::new(Rc::new(FailingStore), &MemorySettings::default());
    let topic = Topic::new("orders");

    memory.save_last_message(Some(&topic), "lost").await;
    memory
        .save_last_attributes(Some(&topic), &attrs(&[("env", "prod")]))
        .await;

    assert_eq!(memory.load_last_message(Some(&topic)).await, "");
    assert!(memory.load_last_attributes(Some(&topic)).await.is_empty());
}

#[tokio::test]
async fn custom_namespaces_are_honoured() {
    init_logging();
    let store = Rc::new(MemoryStore::new());
    let settings = MemorySettings {
        message_namespace: "msg".into(),
        ..MemorySettings::default()
    };
    let memory = MessageMemory::new(store.clone(), &settings);
    memory.save_last_message(None, "hi").await;
    assert_eq!(store.snapshot().get("msg:global"), Some(&json!("hi")));
    assert_eq!(store.snapshot().len(), 1);
}

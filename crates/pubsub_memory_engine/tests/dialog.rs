use std::rc::Rc;
use std::time::Duration;

use ego_tree::NodeId;
use pretty_assertions::assert_eq;
use pubsub_memory_core::{MemorySettings, Topic};
use pubsub_memory_engine::{
    find_attribute_rows, get_value, AttributeSet, DialogController, Dom, MemoryStore,
    MessageMemory, SnapshotDom, TokioScheduler,
};
use serde_json::json;
use tokio::task::LocalSet;

const HREF: &str =
    "https://console.cloud.google.com/cloudpubsub/topic/detail/orders?project=demo";

const DIALOG: &str = r#"<div role="dialog" id="d">
    <textarea id="message" placeholder="Message body"></textarea>
    <div id="rows"></div>
    <button id="add">Add attribute</button>
    <button id="cancel">Cancel</button>
    <button id="publish"><span id="publish-label">Publish</span></button>
</div>"#;

const ROW: &str = r#"<cfc-form-stack-row>
    <input class="cps-attribute-key-input">
    <input class="cps-attribute-value-input">
</cfc-form-stack-row>"#;

type Controller = DialogController<SnapshotDom, MemoryStore, TokioScheduler>;

fn init_logging() {
    engine_logging::initialize_for_tests();
}

struct Fixture {
    dom: SnapshotDom,
    store: Rc<MemoryStore>,
    memory: MessageMemory<MemoryStore>,
    controller: Rc<Controller>,
}

impl Fixture {
    fn new(body: &str) -> Self {
        let dom = SnapshotDom::parse(HREF, &format!("<html><body>{body}</body></html>"));
        let settings = MemorySettings::default();
        let store = Rc::new(MemoryStore::new());
        let memory = MessageMemory::new(store.clone(), &settings);
        let controller = DialogController::new(
            dom.clone(),
            memory.clone(),
            TokioScheduler,
            Rc::new(settings),
        );
        Self {
            dom,
            store,
            memory,
            controller,
        }
    }

    fn node(&self, selector: &str) -> NodeId {
        self.dom
            .find(selector)
            .unwrap_or_else(|| panic!("fixture has no {selector}"))
    }

    fn add_row(&self) {
        self.dom.append_html(self.node("#rows"), ROW).unwrap();
    }

    fn rows(&self) -> Vec<(NodeId, NodeId)> {
        find_attribute_rows(&self.dom, &self.node("#d"))
            .rows
            .into_iter()
            .map(|row| (row.key, row.value))
            .collect()
    }
}

/// Let spawned tasks and short timers run.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

#[tokio::test(start_paused = true)]
async fn finds_the_dialog_that_has_both_input_and_publish_button() {
    init_logging();
    let fx = Fixture::new(&format!(
        r#"<div role="dialog" id="confirm"><textarea></textarea><button>OK</button></div>{DIALOG}"#
    ));

    let dialog = fx.controller.find_publish_dialog().unwrap();

    assert_eq!(dialog.root, fx.node("#d"));
    assert_eq!(dialog.input, fx.node("#message"));
    assert_eq!(dialog.publish_button, fx.node("#publish"));
}

#[tokio::test(start_paused = true)]
async fn no_dialog_means_nothing_to_wire() {
    init_logging();
    LocalSet::new()
        .run_until(async {
            let fx = Fixture::new(r#"<button>Publish message</button>"#);
            assert!(!fx.controller.wire_up_publish_modal_if_present());
            assert_eq!(fx.controller.wired_count(), 0);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn dialog_is_wired_once_per_root() {
    init_logging();
    LocalSet::new()
        .run_until(async {
            let fx = Fixture::new(DIALOG);

            assert!(fx.controller.wire_up_publish_modal_if_present());
            assert!(fx.controller.wire_up_publish_modal_if_present());
            settle().await;

            assert_eq!(fx.controller.wired_count(), 1);
            assert_eq!(fx.dom.capture_listener_count(fx.node("#d")), 1);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn wiring_prefills_message_and_attributes() {
    init_logging();
    LocalSet::new()
        .run_until(async {
            let fx = Fixture::new(DIALOG);
            let topic = Topic::new("orders");
            fx.memory.save_last_message(Some(&topic), "{\"n\": 1}").await;
            let remembered: AttributeSet = [("env", "prod")].into_iter().collect();
            fx.memory.save_last_attributes(Some(&topic), &remembered).await;
            let rows = fx.node("#rows");
            fx.dom.on_click(fx.node("#add"), move |dom| {
                dom.append_html(rows, ROW).unwrap();
            });

            assert!(fx.controller.wire_up_publish_modal_if_present());
            tokio::time::sleep(Duration::from_millis(300)).await;

            assert_eq!(get_value(&fx.dom, &fx.node("#message")), "{\"n\": 1}");
            let (key, value) = fx.rows()[0];
            assert_eq!(get_value(&fx.dom, &key), "env");
            assert_eq!(get_value(&fx.dom, &value), "prod");
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn publish_click_saves_message_and_attributes() {
    init_logging();
    LocalSet::new()
        .run_until(async {
            let fx = Fixture::new(DIALOG);
            assert!(fx.controller.wire_up_publish_modal_if_present());
            settle().await;

            fx.dom.type_value(fx.node("#message"), "  {\"order\": 42}\n");
            fx.add_row();
            fx.add_row();
            let rows = fx.rows();
            fx.dom.type_value(rows[0].0, "env");
            fx.dom.type_value(rows[0].1, "prod");
            fx.dom.type_value(rows[1].0, "region");
            fx.dom.type_value(rows[1].1, "eu");

            // The click lands on the label inside the button.
            fx.dom.click(&fx.node("#publish-label")).unwrap();
            settle().await;

            let saved = fx.store.snapshot();
            assert_eq!(
                saved.get("gcp_pubsub_last_message:orders"),
                Some(&json!("{\"order\": 42}"))
            );
            assert_eq!(
                saved.get("gcp_pubsub_last_message:global"),
                Some(&json!("{\"order\": 42}"))
            );
            assert_eq!(
                saved.get("gcp_pubsub_last_attributes:orders"),
                Some(&json!({"env": "prod", "region": "eu"}))
            );
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn other_clicks_in_the_dialog_save_nothing() {
    init_logging();
    LocalSet::new()
        .run_until(async {
            let fx = Fixture::new(DIALOG);
            assert!(fx.controller.wire_up_publish_modal_if_present());
            fx.dom.type_value(fx.node("#message"), "draft");

            fx.dom.click(&fx.node("#cancel")).unwrap();
            fx.dom.click(&fx.node("#add")).unwrap();
            fx.dom.click(&fx.node("#message")).unwrap();
            settle().await;

            assert!(fx.store.snapshot().is_empty());
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn empty_message_is_not_saved_but_attributes_are() {
    init_logging();
    LocalSet::new()
        .run_until(async {
            let fx = Fixture::new(DIALOG);
            fx.memory
                .save_last_message(Some(&Topic::new("orders")), "older message")
                .await;
            fx.dom.type_value(fx.node("#message"), "typed");
            assert!(fx.controller.wire_up_publish_modal_if_present());
            settle().await;

            fx.dom.type_value(fx.node("#message"), "   ");
            fx.dom.click(&fx.node("#publish")).unwrap();
            settle().await;

            let saved = fx.store.snapshot();
            assert_eq!(
                saved.get("gcp_pubsub_last_message:orders"),
                Some(&json!("older message"))
            );
            assert_eq!(
                saved.get("gcp_pubsub_last_attributes:orders"),
                Some(&json!({}))
            );
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn fields_cleared_after_publish_are_refilled() {
    init_logging();
    LocalSet::new()
        .run_until(async {
            let fx = Fixture::new(DIALOG);
            assert!(fx.controller.wire_up_publish_modal_if_present());
            settle().await;

            let message = fx.node("#message");
            fx.dom.type_value(message, "sent once");
            fx.dom.click(&fx.node("#publish")).unwrap();
            // The host resets the form but keeps the dialog open.
            fx.dom.type_value(message, "");

            tokio::time::sleep(Duration::from_millis(300)).await;

            assert_eq!(get_value(&fx.dom, &message), "sent once");
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn rerendered_dialog_is_wired_afresh() {
    init_logging();
    LocalSet::new()
        .run_until(async {
            let fx = Fixture::new(DIALOG);
            assert!(fx.controller.wire_up_publish_modal_if_present());
            let old_root = fx.node("#d");

            fx.dom.detach(old_root).unwrap();
            fx.dom.append_html(fx.node("body"), DIALOG).unwrap();
            let new_root = fx.node("#d");
            assert!(!fx.dom.is_connected(&old_root));

            assert!(fx.controller.wire_up_publish_modal_if_present());
            settle().await;

            assert_eq!(fx.controller.wired_count(), 1);
            assert_eq!(fx.dom.capture_listener_count(new_root), 1);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn topicless_pages_save_globally() {
    init_logging();
    LocalSet::new()
        .run_until(async {
            let dom = SnapshotDom::parse(
                "https://console.cloud.google.com/cloudpubsub/topic/list",
                &format!("<html><body>{DIALOG}</body></html>"),
            );
            let settings = MemorySettings::default();
            let store = Rc::new(MemoryStore::new());
            let controller = DialogController::new(
                dom.clone(),
                MessageMemory::new(store.clone(), &settings),
                TokioScheduler,
                Rc::new(settings),
            );
            assert!(controller.wire_up_publish_modal_if_present());

            let message = dom.find("#message").unwrap();
            dom.type_value(message, "hello");
            dom.click(&dom.find("#publish").unwrap()).unwrap();
            settle().await;

            let saved = store.snapshot();
            assert_eq!(saved.get("gcp_pubsub_last_message:global"), Some(&json!("hello")));
            assert_eq!(saved.len(), 2);
        })
        .await;
}

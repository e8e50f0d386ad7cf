//! Pub/Sub memory engine: DOM heuristics, storage and the runtime that executes core effects.
mod agent;
mod dialog;
mod dom;
mod field;
mod locate;
mod memory;
mod prefill;
mod schedule;
mod snapshot;
mod store;
mod types;

pub use agent::MemoryAgent;
pub use dialog::{DialogController, PublishDialog};
pub use dom::{ClickListener, Dom, DomError, DomEvent, NavigationListener, CLICKABLE_SELECTOR};
pub use field::{get_value, is_content_editable, set_value};
pub use locate::{
    any_input, attribute_row_strategies, component_rows, content_editable_input,
    editor_backing_input, find_add_attribute_button, find_attribute_rows, find_message_input,
    find_publish_button, input_label, is_publish_action, is_publish_trigger, label_paired_rows,
    message_input_strategies, read_attributes, shares_ancestor_within, textarea_input,
    AttributeRow, AttributeRows, Named, RowStrategy, Strategy, DIALOG_ROOT_SELECTOR,
    PAIRING_DEPTH,
};
pub use memory::MessageMemory;
pub use prefill::{fill_empty_rows, Prefiller};
pub use schedule::{
    spawn_abortable, LiveTimerGuard, LiveTimers, LocalTask, PollTimers, Scheduler,
};
#[cfg(not(target_arch = "wasm32"))]
pub use schedule::TokioScheduler;
pub use snapshot::SnapshotDom;
pub use store::{KeyValueStore, MemoryStore, StoreError};
pub use types::{AttributePrefill, AttributeSet, PrefillOutcome};

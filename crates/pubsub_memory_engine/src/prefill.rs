use std::rc::Rc;

use engine_logging::{engine_debug, engine_warn};
use pubsub_memory_core::{MemorySettings, Topic};

use crate::dom::Dom;
use crate::field::{get_value, set_value};
use crate::locate::{find_attribute_rows, AttributeRow};
use crate::memory::MessageMemory;
use crate::schedule::Scheduler;
use crate::store::KeyValueStore;
use crate::types::{AttributePrefill, AttributeSet, PrefillOutcome};

/// Writes remembered values into empty fields only.
pub struct Prefiller<D, S, H> {
    dom: D,
    memory: MessageMemory<S>,
    scheduler: H,
    settings: Rc<MemorySettings>,
}

impl<D: Clone, S, H: Clone> Clone for Prefiller<D, S, H> {
    fn clone(&self) -> Self {
        Self {
            dom: self.dom.clone(),
            memory: self.memory.clone(),
            scheduler: self.scheduler.clone(),
            settings: self.settings.clone(),
        }
    }
}

impl<D, S, H> Prefiller<D, S, H>
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
    ) -> Self {
        Self {
            dom,
            memory,
            scheduler,
            settings,
        }
    }

    /// Fill the message body if it is blank and something is remembered.
    pub async fn ensure_prefill(&self, input: &D::Node, topic: Option<&Topic>) -> PrefillOutcome {
        let last = self.memory.load_last_message(topic).await;
        if last.is_empty() {
            return PrefillOutcome::NothingRemembered;
        }
        if !get_value(&self.dom, input).trim().is_empty() {
            return PrefillOutcome::KeptExisting;
        }
        match set_value(&self.dom, input, &last) {
            Ok(()) => PrefillOutcome::Filled,
            Err(err) => {
                engine_debug!("Message prefill skipped: {}", err);
                PrefillOutcome::Failed
            }
        }
    }

    /// Fill entirely empty attribute rows with remembered pairs, adding rows first when too few exist.
    pub async fn ensure_prefill_attributes(
        &self,
        root: &D::Node,
        topic: Option<&Topic>,
    ) -> AttributePrefill {
        let remembered = self.memory.load_last_attributes(topic).await;
        if remembered.is_empty() {
            return AttributePrefill::NothingRemembered;
        }

        let mut growth_rounds = 0;
        loop {
            let found = find_attribute_rows(&self.dom, root);
            let missing = remembered.len().saturating_sub(found.rows.len());
            let add_button = found.add_button.filter(|_| missing > 0);

            match add_button {
                Some(button) if growth_rounds < self.settings.max_row_growth_rounds => {
                    for _ in 0..missing {
                        if let Err(err) = self.dom.click(&button) {
                            engine_debug!("Add-row click failed: {}", err);
                        }
                    }
                    growth_rounds += 1;
                    self.scheduler
                        .sleep(self.settings.row_retry_delay())
                        .await;
                }
                other => {
                    if other.is_some() {
                        engine_warn!(
                            "Gave up adding attribute rows after {} rounds; filling {} existing rows",
                            growth_rounds,
                            found.rows.len()
                        );
                    }
                    let filled = fill_empty_rows(&self.dom, &found.rows, &remembered);
                    return AttributePrefill::Applied {
                        filled,
                        growth_rounds,
                    };
                }
            }
        }
    }
}

/// Assign remembered pairs, in order, to rows whose key and value are both
/// blank. Returns the number of rows written.
pub fn fill_empty_rows<D: Dom>(
    dom: &D,
    rows: &[AttributeRow<D::Node>],
    remembered: &AttributeSet,
) -> usize {
    let mut pairs = remembered.iter().peekable();
    let mut filled = 0;
    for row in rows {
        if pairs.peek().is_none() {
            break;
        }
        let has_key = !get_value(dom, &row.key).trim().is_empty();
        let has_value = !get_value(dom, &row.value).trim().is_empty();
        if has_key || has_value {
            continue;
        }
        let Some((name, value)) = pairs.next() else {
            break;
        };
        let written =
            set_value(dom, &row.key, name).and_then(|()| set_value(dom, &row.value, value));
        match written {
            Ok(()) => filled += 1,
            Err(err) => engine_debug!("Attribute row prefill skipped: {}", err),
        }
    }
    filled
}

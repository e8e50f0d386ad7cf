use std::time::Duration;

use serde::Deserialize;

/// Tunables for polling, retries and storage naming.
///
/// Every field has a default, so hosts may override any subset from JSON.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MemorySettings {
    pub poll_interval_ms: u64,
    pub poll_timeout_ms: u64,
    pub row_retry_delay_ms: u64,
    pub republish_prefill_delay_ms: u64,
    pub max_row_growth_rounds: u32,
    pub message_namespace: String,
    pub attributes_namespace: String,
    pub modal_param: String,
    pub modal_sentinel: String,
    pub watch_navigation: bool,
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 200,
            poll_timeout_ms: 6_000,
            row_retry_delay_ms: 250,
            republish_prefill_delay_ms: 250,
            max_row_growth_rounds: 20,
            message_namespace: "gcp_pubsub_last_message".to_string(),
            attributes_namespace: "gcp_pubsub_last_attributes".to_string(),
            modal_param: "modal".to_string(),
            modal_sentinel: "publishmessage".to_string(),
            watch_navigation: true,
        }
    }
}

impl MemorySettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }

    pub fn row_retry_delay(&self) -> Duration {
        Duration::from_millis(self.row_retry_delay_ms)
    }

    pub fn republish_prefill_delay(&self) -> Duration {
        Duration::from_millis(self.republish_prefill_delay_ms)
    }
}

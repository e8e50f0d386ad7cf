use pubsub_memory_core::MemorySettings;
use serde_json::Value;

/// Host-supplied overrides on top of the defaults. `null` means "no overrides".
pub fn settings_from_json(overrides: Value) -> Result<MemorySettings, serde_json::Error> {
    if overrides.is_null() {
        return Ok(MemorySettings::default());
    }
    serde_json::from_value(overrides)
}

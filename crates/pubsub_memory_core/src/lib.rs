//! Pub/Sub memory core: topic resolution, URL intent and the pure poll lifecycle state machine.
mod effect;
mod intent;
mod msg;
mod settings;
mod state;
mod topic;
mod update;

pub use effect::Effect;
pub use intent::has_publish_modal_intent;
pub use msg::Msg;
pub use settings::MemorySettings;
pub use state::{AppState, PollEnd, PollPhase, PollSessionId, PollView};
pub use topic::{topic_from_href, topic_from_path, Topic};
pub use update::update;

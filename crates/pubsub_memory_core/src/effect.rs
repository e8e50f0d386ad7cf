use std::time::Duration;

use crate::PollSessionId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Start the interval and safety-timeout timers for a new session.
    ArmPoll {
        session: PollSessionId,
        interval: Duration,
        timeout: Duration,
    },
    /// Cancel both timers of a session.
    CancelPoll { session: PollSessionId },
    /// Look for the publish dialog and wire it if present.
    AttemptWire { session: PollSessionId },
}

use crate::PollSessionId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// The page location changed (or the script just started) and now reads `href`.
    Navigated { href: String },
    /// A page-level "Publish message" trigger was clicked.
    PublishTriggerClicked,
    /// Interval timer fired for a poll session.
    PollTick { session: PollSessionId },
    /// Result of one attempt to find and wire the publish dialog.
    WireAttempted { session: PollSessionId, wired: bool },
    /// The safety timeout of a poll session elapsed.
    PollTimedOut { session: PollSessionId },
}

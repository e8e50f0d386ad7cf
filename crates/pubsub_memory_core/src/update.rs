use crate::{has_publish_modal_intent, AppState, Effect, Msg, PollEnd};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::Navigated { href } => {
            let intent = has_publish_modal_intent(&href, state.settings());
            restart_poll(&mut state, intent, false)
        }
        Msg::PublishTriggerClicked => restart_poll(&mut state, true, true),
        Msg::PollTick { session } => {
            if state.is_active(session) {
                state.record_tick();
                vec![Effect::AttemptWire { session }]
            } else {
                Vec::new()
            }
        }
        Msg::WireAttempted { session, wired } => {
            if wired && state.is_active(session) {
                stop_poll(&mut state, PollEnd::Wired)
            } else {
                Vec::new()
            }
        }
        Msg::PollTimedOut { session } => {
            if state.is_active(session) {
                stop_poll(&mut state, PollEnd::TimedOut)
            } else {
                Vec::new()
            }
        }
    };

    (state, effects)
}

// Any live session is cancelled first, even when the new trigger does not proceed.
fn restart_poll(state: &mut AppState, proceed: bool, forced: bool) -> Vec<Effect> {
    let mut effects = stop_poll(state, PollEnd::Superseded);
    if proceed {
        let session = state.begin_session(forced);
        effects.push(Effect::ArmPoll {
            session,
            interval: state.settings().poll_interval(),
            timeout: state.settings().poll_timeout(),
        });
    }
    effects
}

fn stop_poll(state: &mut AppState, end: PollEnd) -> Vec<Effect> {
    state
        .end_session(end)
        .map(|session| vec![Effect::CancelPoll { session }])
        .unwrap_or_default()
}

use crate::MemorySettings;

pub type PollSessionId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollPhase {
    #[default]
    Idle,
    Polling {
        session: PollSessionId,
        ticks: u32,
        forced: bool,
    },
}

/// How a poll session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollEnd {
    Wired,
    TimedOut,
    /// A newer trigger cancelled it.
    Superseded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollView {
    pub phase: PollPhase,
    pub sessions_started: u64,
    pub last_end: Option<(PollSessionId, PollEnd)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    settings: MemorySettings,
    next_session: PollSessionId,
    phase: PollPhase,
    last_end: Option<(PollSessionId, PollEnd)>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: MemorySettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn settings(&self) -> &MemorySettings {
        &self.settings
    }

    pub fn view(&self) -> PollView {
        PollView {
            phase: self.phase,
            sessions_started: self.next_session,
            last_end: self.last_end,
        }
    }

    pub fn active_session(&self) -> Option<PollSessionId> {
        match self.phase {
            PollPhase::Idle => None,
            PollPhase::Polling { session, .. } => Some(session),
        }
    }

    pub(crate) fn is_active(&self, session: PollSessionId) -> bool {
        self.active_session() == Some(session)
    }

    pub(crate) fn begin_session(&mut self, forced: bool) -> PollSessionId {
        self.next_session += 1;
        let session = self.next_session;
        self.phase = PollPhase::Polling {
            session,
            ticks: 0,
            forced,
        };
        session
    }

    pub(crate) fn record_tick(&mut self) {
        if let PollPhase::Polling { ticks, .. } = &mut self.phase {
            *ticks = ticks.saturating_add(1);
        }
    }

    /// Ends the active session, if any, and returns its id.
    pub(crate) fn end_session(&mut self, end: PollEnd) -> Option<PollSessionId> {
        let session = self.active_session()?;
        self.phase = PollPhase::Idle;
        self.last_end = Some((session, end));
        Some(session)
    }
}

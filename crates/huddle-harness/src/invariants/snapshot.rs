//! Observable state snapshots for invariant checking.
//!
//! Snapshots capture the observable state of the system at a point in time.
//! Invariants operate on snapshots rather than live state to ensure
//! consistent, atomic checks.

use std::collections::BTreeMap;

use huddle_app::SessionView;
use huddle_core::{EngineSessionId, MeetingEventKind, MeetingStatus, RoomHandle, SessionState};

/// Snapshot of the entire system state.
#[derive(Debug, Clone, Default)]
pub struct SystemSnapshot {
    /// Session and runtime state.
    pub session: SessionSnapshot,
    /// Every engine created so far, in creation order.
    pub engines: Vec<EngineSnapshot>,
}

impl SystemSnapshot {
    /// Snapshot of an idle system with no engines.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Snapshot with the given session state and no engines.
    pub fn with_session(session: SessionSnapshot) -> Self {
        Self { session, engines: Vec::new() }
    }

    /// Add an engine snapshot.
    pub fn add_engine(&mut self, engine: EngineSnapshot) {
        self.engines.push(engine);
    }
}

/// Snapshot of the session controller and the runtime around it.
#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
    /// Session state.
    pub state: SessionState,
    /// Room the session holds.
    pub room: Option<RoomHandle>,
    /// Engine the session holds.
    pub engine: Option<EngineSessionId>,
    /// Engine the runtime owns.
    pub live_engine: Option<EngineSessionId>,
    /// Page path as the session last wrote or read it.
    pub page_path: String,
    /// Path actually shown by the page.
    pub navigation_path: String,
    /// Path that encodes `room`.
    pub expected_path: String,
    /// View derived from the session right now.
    pub view: SessionView,
    /// View last published to observers.
    pub published: SessionView,
}

/// Snapshot of one engine.
#[derive(Debug, Clone)]
pub struct EngineSnapshot {
    /// Engine session.
    pub session: EngineSessionId,
    /// Reported meeting status.
    pub status: MeetingStatus,
    /// Attached listeners per event kind.
    pub listeners: BTreeMap<MeetingEventKind, usize>,
    /// Whether the engine has been destroyed.
    pub destroyed: bool,
}

impl EngineSnapshot {
    /// Fresh engine with no listeners.
    pub fn new(session: EngineSessionId) -> Self {
        Self {
            session,
            status: MeetingStatus::New,
            listeners: BTreeMap::new(),
            destroyed: false,
        }
    }

    /// Set listener counts.
    #[must_use]
    pub fn with_listeners(mut self, listeners: impl IntoIterator<Item = (MeetingEventKind, usize)>) -> Self {
        self.listeners.extend(listeners);
        self
    }

    /// Mark destroyed.
    #[must_use]
    pub fn destroyed(mut self) -> Self {
        self.destroyed = true;
        self
    }

    /// Attached listeners for `kind`.
    pub fn listener_count(&self, kind: MeetingEventKind) -> usize {
        self.listeners.get(&kind).copied().unwrap_or(0)
    }

    /// Total attached listeners.
    pub fn total_listeners(&self) -> usize {
        self.listeners.values().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_snapshot() {
        let snapshot = SystemSnapshot::empty();
        assert!(snapshot.engines.is_empty());
        assert_eq!(snapshot.session.state, SessionState::Idle);
    }

    #[test]
    fn engine_snapshot_builder() {
        let engine = EngineSnapshot::new(EngineSessionId::FIRST)
            .with_listeners([(MeetingEventKind::Joined, 1), (MeetingEventKind::Left, 2)])
            .destroyed();

        assert_eq!(engine.listener_count(MeetingEventKind::Left), 2);
        assert_eq!(engine.listener_count(MeetingEventKind::Error), 0);
        assert_eq!(engine.total_listeners(), 3);
        assert!(engine.destroyed);
    }
}

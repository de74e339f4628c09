//! Standard invariant checks.
//!
//! These invariants capture behavioral properties that must always hold
//! between two runtime inputs.

use huddle_core::MeetingEventKind;

use super::{Invariant, InvariantResult, SystemSnapshot, Violation};

/// Engine and room are held exactly in the states that need them.
pub struct ResourcesMatchState;

impl Invariant for ResourcesMatchState {
    fn name(&self) -> &'static str {
        "resources_match_state"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        let session = &state.session;
        if session.state.has_engine() != session.engine.is_some() {
            return Err(Violation {
                invariant: self.name(),
                message: format!("state {} with engine {:?}", session.state, session.engine),
            });
        }
        if session.state.has_room() != session.room.is_some() {
            return Err(Violation {
                invariant: self.name(),
                message: format!("state {} with room {:?}", session.state, session.room),
            });
        }
        Ok(())
    }
}

/// The runtime owns exactly the engine the session believes is live.
pub struct RuntimeOwnsSessionEngine;

impl Invariant for RuntimeOwnsSessionEngine {
    fn name(&self) -> &'static str {
        "runtime_owns_session_engine"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        let session = &state.session;
        if session.live_engine != session.engine {
            return Err(Violation {
                invariant: self.name(),
                message: format!(
                    "session holds {:?} but runtime owns {:?}",
                    session.engine, session.live_engine
                ),
            });
        }
        Ok(())
    }
}

/// The live engine has exactly one listener per event kind. Every other
/// engine has none.
pub struct SingleListenerPerKind;

impl Invariant for SingleListenerPerKind {
    fn name(&self) -> &'static str {
        "single_listener_per_kind"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for engine in &state.engines {
            let expected = usize::from(Some(engine.session) == state.session.live_engine);
            for kind in MeetingEventKind::ALL {
                let count = engine.listener_count(kind);
                if count != expected {
                    return Err(Violation {
                        invariant: self.name(),
                        message: format!(
                            "{} has {count} {kind} listeners, expected {expected}",
                            engine.session
                        ),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Every engine except the live one has been destroyed.
pub struct RetiredEnginesDestroyed;

impl Invariant for RetiredEnginesDestroyed {
    fn name(&self) -> &'static str {
        "retired_engines_destroyed"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for engine in &state.engines {
            let live = Some(engine.session) == state.session.live_engine;
            if live == engine.destroyed {
                let what = if live { "live engine destroyed" } else { "retired engine leaked" };
                return Err(Violation {
                    invariant: self.name(),
                    message: format!("{what}: {}", engine.session),
                });
            }
        }
        Ok(())
    }
}

/// The page shows the path the session wrote, and that path encodes the
/// active room.
pub struct PagePathInSync;

impl Invariant for PagePathInSync {
    fn name(&self) -> &'static str {
        "page_path_in_sync"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        let session = &state.session;
        if session.navigation_path != session.page_path {
            return Err(Violation {
                invariant: self.name(),
                message: format!(
                    "page shows {:?} but session wrote {:?}",
                    session.navigation_path, session.page_path
                ),
            });
        }
        if session.room.is_some() && session.page_path != session.expected_path {
            return Err(Violation {
                invariant: self.name(),
                message: format!(
                    "page path {:?} does not encode room (expected {:?})",
                    session.page_path, session.expected_path
                ),
            });
        }
        Ok(())
    }
}

/// Observers have been sent the current view.
pub struct PublishedViewCurrent;

impl Invariant for PublishedViewCurrent {
    fn name(&self) -> &'static str {
        "published_view_current"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        let session = &state.session;
        if session.view != session.published {
            return Err(Violation {
                invariant: self.name(),
                message: format!(
                    "published {:?} but session is {:?}",
                    session.published, session.view
                ),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use huddle_core::{EngineSessionId, RoomHandle, SessionState};

    use super::*;
    use crate::invariants::{EngineSnapshot, SessionSnapshot};

    fn joined() -> SystemSnapshot {
        let engine = EngineSessionId::FIRST;
        let mut snapshot = SystemSnapshot::with_session(SessionSnapshot {
            state: SessionState::Joined,
            room: RoomHandle::parse("abc").ok(),
            engine: Some(engine),
            live_engine: Some(engine),
            page_path: "/abc".into(),
            navigation_path: "/abc".into(),
            expected_path: "/abc".into(),
            ..Default::default()
        });
        snapshot.add_engine(
            EngineSnapshot::new(engine)
                .with_listeners(MeetingEventKind::ALL.into_iter().map(|kind| (kind, 1))),
        );
        snapshot
    }

    #[test]
    fn consistent_call_passes() {
        let snapshot = joined();
        assert!(ResourcesMatchState.check(&snapshot).is_ok());
        assert!(RuntimeOwnsSessionEngine.check(&snapshot).is_ok());
        assert!(SingleListenerPerKind.check(&snapshot).is_ok());
        assert!(RetiredEnginesDestroyed.check(&snapshot).is_ok());
        assert!(PagePathInSync.check(&snapshot).is_ok());
    }

    #[test]
    fn engine_without_state_detected() {
        let mut snapshot = joined();
        snapshot.session.state = SessionState::Idle;
        assert!(ResourcesMatchState.check(&snapshot).is_err());
    }

    #[test]
    fn duplicate_listener_detected() {
        let mut snapshot = joined();
        snapshot.engines[0].listeners.insert(MeetingEventKind::Error, 2);

        let violation = SingleListenerPerKind.check(&snapshot).unwrap_err();
        assert!(violation.message.contains("2 error listeners"));
    }

    #[test]
    fn leaked_engine_detected() {
        let mut snapshot = joined();
        snapshot.add_engine(EngineSnapshot::new(EngineSessionId::new(7)));
        assert!(RetiredEnginesDestroyed.check(&snapshot).is_err());
    }

    #[test]
    fn stale_page_path_detected() {
        let mut snapshot = joined();
        snapshot.session.navigation_path = "/".into();
        assert!(PagePathInSync.check(&snapshot).is_err());
    }
}

//! Property-based tests for the call session state machine.
//!
//! Events arrive in arbitrary order, including duplicates, results for
//! superseded requests and notifications from engines that are long gone. The
//! session must stay internally consistent through all of them.

use std::collections::HashSet;

use huddle_app::{CallSession, SessionAction, SessionConfig, SessionEvent};
use huddle_core::{
    EngineSessionId, MeetingEvent, MeetingStatus, ProvisionError, ProvisionRequestId,
    RoomAddressCodec, RoomHandle, SessionState,
};
use proptest::prelude::*;

fn status_strategy() -> impl Strategy<Value = MeetingStatus> {
    prop_oneof![
        Just(MeetingStatus::New),
        Just(MeetingStatus::Joining),
        Just(MeetingStatus::Joined),
        Just(MeetingStatus::Leaving),
        Just(MeetingStatus::Left),
        Just(MeetingStatus::Error),
    ]
}

fn trigger_strategy() -> impl Strategy<Value = Option<MeetingEvent>> {
    prop::option::of(prop_oneof![
        Just(MeetingEvent::Joined),
        Just(MeetingEvent::Left),
        "[a-z ]{0,12}".prop_map(|message| MeetingEvent::Error { message }),
    ])
}

/// Generate random session events, referencing a small pool of ids so stale
/// and live ids both come up often.
fn event_strategy() -> impl Strategy<Value = SessionEvent> {
    let session = (1u64..5).prop_map(EngineSessionId::new);
    let request = (1u64..5).prop_map(ProvisionRequestId::new);
    let result = prop_oneof![
        3 => "[a-z]{1,6}".prop_map(|id| RoomHandle::parse(&id).map_err(ProvisionError::from)),
        1 => (400u16..600).prop_map(|status| Err::<RoomHandle, _>(ProvisionError::Rejected { status })),
    ];

    prop_oneof![
        2 => Just(SessionEvent::StartCall),
        2 => Just(SessionEvent::LeaveCall),
        2 => (request, result)
            .prop_map(|(request, result)| SessionEvent::RoomProvisioned { request, result }),
        4 => (session.clone(), trigger_strategy(), status_strategy()).prop_map(
            |(session, trigger, status)| SessionEvent::MeetingStateChanged {
                session,
                trigger,
                status,
            }
        ),
        1 => session.clone().prop_map(|session| SessionEvent::AppMessage {
            session,
            from_id: "peer".into(),
            data: "hello".into(),
        }),
        2 => session.prop_map(|session| SessionEvent::EngineDestroyed { session }),
    ]
}

fn assert_consistent(call: &CallSession, codec: &RoomAddressCodec) {
    let state = call.state();
    assert_eq!(state.has_engine(), call.engine().is_some(), "engine presence in {state}");
    assert_eq!(state.has_room(), call.room().is_some(), "room presence in {state}");
    assert_eq!(call.page_path(), codec.path_for(call.room()), "page path in {state}");
    assert!(call.view().error.is_none() || state == SessionState::Error, "error text in {state}");
}

proptest! {
    /// Engine and room presence always match the state, and the page path
    /// always encodes the current room.
    #[test]
    fn prop_session_stays_consistent(events in prop::collection::vec(event_strategy(), 0..60)) {
        let config = SessionConfig::default();
        let codec = config.codec.clone();
        let mut call = CallSession::new(config);
        let _ = call.start("/");
        assert_consistent(&call, &codec);

        for event in events {
            let _ = call.handle(event);
            assert_consistent(&call, &codec);
        }
    }

    /// The state only ever moves along state machine edges.
    #[test]
    fn prop_transitions_follow_edges(events in prop::collection::vec(event_strategy(), 0..60)) {
        let mut call = CallSession::new(SessionConfig::default());
        let _ = call.start("/");

        for event in events {
            let before = call.state();
            let _ = call.handle(event);
            let after = call.state();
            prop_assert!(
                before == after || before.can_transition_to(after),
                "illegal transition {} -> {}", before, after
            );
        }
    }

    /// Engine ids are never reused, every engine is destroyed at most once,
    /// and every action targets the engine the session currently owns.
    #[test]
    fn prop_engine_lifecycle(events in prop::collection::vec(event_strategy(), 0..60)) {
        let mut call = CallSession::new(SessionConfig::default());
        let _ = call.start("/");

        let mut created: Vec<EngineSessionId> = Vec::new();
        let mut destroyed: HashSet<EngineSessionId> = HashSet::new();

        for event in events {
            for action in call.handle(event) {
                match &action {
                    SessionAction::CreateEngine { session } => {
                        prop_assert!(created.last().is_none_or(|last| session > last));
                        created.push(*session);
                    },
                    SessionAction::DestroyEngine { session } => {
                        prop_assert!(destroyed.insert(*session), "{} destroyed twice", session);
                    },
                    _ => {},
                }
                if let Some(session) = action.engine_session() {
                    prop_assert_eq!(Some(session), call.engine());
                }
            }
        }
    }

    /// Input tagged with an engine the session does not own never changes
    /// anything.
    #[test]
    fn prop_stale_engine_input_is_inert(
        events in prop::collection::vec(event_strategy(), 0..40),
        trigger in trigger_strategy(),
        status in status_strategy(),
    ) {
        let mut call = CallSession::new(SessionConfig::default());
        let _ = call.start("/");
        for event in events {
            let _ = call.handle(event);
        }

        let stale = EngineSessionId::new(call.engine().map_or(99, |live| live.get() + 100));
        let before = call.view();

        let actions = call.handle(SessionEvent::MeetingStateChanged { session: stale, trigger, status });
        prop_assert!(actions.is_empty());
        let actions = call.handle(SessionEvent::EngineDestroyed { session: stale });
        prop_assert!(actions.is_empty());

        prop_assert_eq!(before, call.view());
    }
}

#[test]
fn deep_link_with_base_joins_resolved_room() {
    let codec = RoomAddressCodec::with_base("https://team.example.com").unwrap();
    let mut call = CallSession::new(SessionConfig { codec });

    let actions = call.start("/standup");

    let join = actions.iter().find_map(|action| match action {
        SessionAction::JoinEngine { room, .. } => Some(room.url().to_string()),
        _ => None,
    });
    assert_eq!(join.as_deref(), Some("https://team.example.com/standup"));
    assert_eq!(call.page_path(), "/standup");
}

#[test]
fn start_ignores_paths_without_room() {
    let mut call = CallSession::new(SessionConfig::default());

    assert_eq!(call.start("/"), vec![SessionAction::Render]);
    assert_eq!(call.state(), SessionState::Idle);
}

//! Fuzz target for the call session state machine
//!
//! Ensure the session stays consistent under arbitrary event interleavings
//! (HIGH priority)
//!
//! # Strategy
//!
//! - Environment model: request and engine ids are taken from the actions the
//!   session emitted, so both live and superseded ids come up
//! - Unknown ids: indexes past the issued ids produce ids never handed out
//! - Provisioning: rooms, backend rejections and unusable addresses
//! - Engine notices: every status paired with every trigger
//!
//! # Invariants
//!
//! - Engine and room presence match the session state
//! - The page path encodes the current room while there is one
//! - Error text only exists in the error state
//! - Engine ids strictly increase and each engine is destroyed at most once
//! - Every emitted engine action targets the engine the session owns
//! - NEVER panic on out-of-order input

#![no_main]

use std::collections::HashSet;

use arbitrary::Arbitrary;
use huddle_app::{CallSession, SessionAction, SessionConfig, SessionEvent};
use huddle_core::{
    EngineSessionId, MeetingEvent, MeetingStatus, ProvisionError, ProvisionRequestId,
    RoomAddressCodec, RoomHandle, SessionState,
};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Clone, Arbitrary)]
struct SessionInput {
    start: PathChoice,
    with_base: bool,
    ops: Vec<SessionOp>,
}

#[derive(Debug, Clone, Arbitrary)]
enum PathChoice {
    Root,
    Room(u8),
    Nested,
    Raw(String),
}

#[derive(Debug, Clone, Arbitrary)]
enum SessionOp {
    StartCall,
    LeaveCall,
    Provision { request: u8, outcome: ProvisionChoice },
    StateChanged { engine: u8, trigger: TriggerChoice, status: StatusChoice },
    AppMessage { engine: u8, data: String },
    Destroyed { engine: u8 },
}

#[derive(Debug, Clone, Arbitrary)]
enum ProvisionChoice {
    Room(u8),
    Rejected(u16),
    Transport,
    BadAddress,
}

#[derive(Debug, Clone, Arbitrary)]
enum TriggerChoice {
    None,
    Joined,
    Left,
    Error(String),
}

#[derive(Debug, Clone, Copy, Arbitrary)]
enum StatusChoice {
    New,
    Joining,
    Joined,
    Leaving,
    Left,
    Error,
}

/// Ids the session has handed out so far.
#[derive(Default)]
struct Environment {
    requests: Vec<ProvisionRequestId>,
    engines: Vec<EngineSessionId>,
    destroyed: HashSet<EngineSessionId>,
}

impl Environment {
    fn request(&self, index: u8) -> ProvisionRequestId {
        match self.requests.get(usize::from(index)) {
            Some(request) => *request,
            None => ProvisionRequestId::new(1000 + u64::from(index)),
        }
    }

    fn engine(&self, index: u8) -> EngineSessionId {
        match self.engines.get(usize::from(index)) {
            Some(engine) => *engine,
            None => EngineSessionId::new(1000 + u64::from(index)),
        }
    }

    fn observe(&mut self, call: &CallSession, actions: &[SessionAction]) {
        let mut last_path = None;
        for action in actions {
            match action {
                SessionAction::ProvisionRoom { request } => self.requests.push(*request),
                SessionAction::CreateEngine { session } => {
                    if let Some(last) = self.engines.last() {
                        assert!(session > last, "engine id {session} reused after {last}");
                    }
                    self.engines.push(*session);
                },
                SessionAction::DestroyEngine { session } => {
                    assert!(self.destroyed.insert(*session), "engine {session} destroyed twice");
                },
                SessionAction::ReplacePath { path } => last_path = Some(path.clone()),
                _ => {},
            }

            if let Some(session) = action.engine_session() {
                assert_eq!(Some(session), call.engine(), "action {action:?} targets a stale engine");
            }
        }

        if let Some(path) = last_path {
            assert_eq!(path, call.page_path());
        }
    }
}

fuzz_target!(|input: SessionInput| {
    let codec = if input.with_base {
        match RoomAddressCodec::with_base("https://rooms.example.com") {
            Ok(codec) => codec,
            Err(_) => return,
        }
    } else {
        RoomAddressCodec::new()
    };

    let mut call = CallSession::new(SessionConfig { codec: codec.clone() });
    let mut env = Environment::default();

    let path = match &input.start {
        PathChoice::Root => "/".to_string(),
        PathChoice::Room(n) => format!("/room{n}"),
        PathChoice::Nested => "/a/b".to_string(),
        PathChoice::Raw(raw) => raw.clone(),
    };
    let actions = call.start(&path);
    env.observe(&call, &actions);
    check_consistent(&call, &codec, &path);

    for op in input.ops {
        let event = match op {
            SessionOp::StartCall => SessionEvent::StartCall,
            SessionOp::LeaveCall => SessionEvent::LeaveCall,
            SessionOp::Provision { request, outcome } => SessionEvent::RoomProvisioned {
                request: env.request(request),
                result: provision_result(&outcome),
            },
            SessionOp::StateChanged { engine, trigger, status } => {
                SessionEvent::MeetingStateChanged {
                    session: env.engine(engine),
                    trigger: meeting_trigger(trigger),
                    status: meeting_status(status),
                }
            },
            SessionOp::AppMessage { engine, data } => SessionEvent::AppMessage {
                session: env.engine(engine),
                from_id: "peer".to_string(),
                data,
            },
            SessionOp::Destroyed { engine } => {
                SessionEvent::EngineDestroyed { session: env.engine(engine) }
            },
        };

        let before = call.state();
        let actions = call.handle(event);
        let after = call.state();
        assert!(before == after || before.can_transition_to(after), "illegal {before} -> {after}");

        env.observe(&call, &actions);
        check_consistent(&call, &codec, &path);
    }
});

/// `opened_at` is the path the page was opened at. It survives untouched
/// until the session first joins a room.
fn check_consistent(call: &CallSession, codec: &RoomAddressCodec, opened_at: &str) {
    let state = call.state();
    assert_eq!(state.has_engine(), call.engine().is_some(), "engine presence in {state}");
    assert_eq!(state.has_room(), call.room().is_some(), "room presence in {state}");
    if call.room().is_some() {
        assert_eq!(call.page_path(), codec.path_for(call.room()), "page path in {state}");
    } else {
        let path = call.page_path();
        assert!(path == codec.path_for(None) || path == opened_at, "page path {path} in {state}");
    }
    if state != SessionState::Error {
        assert!(call.view().error.is_none(), "error text in {state}");
    }
}

fn provision_result(choice: &ProvisionChoice) -> Result<RoomHandle, ProvisionError> {
    match choice {
        ProvisionChoice::Room(n) => RoomHandle::parse(&format!("room{n}")).map_err(ProvisionError::from),
        ProvisionChoice::Rejected(status) => Err(ProvisionError::Rejected { status: *status }),
        ProvisionChoice::Transport => Err(ProvisionError::Transport("connection reset".to_string())),
        ProvisionChoice::BadAddress => RoomHandle::parse("   ").map_err(ProvisionError::from),
    }
}

fn meeting_trigger(choice: TriggerChoice) -> Option<MeetingEvent> {
    match choice {
        TriggerChoice::None => None,
        TriggerChoice::Joined => Some(MeetingEvent::Joined),
        TriggerChoice::Left => Some(MeetingEvent::Left),
        TriggerChoice::Error(message) => Some(MeetingEvent::Error { message }),
    }
}

fn meeting_status(choice: StatusChoice) -> MeetingStatus {
    match choice {
        StatusChoice::New => MeetingStatus::New,
        StatusChoice::Joining => MeetingStatus::Joining,
        StatusChoice::Joined => MeetingStatus::Joined,
        StatusChoice::Leaving => MeetingStatus::Leaving,
        StatusChoice::Left => MeetingStatus::Left,
        StatusChoice::Error => MeetingStatus::Error,
    }
}

//! Call session state machine.
//!
//! This module defines [`CallSession`], which owns the lifecycle of a call
//! completely decoupled from the engine, the room backend and the page
//! address.
//!
//! This is a pure state machine: it consumes [`crate::SessionEvent`] inputs
//! and produces [`crate::SessionAction`] instructions for the runtime to
//! execute. Failures never escape as errors; they become state values or are
//! logged and ignored.
//!
//! # Responsibilities
//!
//! - Moves [`SessionState`] along validated edges only.
//! - Allocates engine session ids and ignores input from engines it no longer
//!   owns.
//! - Re-derives the lifecycle from the engine's reported status rather than
//!   from event payloads.
//! - Keeps the page path in sync with the active room.

use huddle_core::{
    EngineSessionId, MeetingEvent, MeetingStatus, ProvisionError, ProvisionRequestId,
    RoomAddressCodec, RoomHandle, SessionError, SessionState,
};

use crate::{SessionAction, SessionEvent, SessionView};

/// Session configuration.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    /// Mapping between rooms and page paths.
    pub codec: RoomAddressCodec,
}

/// Call session state machine.
///
/// Pure state machine that processes events and produces actions.
/// No I/O dependencies - fully testable in simulation.
#[derive(Debug, Clone)]
pub struct CallSession {
    /// Lifecycle state.
    state: SessionState,
    /// Configuration.
    config: SessionConfig,
    /// Active room. `None` outside a call.
    room: Option<RoomHandle>,
    /// Live engine. `None` outside a call.
    engine: Option<EngineSessionId>,
    /// Id for the next engine.
    next_engine: EngineSessionId,
    /// Outstanding provisioning request while creating.
    pending_request: Option<ProvisionRequestId>,
    /// Id for the next provisioning request.
    next_request: u64,
    /// Destroy has been requested for the live engine.
    tearing_down: bool,
    /// Page path as last read or written.
    page_path: String,
    /// Error reported by the engine while in `Error`.
    error: Option<String>,
}

impl CallSession {
    /// Create an idle session.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            state: SessionState::Idle,
            config,
            room: None,
            engine: None,
            next_engine: EngineSessionId::FIRST,
            pending_request: None,
            next_request: 1,
            tearing_down: false,
            page_path: huddle_core::ROOT_PATH.to_string(),
            error: None,
        }
    }

    /// Start the session on a page at `page_path`.
    ///
    /// If the path encodes a room, joining starts immediately.
    pub fn start(&mut self, page_path: &str) -> Vec<SessionAction> {
        let result = self.handle_start(page_path);
        self.settle(result)
    }

    /// Start a new call in a freshly provisioned room.
    pub fn start_call(&mut self) -> Vec<SessionAction> {
        let result = self.handle_start_call();
        self.settle(result)
    }

    /// Leave the current call.
    ///
    /// Leaves gracefully from `Joined`. From `Error` the engine is destroyed
    /// without a graceful leave.
    pub fn leave_call(&mut self) -> Vec<SessionAction> {
        let result = self.handle_leave_call();
        self.settle(result)
    }

    /// Process an event and return actions.
    pub fn handle(&mut self, event: SessionEvent) -> Vec<SessionAction> {
        let result = match event {
            SessionEvent::StartCall => self.handle_start_call(),
            SessionEvent::LeaveCall => self.handle_leave_call(),
            SessionEvent::RoomProvisioned { request, result } => {
                self.handle_provisioned(request, result)
            },
            SessionEvent::MeetingStateChanged { session, trigger, status } => {
                self.handle_meeting_state(session, trigger, status)
            },
            SessionEvent::AppMessage { session, from_id, data } => {
                self.handle_app_message(session, &from_id, &data)
            },
            SessionEvent::EngineDestroyed { session } => self.handle_engine_destroyed(session),
        };
        self.settle(result)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Active room. `None` outside a call.
    pub fn room(&self) -> Option<&RoomHandle> {
        self.room.as_ref()
    }

    /// Live engine session. `None` outside a call.
    pub fn engine(&self) -> Option<EngineSessionId> {
        self.engine
    }

    /// Page path as last read or written.
    pub fn page_path(&self) -> &str {
        &self.page_path
    }

    /// Whether destroy has been requested for the live engine.
    pub fn is_tearing_down(&self) -> bool {
        self.tearing_down
    }

    /// Session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Snapshot for the UI.
    pub fn view(&self) -> SessionView {
        SessionView {
            state: self.state,
            room: self.room.clone(),
            engine: self.engine,
            error: self.error.clone(),
        }
    }

    fn settle(&self, result: Result<Vec<SessionAction>, SessionError>) -> Vec<SessionAction> {
        match result {
            Ok(actions) => actions,
            Err(err @ SessionError::InvalidTransition { .. }) => {
                tracing::warn!(%err, "rejected session transition");
                Vec::new()
            },
            Err(err) => {
                tracing::debug!(%err, "ignoring session input");
                Vec::new()
            },
        }
    }

    fn handle_start(&mut self, page_path: &str) -> Result<Vec<SessionAction>, SessionError> {
        if self.state != SessionState::Idle || self.engine.is_some() {
            return Err(SessionError::ActionDisabled { state: self.state, operation: "start" });
        }

        self.page_path = page_path.to_string();
        match self.config.codec.room_from_path(page_path) {
            Some(room) => {
                tracing::info!(%room, "joining room from page address");
                self.begin_joining(room)
            },
            None => Ok(vec![SessionAction::Render]),
        }
    }

    fn handle_start_call(&mut self) -> Result<Vec<SessionAction>, SessionError> {
        if !self.state.can_start() {
            return Err(SessionError::ActionDisabled { state: self.state, operation: "start call" });
        }

        self.transition(SessionState::Creating)?;

        let request = ProvisionRequestId::new(self.next_request);
        self.next_request += 1;
        self.pending_request = Some(request);

        Ok(vec![SessionAction::ProvisionRoom { request }, SessionAction::Render])
    }

    fn handle_leave_call(&mut self) -> Result<Vec<SessionAction>, SessionError> {
        let disabled = SessionError::ActionDisabled { state: self.state, operation: "leave call" };
        let Some(session) = self.engine else {
            return Err(disabled);
        };
        if self.tearing_down {
            return Err(disabled);
        }

        match self.state {
            SessionState::Joined => {
                self.transition(SessionState::Leaving)?;
                Ok(vec![SessionAction::LeaveEngine { session }, SessionAction::Render])
            },
            SessionState::Error => {
                tracing::info!(%session, "destroying failed engine without leaving");
                Ok(self.begin_teardown(session))
            },
            _ => Err(disabled),
        }
    }

    fn handle_provisioned(
        &mut self,
        request: ProvisionRequestId,
        result: Result<RoomHandle, ProvisionError>,
    ) -> Result<Vec<SessionAction>, SessionError> {
        if self.state != SessionState::Creating || self.pending_request != Some(request) {
            return Err(SessionError::StaleRequest { request });
        }
        self.pending_request = None;

        match result {
            Ok(room) => {
                tracing::info!(%request, %room, "room created");
                self.begin_joining(room)
            },
            Err(err) => {
                tracing::warn!(%request, %err, transient = err.is_transient(), "Error creating room");
                // No room was ever assigned, so the page address stays as is.
                self.transition(SessionState::Idle)?;
                Ok(vec![SessionAction::Render])
            },
        }
    }

    fn handle_meeting_state(
        &mut self,
        session: EngineSessionId,
        trigger: Option<MeetingEvent>,
        status: MeetingStatus,
    ) -> Result<Vec<SessionAction>, SessionError> {
        self.ensure_live(session)?;

        if let Some(trigger) = &trigger {
            tracing::info!(%session, event = %trigger.kind(), %status, "engine event");
        }

        match status {
            MeetingStatus::Joined if self.state == SessionState::Joining => {
                self.transition(SessionState::Joined)?;
                Ok(vec![SessionAction::Render])
            },
            MeetingStatus::Left
                if !self.tearing_down
                    && matches!(
                        self.state,
                        SessionState::Joining | SessionState::Joined | SessionState::Leaving
                    ) =>
            {
                Ok(self.begin_teardown(session))
            },
            MeetingStatus::Error
                if matches!(
                    self.state,
                    SessionState::Joining | SessionState::Joined | SessionState::Leaving
                ) =>
            {
                self.transition(SessionState::Error)?;
                self.error = match trigger {
                    Some(MeetingEvent::Error { message }) => Some(message),
                    _ => None,
                };
                Ok(vec![SessionAction::Render])
            },
            _ => Ok(Vec::new()),
        }
    }

    fn handle_app_message(
        &mut self,
        session: EngineSessionId,
        from_id: &str,
        data: &str,
    ) -> Result<Vec<SessionAction>, SessionError> {
        self.ensure_live(session)?;
        tracing::info!(%session, from_id, data, "received app message");
        Ok(Vec::new())
    }

    fn handle_engine_destroyed(
        &mut self,
        session: EngineSessionId,
    ) -> Result<Vec<SessionAction>, SessionError> {
        self.ensure_live(session)?;

        self.transition(SessionState::Idle)?;
        self.engine = None;
        self.room = None;
        self.tearing_down = false;
        self.error = None;
        tracing::info!(%session, "engine destroyed");

        let mut actions: Vec<_> = self.sync_path().into_iter().collect();
        actions.push(SessionAction::Render);
        Ok(actions)
    }

    /// Create an engine for `room` and start joining it.
    fn begin_joining(&mut self, room: RoomHandle) -> Result<Vec<SessionAction>, SessionError> {
        self.transition(SessionState::Joining)?;

        let session = self.next_engine;
        self.next_engine = session.next();
        self.engine = Some(session);
        self.room = Some(room.clone());

        let mut actions = vec![
            SessionAction::CreateEngine { session },
            SessionAction::JoinEngine { session, room },
            SessionAction::SubscribeEngine { session },
        ];
        actions.extend(self.sync_path());
        actions.push(SessionAction::Render);
        Ok(actions)
    }

    /// Detach listeners and destroy the live engine. State is reset once the
    /// runtime reports the engine destroyed.
    fn begin_teardown(&mut self, session: EngineSessionId) -> Vec<SessionAction> {
        self.tearing_down = true;
        vec![SessionAction::UnsubscribeEngine { session }, SessionAction::DestroyEngine { session }]
    }

    fn ensure_live(&self, session: EngineSessionId) -> Result<(), SessionError> {
        if self.engine == Some(session) {
            Ok(())
        } else {
            Err(SessionError::StaleSession { session, live: self.engine })
        }
    }

    fn transition(&mut self, next: SessionState) -> Result<(), SessionError> {
        if !self.state.can_transition_to(next) {
            return Err(SessionError::InvalidTransition { from: self.state, to: next });
        }
        tracing::info!(from = %self.state, to = %next, "session state changed");
        self.state = next;
        Ok(())
    }

    /// Path rewrite for the current room, if the page is not already there.
    fn sync_path(&mut self) -> Option<SessionAction> {
        let path = self.config.codec.path_for(self.room.as_ref());
        if path == self.page_path {
            return None;
        }
        self.page_path.clone_from(&path);
        Some(SessionAction::ReplacePath { path })
    }
}

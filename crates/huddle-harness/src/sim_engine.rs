//! Scriptable call engine for deterministic testing.
//!
//! [`SimEngine`] implements [`MeetingEngine`] without any media. Tests steer
//! it through an [`EngineControl`] handle: completing a join, failing, leaving
//! or broadcasting an app message, exactly as a real engine would report them
//! to its listeners.
//!
//! The engine remembers every listener ever attached, so tests can also model
//! an engine that keeps firing after it was detached and destroyed.

#![allow(clippy::disallowed_types, reason = "Synchronous locking operations only")]

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use huddle_app::{EngineFactory, EngineListener, ListenerId, MeetingEngine};
use huddle_core::{EngineSessionId, MeetingEvent, MeetingEventKind, MeetingStatus, RoomHandle};

/// How a simulated engine responds to `join`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum JoinBehavior {
    /// Joins synchronously, before any listener can be attached.
    #[default]
    Immediate,
    /// Stays joining until [`EngineControl::complete_join`].
    Pending,
    /// Fails synchronously with the given message.
    Fail(String),
}

/// How a simulated engine responds to `leave`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LeaveBehavior {
    /// Reports `Left` to listeners right away.
    #[default]
    Immediate,
    /// Stays leaving until [`EngineControl::complete_leave`].
    Pending,
}

#[derive(Debug)]
struct EngineState {
    session: EngineSessionId,
    status: MeetingStatus,
    room: Option<RoomHandle>,
    listeners: BTreeMap<MeetingEventKind, Vec<EngineListener>>,
    retained: Vec<(MeetingEventKind, EngineListener)>,
    join_calls: usize,
    leave_calls: usize,
    destroyed: bool,
}

impl EngineState {
    fn new(session: EngineSessionId) -> Self {
        Self {
            session,
            status: MeetingStatus::New,
            room: None,
            listeners: BTreeMap::new(),
            retained: Vec::new(),
            join_calls: 0,
            leave_calls: 0,
            destroyed: false,
        }
    }

    /// Listeners currently attached for `kind`. Empty once destroyed.
    fn attached(&self, kind: MeetingEventKind) -> Vec<EngineListener> {
        if self.destroyed {
            return Vec::new();
        }
        self.listeners.get(&kind).cloned().unwrap_or_default()
    }
}

/// Handle for steering and inspecting one simulated engine.
#[derive(Debug, Clone)]
pub struct EngineControl {
    state: Arc<Mutex<EngineState>>,
}

impl EngineControl {
    fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Update the status, then deliver `event` to the attached listeners.
    fn transition(&self, status: Option<MeetingStatus>, event: MeetingEvent) {
        let listeners = {
            let mut state = self.lock();
            if let Some(status) = status {
                state.status = status;
            }
            state.attached(event.kind())
        };
        for listener in listeners {
            listener.notify(event.clone());
        }
    }

    /// Engine session this engine was created for.
    pub fn session(&self) -> EngineSessionId {
        self.lock().session
    }

    /// Current meeting status.
    pub fn status(&self) -> MeetingStatus {
        self.lock().status
    }

    /// Room the engine was asked to join.
    pub fn room(&self) -> Option<RoomHandle> {
        self.lock().room.clone()
    }

    /// Finish a pending join.
    pub fn complete_join(&self) {
        self.transition(Some(MeetingStatus::Joined), MeetingEvent::Joined);
    }

    /// Fail the engine with `message`.
    pub fn fail(&self, message: &str) {
        let event = MeetingEvent::Error { message: message.to_string() };
        self.transition(Some(MeetingStatus::Error), event);
    }

    /// Finish a pending leave. Also models the remote side ending the call.
    pub fn complete_leave(&self) {
        self.transition(Some(MeetingStatus::Left), MeetingEvent::Left);
    }

    /// Broadcast an application message from `from_id`.
    pub fn send_app_message(&self, from_id: &str, data: &str) {
        let event = MeetingEvent::AppMessage { from_id: from_id.to_string(), data: data.to_string() };
        self.transition(None, event);
    }

    /// Deliver `event` through every listener ever attached for its kind,
    /// including detached ones, even after destroy.
    pub fn emit_retained(&self, event: MeetingEvent) {
        let kind = event.kind();
        let listeners: Vec<_> = self
            .lock()
            .retained
            .iter()
            .filter(|(retained, _)| *retained == kind)
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in listeners {
            listener.notify(event.clone());
        }
    }

    /// Number of listeners attached for `kind`.
    pub fn listener_count(&self, kind: MeetingEventKind) -> usize {
        self.lock().listeners.get(&kind).map_or(0, Vec::len)
    }

    /// Listener counts for every kind.
    pub fn listener_counts(&self) -> BTreeMap<MeetingEventKind, usize> {
        MeetingEventKind::ALL.into_iter().map(|kind| (kind, self.listener_count(kind))).collect()
    }

    /// Number of `join` calls received.
    pub fn join_calls(&self) -> usize {
        self.lock().join_calls
    }

    /// Number of `leave` calls received.
    pub fn leave_calls(&self) -> usize {
        self.lock().leave_calls
    }

    /// Whether the engine has been destroyed.
    pub fn is_destroyed(&self) -> bool {
        self.lock().destroyed
    }
}

/// Simulated engine.
#[derive(Debug)]
pub struct SimEngine {
    control: EngineControl,
    join: JoinBehavior,
    leave: LeaveBehavior,
}

impl SimEngine {
    /// Control handle for this engine.
    pub fn control(&self) -> EngineControl {
        self.control.clone()
    }
}

impl MeetingEngine for SimEngine {
    fn join(&mut self, room: &RoomHandle) {
        {
            let mut state = self.control.lock();
            state.join_calls += 1;
            state.room = Some(room.clone());
            state.status = MeetingStatus::Joining;
        }
        match &self.join {
            JoinBehavior::Immediate => self.control.complete_join(),
            JoinBehavior::Pending => {},
            JoinBehavior::Fail(message) => self.control.fail(message),
        }
    }

    fn leave(&mut self) {
        {
            let mut state = self.control.lock();
            state.leave_calls += 1;
            state.status = MeetingStatus::Leaving;
        }
        if self.leave == LeaveBehavior::Immediate {
            self.control.complete_leave();
        }
    }

    async fn destroy(&mut self) {
        tokio::task::yield_now().await;
        let mut state = self.control.lock();
        state.destroyed = true;
        tracing::debug!(session = %state.session, "sim engine destroyed");
    }

    fn current_status(&self) -> MeetingStatus {
        self.control.status()
    }

    fn on(&mut self, kind: MeetingEventKind, listener: EngineListener) {
        let mut state = self.control.lock();
        state.retained.push((kind, listener.clone()));
        state.listeners.entry(kind).or_default().push(listener);
    }

    fn off(&mut self, kind: MeetingEventKind, listener: ListenerId) {
        let mut state = self.control.lock();
        if let Some(listeners) = state.listeners.get_mut(&kind) {
            listeners.retain(|attached| attached.id() != listener);
        }
    }
}

/// Creates [`SimEngine`]s and keeps a control handle for each.
#[derive(Debug, Clone, Default)]
pub struct SimEngineFactory {
    join: JoinBehavior,
    leave: LeaveBehavior,
    engines: Arc<Mutex<Vec<EngineControl>>>,
}

impl SimEngineFactory {
    /// Factory for engines that join and leave immediately.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set how new engines respond to `join`.
    #[must_use]
    pub fn with_join(mut self, join: JoinBehavior) -> Self {
        self.join = join;
        self
    }

    /// Set how new engines respond to `leave`.
    #[must_use]
    pub fn with_leave(mut self, leave: LeaveBehavior) -> Self {
        self.leave = leave;
        self
    }

    /// Change the join behavior for engines created from now on.
    pub fn set_join(&mut self, join: JoinBehavior) {
        self.join = join;
    }

    fn engines(&self) -> MutexGuard<'_, Vec<EngineControl>> {
        self.engines.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Control handles for every engine created so far, in creation order.
    pub fn controls(&self) -> Vec<EngineControl> {
        self.engines().clone()
    }

    /// Control handle for the engine created for `session`.
    pub fn control(&self, session: EngineSessionId) -> Option<EngineControl> {
        self.engines().iter().find(|control| control.session() == session).cloned()
    }

    /// Most recently created engine.
    pub fn latest(&self) -> Option<EngineControl> {
        self.engines().last().cloned()
    }

    /// Number of engines created.
    pub fn created(&self) -> usize {
        self.engines().len()
    }
}

impl EngineFactory for SimEngineFactory {
    type Engine = SimEngine;

    fn create(&mut self, session: EngineSessionId) -> SimEngine {
        let control = EngineControl { state: Arc::new(Mutex::new(EngineState::new(session))) };
        self.engines().push(control.clone());
        tracing::debug!(%session, "sim engine created");
        SimEngine { control, join: self.join.clone(), leave: self.leave }
    }
}

//! Collaborator traits for I/O the session depends on.
//!
//! The [`MeetingEngine`], [`RoomProvisioner`] and [`NavigationPort`] traits
//! decouple the session runtime from the real media SDK, the room backend and
//! the browser address bar. Each frontend implements them to provide
//! platform-specific I/O, while the generic [`crate::Runtime`] handles all
//! orchestration.
//!
//! # Implementations
//!
//! - **Simulation**: `huddle-harness` provides scriptable, deterministic
//!   versions of every trait
//! - **Browser**: wraps the call SDK object, a `fetch` to the room endpoint and
//!   `history.replaceState`

use std::future::Future;

use huddle_core::{
    EngineSessionId, MeetingEvent, MeetingEventKind, MeetingStatus, ProvisionError, RoomHandle,
};
use tokio::sync::mpsc;

use crate::runtime::RuntimeInput;

/// Identity of one attached listener, used to detach it again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Wrap a raw id.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw numeric value.
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Engine event notification delivered to the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineNotice {
    /// Engine the event came from.
    pub session: EngineSessionId,
    /// The event.
    pub event: MeetingEvent,
}

/// Handler an engine invokes for one event kind.
///
/// Forwards events into the runtime inbox tagged with the engine session it
/// was attached to, so the runtime can drop events from engines it no longer
/// owns.
#[derive(Debug, Clone)]
pub struct EngineListener {
    id: ListenerId,
    session: EngineSessionId,
    inbox: mpsc::UnboundedSender<RuntimeInput>,
}

impl EngineListener {
    /// Create a listener that posts into `inbox`.
    pub fn new(
        id: ListenerId,
        session: EngineSessionId,
        inbox: mpsc::UnboundedSender<RuntimeInput>,
    ) -> Self {
        Self { id, session, inbox }
    }

    /// Listener identity.
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Engine session the listener was attached for.
    pub fn session(&self) -> EngineSessionId {
        self.session
    }

    /// Deliver an event. Returns `false` if the runtime has stopped.
    pub fn notify(&self, event: MeetingEvent) -> bool {
        let notice = EngineNotice { session: self.session, event };
        self.inbox.send(RuntimeInput::Engine(notice)).is_ok()
    }
}

/// One instance of the external call engine.
///
/// Engines report progress exclusively through events delivered to attached
/// listeners; [`MeetingEngine::current_status`] is the authoritative status at
/// any point in time.
pub trait MeetingEngine: Send {
    /// Start joining `room`. Completion is reported by a `Joined` or `Error`
    /// event.
    fn join(&mut self, room: &RoomHandle);

    /// Start leaving the meeting. Completion is reported by a `Left` event.
    fn leave(&mut self);

    /// Tear the engine down. The engine is unusable afterwards, even after an
    /// error.
    fn destroy(&mut self) -> impl Future<Output = ()> + Send;

    /// Authoritative meeting status.
    fn current_status(&self) -> MeetingStatus;

    /// Attach `listener` for events of `kind`.
    fn on(&mut self, kind: MeetingEventKind, listener: EngineListener);

    /// Detach the listener with identity `listener` from events of `kind`.
    fn off(&mut self, kind: MeetingEventKind, listener: ListenerId);
}

/// Creates engine instances.
pub trait EngineFactory: Send {
    /// Engine type produced.
    type Engine: MeetingEngine;

    /// Create a fresh engine known to the session as `session`.
    fn create(&mut self, session: EngineSessionId) -> Self::Engine;
}

/// Backend that creates rooms.
pub trait RoomProvisioner: Send + Sync + 'static {
    /// Create a room and return its address.
    ///
    /// # Errors
    ///
    /// Returns a [`ProvisionError`] if the backend is unreachable, rejects the
    /// request, or answers with an unusable address.
    fn create_room(&self) -> impl Future<Output = Result<RoomHandle, ProvisionError>> + Send;
}

/// The page address the client runs under.
pub trait NavigationPort: Send {
    /// Current page path.
    fn current_path(&self) -> String;

    /// Replace the page path in place, without adding a history entry.
    fn replace_path(&mut self, path: &str);
}

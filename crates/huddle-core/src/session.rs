//! Call session lifecycle types.
//!
//! Defines the application-level [`SessionState`] together with the engine's
//! own view of a meeting ([`MeetingStatus`], [`MeetingEvent`]). The session
//! state only moves along the edges accepted by
//! [`SessionState::can_transition_to`].
//!
//! # State Machine
//!
//! ```text
//!           start_call            provisioned
//! ┌──────┐ ───────────> ┌──────────┐ ─────────> ┌─────────┐  joined  ┌────────┐
//! │ Idle │              │ Creating │            │ Joining │ ───────> │ Joined │
//! └──────┘ <─────────── └──────────┘            └─────────┘          └────────┘
//!    │    provision failed                         ^    │ error        │    │
//!    └───────────────── deep link ─────────────────┘    ↓              │    │ leave_call
//!                                               ┌───────┐ <── error ───┘    ↓
//!                                               │ Error │             ┌─────────┐
//!                                               └───────┘ <── error ─ │ Leaving │
//!                                                                     └─────────┘
//!
//! Joining, Joined, Leaving and Error return to Idle once the engine has been
//! destroyed.
//! ```

use std::fmt;

/// Application-level call session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    /// No call in progress.
    #[default]
    Idle,
    /// Waiting for the provisioner to create a room.
    Creating,
    /// Engine created and asked to join; waiting for confirmation.
    Joining,
    /// Engine confirmed the meeting is joined.
    Joined,
    /// Graceful leave requested; waiting for the engine to report left.
    Leaving,
    /// Engine reported a fatal error. Only a forced leave exits this state.
    Error,
}

impl SessionState {
    /// All states, in lifecycle order.
    pub const ALL: [Self; 6] =
        [Self::Idle, Self::Creating, Self::Joining, Self::Joined, Self::Leaving, Self::Error];

    /// Whether `self -> next` is an edge of the session state machine.
    ///
    /// Self-loops are not transitions and are rejected.
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Creating | Self::Joining)
                | (Self::Creating, Self::Idle | Self::Joining)
                | (Self::Joining, Self::Joined | Self::Error | Self::Idle)
                | (Self::Joined, Self::Leaving | Self::Error | Self::Idle)
                | (Self::Leaving, Self::Error | Self::Idle)
                | (Self::Error, Self::Idle)
        )
    }

    /// Whether an engine session must exist in this state.
    pub fn has_engine(self) -> bool {
        matches!(self, Self::Joining | Self::Joined | Self::Leaving | Self::Error)
    }

    /// Whether a room handle must exist in this state.
    pub fn has_room(self) -> bool {
        self.has_engine()
    }

    /// Whether the "start call" control is enabled.
    pub fn can_start(self) -> bool {
        self == Self::Idle
    }

    /// Whether the "leave call" and in-call controls are enabled.
    pub fn can_leave(self) -> bool {
        matches!(self, Self::Joined | Self::Error)
    }

    /// Whether the call screen (tiles and tray) is shown instead of the start
    /// button.
    pub fn shows_call(self) -> bool {
        matches!(self, Self::Joining | Self::Joined | Self::Error)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Creating => "creating",
            Self::Joining => "joining",
            Self::Joined => "joined",
            Self::Leaving => "leaving",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

/// The engine's authoritative meeting status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeetingStatus {
    /// Engine created, nothing requested yet.
    New,
    /// Join in flight.
    Joining,
    /// In the meeting.
    Joined,
    /// Leave in flight.
    Leaving,
    /// Left the meeting.
    Left,
    /// Engine failed; unusable until destroyed.
    Error,
}

impl fmt::Display for MeetingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::New => "new",
            Self::Joining => "joining-meeting",
            Self::Joined => "joined-meeting",
            Self::Leaving => "leaving-meeting",
            Self::Left => "left-meeting",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

/// Event channels an engine exposes for subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MeetingEventKind {
    /// The local participant joined the meeting.
    Joined,
    /// The local participant left the meeting.
    Left,
    /// The engine hit a fatal error.
    Error,
    /// A peer broadcast an application message.
    AppMessage,
}

impl MeetingEventKind {
    /// Every kind the session subscribes to, one listener each.
    pub const ALL: [Self; 4] = [Self::Joined, Self::Left, Self::Error, Self::AppMessage];

    /// Whether events of this kind drive the session lifecycle.
    pub fn is_lifecycle(self) -> bool {
        !matches!(self, Self::AppMessage)
    }
}

impl fmt::Display for MeetingEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Joined => "joined-meeting",
            Self::Left => "left-meeting",
            Self::Error => "error",
            Self::AppMessage => "app-message",
        };
        f.write_str(name)
    }
}

/// Event emitted by an engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeetingEvent {
    /// Joined the meeting.
    Joined,
    /// Left the meeting.
    Left,
    /// Fatal engine error.
    Error {
        /// Human-readable error text reported by the engine.
        message: String,
    },
    /// Application message from another participant.
    AppMessage {
        /// Engine participant id of the sender.
        from_id: String,
        /// Opaque message payload.
        data: String,
    },
}

impl MeetingEvent {
    /// Channel this event is delivered on.
    pub fn kind(&self) -> MeetingEventKind {
        match self {
            Self::Joined => MeetingEventKind::Joined,
            Self::Left => MeetingEventKind::Left,
            Self::Error { .. } => MeetingEventKind::Error,
            Self::AppMessage { .. } => MeetingEventKind::AppMessage,
        }
    }
}

/// Handle identifying one engine instance.
///
/// Allocated monotonically by the session controller and never reused, so a
/// notice carrying an old id can always be told apart from the live engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EngineSessionId(u64);

impl EngineSessionId {
    /// First id handed out by a fresh controller.
    pub const FIRST: Self = Self(1);

    /// Wrap a raw id.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw numeric value.
    pub fn get(self) -> u64 {
        self.0
    }

    /// The id allocated after this one.
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for EngineSessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "engine#{}", self.0)
    }
}

/// Identifier of one room provisioning request.
///
/// Lets the controller recognise a provisioning result that arrives after the
/// request it answers has been superseded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProvisionRequestId(u64);

impl ProvisionRequestId {
    /// Wrap a raw id.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw numeric value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ProvisionRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "provision#{}", self.0)
    }
}

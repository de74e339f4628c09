//! Session side-effects.
//!
//! This module defines the [`SessionAction`] enum, which represents
//! instructions produced by the [`crate::CallSession`] state machine for the
//! runtime to execute against the engine, the provisioner and the page
//! address.

use huddle_core::{EngineSessionId, ProvisionRequestId, RoomHandle};

/// Actions produced by the session state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// Publish the current session view to observers.
    Render,

    /// Ask the provisioner for a new room.
    ProvisionRoom {
        /// Request id the result must carry back.
        request: ProvisionRequestId,
    },

    /// Construct a new engine instance.
    CreateEngine {
        /// Id the new engine is known by.
        session: EngineSessionId,
    },

    /// Ask the engine to join a room.
    JoinEngine {
        /// Target engine.
        session: EngineSessionId,
        /// Room to join.
        room: RoomHandle,
    },

    /// Attach one listener per event kind and sync with the engine's status.
    SubscribeEngine {
        /// Target engine.
        session: EngineSessionId,
    },

    /// Ask the engine to leave gracefully.
    LeaveEngine {
        /// Target engine.
        session: EngineSessionId,
    },

    /// Detach every listener attached by [`SessionAction::SubscribeEngine`].
    UnsubscribeEngine {
        /// Target engine.
        session: EngineSessionId,
    },

    /// Destroy the engine and report completion back to the session.
    DestroyEngine {
        /// Target engine.
        session: EngineSessionId,
    },

    /// Rewrite the page path in place, without a history entry.
    ReplacePath {
        /// New page path.
        path: String,
    },
}

impl SessionAction {
    /// Engine the action targets, if any.
    pub fn engine_session(&self) -> Option<EngineSessionId> {
        match self {
            Self::CreateEngine { session }
            | Self::JoinEngine { session, .. }
            | Self::SubscribeEngine { session }
            | Self::LeaveEngine { session }
            | Self::UnsubscribeEngine { session }
            | Self::DestroyEngine { session } => Some(*session),
            Self::Render | Self::ProvisionRoom { .. } | Self::ReplacePath { .. } => None,
        }
    }
}

//! Session input events.
//!
//! This module defines [`SessionEvent`], the complete set of inputs that drive
//! the [`crate::CallSession`] state machine.
//!
//! Events originate from three sources:
//! - User actions from the UI (start and leave).
//! - Completions of work the runtime performed (provisioning, destroy).
//! - Engine notifications, enriched by the runtime with the engine's own
//!   current status.

use huddle_core::{
    EngineSessionId, MeetingEvent, MeetingStatus, ProvisionError, ProvisionRequestId, RoomHandle,
};

/// Events processed by the session state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// User asked to start a new call.
    StartCall,

    /// User asked to leave the current call.
    LeaveCall,

    /// The provisioner answered a room request.
    RoomProvisioned {
        /// Request being answered.
        request: ProvisionRequestId,
        /// Created room, or why it could not be created.
        result: Result<RoomHandle, ProvisionError>,
    },

    /// The engine's meeting status may have changed.
    ///
    /// Delivered for every lifecycle event and once right after subscribing,
    /// with `trigger` set to `None`.
    MeetingStateChanged {
        /// Engine the notification came from.
        session: EngineSessionId,
        /// Event that prompted the check, if any.
        trigger: Option<MeetingEvent>,
        /// Engine status read when the event was dispatched.
        status: MeetingStatus,
    },

    /// A peer sent an application message.
    AppMessage {
        /// Engine the message arrived on.
        session: EngineSessionId,
        /// Engine participant id of the sender.
        from_id: String,
        /// Opaque payload.
        data: String,
    },

    /// The engine finished tearing down.
    EngineDestroyed {
        /// Engine that was destroyed.
        session: EngineSessionId,
    },
}

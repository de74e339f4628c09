//! Observable session state.
//!
//! [`SessionView`] is the view model published to the UI after every change.
//! It carries the raw session values plus the derived control flags, so the
//! presentation layer never has to reason about the state machine itself.

use huddle_core::{EngineSessionId, RoomHandle, SessionState};

/// Snapshot of the call session as seen by the UI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionView {
    /// Current session state.
    pub state: SessionState,
    /// Active room. `None` outside a call.
    pub room: Option<RoomHandle>,
    /// Live engine. `None` outside a call.
    pub engine: Option<EngineSessionId>,
    /// Error reported by the engine while in [`SessionState::Error`].
    pub error: Option<String>,
}

impl SessionView {
    /// Whether the start button is enabled.
    pub fn can_start(&self) -> bool {
        self.state.can_start()
    }

    /// Whether the leave button and other in-call controls are enabled.
    pub fn can_leave(&self) -> bool {
        self.state.can_leave()
    }

    /// Whether the call screen is shown instead of the start button.
    pub fn shows_call(&self) -> bool {
        self.state.shows_call()
    }

    /// Banner to show over the call, if any.
    pub fn call_message(&self) -> Option<CallMessage> {
        match self.state {
            SessionState::Error => Some(CallMessage {
                header: "Fatal error".to_string(),
                detail: self.error.clone().unwrap_or_else(|| "Unknown error".to_string()),
                is_error: true,
            }),
            _ => None,
        }
    }
}

/// Banner message shown over the call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallMessage {
    /// First line, emphasised.
    pub header: String,
    /// Supporting text.
    pub detail: String,
    /// Render with error styling.
    pub is_error: bool,
}

impl CallMessage {
    /// CSS class list for the message container.
    pub fn class_names(&self) -> &'static str {
        if self.is_error { "call-message error" } else { "call-message" }
    }
}

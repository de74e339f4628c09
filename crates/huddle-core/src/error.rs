//! Error types for the huddle core.
//!
//! None of these errors ever reach the UI as a Rust error. The session
//! controller turns every failure into a state value; these types exist so the
//! layers underneath can report what went wrong precisely and so the failures
//! can be logged with structure.

use thiserror::Error;

use crate::session::{EngineSessionId, ProvisionRequestId, SessionState};

/// Errors raised by the session state machine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Transition is not an edge of the state machine.
    #[error("invalid state transition: {from} -> {to}")]
    InvalidTransition {
        /// State the session was in.
        from: SessionState,
        /// State that was requested.
        to: SessionState,
    },

    /// Action is not enabled in the current state.
    #[error("cannot {operation} while {state}")]
    ActionDisabled {
        /// Current state.
        state: SessionState,
        /// Action that was attempted.
        operation: &'static str,
    },

    /// Input belongs to an engine session that is no longer live.
    #[error("stale input from {session} (live: {live:?})")]
    StaleSession {
        /// Session the input came from.
        session: EngineSessionId,
        /// Session currently owned, if any.
        live: Option<EngineSessionId>,
    },

    /// Provisioning result answers a request that is no longer pending.
    #[error("stale provisioning result for {request}")]
    StaleRequest {
        /// Request the result answers.
        request: ProvisionRequestId,
    },
}

/// Errors raised while asking the backend for a new room.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProvisionError {
    /// Request never reached the backend or the connection broke.
    #[error("transport error: {0}")]
    Transport(String),

    /// Backend answered with a failure status.
    #[error("backend rejected room creation with status {status}")]
    Rejected {
        /// Status code returned by the backend.
        status: u16,
    },

    /// Backend answered but the room address was unusable.
    #[error("invalid room address: {0}")]
    InvalidAddress(#[from] AddressError),
}

impl ProvisionError {
    /// Returns true if retrying the same request may succeed.
    ///
    /// Server-side (5xx) rejections and transport failures are transient;
    /// client-side rejections and malformed addresses are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Rejected { status } => *status >= 500,
            Self::InvalidAddress(_) => false,
        }
    }
}

/// Errors raised when parsing room addresses and page paths.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// Address was empty after trimming.
    #[error("room address is empty")]
    Empty,

    /// Address contains whitespace.
    #[error("room address contains whitespace: {0:?}")]
    Whitespace(String),

    /// Address has no non-empty segment to use as the room identifier.
    #[error("room address {0:?} has no identifier segment")]
    NotASegment(String),
}

//! Application layer for Huddle
//!
//! Pure call session state machine and generic runtime, enabling
//! deterministic simulation testing with the same code that runs in
//! production.
//!
//! # Components
//!
//! - [`CallSession`]: Session state machine (start, join, leave, teardown)
//! - [`MeetingEngine`], [`RoomProvisioner`], [`NavigationPort`]: Traits for
//!   platform-specific I/O
//! - [`Runtime`]: Generic orchestration loop driving the session against those
//!   traits
//! - [`SessionHandle`]: What the UI holds to issue requests and observe
//!   [`SessionView`] updates

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod action;
mod engine;
mod event;
mod runtime;
mod session;
mod state;

pub use action::SessionAction;
pub use engine::{
    EngineFactory, EngineListener, EngineNotice, ListenerId, MeetingEngine, NavigationPort,
    RoomProvisioner,
};
pub use event::SessionEvent;
pub use runtime::{Runtime, RuntimeError, RuntimeInput, SessionHandle};
pub use session::{CallSession, SessionConfig};
pub use state::{CallMessage, SessionView};

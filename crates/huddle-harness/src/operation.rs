//! Operations for randomized session testing.
//!
//! Operations represent everything that can happen to a call session: user
//! clicks, engine progress, misbehaving engines and scheduling. They are
//! generated randomly and applied to a [`SimSession`] in sequence.

use arbitrary::Arbitrary;
use huddle_core::MeetingEvent;

use crate::SimSession;

/// Event a detached engine fires after it should have gone quiet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Arbitrary)]
pub enum StaleEvent {
    /// Reports joined.
    Joined,
    /// Reports left.
    Left,
    /// Reports an error.
    Error,
    /// Broadcasts an app message.
    AppMessage,
}

impl StaleEvent {
    fn to_event(self) -> MeetingEvent {
        match self {
            Self::Joined => MeetingEvent::Joined,
            Self::Left => MeetingEvent::Left,
            Self::Error => MeetingEvent::Error { message: "stale failure".into() },
            Self::AppMessage => {
                MeetingEvent::AppMessage { from_id: "ghost".into(), data: "boo".into() }
            },
        }
    }
}

/// Operations that can be applied to a simulated session.
#[derive(Debug, Clone, PartialEq, Eq, Arbitrary)]
pub enum Operation {
    /// User clicks start.
    StartCall,
    /// User clicks leave.
    LeaveCall,
    /// Live engine finishes joining.
    CompleteJoin,
    /// Live engine fails.
    FailEngine,
    /// Live engine reports it left.
    CompleteLeave,
    /// A peer broadcasts an app message.
    AppMessage {
        /// Peer index.
        from: u8,
    },
    /// A destroyed engine fires through a listener it should have dropped.
    StaleEmit {
        /// Index into the destroyed engines.
        engine: u8,
        /// Event to fire.
        event: StaleEvent,
    },
    /// Process one ready input.
    Step,
    /// Process everything that is ready.
    Settle,
}

impl Operation {
    /// Apply the operation to `sim`.
    pub async fn apply(&self, sim: &mut SimSession) {
        match self {
            Self::StartCall => sim.start_call(),
            Self::LeaveCall => sim.leave_call(),
            Self::CompleteJoin => {
                if let Some(engine) = sim.live_engine() {
                    engine.complete_join();
                }
            },
            Self::FailEngine => {
                if let Some(engine) = sim.live_engine() {
                    engine.fail("simulated failure");
                }
            },
            Self::CompleteLeave => {
                if let Some(engine) = sim.live_engine() {
                    engine.complete_leave();
                }
            },
            Self::AppMessage { from } => {
                if let Some(engine) = sim.live_engine() {
                    engine.send_app_message(&format!("peer-{from}"), "hello");
                }
            },
            Self::StaleEmit { engine, event } => {
                let destroyed: Vec<_> =
                    sim.factory().controls().into_iter().filter(|c| c.is_destroyed()).collect();
                if !destroyed.is_empty() {
                    let control = &destroyed[usize::from(*engine) % destroyed.len()];
                    control.emit_retained(event.to_event());
                }
            },
            Self::Step => {
                sim.step().await;
            },
            Self::Settle => {
                sim.settle().await;
            },
        }
    }
}

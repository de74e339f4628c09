//! Deterministic simulation harness for Huddle call session testing.
//!
//! Simulated implementations of the engine, room backend and navigation
//! traits, driven through the production [`huddle_app::Runtime`].
//!
//! # Simulation
//!
//! - [`SimEngineFactory`] creates scriptable [`SimEngine`]s, steered through
//!   [`EngineControl`] handles
//! - [`SimProvisioner`] hands out seeded room names and scripted failures
//! - [`SimNavigation`] records every page path replacement
//! - [`SimSession`] wires them together and checks invariants after every
//!   processed input
//!
//! # Invariant Testing
//!
//! The `invariants` module provides behavioral testing through invariant
//! checks. Invariants verify WHAT must be true across all execution paths, not
//! specific scenarios. Use [`InvariantRegistry::standard()`] for the session
//! invariants.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod invariants;
pub mod operation;
pub mod sim_engine;
pub mod sim_navigation;
pub mod sim_provisioner;
pub mod sim_session;

pub use invariants::{
    EngineSnapshot, Invariant, InvariantRegistry, InvariantResult, PagePathInSync,
    PublishedViewCurrent, ResourcesMatchState, RetiredEnginesDestroyed, RuntimeOwnsSessionEngine,
    SessionSnapshot, SingleListenerPerKind, SystemSnapshot, Violation,
};
pub use operation::Operation;
pub use sim_engine::{EngineControl, JoinBehavior, LeaveBehavior, SimEngine, SimEngineFactory};
pub use sim_navigation::SimNavigation;
pub use sim_provisioner::{ProvisionOutcome, SimProvisioner};
pub use sim_session::{SimRuntime, SimSession};

//! Command-line shell for Huddle
//!
//! Runs scripted call scenarios through the generic [`huddle_app::Runtime`]
//! against the simulated collaborators from `huddle-harness`, and renders the
//! call screen as text after every step.
//!
//! This crate only handles scenario scripting and text rendering.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod scenario;
pub mod ui;

pub use scenario::{Frame, Report, Scenario, ScenarioConfig, ScenarioError};
pub use ui::Participant;

//! Session-wide invariants.
//!
//! A [`SystemSnapshot`] captures what the session, the runtime, the page
//! address and every simulated engine look like between two inputs. Each
//! [`Invariant`] inspects one snapshot and reports a [`Violation`] when the
//! pieces disagree, e.g. an engine that outlived its call or a page path that
//! no longer names the active room.
//!
//! [`crate::SimSession`] runs a registry after every processed input when one
//! is attached with [`crate::SimSession::with_invariants`].

mod checks;
mod snapshot;

use std::fmt;

pub use checks::{
    PagePathInSync, PublishedViewCurrent, ResourcesMatchState, RetiredEnginesDestroyed,
    RuntimeOwnsSessionEngine, SingleListenerPerKind,
};
pub use snapshot::{EngineSnapshot, SessionSnapshot, SystemSnapshot};

/// Outcome of a single check.
pub type InvariantResult = Result<(), Violation>;

/// A check that failed on a snapshot.
#[derive(Debug, Clone)]
pub struct Violation {
    /// Check that failed.
    pub invariant: &'static str,
    /// What the snapshot showed.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.invariant, self.message)
    }
}

impl std::error::Error for Violation {}

/// Property of a [`SystemSnapshot`] that holds between any two inputs.
pub trait Invariant: Send + Sync {
    /// Short name used in violation reports.
    fn name(&self) -> &'static str;

    /// Inspect `state`.
    fn check(&self, state: &SystemSnapshot) -> InvariantResult;
}

/// Ordered set of checks run together against one snapshot.
#[derive(Default)]
pub struct InvariantRegistry {
    checks: Vec<Box<dyn Invariant>>,
}

impl InvariantRegistry {
    /// Registry with no checks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every session check:
    ///
    /// - [`ResourcesMatchState`]: engine and room exist exactly in call states
    /// - [`RuntimeOwnsSessionEngine`]: runtime holds the engine the session names
    /// - [`SingleListenerPerKind`]: one listener per kind on the live engine
    /// - [`RetiredEnginesDestroyed`]: every other engine is destroyed and bare
    /// - [`PagePathInSync`]: the page shows the path the session wrote
    /// - [`PublishedViewCurrent`]: observers hold the session's current view
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.add(ResourcesMatchState);
        registry.add(RuntimeOwnsSessionEngine);
        registry.add(SingleListenerPerKind);
        registry.add(RetiredEnginesDestroyed);
        registry.add(PagePathInSync);
        registry.add(PublishedViewCurrent);
        registry
    }

    /// Register `invariant` after the existing checks.
    pub fn add<I: Invariant + 'static>(&mut self, invariant: I) {
        self.checks.push(Box::new(invariant));
    }

    /// Names of the registered checks, in run order.
    pub fn names(&self) -> Vec<&'static str> {
        self.checks.iter().map(|check| check.name()).collect()
    }

    /// Run every check. Collects all violations rather than stopping at the
    /// first.
    pub fn check_all(&self, state: &SystemSnapshot) -> Result<(), Vec<Violation>> {
        let violations: Vec<Violation> =
            self.checks.iter().filter_map(|check| check.check(state).err()).collect();
        if violations.is_empty() { Ok(()) } else { Err(violations) }
    }

    /// Run every check and panic listing all violations. `context` names the
    /// point in the run, e.g. `"after input 12"`.
    #[allow(clippy::panic)]
    pub fn assert_all(&self, state: &SystemSnapshot, context: &str) {
        if let Err(violations) = self.check_all(state) {
            let report = violations.iter().map(ToString::to_string).collect::<Vec<_>>().join("\n  ");
            panic!("session invariants broken {context}:\n  {report}");
        }
    }

    /// Number of registered checks.
    pub fn len(&self) -> usize {
        self.checks.len()
    }

    /// Whether no checks are registered.
    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AlwaysFails;

    impl Invariant for AlwaysFails {
        fn name(&self) -> &'static str {
            "always_fails"
        }

        fn check(&self, _state: &SystemSnapshot) -> InvariantResult {
            Err(Violation { invariant: self.name(), message: "nope".into() })
        }
    }

    #[test]
    fn standard_registry_runs_session_checks_in_order() {
        let registry = InvariantRegistry::standard();
        assert_eq!(registry.len(), 6);
        assert_eq!(registry.names()[0], "resources_match_state");
        assert!(registry.names().contains(&"page_path_in_sync"));
    }

    #[test]
    fn idle_snapshot_passes() {
        assert!(InvariantRegistry::standard().check_all(&SystemSnapshot::empty()).is_ok());
    }

    #[test]
    fn violations_are_collected_and_named() {
        let mut registry = InvariantRegistry::new();
        assert!(registry.is_empty());
        registry.add(AlwaysFails);
        registry.add(AlwaysFails);

        let violations = registry.check_all(&SystemSnapshot::empty()).unwrap_err();
        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0].to_string(), "[always_fails] nope");
    }
}

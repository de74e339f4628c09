//! Simulated call session.
//!
//! `SimSession` wires the production [`Runtime`] to the simulated engine,
//! room backend and page address, so the same orchestration code runs in
//! production and in deterministic tests. Every processed input can be
//! followed by an invariant check.

use huddle_app::{Runtime, SessionConfig, SessionHandle, SessionView};
use huddle_core::{EngineSessionId, SessionState};

use crate::{
    invariants::{EngineSnapshot, InvariantRegistry, SessionSnapshot, SystemSnapshot},
    sim_engine::{EngineControl, SimEngineFactory},
    sim_navigation::SimNavigation,
    sim_provisioner::SimProvisioner,
};

/// Runtime over simulated collaborators.
pub type SimRuntime = Runtime<SimEngineFactory, SimProvisioner, SimNavigation>;

/// Upper bound on settle rounds, so a feedback loop fails the test instead of
/// hanging it.
const MAX_SETTLE_ROUNDS: usize = 1_000;

/// Empty polls, each after yielding to background tasks, before the inbox is
/// considered quiet.
const IDLE_ROUNDS: usize = 3;

/// Simulated call session for deterministic testing.
pub struct SimSession {
    runtime: SimRuntime,
    handle: SessionHandle,
    invariants: Option<InvariantRegistry>,
    processed: usize,
}

impl SimSession {
    /// Create a session over the given collaborators.
    pub fn new(
        config: SessionConfig,
        factory: SimEngineFactory,
        provisioner: SimProvisioner,
        navigation: SimNavigation,
    ) -> Self {
        let runtime = Runtime::new(config, factory, provisioner, navigation);
        let handle = runtime.handle();
        Self { runtime, handle, invariants: None, processed: 0 }
    }

    /// Session at `path` with default collaborators and a seeded backend.
    pub fn at(path: &str, seed: u64) -> Self {
        Self::new(
            SessionConfig::default(),
            SimEngineFactory::new(),
            SimProvisioner::with_seed(seed),
            SimNavigation::at(path),
        )
    }

    /// Enable invariant checking after every processed input.
    #[must_use]
    pub fn with_invariants(mut self, registry: InvariantRegistry) -> Self {
        self.invariants = Some(registry);
        self
    }

    /// Start the session from the page path.
    pub async fn start(&mut self) {
        self.runtime.start().await;
        self.check_invariants("after start");
    }

    /// Handle the UI would hold.
    pub fn handle(&self) -> &SessionHandle {
        &self.handle
    }

    /// Request a new call.
    pub fn start_call(&self) {
        if self.handle.start_call().is_err() {
            tracing::warn!("start requested after shutdown");
        }
    }

    /// Request to leave the call.
    pub fn leave_call(&self) {
        if self.handle.leave_call().is_err() {
            tracing::warn!("leave requested after shutdown");
        }
    }

    /// Process every input that is ready, including provisioning results
    /// produced by background tasks. Returns the number processed.
    pub async fn settle(&mut self) -> usize {
        let before = self.processed;
        let mut idle_rounds = 0;
        for _ in 0..MAX_SETTLE_ROUNDS {
            if self.step().await {
                idle_rounds = 0;
                continue;
            }
            idle_rounds += 1;
            if idle_rounds > IDLE_ROUNDS {
                break;
            }
            tokio::task::yield_now().await;
        }
        self.processed - before
    }

    /// Process one ready input. Returns `false` if nothing was waiting.
    pub async fn step(&mut self) -> bool {
        if !self.runtime.try_process_next().await {
            return false;
        }
        self.processed += 1;
        let context = format!("after input {}", self.processed);
        self.check_invariants(&context);
        true
    }

    /// Destroy the live engine, as on page teardown.
    pub async fn stop(&mut self) {
        self.runtime.stop().await;
        self.check_invariants("after stop");
    }

    /// Underlying runtime.
    pub fn runtime(&self) -> &SimRuntime {
        &self.runtime
    }

    /// Session state.
    pub fn state(&self) -> SessionState {
        self.runtime.session().state()
    }

    /// Latest published view.
    pub fn view(&self) -> SessionView {
        self.handle.view()
    }

    /// Simulated page address.
    pub fn navigation(&self) -> &SimNavigation {
        self.runtime.navigation()
    }

    /// Simulated room backend.
    pub fn provisioner(&self) -> &SimProvisioner {
        self.runtime.provisioner()
    }

    /// Engine factory.
    pub fn factory(&self) -> &SimEngineFactory {
        self.runtime.factory()
    }

    /// Control handle for the engine created for `session`.
    pub fn engine(&self, session: EngineSessionId) -> Option<EngineControl> {
        self.factory().control(session)
    }

    /// Control handle for the engine the session currently holds.
    pub fn live_engine(&self) -> Option<EngineControl> {
        self.runtime.session().engine().and_then(|session| self.engine(session))
    }

    /// Number of inputs processed so far.
    pub fn processed(&self) -> usize {
        self.processed
    }

    /// Capture the observable system state.
    pub fn snapshot(&self) -> SystemSnapshot {
        let session = self.runtime.session();
        let mut snapshot = SystemSnapshot::with_session(SessionSnapshot {
            state: session.state(),
            room: session.room().cloned(),
            engine: session.engine(),
            live_engine: self.runtime.live_session(),
            page_path: session.page_path().to_string(),
            navigation_path: self.navigation().path().to_string(),
            expected_path: session.config().codec.path_for(session.room()),
            view: session.view(),
            published: self.runtime.view(),
        });

        for control in self.factory().controls() {
            let mut engine =
                EngineSnapshot::new(control.session()).with_listeners(control.listener_counts());
            engine.status = control.status();
            if control.is_destroyed() {
                engine = engine.destroyed();
            }
            snapshot.add_engine(engine);
        }
        snapshot
    }

    /// Check invariants against the current state.
    pub fn check_invariants(&self, context: &str) {
        if let Some(registry) = &self.invariants {
            registry.assert_all(&self.snapshot(), context);
        }
    }
}

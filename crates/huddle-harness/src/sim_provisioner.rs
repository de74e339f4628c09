//! Seeded room backend for deterministic testing.
//!
//! [`SimProvisioner`] hands out room names drawn from a seeded RNG, so the same
//! seed always yields the same rooms. Failures can be scripted per call or
//! injected at a fixed rate.

#![allow(clippy::disallowed_types, reason = "Locking simple RNG state")]

use std::{
    collections::VecDeque,
    sync::{Mutex, MutexGuard, PoisonError},
};

use huddle_app::RoomProvisioner;
use huddle_core::{ProvisionError, RoomHandle};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Length of generated room identifiers.
const ROOM_ID_LEN: usize = 10;

/// Scripted answer for one provisioning call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisionOutcome {
    /// Create a room with a generated name.
    Room,
    /// Create a room with this exact address.
    Named(String),
    /// Fail with this error.
    Fail(ProvisionError),
}

#[derive(Debug)]
struct ProvisionerState {
    rng: ChaCha8Rng,
    script: VecDeque<ProvisionOutcome>,
    calls: usize,
}

/// Simulated room backend.
#[derive(Debug)]
pub struct SimProvisioner {
    base: Option<String>,
    failure_rate: f64,
    state: Mutex<ProvisionerState>,
}

impl SimProvisioner {
    /// Provisioner seeded with `seed` that always succeeds.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            base: None,
            failure_rate: 0.0,
            state: Mutex::new(ProvisionerState {
                rng: ChaCha8Rng::seed_from_u64(seed),
                script: VecDeque::new(),
                calls: 0,
            }),
        }
    }

    /// Generate room addresses under `base` instead of bare identifiers.
    #[must_use]
    pub fn with_base(mut self, base: &str) -> Self {
        self.base = Some(base.trim_end_matches('/').to_string());
        self
    }

    /// Fail unscripted calls with probability `rate`.
    #[must_use]
    pub fn with_failure_rate(mut self, rate: f64) -> Self {
        self.failure_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Answer the next calls with `outcomes`, in order, before falling back to
    /// generated rooms.
    #[must_use]
    pub fn with_script(self, outcomes: impl IntoIterator<Item = ProvisionOutcome>) -> Self {
        self.lock().script.extend(outcomes);
        self
    }

    fn lock(&self) -> MutexGuard<'_, ProvisionerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of provisioning calls received.
    pub fn calls(&self) -> usize {
        self.lock().calls
    }

    fn next_outcome(&self) -> Result<RoomHandle, ProvisionError> {
        let mut state = self.lock();
        state.calls += 1;

        let outcome = match state.script.pop_front() {
            Some(outcome) => outcome,
            None if state.rng.gen_bool(self.failure_rate) => {
                ProvisionOutcome::Fail(ProvisionError::Rejected { status: 503 })
            },
            None => ProvisionOutcome::Room,
        };

        match outcome {
            ProvisionOutcome::Room => {
                let id: String =
                    (0..ROOM_ID_LEN).map(|_| char::from(state.rng.gen_range(b'a'..=b'z'))).collect();
                let url = match &self.base {
                    Some(base) => format!("{base}/{id}"),
                    None => id,
                };
                Ok(RoomHandle::parse(&url)?)
            },
            ProvisionOutcome::Named(url) => Ok(RoomHandle::parse(&url)?),
            ProvisionOutcome::Fail(err) => Err(err),
        }
    }
}

impl RoomProvisioner for SimProvisioner {
    async fn create_room(&self) -> Result<RoomHandle, ProvisionError> {
        let result = self.next_outcome();
        match &result {
            Ok(room) => tracing::debug!(%room, "sim room created"),
            Err(err) => tracing::debug!(%err, "sim room creation failed"),
        }
        result
    }
}

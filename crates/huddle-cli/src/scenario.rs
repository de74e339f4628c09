//! Scripted call scenarios.
//!
//! Each scenario drives the production runtime against the simulated engine,
//! room backend and page address, capturing a rendered frame of the screen
//! after every step. Invariants are checked at every frame.

use clap::ValueEnum;
use huddle_app::SessionConfig;
use huddle_core::{MediaTrack, OffReason, RoomAddressCodec, SessionState, TrackState};
use huddle_harness::{
    InvariantRegistry, JoinBehavior, SimEngineFactory, SimNavigation, SimProvisioner, SimSession,
};
use thiserror::Error;

use crate::ui::{self, Participant};

/// Message the engine fails with in [`Scenario::EngineError`].
const ENGINE_FAILURE: &str = "connection lost";

/// Scenario to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Scenario {
    /// Create a room, join it, leave it.
    Happy,
    /// The room backend rejects every request.
    ProvisionFailure,
    /// The engine fails mid-call and the user forces a leave.
    EngineError,
}

/// Scenario parameters.
#[derive(Debug, Clone)]
pub struct ScenarioConfig {
    /// Page path the client opens at.
    pub path: String,
    /// Room address mapping.
    pub codec: RoomAddressCodec,
    /// Seed for generated room names.
    pub seed: u64,
}

/// Scenario failures.
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// The system reached an inconsistent state.
    #[error("invariant violated at {frame:?}: {details}")]
    Invariant {
        /// Frame being captured.
        frame: String,
        /// Violations found.
        details: String,
    },

    /// A step needed a live engine and there was none.
    #[error("expected a live engine while {0}")]
    NoEngine(SessionState),
}

/// One captured screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Step that produced the frame.
    pub label: String,
    /// Rendered screen lines.
    pub lines: Vec<String>,
}

/// Result of a scenario run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    /// Captured frames, in order.
    pub frames: Vec<Frame>,
    /// Every page path written, in order.
    pub replacements: Vec<String>,
    /// Final session state.
    pub final_state: SessionState,
}

struct Recorder {
    sim: SimSession,
    invariants: InvariantRegistry,
    frames: Vec<Frame>,
}

impl Recorder {
    fn capture(&mut self, label: &str) -> Result<(), ScenarioError> {
        if let Err(violations) = self.invariants.check_all(&self.sim.snapshot()) {
            let details = violations.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ");
            return Err(ScenarioError::Invariant { frame: label.to_string(), details });
        }

        let view = self.sim.view();
        let lines = ui::render(&view, self.sim.navigation().path(), &participants(view.state));
        tracing::debug!(label, state = %view.state, "captured frame");
        self.frames.push(Frame { label: label.to_string(), lines });
        Ok(())
    }

    fn live_engine(&self) -> Result<huddle_harness::EngineControl, ScenarioError> {
        self.sim.live_engine().ok_or_else(|| ScenarioError::NoEngine(self.sim.state()))
    }
}

/// Participants the simulated call shows in `state`.
fn participants(state: SessionState) -> Vec<Participant> {
    let mut participants = vec![Participant {
        name: "you".into(),
        video: Some(TrackState::Playable(MediaTrack::new("local-cam"))),
        audio: Some(TrackState::Off(OffReason { by_user: true, by_bandwidth: false })),
        is_local: true,
    }];

    match state {
        SessionState::Joining => participants[0].video = Some(TrackState::Loading),
        SessionState::Joined | SessionState::Error => participants.push(Participant {
            name: "peer-1".into(),
            video: Some(TrackState::Playable(MediaTrack::new("peer-1-cam"))),
            audio: Some(TrackState::Playable(MediaTrack::new("peer-1-mic"))),
            is_local: false,
        }),
        SessionState::Idle | SessionState::Creating | SessionState::Leaving => {},
    }
    participants
}

/// Run `scenario` and return the captured frames.
pub async fn run(scenario: Scenario, config: ScenarioConfig) -> Result<Report, ScenarioError> {
    tracing::info!(?scenario, path = %config.path, seed = config.seed, "running scenario");

    let factory = match scenario {
        Scenario::EngineError => SimEngineFactory::new().with_join(JoinBehavior::Pending),
        Scenario::Happy | Scenario::ProvisionFailure => SimEngineFactory::new(),
    };
    let mut provisioner = SimProvisioner::with_seed(config.seed);
    if let Some(base) = config.codec.base() {
        provisioner = provisioner.with_base(base);
    }
    if scenario == Scenario::ProvisionFailure {
        provisioner = provisioner.with_failure_rate(1.0);
    }

    let sim = SimSession::new(
        SessionConfig { codec: config.codec },
        factory,
        provisioner,
        SimNavigation::at(&config.path),
    );
    let mut recorder =
        Recorder { sim, invariants: InvariantRegistry::standard(), frames: Vec::new() };

    recorder.sim.start().await;
    recorder.sim.settle().await;
    recorder.capture("open page")?;

    if recorder.sim.state() == SessionState::Idle {
        recorder.sim.start_call();
        recorder.sim.settle().await;
        recorder.capture("start call")?;
    }

    match scenario {
        Scenario::Happy => {
            if recorder.sim.state() == SessionState::Joined {
                recorder.live_engine()?.send_app_message("peer-1", "hello");
                recorder.sim.settle().await;
            }
        },
        Scenario::ProvisionFailure => {},
        Scenario::EngineError => {
            let engine = recorder.live_engine()?;
            engine.complete_join();
            recorder.sim.settle().await;
            recorder.capture("engine joined")?;

            engine.fail(ENGINE_FAILURE);
            recorder.sim.settle().await;
            recorder.capture("engine failed")?;
        },
    }

    recorder.sim.leave_call();
    recorder.sim.settle().await;
    recorder.capture("leave call")?;

    Ok(Report {
        replacements: recorder.sim.navigation().replacements().to_vec(),
        final_state: recorder.sim.state(),
        frames: recorder.frames,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(path: &str) -> ScenarioConfig {
        ScenarioConfig { path: path.into(), codec: RoomAddressCodec::new(), seed: 42 }
    }

    fn labels(report: &Report) -> Vec<&str> {
        report.frames.iter().map(|frame| frame.label.as_str()).collect()
    }

    #[tokio::test]
    async fn happy_path_returns_to_root() {
        let report = run(Scenario::Happy, config("/")).await.unwrap();

        assert_eq!(labels(&report), vec!["open page", "start call", "leave call"]);
        assert_eq!(report.final_state, SessionState::Idle);
        assert_eq!(report.replacements.len(), 2);
        assert_eq!(report.replacements.last().map(String::as_str), Some("/"));
        assert!(report.frames[1].lines[0].ends_with("(joined)"));
    }

    #[tokio::test]
    async fn provisioning_failure_stays_idle() {
        let report = run(Scenario::ProvisionFailure, config("/")).await.unwrap();

        assert_eq!(report.final_state, SessionState::Idle);
        assert!(report.replacements.is_empty());
        assert_eq!(report.frames[1].lines, vec!["/ (idle)", "[ start call ]"]);
    }

    #[tokio::test]
    async fn engine_error_shows_banner_then_recovers() {
        let report = run(Scenario::EngineError, config("/standup")).await.unwrap();

        assert_eq!(labels(&report), vec!["open page", "engine joined", "engine failed", "leave call"]);
        let failed = &report.frames[2].lines;
        assert!(failed.iter().any(|line| line.contains("Fatal error: connection lost")));
        assert_eq!(report.final_state, SessionState::Idle);
        assert_eq!(report.replacements, vec!["/".to_string()]);
    }

    #[tokio::test]
    async fn base_url_prefixes_rooms() {
        let config = ScenarioConfig {
            codec: RoomAddressCodec::with_base("https://team.example.com").unwrap(),
            ..config("/")
        };
        let report = run(Scenario::Happy, config).await.unwrap();

        // The page path only ever carries the identifier.
        let joined_path = &report.replacements[0];
        assert!(!joined_path.contains("example.com"));
        assert_eq!(joined_path.matches('/').count(), 1);
    }
}

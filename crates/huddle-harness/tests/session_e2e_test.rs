//! End-to-end tests for the call session runtime.
//!
//! Each test drives the production runtime against simulated collaborators
//! with the standard invariants checked after every processed input.
//!
//! # Oracle Pattern
//!
//! Tests end with oracle checks that verify:
//! - Session state and published view
//! - Engine lifecycle (created, listeners, destroyed)
//! - Page path history

use huddle_app::{Runtime, SessionConfig};
use huddle_core::{
    EngineSessionId, MeetingEvent, MeetingEventKind, MeetingStatus, ProvisionError, RoomAddressCodec,
    SessionState,
};
use huddle_harness::{
    InvariantRegistry, JoinBehavior, LeaveBehavior, ProvisionOutcome, SimEngineFactory,
    SimNavigation, SimProvisioner, SimSession,
};

fn sim(path: &str, factory: SimEngineFactory, provisioner: SimProvisioner) -> SimSession {
    SimSession::new(SessionConfig::default(), factory, provisioner, SimNavigation::at(path))
        .with_invariants(InvariantRegistry::standard())
}

fn scripted_room(name: &str) -> SimProvisioner {
    SimProvisioner::with_seed(1).with_script([ProvisionOutcome::Named(name.into())])
}

#[tokio::test]
async fn start_join_leave() {
    let mut sim = sim("/", SimEngineFactory::new(), scripted_room("abc"));
    sim.start().await;
    assert_eq!(sim.state(), SessionState::Idle);

    sim.start_call();
    sim.settle().await;

    assert_eq!(sim.state(), SessionState::Joined);
    assert_eq!(sim.navigation().path(), "/abc");
    let engine = sim.live_engine().unwrap();
    assert_eq!(engine.room().map(|r| r.url().to_string()), Some("abc".into()));
    for kind in MeetingEventKind::ALL {
        assert_eq!(engine.listener_count(kind), 1, "{kind}");
    }

    sim.leave_call();
    sim.settle().await;

    assert_eq!(sim.state(), SessionState::Idle);
    assert_eq!(sim.view().room, None);
    assert_eq!(sim.view().engine, None);
    assert_eq!(engine.leave_calls(), 1);
    assert!(engine.is_destroyed());
    assert_eq!(engine.listener_counts().values().sum::<usize>(), 0);
    insta::assert_snapshot!(sim.navigation().replacements().join(" "), @"/abc /");
}

#[tokio::test]
async fn pending_join_waits_for_engine() {
    let factory = SimEngineFactory::new().with_join(JoinBehavior::Pending);
    let mut sim = sim("/", factory, scripted_room("abc"));
    sim.start().await;

    sim.start_call();
    sim.settle().await;
    assert_eq!(sim.state(), SessionState::Joining);
    assert!(sim.view().shows_call());
    assert!(!sim.view().can_leave());

    sim.live_engine().unwrap().complete_join();
    sim.settle().await;
    assert_eq!(sim.state(), SessionState::Joined);
    assert!(sim.view().can_leave());
}

#[tokio::test]
async fn provisioning_failure_returns_to_idle() {
    let provisioner = SimProvisioner::with_seed(1)
        .with_script([ProvisionOutcome::Fail(ProvisionError::Rejected { status: 500 })]);
    let mut sim = sim("/", SimEngineFactory::new(), provisioner);
    sim.start().await;

    sim.start_call();
    sim.settle().await;

    assert_eq!(sim.state(), SessionState::Idle);
    assert_eq!(sim.view().call_message(), None);
    assert_eq!(sim.factory().created(), 0);
    assert!(sim.navigation().replacements().is_empty());

    // The start control is usable again.
    sim.start_call();
    sim.settle().await;
    assert_eq!(sim.state(), SessionState::Joined);
    assert_eq!(sim.provisioner().calls(), 2);
}

#[tokio::test]
async fn provisioning_failure_keeps_unrecognized_path() {
    let provisioner = SimProvisioner::with_seed(1)
        .with_script([ProvisionOutcome::Fail(ProvisionError::Rejected { status: 500 })]);
    let mut sim = sim("/a/b", SimEngineFactory::new(), provisioner);
    sim.start().await;
    assert_eq!(sim.state(), SessionState::Idle);

    sim.start_call();
    sim.settle().await;

    assert_eq!(sim.state(), SessionState::Idle);
    assert_eq!(sim.navigation().path(), "/a/b");
    assert!(sim.navigation().replacements().is_empty());
}

#[tokio::test]
async fn deep_link_joins_without_provisioning() {
    let mut sim = sim("/standup", SimEngineFactory::new(), SimProvisioner::with_seed(1));
    sim.start().await;
    sim.settle().await;

    assert_eq!(sim.state(), SessionState::Joined);
    assert_eq!(sim.view().room.map(|r| r.url().to_string()), Some("standup".into()));
    assert_eq!(sim.provisioner().calls(), 0);
    // Already on the right path, so nothing is rewritten.
    assert!(sim.navigation().replacements().is_empty());
}

#[tokio::test]
async fn deep_link_resolves_against_base() {
    let codec = RoomAddressCodec::with_base("https://team.example.com").unwrap();
    let mut sim = SimSession::new(
        SessionConfig { codec },
        SimEngineFactory::new(),
        SimProvisioner::with_seed(1),
        SimNavigation::at("/weekly"),
    )
    .with_invariants(InvariantRegistry::standard());
    sim.start().await;
    sim.settle().await;

    let room = sim.live_engine().unwrap().room().unwrap();
    assert_eq!(room.url(), "https://team.example.com/weekly");
    assert_eq!(sim.navigation().path(), "/weekly");
}

#[tokio::test]
async fn engine_error_then_forced_leave() {
    let factory = SimEngineFactory::new().with_join(JoinBehavior::Pending);
    let mut sim = sim("/", factory, scripted_room("abc"));
    sim.start().await;
    sim.start_call();
    sim.settle().await;

    let engine = sim.live_engine().unwrap();
    engine.complete_join();
    sim.settle().await;
    engine.fail("ice connection failed");
    sim.settle().await;

    assert_eq!(sim.state(), SessionState::Error);
    let view = sim.view();
    assert!(view.shows_call());
    assert!(view.can_leave());
    let message = view.call_message().unwrap();
    assert_eq!(message.header, "Fatal error");
    assert_eq!(message.detail, "ice connection failed");

    sim.leave_call();
    sim.settle().await;

    assert_eq!(sim.state(), SessionState::Idle);
    // Forced leave skips the graceful leave.
    assert_eq!(engine.leave_calls(), 0);
    assert!(engine.is_destroyed());
    assert_eq!(sim.navigation().path(), "/");
}

#[tokio::test]
async fn error_without_message_shows_fallback() {
    let factory = SimEngineFactory::new().with_join(JoinBehavior::Fail("unreachable".into()));
    let mut sim = sim("/abc", factory, SimProvisioner::with_seed(1));
    sim.start().await;
    sim.settle().await;

    // The failure happened before any listener was attached, so only the
    // status reports it.
    assert_eq!(sim.state(), SessionState::Error);
    assert_eq!(sim.view().call_message().map(|m| m.detail), Some("Unknown error".into()));
}

#[tokio::test]
async fn error_while_leaving() {
    let factory = SimEngineFactory::new().with_leave(LeaveBehavior::Pending);
    let mut sim = sim("/abc", factory, SimProvisioner::with_seed(1));
    sim.start().await;
    sim.settle().await;

    sim.leave_call();
    sim.settle().await;
    assert_eq!(sim.state(), SessionState::Leaving);
    assert!(!sim.view().shows_call());

    sim.live_engine().unwrap().fail("network lost");
    sim.settle().await;
    assert_eq!(sim.state(), SessionState::Error);

    sim.leave_call();
    sim.settle().await;
    assert_eq!(sim.state(), SessionState::Idle);
}

#[tokio::test]
async fn remote_end_tears_down() {
    let mut sim = sim("/abc", SimEngineFactory::new(), SimProvisioner::with_seed(1));
    sim.start().await;
    sim.settle().await;

    let engine = sim.live_engine().unwrap();
    engine.complete_leave();
    sim.settle().await;

    assert_eq!(sim.state(), SessionState::Idle);
    assert_eq!(engine.leave_calls(), 0);
    assert!(engine.is_destroyed());
}

#[tokio::test]
async fn left_while_joining_tears_down() {
    let factory = SimEngineFactory::new().with_join(JoinBehavior::Pending);
    let mut sim = sim("/abc", factory, SimProvisioner::with_seed(1));
    sim.start().await;
    sim.settle().await;
    assert_eq!(sim.state(), SessionState::Joining);

    sim.live_engine().unwrap().complete_leave();
    sim.settle().await;
    assert_eq!(sim.state(), SessionState::Idle);
}

#[tokio::test]
async fn repeated_clicks_are_ignored() {
    let mut sim = sim("/", SimEngineFactory::new(), scripted_room("abc"));
    sim.start().await;

    sim.start_call();
    sim.start_call();
    sim.settle().await;
    assert_eq!(sim.provisioner().calls(), 1);
    assert_eq!(sim.factory().created(), 1);

    let factory_engine = sim.live_engine().unwrap();
    sim.leave_call();
    sim.leave_call();
    sim.settle().await;
    assert_eq!(factory_engine.leave_calls(), 1);
    assert_eq!(sim.state(), SessionState::Idle);
}

#[tokio::test]
async fn stale_engine_events_are_ignored() {
    let factory = SimEngineFactory::new().with_join(JoinBehavior::Pending);
    let provisioner = SimProvisioner::with_seed(1).with_script([
        ProvisionOutcome::Named("first".into()),
        ProvisionOutcome::Named("second".into()),
    ]);
    let mut sim = sim("/", factory, provisioner);
    sim.start().await;

    sim.start_call();
    sim.settle().await;
    let first = sim.live_engine().unwrap();
    first.complete_join();
    sim.settle().await;
    sim.leave_call();
    sim.settle().await;
    assert!(first.is_destroyed());

    sim.start_call();
    sim.settle().await;
    let second = sim.live_engine().unwrap();
    assert_ne!(first.session(), second.session());
    assert_eq!(sim.state(), SessionState::Joining);

    // The old engine keeps firing through listeners it should have dropped.
    first.emit_retained(MeetingEvent::Error { message: "late".into() });
    first.emit_retained(MeetingEvent::Left);
    first.emit_retained(MeetingEvent::Joined);
    sim.settle().await;

    assert_eq!(sim.state(), SessionState::Joining);
    assert_eq!(sim.view().engine, Some(second.session()));
    assert_eq!(sim.view().error, None);
    assert!(!second.is_destroyed());
}

#[tokio::test]
async fn app_messages_do_not_change_state() {
    let mut sim = sim("/abc", SimEngineFactory::new(), SimProvisioner::with_seed(1));
    sim.start().await;
    sim.settle().await;
    let before = sim.view();

    sim.live_engine().unwrap().send_app_message("peer-1", "hello");
    assert_eq!(sim.settle().await, 1);

    assert_eq!(sim.view(), before);
}

#[tokio::test]
async fn observers_see_every_change() {
    let factory = SimEngineFactory::new().with_join(JoinBehavior::Pending);
    let mut sim = sim("/", factory, scripted_room("abc"));
    let mut views = sim.handle().subscribe();
    sim.start().await;

    sim.start_call();
    sim.step().await;
    assert!(views.has_changed().unwrap());
    assert_eq!(views.borrow_and_update().state, SessionState::Creating);

    sim.settle().await;
    assert_eq!(views.borrow_and_update().state, SessionState::Joining);
}

#[tokio::test]
async fn shutdown_destroys_live_engine() {
    let factory = SimEngineFactory::new();
    let runtime = Runtime::new(
        SessionConfig::default(),
        factory.clone(),
        SimProvisioner::with_seed(1),
        SimNavigation::at("/abc"),
    );
    let handle = runtime.handle();
    handle.shutdown().unwrap();

    runtime.run().await;

    let engine = factory.control(EngineSessionId::FIRST).unwrap();
    assert_eq!(engine.status(), MeetingStatus::Joined);
    assert!(engine.is_destroyed());
    assert_eq!(engine.listener_counts().values().sum::<usize>(), 0);
    assert_eq!(handle.view().state, SessionState::Idle);
    assert_eq!(handle.view().engine, None);
    assert!(handle.start_call().is_err());
}

#[tokio::test]
async fn stop_returns_session_to_idle() {
    let mut sim = sim("/", SimEngineFactory::new(), scripted_room("abc"));
    sim.start().await;
    sim.start_call();
    sim.settle().await;
    assert_eq!(sim.state(), SessionState::Joined);
    let engine = sim.live_engine().unwrap();

    sim.stop().await;

    assert!(engine.is_destroyed());
    assert_eq!(sim.state(), SessionState::Idle);
    assert_eq!(sim.view(), sim.runtime().session().view());
    assert_eq!(sim.view().room, None);
    assert!(sim.runtime().live_session().is_none());
}

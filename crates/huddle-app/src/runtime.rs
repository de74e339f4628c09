//! Generic runtime for call session orchestration.
//!
//! The Runtime drives the session event loop, coordinating between:
//! - [`CallSession`]: session state machine
//! - [`EngineFactory`] and [`MeetingEngine`]: the call engine
//! - [`RoomProvisioner`]: the room backend
//! - [`NavigationPort`]: the page address
//!
//! Every input (user requests, provisioning results, engine events) is
//! serialized through a single inbox, so the state machine sees one event at a
//! time in arrival order.

use std::{collections::VecDeque, sync::Arc};

use huddle_core::{EngineSessionId, MeetingEvent, MeetingEventKind};
use thiserror::Error;
use tokio::sync::{mpsc, watch};

use crate::{
    CallSession, EngineFactory, EngineListener, EngineNotice, ListenerId, MeetingEngine,
    NavigationPort, RoomProvisioner, SessionAction, SessionConfig, SessionEvent, SessionView,
};

/// Input delivered to the runtime inbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeInput {
    /// Event for the session state machine.
    Session(SessionEvent),
    /// Raw event from an engine listener.
    Engine(EngineNotice),
    /// Stop the event loop and destroy the live engine.
    Shutdown,
}

/// Errors returned by [`SessionHandle`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeError {
    /// The runtime is no longer processing input.
    #[error("session runtime has stopped")]
    Stopped,
}

/// Cloneable handle the UI uses to drive and observe the session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    inbox: mpsc::UnboundedSender<RuntimeInput>,
    view: watch::Receiver<SessionView>,
}

impl SessionHandle {
    /// Request a new call in a freshly provisioned room.
    pub fn start_call(&self) -> Result<(), RuntimeError> {
        self.send(RuntimeInput::Session(SessionEvent::StartCall))
    }

    /// Request to leave the current call.
    pub fn leave_call(&self) -> Result<(), RuntimeError> {
        self.send(RuntimeInput::Session(SessionEvent::LeaveCall))
    }

    /// Stop the runtime, destroying any live engine.
    pub fn shutdown(&self) -> Result<(), RuntimeError> {
        self.send(RuntimeInput::Shutdown)
    }

    /// Latest published session view.
    pub fn view(&self) -> SessionView {
        self.view.borrow().clone()
    }

    /// Receiver notified on every published view.
    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.view.clone()
    }

    fn send(&self, input: RuntimeInput) -> Result<(), RuntimeError> {
        self.inbox.send(input).map_err(|_| RuntimeError::Stopped)
    }
}

/// The engine currently owned by the runtime.
struct LiveEngine<E> {
    session: EngineSessionId,
    engine: E,
    listeners: Vec<(MeetingEventKind, ListenerId)>,
}

/// Generic runtime that orchestrates the session and its collaborators.
///
/// # Type Parameters
///
/// - `F`: Engine factory
/// - `P`: Room provisioner
/// - `N`: Page navigation
pub struct Runtime<F, P, N>
where
    F: EngineFactory,
    P: RoomProvisioner,
    N: NavigationPort,
{
    session: CallSession,
    factory: F,
    provisioner: Arc<P>,
    navigation: N,
    live: Option<LiveEngine<F::Engine>>,
    inbox_tx: mpsc::UnboundedSender<RuntimeInput>,
    inbox_rx: mpsc::UnboundedReceiver<RuntimeInput>,
    view_tx: watch::Sender<SessionView>,
    next_listener: u64,
    stopped: bool,
}

impl<F, P, N> Runtime<F, P, N>
where
    F: EngineFactory,
    P: RoomProvisioner,
    N: NavigationPort,
{
    /// Create a runtime with an idle session.
    pub fn new(config: SessionConfig, factory: F, provisioner: P, navigation: N) -> Self {
        let session = CallSession::new(config);
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        let (view_tx, _) = watch::channel(session.view());

        Self {
            session,
            factory,
            provisioner: Arc::new(provisioner),
            navigation,
            live: None,
            inbox_tx,
            inbox_rx,
            view_tx,
            next_listener: 1,
            stopped: false,
        }
    }

    /// Handle for the UI.
    pub fn handle(&self) -> SessionHandle {
        SessionHandle { inbox: self.inbox_tx.clone(), view: self.view_tx.subscribe() }
    }

    /// Run the main event loop until shutdown.
    ///
    /// Reads the page path once, then processes inbox input in order. On
    /// shutdown the live engine, if any, is detached and destroyed, and the
    /// final idle view is published.
    pub async fn run(mut self) {
        self.start().await;
        while self.process_next().await {}
        self.stop().await;
    }

    /// Start the session from the current page path.
    pub async fn start(&mut self) {
        let path = self.navigation.current_path();
        tracing::info!(%path, "starting call session");
        let actions = self.session.start(&path);
        self.drive(actions).await;
    }

    /// Wait for and process one inbox input.
    ///
    /// Returns `false` once shutdown has been requested.
    pub async fn process_next(&mut self) -> bool {
        if self.stopped {
            return false;
        }
        match self.inbox_rx.recv().await {
            Some(input) => self.process_input(input).await,
            None => self.stopped = true,
        }
        !self.stopped
    }

    /// Process one input if one is already waiting.
    ///
    /// Returns `false` if the inbox was empty or the runtime has stopped.
    pub async fn try_process_next(&mut self) -> bool {
        if self.stopped {
            return false;
        }
        match self.inbox_rx.try_recv() {
            Ok(input) => {
                self.process_input(input).await;
                true
            },
            Err(_) => false,
        }
    }

    /// Process every input already waiting in the inbox. Returns the number
    /// of inputs processed.
    pub async fn drain(&mut self) -> usize {
        let mut processed = 0;
        while self.try_process_next().await {
            processed += 1;
        }
        processed
    }

    /// Whether shutdown has been requested.
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Detach and destroy the live engine, if any, and report it destroyed
    /// to the session so the published view returns to idle.
    pub async fn stop(&mut self) {
        if let Some(mut live) = self.live.take() {
            tracing::info!(session = %live.session, "destroying engine on shutdown");
            detach(&mut live);
            live.engine.destroy().await;
            self.apply(SessionEvent::EngineDestroyed { session: live.session }).await;
        }
    }

    /// Session state machine.
    pub fn session(&self) -> &CallSession {
        &self.session
    }

    /// Engine factory.
    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Room provisioner.
    pub fn provisioner(&self) -> &P {
        &self.provisioner
    }

    /// Page navigation.
    pub fn navigation(&self) -> &N {
        &self.navigation
    }

    /// Engine session currently owned by the runtime.
    pub fn live_session(&self) -> Option<EngineSessionId> {
        self.live.as_ref().map(|live| live.session)
    }

    /// Latest published view.
    pub fn view(&self) -> SessionView {
        self.view_tx.borrow().clone()
    }

    async fn process_input(&mut self, input: RuntimeInput) {
        match input {
            RuntimeInput::Session(event) => self.apply(event).await,
            RuntimeInput::Engine(notice) => {
                if let Some(event) = self.translate(notice) {
                    self.apply(event).await;
                }
            },
            RuntimeInput::Shutdown => {
                tracing::info!("shutdown requested");
                self.stopped = true;
            },
        }
    }

    /// Turn an engine notice into a session event, reading the engine's
    /// current status for lifecycle events.
    fn translate(&self, notice: EngineNotice) -> Option<SessionEvent> {
        let Some(live) = self.live.as_ref().filter(|live| live.session == notice.session) else {
            tracing::debug!(session = %notice.session, "dropping event from detached engine");
            return None;
        };

        let event = match notice.event {
            MeetingEvent::AppMessage { from_id, data } => {
                SessionEvent::AppMessage { session: notice.session, from_id, data }
            },
            trigger => SessionEvent::MeetingStateChanged {
                session: notice.session,
                status: live.engine.current_status(),
                trigger: Some(trigger),
            },
        };
        Some(event)
    }

    /// Feed `event` to the session and run the resulting actions, including
    /// any follow-up events they produce.
    async fn apply(&mut self, event: SessionEvent) {
        let actions = self.session.handle(event);
        self.drive(actions).await;
    }

    async fn drive(&mut self, actions: Vec<SessionAction>) {
        let mut pending: VecDeque<SessionEvent> = VecDeque::new();
        for action in actions {
            if let Some(event) = self.execute(action).await {
                pending.push_back(event);
            }
        }

        while let Some(event) = pending.pop_front() {
            for action in self.session.handle(event) {
                if let Some(event) = self.execute(action).await {
                    pending.push_back(event);
                }
            }
        }
    }

    /// Execute one action. Returns the follow-up event it produced, if any.
    async fn execute(&mut self, action: SessionAction) -> Option<SessionEvent> {
        match action {
            SessionAction::Render => {
                self.view_tx.send_replace(self.session.view());
                None
            },
            SessionAction::ProvisionRoom { request } => {
                let provisioner = Arc::clone(&self.provisioner);
                let inbox = self.inbox_tx.clone();
                tokio::spawn(async move {
                    let result = provisioner.create_room().await;
                    let event = SessionEvent::RoomProvisioned { request, result };
                    if inbox.send(RuntimeInput::Session(event)).is_err() {
                        tracing::debug!(%request, "runtime stopped before room was provisioned");
                    }
                });
                None
            },
            SessionAction::CreateEngine { session } => {
                if let Some(previous) = &self.live {
                    tracing::error!(
                        %session,
                        previous = %previous.session,
                        "engine created while another is live"
                    );
                    return None;
                }
                let engine = self.factory.create(session);
                self.live = Some(LiveEngine { session, engine, listeners: Vec::new() });
                None
            },
            SessionAction::JoinEngine { session, room } => {
                if let Some(live) = self.live_mut(session) {
                    tracing::info!(%session, %room, "joining room");
                    live.engine.join(&room);
                }
                None
            },
            SessionAction::SubscribeEngine { session } => self.subscribe(session),
            SessionAction::LeaveEngine { session } => {
                if let Some(live) = self.live_mut(session) {
                    live.engine.leave();
                }
                None
            },
            SessionAction::UnsubscribeEngine { session } => {
                if let Some(live) = self.live_mut(session) {
                    detach(live);
                }
                None
            },
            SessionAction::DestroyEngine { session } => {
                if self.live_mut(session).is_none() {
                    return None;
                }
                let mut live = self.live.take()?;
                if !live.listeners.is_empty() {
                    tracing::warn!(%session, "destroying engine with listeners attached");
                    detach(&mut live);
                }
                live.engine.destroy().await;
                Some(SessionEvent::EngineDestroyed { session })
            },
            SessionAction::ReplacePath { path } => {
                if self.navigation.current_path() != path {
                    tracing::debug!(%path, "replacing page path");
                    self.navigation.replace_path(&path);
                }
                None
            },
        }
    }

    /// Attach one listener per event kind, then report the engine's status so
    /// a transition that completed before the listeners existed is not missed.
    fn subscribe(&mut self, session: EngineSessionId) -> Option<SessionEvent> {
        let first = self.next_listener;
        let inbox = self.inbox_tx.clone();
        let live = self.live_mut(session)?;

        if !live.listeners.is_empty() {
            tracing::warn!(%session, "engine already subscribed");
            return None;
        }

        let mut next = first;
        for kind in MeetingEventKind::ALL {
            let id = ListenerId::new(next);
            next += 1;
            live.engine.on(kind, EngineListener::new(id, session, inbox.clone()));
            live.listeners.push((kind, id));
        }
        let status = live.engine.current_status();
        self.next_listener = next;

        Some(SessionEvent::MeetingStateChanged { session, trigger: None, status })
    }

    fn live_mut(&mut self, session: EngineSessionId) -> Option<&mut LiveEngine<F::Engine>> {
        match self.live.as_mut() {
            Some(live) if live.session == session => Some(live),
            other => {
                let live = other.map(|live| live.session);
                tracing::debug!(%session, ?live, "ignoring action for engine that is not live");
                None
            },
        }
    }
}

fn detach<E: MeetingEngine>(live: &mut LiveEngine<E>) {
    for (kind, id) in live.listeners.drain(..) {
        live.engine.off(kind, id);
    }
}

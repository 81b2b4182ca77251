use std::marker::PhantomData;
use std::sync::{Arc, Mutex};

use tokio::sync::{mpsc, watch};

/// Lifecycle states of a hosted worker. "No registration" is represented by
/// `WorkerHost::registration` returning `None`, not by a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Installing,
    /// Installed but parked behind the controlling worker; progresses only
    /// on an explicit skip-waiting signal.
    Waiting,
    Activated,
    /// Installation failed; the registration is dead.
    Redundant,
}

/// A clicked notification as routed back into the worker context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickedNotification {
    pub tag: String,
    pub url: String,
}

#[derive(Debug)]
enum WorkerEvent {
    SkipWaiting,
    Push(Vec<u8>),
    NotificationClick(ClickedNotification),
}

/// What a script's install handler decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    Installed {
        /// Activate immediately instead of parking in `Waiting`.
        skip_waiting: bool,
    },
    Failed,
}

/// Event hooks of a worker script. Runs on a spawned task with no access to
/// foreground state; the `Registration` handle is the only channel in.
pub trait WorkerScript: Send + Sync + 'static {
    type InstallFut<'a>: Future<Output = InstallOutcome> + Send + 'a
    where
        Self: 'a;
    type EventFut<'a>: Future<Output = ()> + Send + 'a
    where
        Self: 'a;

    fn install<'a>(&'a self) -> Self::InstallFut<'a>;
    fn activate<'a>(&'a self) -> Self::EventFut<'a>;
    fn push<'a>(&'a self, payload: Vec<u8>) -> Self::EventFut<'a>;
    fn notification_click<'a>(&'a self, clicked: ClickedNotification) -> Self::EventFut<'a>;
}

/// Shared handle to a hosted worker. Cloneable; all clones refer to the same
/// underlying worker task.
#[derive(Clone)]
pub struct Registration {
    scope: Arc<str>,
    state: Arc<watch::Sender<WorkerState>>,
    events: mpsc::UnboundedSender<WorkerEvent>,
}

impl Registration {
    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn state(&self) -> WorkerState {
        *self.state.borrow()
    }

    /// Subscribes to state transitions. Dropping the receiver deregisters the
    /// listener; waiting code holds it only for the duration of the wait.
    pub fn watch_state(&self) -> watch::Receiver<WorkerState> {
        self.state.subscribe()
    }

    /// Signals a waiting worker to activate.
    pub fn skip_waiting(&self) {
        let _ = self.events.send(WorkerEvent::SkipWaiting);
    }

    /// Delivers an inbound push message to the worker.
    pub fn deliver_push(&self, payload: Vec<u8>) {
        let _ = self.events.send(WorkerEvent::Push(payload));
    }

    /// Routes a notification click back into the worker.
    pub fn notification_click(&self, clicked: ClickedNotification) {
        let _ = self.events.send(WorkerEvent::NotificationClick(clicked));
    }
}

#[derive(Debug)]
pub struct RegisterError(pub String);

impl std::fmt::Display for RegisterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hosts at most one logical worker registration per scope, mirroring the
/// platform runtime's singleton registration.
pub struct WorkerHost<S, F> {
    scope: String,
    factory: F,
    registration: Mutex<Option<Registration>>,
    _script: PhantomData<fn() -> S>,
}

impl<S, F> WorkerHost<S, F>
where
    S: WorkerScript,
    F: Fn() -> Result<S, String> + Send + Sync + 'static,
{
    /// `factory` stands in for fetching the worker script; an `Err` models a
    /// script or network failure during registration.
    pub fn new(scope: impl Into<String>, factory: F) -> Self {
        Self {
            scope: scope.into(),
            factory,
            registration: Mutex::new(None),
            _script: PhantomData,
        }
    }

    /// The current registration, if one exists.
    pub fn registration(&self) -> Option<Registration> {
        self.registration
            .lock()
            .expect("registration lock")
            .clone()
    }

    /// Registers the worker script, spawning its task. Returns the existing
    /// registration when a live one is already present.
    pub fn register(&self) -> Result<Registration, RegisterError> {
        let mut guard = self.registration.lock().expect("registration lock");
        if let Some(existing) = guard.as_ref()
            && existing.state() != WorkerState::Redundant
        {
            return Ok(existing.clone());
        }

        let script = (self.factory)().map_err(RegisterError)?;
        let state = Arc::new(watch::Sender::new(WorkerState::Installing));
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        tokio::spawn(run_worker(script, Arc::clone(&state), events_rx));

        let registration = Registration {
            scope: Arc::from(self.scope.as_str()),
            state,
            events: events_tx,
        };
        *guard = Some(registration.clone());
        Ok(registration)
    }
}

async fn run_worker<S: WorkerScript>(
    script: S,
    state: Arc<watch::Sender<WorkerState>>,
    mut events: mpsc::UnboundedReceiver<WorkerEvent>,
) {
    match script.install().await {
        InstallOutcome::Failed => {
            state.send_replace(WorkerState::Redundant);
            return;
        }
        InstallOutcome::Installed { skip_waiting } => {
            if !skip_waiting {
                state.send_replace(WorkerState::Waiting);
                loop {
                    match events.recv().await {
                        Some(WorkerEvent::SkipWaiting) => break,
                        // A waiting worker does not receive push traffic.
                        Some(_) => continue,
                        None => return,
                    }
                }
            }
        }
    }

    state.send_replace(WorkerState::Activated);
    script.activate().await;

    while let Some(event) = events.recv().await {
        match event {
            WorkerEvent::Push(payload) => script.push(payload).await,
            WorkerEvent::NotificationClick(clicked) => script.notification_click(clicked).await,
            WorkerEvent::SkipWaiting => {}
        }
    }
}

use std::time::Duration;

use crate::ports::time::TimeProvider;

use super::runtime::{RegisterError, Registration, WorkerHost, WorkerScript, WorkerState};

/// Worker bootstrap failures. All are terminal for the call; recovery is a
/// user-triggered reload, never an internal retry.
#[derive(Debug, PartialEq, Eq)]
pub enum WorkerError {
    RegistrationFailed(String),
    InstallFailed,
    Timeout,
}

impl std::fmt::Display for WorkerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RegistrationFailed(message) => {
                write!(f, "worker registration failed: {message}")
            }
            Self::InstallFailed => f.write_str("worker installation failed, reload and try again"),
            Self::Timeout => f.write_str("worker did not activate in time, reload and try again"),
        }
    }
}

/// Normalizes the three discovery outcomes (already active, pending, absent)
/// into one awaited active registration.
#[derive(Debug, Clone)]
pub struct WorkerLifecycle<T> {
    time: T,
    timeout: Duration,
}

impl<T: TimeProvider> WorkerLifecycle<T> {
    pub fn new(time: T, timeout: Duration) -> Self {
        Self { time, timeout }
    }

    /// Returns an active registration for the host's scope, registering the
    /// script first when none exists. Bounded by the configured timeout.
    pub async fn ready_registration<S, F>(
        &self,
        host: &WorkerHost<S, F>,
    ) -> Result<Registration, WorkerError>
    where
        S: WorkerScript,
        F: Fn() -> Result<S, String> + Send + Sync + 'static,
    {
        if let Some(registration) = host.registration() {
            if registration.state() == WorkerState::Activated {
                return Ok(registration);
            }
            return self.await_activation(registration).await;
        }

        let registration = host
            .register()
            .map_err(|RegisterError(message)| WorkerError::RegistrationFailed(message))?;
        if registration.state() == WorkerState::Activated {
            return Ok(registration);
        }
        self.await_activation(registration).await
    }

    async fn await_activation(
        &self,
        registration: Registration,
    ) -> Result<Registration, WorkerError> {
        // The listener lives exactly as long as this wait; dropping the
        // receiver on any exit path is the deregistration.
        let mut watcher = registration.watch_state();
        let outcome = {
            let wait = async {
                loop {
                    match *watcher.borrow_and_update() {
                        WorkerState::Activated => return Ok(()),
                        WorkerState::Redundant => return Err(WorkerError::InstallFailed),
                        // A parked worker stays waiting indefinitely unless
                        // nudged past the controlling one.
                        WorkerState::Waiting => registration.skip_waiting(),
                        WorkerState::Installing => {}
                    }
                    if watcher.changed().await.is_err() {
                        return Err(WorkerError::InstallFailed);
                    }
                }
            };
            tokio::select! {
                outcome = wait => outcome,
                () = self.time.sleep(self.timeout) => Err(WorkerError::Timeout),
            }
        };
        outcome.map(|()| registration)
    }
}

#[cfg(test)]
#[allow(non_snake_case)]
pub(crate) mod tests {
    use super::*;
    use crate::worker::runtime::tests::TestScript;
    use std::pin::Pin;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::task::{Context, Poll};
    use tokio::sync::oneshot;

    #[derive(Clone)]
    pub(crate) struct TestTime {
        sleeps: Arc<Mutex<Vec<oneshot::Sender<()>>>>,
        durations: Arc<Mutex<Vec<Duration>>>,
    }

    impl TestTime {
        pub(crate) fn new() -> Self {
            Self {
                sleeps: Arc::new(Mutex::new(Vec::new())),
                durations: Arc::new(Mutex::new(Vec::new())),
            }
        }

        pub(crate) fn sleep_durations(&self) -> Vec<Duration> {
            self.durations.lock().expect("durations lock").clone()
        }

        pub(crate) fn trigger_all(&self) {
            let mut sends = self.sleeps.lock().expect("sleeps lock");
            for sender in sends.drain(..) {
                let _ = sender.send(());
            }
        }
    }

    pub(crate) struct ManualSleep {
        receiver: oneshot::Receiver<()>,
    }

    impl Future for ManualSleep {
        type Output = ();

        fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
            match Pin::new(&mut self.receiver).poll(cx) {
                Poll::Ready(_) => Poll::Ready(()),
                Poll::Pending => Poll::Pending,
            }
        }
    }

    impl TimeProvider for TestTime {
        type Sleep<'a>
            = ManualSleep
        where
            Self: 'a;

        fn sleep<'a>(&'a self, duration: Duration) -> Self::Sleep<'a> {
            let (sender, receiver) = oneshot::channel();
            self.durations
                .lock()
                .expect("durations lock")
                .push(duration);
            self.sleeps.lock().expect("sleeps lock").push(sender);
            ManualSleep { receiver }
        }
    }

    fn lifecycle(time: TestTime) -> WorkerLifecycle<TestTime> {
        WorkerLifecycle::new(time, Duration::from_secs(10))
    }

    #[tokio::test]
    async fn ready_registration__should_resolve_immediately_when_already_active() {
        // Given: an activated registration
        let script = TestScript::activating();
        let calls = Arc::new(AtomicUsize::new(0));
        let factory_calls = Arc::clone(&calls);
        let host = WorkerHost::new("/", move || {
            factory_calls.fetch_add(1, Ordering::SeqCst);
            Ok(script.clone())
        });
        let time = TestTime::new();
        let existing = lifecycle(time.clone())
            .ready_registration(&host)
            .await
            .expect("first registration");
        assert_eq!(existing.state(), WorkerState::Activated);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // When
        let registration = lifecycle(time.clone())
            .ready_registration(&host)
            .await
            .expect("fast path");

        // Then: no new registration attempt, no suspension on the clock
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(registration.state(), WorkerState::Activated);
        assert_eq!(time.sleep_durations().len(), 1);
    }

    #[tokio::test]
    async fn ready_registration__should_register_and_await_activation() {
        // Given
        let script = TestScript::activating();
        let host = WorkerHost::new("/", move || Ok(script.clone()));

        // When
        let registration = lifecycle(TestTime::new())
            .ready_registration(&host)
            .await
            .expect("registration");

        // Then
        assert_eq!(registration.state(), WorkerState::Activated);
    }

    #[tokio::test]
    async fn ready_registration__should_nudge_waiting_worker_with_skip_signal() {
        // Given: a script that installs but does not skip waiting on its own
        let script = TestScript::waiting();
        let host = WorkerHost::new("/", move || Ok(script.clone()));

        // When
        let registration = lifecycle(TestTime::new())
            .ready_registration(&host)
            .await
            .expect("registration");

        // Then
        assert_eq!(registration.state(), WorkerState::Activated);
    }

    #[tokio::test]
    async fn ready_registration__should_fail_when_install_fails() {
        // Given
        let script = TestScript::failing();
        let host = WorkerHost::new("/", move || Ok(script.clone()));

        // When
        let result = lifecycle(TestTime::new()).ready_registration(&host).await;

        // Then
        assert_eq!(result.err(), Some(WorkerError::InstallFailed));
    }

    #[tokio::test]
    async fn ready_registration__should_time_out_when_worker_stays_installing() {
        // Given: a worker stuck in installing
        let script = TestScript::stuck();
        let host = WorkerHost::new("/", move || Ok(script.clone()));
        let time = TestTime::new();
        let manager = lifecycle(time.clone());

        // When
        let pending = tokio::spawn({
            let time = time.clone();
            async move {
                // Let the wait park on the clock before firing it.
                tokio::task::yield_now().await;
                time.trigger_all();
            }
        });
        let result = manager.ready_registration(&host).await;
        pending.await.expect("trigger task");

        // Then
        assert_eq!(result.err(), Some(WorkerError::Timeout));
        assert_eq!(time.sleep_durations(), vec![Duration::from_secs(10)]);
    }

    #[tokio::test]
    async fn ready_registration__should_classify_registration_failure() {
        // Given
        let host =
            WorkerHost::<TestScript, _>::new("/", || Err("script unreachable".to_string()));

        // When
        let result = lifecycle(TestTime::new()).ready_registration(&host).await;

        // Then
        match result.err().expect("registration error") {
            WorkerError::RegistrationFailed(message) => {
                assert_eq!(message, "script unreachable")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}

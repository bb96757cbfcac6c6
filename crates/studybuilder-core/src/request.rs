//! Request lifecycle controller.
//!
//! [`AsyncController`] wraps one logical asynchronous operation and exposes
//! its status, last data and last error to any number of observers.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Pending -> (Resolved | Rejected)
//!           ^               |
//!           +---- run() ----+
//! ```
//!
//! Every `run()` takes a new generation number. A settlement is committed
//! only if its generation is still the current one and the controller has not
//! been torn down; anything else is dropped without touching the state.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::error::RemoteError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RequestStatus {
    Idle,
    Pending,
    Resolved,
    Rejected,
}

/// Snapshot of a controller.
#[derive(Debug, Clone, PartialEq)]
pub struct AsyncState<T, E = RemoteError> {
    pub status: RequestStatus,
    pub data: Option<T>,
    pub error: Option<E>,
}

impl<T, E> AsyncState<T, E> {
    pub fn idle() -> Self {
        Self {
            status: RequestStatus::Idle,
            data: None,
            error: None,
        }
    }

    /// Initial state for screens that render a spinner before the first run.
    pub fn pending() -> Self {
        Self {
            status: RequestStatus::Pending,
            data: None,
            error: None,
        }
    }
}

impl<T, E> Default for AsyncState<T, E> {
    fn default() -> Self {
        Self::idle()
    }
}

/// How a `run()` ended from the controller's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Resolved,
    Rejected,
    /// A newer `run()` started before this one settled.
    Superseded,
    /// The consumer went away before this run settled.
    Abandoned,
}

impl RunOutcome {
    pub fn is_committed(self) -> bool {
        matches!(self, RunOutcome::Resolved | RunOutcome::Rejected)
    }
}

type Observer<T, E> = Arc<dyn Fn(&AsyncState<T, E>) + Send + Sync>;

struct Inner<T, E> {
    state: AsyncState<T, E>,
    generation: u64,
    torn_down: bool,
    observers: Vec<(u64, Observer<T, E>)>,
    next_observer_id: u64,
}

/// Async request lifecycle state machine.
///
/// Cloning yields another handle to the same controller.
pub struct AsyncController<T, E = RemoteError> {
    inner: Arc<Mutex<Inner<T, E>>>,
}

impl<T, E> Clone for AsyncController<T, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

fn lock<T, E>(inner: &Mutex<Inner<T, E>>) -> MutexGuard<'_, Inner<T, E>> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<T, E> AsyncController<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + std::fmt::Display + 'static,
{
    pub fn new() -> Self {
        Self::with_state(AsyncState::idle())
    }

    pub fn with_state(initial: AsyncState<T, E>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                state: initial,
                generation: 0,
                torn_down: false,
                observers: Vec::new(),
                next_observer_id: 0,
            })),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> AsyncState<T, E> {
        lock(&self.inner).state.clone()
    }

    pub fn status(&self) -> RequestStatus {
        lock(&self.inner).state.status
    }

    pub fn data(&self) -> Option<T> {
        lock(&self.inner).state.data.clone()
    }

    pub fn error(&self) -> Option<E> {
        lock(&self.inner).state.error.clone()
    }

    pub fn is_torn_down(&self) -> bool {
        lock(&self.inner).torn_down
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Register an observer called after every committed change.
    ///
    /// The controller counts as torn down once the last subscription is
    /// dropped; subscribing again brings it back.
    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&AsyncState<T, E>) + Send + Sync + 'static,
    {
        let id = {
            let mut inner = lock(&self.inner);
            let id = inner.next_observer_id;
            inner.next_observer_id += 1;
            inner.observers.push((id, Arc::new(observer)));
            inner.torn_down = false;
            id
        };

        let weak = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                let mut inner = lock(&inner);
                inner.observers.retain(|(oid, _)| *oid != id);
                if inner.observers.is_empty() {
                    Self::tear_down_locked(&mut inner);
                }
            }
        })
    }

    /// Mark the consumer as gone. In-flight runs settle into nothing.
    pub fn teardown(&self) {
        let mut inner = lock(&self.inner);
        Self::tear_down_locked(&mut inner);
    }

    fn tear_down_locked(inner: &mut Inner<T, E>) {
        inner.torn_down = true;
        // in-flight runs can no longer match
        inner.generation += 1;
        tracing::debug!(generation = inner.generation, "request controller torn down");
    }

    /// Replace `data` without touching `status`.
    pub fn set_data(&self, value: T) {
        let mut inner = lock(&self.inner);
        if inner.torn_down {
            return;
        }
        inner.state.data = Some(value);
        self.notify(inner);
    }

    /// Start a new run of the operation produced by `factory`.
    ///
    /// The controller moves to `Pending` (clearing data and error) before
    /// this returns. The returned future drives the operation and commits its
    /// result, unless a newer run started or the consumer was torn down in
    /// the meantime.
    pub fn run<F, Fut>(&self, factory: F) -> impl Future<Output = RunOutcome> + Send + 'static
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let generation = {
            let mut inner = lock(&self.inner);
            inner.generation += 1;
            let generation = inner.generation;
            if inner.torn_down {
                tracing::debug!(generation, "run after teardown, state left as is");
            } else {
                inner.state = AsyncState::pending();
                tracing::debug!(generation, "request pending");
                self.notify(inner);
            }
            generation
        };

        let operation = factory();
        let handle = self.clone();
        async move {
            let result = operation.await;
            handle.settle(generation, result)
        }
    }

    fn settle(&self, generation: u64, result: Result<T, E>) -> RunOutcome {
        let mut inner = lock(&self.inner);
        if inner.torn_down {
            tracing::debug!(generation, "settlement dropped after teardown");
            return RunOutcome::Abandoned;
        }
        if generation != inner.generation {
            tracing::debug!(
                generation,
                current = inner.generation,
                "stale settlement dropped"
            );
            return RunOutcome::Superseded;
        }

        let outcome = match result {
            Ok(data) => {
                inner.state = AsyncState {
                    status: RequestStatus::Resolved,
                    data: Some(data),
                    error: None,
                };
                RunOutcome::Resolved
            }
            Err(error) => {
                tracing::debug!(generation, %error, "request rejected");
                inner.state.status = RequestStatus::Rejected;
                inner.state.error = Some(error);
                RunOutcome::Rejected
            }
        };
        self.notify(inner);
        outcome
    }

    /// Release the lock, then call observers with the new snapshot.
    fn notify(&self, inner: MutexGuard<'_, Inner<T, E>>) {
        if inner.torn_down || inner.observers.is_empty() {
            return;
        }
        let snapshot = inner.state.clone();
        let observers: Vec<_> = inner.observers.iter().map(|(_, o)| Arc::clone(o)).collect();
        drop(inner);
        for observer in observers {
            observer(&snapshot);
        }
    }
}

impl<T, E> Default for AsyncController<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + std::fmt::Display + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Live observer registration. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub(crate) fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    pub fn unsubscribe(mut self) {
        self.release_now();
    }

    fn release_now(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release_now();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.release.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::oneshot;

    type Controller = AsyncController<String, RemoteError>;

    fn deferred() -> (
        oneshot::Sender<Result<String, RemoteError>>,
        impl Future<Output = Result<String, RemoteError>> + Send + 'static,
    ) {
        let (tx, rx) = oneshot::channel();
        let fut = async move { rx.await.unwrap_or(Err(RemoteError::Offline)) };
        (tx, fut)
    }

    #[test]
    fn starts_idle() {
        let controller = Controller::new();
        assert_eq!(controller.state(), AsyncState::idle());
    }

    #[tokio::test]
    async fn run_resolves_with_value() {
        let controller = Controller::new();
        let outcome = controller
            .run(|| async { Ok::<_, RemoteError>("done".to_string()) })
            .await;
        assert_eq!(outcome, RunOutcome::Resolved);
        let state = controller.state();
        assert_eq!(state.status, RequestStatus::Resolved);
        assert_eq!(state.data.as_deref(), Some("done"));
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn run_is_pending_before_first_poll() {
        let controller = Controller::new();
        controller.set_data("old".into());
        let (tx, fut) = deferred();
        let run = controller.run(move || fut);
        assert_eq!(controller.status(), RequestStatus::Pending);
        assert!(controller.data().is_none());
        tx.send(Ok("new".into())).unwrap();
        assert_eq!(run.await, RunOutcome::Resolved);
    }

    #[tokio::test]
    async fn rejection_records_error() {
        let controller = Controller::new();
        let outcome = controller
            .run(|| async { Err::<String, _>(RemoteError::Status { status: 500, message: "boom".into() }) })
            .await;
        assert_eq!(outcome, RunOutcome::Rejected);
        let state = controller.state();
        assert_eq!(state.status, RequestStatus::Rejected);
        assert!(state.data.is_none());
        assert_eq!(
            state.error,
            Some(RemoteError::Status { status: 500, message: "boom".into() })
        );
    }

    #[tokio::test]
    async fn rerun_from_settled_goes_back_to_pending() {
        let controller = Controller::new();
        controller.run(|| async { Ok("first".to_string()) }).await;
        let (tx, fut) = deferred();
        let run = controller.run(move || fut);
        assert_eq!(controller.status(), RequestStatus::Pending);
        tx.send(Err(RemoteError::Offline)).unwrap();
        run.await;
        assert_eq!(controller.status(), RequestStatus::Rejected);
    }

    #[tokio::test]
    async fn late_first_run_does_not_override_second() {
        let controller = Controller::new();
        let (tx1, fut1) = deferred();
        let (tx2, fut2) = deferred();
        let run1 = controller.run(move || fut1);
        let run2 = controller.run(move || fut2);

        tx2.send(Ok("second".into())).unwrap();
        assert_eq!(run2.await, RunOutcome::Resolved);
        tx1.send(Ok("first".into())).unwrap();
        assert_eq!(run1.await, RunOutcome::Superseded);

        let state = controller.state();
        assert_eq!(state.status, RequestStatus::Resolved);
        assert_eq!(state.data.as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn late_rejection_of_first_run_is_ignored() {
        let controller = Controller::new();
        let (tx1, fut1) = deferred();
        let (tx2, fut2) = deferred();
        let run1 = controller.run(move || fut1);
        let run2 = controller.run(move || fut2);

        tx2.send(Ok("second".into())).unwrap();
        run2.await;
        tx1.send(Err(RemoteError::Offline)).unwrap();
        assert_eq!(run1.await, RunOutcome::Superseded);
        assert!(controller.error().is_none());
    }

    #[tokio::test]
    async fn no_update_after_unsubscribe() {
        let controller = Controller::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let subscription = controller.subscribe(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        let (tx, fut) = deferred();
        let run = controller.run(move || fut);
        let after_run = calls.load(Ordering::SeqCst);
        assert_eq!(after_run, 1);

        subscription.unsubscribe();
        assert!(controller.is_torn_down());
        tx.send(Ok("late".into())).unwrap();
        assert_eq!(run.await, RunOutcome::Abandoned);

        assert_eq!(calls.load(Ordering::SeqCst), after_run);
        assert_eq!(controller.status(), RequestStatus::Pending);
        assert!(controller.data().is_none());
    }

    #[tokio::test]
    async fn observers_see_each_transition() {
        let controller = Controller::new();
        let statuses = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&statuses);
        let _subscription = controller.subscribe(move |state| {
            sink.lock().unwrap().push(state.status);
        });
        controller.run(|| async { Ok("x".to_string()) }).await;
        assert_eq!(
            *statuses.lock().unwrap(),
            vec![RequestStatus::Pending, RequestStatus::Resolved]
        );
    }

    #[tokio::test]
    async fn set_data_keeps_status() {
        let controller = Controller::new();
        controller.run(|| async { Ok("fetched".to_string()) }).await;
        controller.set_data("saved locally".into());
        assert_eq!(controller.status(), RequestStatus::Resolved);
        assert_eq!(controller.data().as_deref(), Some("saved locally"));
    }

    #[tokio::test]
    async fn data_seeded_during_run_survives_rejection() {
        let controller = Controller::new();
        let (tx, fut) = deferred();
        let run = controller.run(move || fut);
        controller.set_data("last known good".into());
        tx.send(Err(RemoteError::Offline)).unwrap();
        assert_eq!(run.await, RunOutcome::Rejected);
        let state = controller.state();
        assert_eq!(state.status, RequestStatus::Rejected);
        assert_eq!(state.data.as_deref(), Some("last known good"));
        assert_eq!(state.error, Some(RemoteError::Offline));
    }

    #[tokio::test]
    async fn run_after_teardown_leaves_state_alone() {
        let controller = Controller::new();
        controller.run(|| async { Ok("kept".to_string()) }).await;
        controller.teardown();

        let run = controller.run(|| async { Ok("ignored".to_string()) });
        assert_eq!(controller.status(), RequestStatus::Resolved);
        assert_eq!(run.await, RunOutcome::Abandoned);
        assert_eq!(controller.data().as_deref(), Some("kept"));
    }

    #[tokio::test]
    async fn resubscribing_after_teardown_allows_new_runs() {
        let controller = Controller::new();
        controller.teardown();
        let _subscription = controller.subscribe(|_| {});
        let outcome = controller.run(|| async { Ok("again".to_string()) }).await;
        assert_eq!(outcome, RunOutcome::Resolved);
    }
}

//! Single-assignment completion cells for in-flight engine operations.
//!
//! [`pending`] hands out a [`Completer`] to the engine and a [`DriverFuture`] to the caller.
//! The engine settles the cell exactly once from its own threads; the caller blocks in
//! [`DriverFuture::wait`]/[`DriverFuture::wait_timed`] or awaits [`DriverFuture::wait_async`].
//! Once settled the state never changes again.

use std::fmt;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::Notify;
use tracing::{debug, warn};

use crate::error::CqlMiddlewareDbError;
use crate::taxonomy::{DriverError, ErrorCode, ErrorSource, LibraryError};

/// Observable state of a [`DriverFuture`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FutureState {
    Pending,
    Success,
    Failure,
}

struct Slot<T> {
    state: FutureState,
    payload: Option<T>,
    error: Option<DriverError>,
}

struct Shared<T> {
    operation: &'static str,
    slot: Mutex<Slot<T>>,
    settled: Condvar,
    notify: Notify,
}

impl<T> Shared<T> {
    fn lock(&self) -> MutexGuard<'_, Slot<T>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn settle(&self, outcome: Result<T, DriverError>) {
        {
            let mut slot = self.lock();
            if slot.state != FutureState::Pending {
                return;
            }
            match outcome {
                Ok(payload) => {
                    debug!(operation = self.operation, "operation completed");
                    slot.payload = Some(payload);
                    slot.state = FutureState::Success;
                }
                Err(err) => {
                    warn!(
                        operation = self.operation,
                        source = %err.error_source(),
                        code = %err.code(),
                        message = err.message(),
                        "operation failed"
                    );
                    slot.error = Some(err);
                    slot.state = FutureState::Failure;
                }
            }
        }
        self.settled.notify_all();
        self.notify.notify_waiters();
    }
}

type Sink<T> = Box<dyn FnOnce(Result<T, DriverError>) + Send>;

/// Create a linked completer/future pair for one operation.
#[must_use]
pub fn pending<T: Send + 'static>(operation: &'static str) -> (Completer<T>, DriverFuture<T>) {
    let shared = Arc::new(Shared {
        operation,
        slot: Mutex::new(Slot {
            state: FutureState::Pending,
            payload: None,
            error: None,
        }),
        settled: Condvar::new(),
        notify: Notify::new(),
    });
    let target = Arc::clone(&shared);
    (
        Completer {
            operation,
            sink: Some(Box::new(move |outcome| target.settle(outcome))),
        },
        DriverFuture { shared },
    )
}

/// A future that is already settled, for failures detected before the engine is involved.
#[must_use]
pub fn settled<T: Send + 'static>(
    operation: &'static str,
    outcome: Result<T, DriverError>,
) -> DriverFuture<T> {
    let (completer, future) = pending(operation);
    completer.complete(outcome);
    future
}

/// Producer side of a [`DriverFuture`]. Consumed by completion, so a cell settles at most once.
///
/// Dropping a completer without completing it fails the future with
/// `(Library, UnexpectedResponse)` so waiters are never stranded.
pub struct Completer<T> {
    operation: &'static str,
    sink: Option<Sink<T>>,
}

impl<T: Send + 'static> Completer<T> {
    pub fn complete(mut self, outcome: Result<T, DriverError>) {
        if let Some(sink) = self.sink.take() {
            sink(outcome);
        }
    }

    pub fn succeed(self, payload: T) {
        self.complete(Ok(payload));
    }

    pub fn fail(self, err: DriverError) {
        self.complete(Err(err));
    }

    /// Fail with the engine's packed `(source << 24) | code` signal.
    pub fn fail_raw(self, raw_code: u32, message: impl Into<String>) {
        self.complete(Err(DriverError::from_raw(raw_code, message)));
    }

    /// Adapt this completer to an engine that produces `U` instead of `T`.
    #[must_use]
    pub fn map<U, F>(mut self, f: F) -> Completer<U>
    where
        U: Send + 'static,
        F: FnOnce(U) -> T + Send + 'static,
    {
        let sink = self.sink.take();
        Completer {
            operation: self.operation,
            sink: sink.map(|sink| -> Sink<U> { Box::new(move |outcome| sink(outcome.map(f))) }),
        }
    }
}

impl<T> Drop for Completer<T> {
    fn drop(&mut self) {
        if let Some(sink) = self.sink.take() {
            warn!(operation = self.operation, "completer dropped before completion");
            sink(Err(DriverError::new(
                ErrorCode::Library(LibraryError::UnexpectedResponse),
                "operation abandoned before completion",
            )));
        }
    }
}

impl<T> fmt::Debug for Completer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completer")
            .field("operation", &self.operation)
            .field("settled", &self.sink.is_none())
            .finish()
    }
}

/// Handle to the eventual outcome of one asynchronous operation.
///
/// Any number of threads may poll or wait on a shared reference; the payload is taken once, by
/// the owner, through [`DriverFuture::into_outcome`] or one of the typed accessors.
pub struct DriverFuture<T> {
    shared: Arc<Shared<T>>,
}

impl<T> DriverFuture<T> {
    #[must_use]
    pub fn state(&self) -> FutureState {
        self.shared.lock().state
    }

    /// Non-blocking poll.
    #[must_use]
    pub fn ready(&self) -> bool {
        self.state() != FutureState::Pending
    }

    /// Block the calling thread until the operation settles.
    pub fn wait(&self) {
        let slot = self.shared.lock();
        let _slot = self
            .shared
            .settled
            .wait_while(slot, |s| s.state == FutureState::Pending)
            .unwrap_or_else(PoisonError::into_inner);
    }

    /// Block for at most `timeout`. Returns whether the operation settled.
    ///
    /// A timeout does not cancel the operation; the future stays valid and may settle later.
    pub fn wait_timed(&self, timeout: Duration) -> bool {
        let slot = self.shared.lock();
        let (slot, _timed_out) = self
            .shared
            .settled
            .wait_timeout_while(slot, timeout, |s| s.state == FutureState::Pending)
            .unwrap_or_else(PoisonError::into_inner);
        slot.state != FutureState::Pending
    }

    /// Suspend the current task until the operation settles, without blocking the thread.
    pub async fn wait_async(&self) {
        loop {
            let notified = self.shared.notify.notified();
            if self.ready() {
                return;
            }
            notified.await;
        }
    }

    /// The classified failure, if the operation failed.
    #[must_use]
    pub fn error(&self) -> Option<DriverError> {
        self.shared.lock().error.clone()
    }

    /// `ErrorSource::None` unless the operation failed.
    #[must_use]
    pub fn error_source(&self) -> ErrorSource {
        self.error().map_or(ErrorSource::None, |e| e.error_source())
    }

    /// `ErrorCode::Ok` unless the operation failed.
    #[must_use]
    pub fn error_code(&self) -> ErrorCode {
        self.error().map_or(ErrorCode::Ok, |e| e.code())
    }

    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        self.error().map(|e| e.message().to_owned())
    }

    /// Wait for the operation and take its outcome.
    ///
    /// # Errors
    ///
    /// Returns `CqlMiddlewareDbError::Driver` with the classified failure if the operation
    /// failed.
    pub fn into_outcome(self) -> Result<T, CqlMiddlewareDbError> {
        self.wait();
        self.take_outcome()
    }

    /// Async counterpart of [`DriverFuture::into_outcome`].
    ///
    /// # Errors
    ///
    /// Returns `CqlMiddlewareDbError::Driver` with the classified failure if the operation
    /// failed.
    pub async fn outcome_async(self) -> Result<T, CqlMiddlewareDbError> {
        self.wait_async().await;
        self.take_outcome()
    }

    fn take_outcome(&self) -> Result<T, CqlMiddlewareDbError> {
        let mut slot = self.shared.lock();
        if let Some(err) = &slot.error {
            return Err(err.clone().into());
        }
        slot.payload.take().ok_or_else(|| {
            DriverError::new(
                ErrorCode::Library(LibraryError::UnexpectedResponse),
                format!("{} payload already taken", self.shared.operation),
            )
            .into()
        })
    }
}

impl<T> fmt::Debug for DriverFuture<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverFuture")
            .field("operation", &self.shared.operation)
            .field("state", &self.state())
            .finish()
    }
}

//! State shared between a cursor's consumer and the connection's reader task
//!
//! The queue, state and fetch bookkeeping live behind one mutex. The reader
//! task enqueues batches; the consumer dequeues rows and waits on a
//! [`Notify`] when there is nothing to take. No lock is held across an
//! await point, and requests go out through the connection's non-blocking
//! outbound queue, so both sides only ever hold the lock briefly.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::sync::Notify;
use tracing::{debug, trace};

use crate::connection::ConnectionShared;
use crate::cursor::scheduler::{FetchScheduler, PrefetchWindow};
use crate::cursor::state::{CursorMode, CursorState, CursorStats};
use crate::error::{Error, Result};
use crate::protocol::{Batch, Continuation, Query};
use crate::row::Row;

pub(crate) struct CursorInner {
    pub(super) state: CursorState,
    pub(super) mode: CursorMode,
    pub(super) queue: VecDeque<Row>,
    pub(super) scheduler: FetchScheduler,
    /// The server sent its final batch; Exhausted once the queue drains
    pub(super) server_done: bool,
    pub(super) error: Option<Error>,
    pub(super) delivered: u64,
    pub(super) batches: u64,
}

pub(crate) struct CursorShared {
    token: u64,
    connection: Weak<ConnectionShared>,
    inner: Mutex<CursorInner>,
    pub(super) notify: Notify,
}

impl CursorShared {
    /// Create the shared state for a query whose initial request is about
    /// to be sent
    pub(crate) fn new(
        token: u64,
        connection: Weak<ConnectionShared>,
        window: PrefetchWindow,
    ) -> Arc<Self> {
        Arc::new(Self {
            token,
            connection,
            inner: Mutex::new(CursorInner {
                state: CursorState::Active,
                mode: CursorMode::Unknown,
                queue: VecDeque::new(),
                scheduler: FetchScheduler::new(window),
                server_done: false,
                error: None,
                delivered: 0,
                batches: 0,
            }),
            notify: Notify::new(),
        })
    }

    pub(crate) fn token(&self) -> u64 {
        self.token
    }

    pub(super) fn lock(&self) -> MutexGuard<'_, CursorInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(super) fn send(&self, query: Query) -> Result<()> {
        let connection = self.connection.upgrade().ok_or(Error::ConnectionClosed)?;
        connection.send(query.to_frame(self.token)?)
    }

    pub(super) fn deregister(&self) {
        if let Some(connection) = self.connection.upgrade() {
            connection.deregister(self.token);
        }
    }

    // =========================================================================
    // Consumer side
    // =========================================================================

    /// Take the next row or terminal signal, or `None` if the caller must wait
    pub(super) fn try_next(&self) -> Option<Result<Option<Row>>> {
        let mut inner = self.lock();

        if let Some(row) = inner.queue.pop_front() {
            inner.delivered += 1;
            if inner.queue.is_empty() && inner.server_done {
                self.exhaust_locked(&mut inner);
            } else {
                self.schedule(&mut inner);
            }
            return Some(Ok(Some(row)));
        }

        match inner.state {
            CursorState::Exhausted => Some(Ok(None)),
            CursorState::Errored => Some(Err(terminal_error(&inner))),
            CursorState::Closed => Some(Err(Error::CursorClosed)),
            CursorState::Active | CursorState::Fetching => {
                if inner.server_done {
                    self.exhaust_locked(&mut inner);
                    return Some(Ok(None));
                }
                self.schedule(&mut inner);
                match inner.state {
                    CursorState::Errored => Some(Err(terminal_error(&inner))),
                    _ => None,
                }
            }
        }
    }

    /// Wait for the next row or terminal signal
    pub(crate) async fn next_row(&self, timeout: Option<Duration>) -> Result<Option<Row>> {
        loop {
            if let Some(result) = self.try_next() {
                return result;
            }
            match timeout {
                None => self.notify.notified().await,
                Some(limit) => {
                    if tokio::time::timeout(limit, self.notify.notified())
                        .await
                        .is_err()
                    {
                        self.expire(limit);
                    }
                }
            }
        }
    }

    /// Issue a continuation request if the scheduler asks for one
    fn schedule(&self, inner: &mut CursorInner) {
        if inner.state.is_terminal()
            || inner.server_done
            || !inner.scheduler.should_fetch(inner.queue.len())
        {
            return;
        }

        match self.send(Query::Continue) {
            Ok(()) => {
                inner.scheduler.begin();
                inner.state = CursorState::Fetching;
                trace!(
                    token = self.token,
                    queued = inner.queue.len(),
                    "requested next batch"
                );
            }
            Err(err) => {
                debug!(token = self.token, error = %err, "continuation request failed");
                self.fail_locked(inner, err);
            }
        }
    }

    // =========================================================================
    // Producer side
    // =========================================================================

    /// Deliver a decoded response (or the decode failure) for this cursor
    pub(crate) fn on_batch(&self, batch: Result<Batch>) {
        {
            let mut inner = self.lock();
            if inner.state.is_terminal() || inner.server_done {
                debug!(
                    token = self.token,
                    state = %inner.state,
                    "dropping response for finished cursor"
                );
                return;
            }

            let rows = batch.as_ref().map(Batch::len).unwrap_or(0);
            inner.scheduler.complete(rows);
            inner.state = CursorState::Active;

            match batch {
                Err(err) => {
                    self.fail_locked(&mut inner, err);
                }
                Ok(batch) => {
                    inner.batches += 1;
                    match batch.feed {
                        Some(feed) => inner.mode = CursorMode::Changefeed(feed),
                        None if inner.mode == CursorMode::Unknown => {
                            inner.mode = CursorMode::Finite
                        }
                        None => {}
                    }
                    trace!(token = self.token, rows, "received batch");
                    inner.queue.extend(batch.rows);

                    match batch.continuation {
                        Continuation::More => self.schedule(&mut inner),
                        Continuation::Done => self.finish_locked(&mut inner),
                        Continuation::Error(err) => {
                            self.fail_locked(&mut inner, err);
                        }
                    }
                }
            }
        }
        self.notify.notify_one();
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    pub(crate) fn state(&self) -> CursorState {
        self.lock().state
    }

    pub(crate) fn mode(&self) -> CursorMode {
        self.lock().mode
    }

    pub(crate) fn stats(&self) -> CursorStats {
        let inner = self.lock();
        CursorStats {
            token: self.token,
            state: inner.state,
            mode: inner.mode,
            rows_delivered: inner.delivered,
            rows_buffered: inner.queue.len(),
            batches_received: inner.batches,
            continuations_sent: inner.scheduler.continuations(),
            fetch_in_flight: inner.scheduler.in_flight(),
            low_water_mark: inner.scheduler.low_water_mark(),
        }
    }
}

fn terminal_error(inner: &CursorInner) -> Error {
    inner
        .error
        .clone()
        .unwrap_or_else(|| Error::Internal("errored cursor without an error".to_string()))
}

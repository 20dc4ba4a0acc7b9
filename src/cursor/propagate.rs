//! Terminal transitions
//!
//! Every way a cursor can end goes through here. The first terminal
//! transition wins; later signals are logged and dropped.

use std::time::Duration;

use tracing::{debug, trace, warn};

use crate::cursor::shared::{CursorInner, CursorShared};
use crate::cursor::state::CursorState;
use crate::error::Error;
use crate::protocol::Query;

impl CursorShared {
    /// The server sent its final batch
    pub(super) fn finish_locked(&self, inner: &mut CursorInner) {
        inner.server_done = true;
        inner.scheduler.cancel();
        self.deregister();
        if inner.queue.is_empty() {
            self.exhaust_locked(inner);
        }
    }

    pub(super) fn exhaust_locked(&self, inner: &mut CursorInner) {
        inner.state = CursorState::Exhausted;
        debug!(
            token = self.token(),
            rows = inner.delivered,
            "cursor exhausted"
        );
    }

    /// Move to Errored, keeping queued rows for delivery. Returns false if
    /// the cursor had already reached an outcome.
    pub(super) fn fail_locked(&self, inner: &mut CursorInner, err: Error) -> bool {
        if inner.state.is_terminal() || inner.server_done {
            debug!(
                token = self.token(),
                state = %inner.state,
                error = %err,
                "ignoring error for finished cursor"
            );
            return false;
        }

        debug!(
            token = self.token(),
            buffered = inner.queue.len(),
            error = %err,
            "cursor failed"
        );
        inner.scheduler.cancel();
        inner.state = CursorState::Errored;
        inner.error = Some(err);
        self.deregister();
        true
    }

    /// Fail the cursor from outside the consumer flow
    pub(crate) fn fail(&self, err: Error) {
        let changed = {
            let mut inner = self.lock();
            self.fail_locked(&mut inner, err)
        };
        if changed {
            self.notify.notify_one();
        }
    }

    /// Close the cursor, discarding queued rows. Never waits on the server.
    pub(crate) fn close(&self) {
        {
            let mut inner = self.lock();
            if inner.state == CursorState::Closed {
                return;
            }

            let server_open = !inner.state.is_terminal() && !inner.server_done;
            let discarded = inner.queue.len();
            inner.queue.clear();
            inner.state = CursorState::Closed;
            inner.error = None;
            inner.scheduler.cancel();

            if server_open {
                if let Err(err) = self.send(Query::Stop) {
                    trace!(token = self.token(), error = %err, "stop request not sent");
                }
            }
            self.deregister();
            debug!(token = self.token(), discarded, "cursor closed");
        }
        self.notify.notify_one();
    }

    /// A wait for an in-flight response ran out of time
    pub(super) fn expire(&self, limit: Duration) {
        let mut inner = self.lock();
        if inner.state.is_terminal() || inner.server_done || !inner.queue.is_empty() {
            return;
        }

        warn!(token = self.token(), ?limit, "timed out waiting for response");
        if let Err(err) = self.send(Query::Stop) {
            trace!(token = self.token(), error = %err, "stop request not sent");
        }
        self.fail_locked(&mut inner, Error::FetchTimeout(limit));
    }
}

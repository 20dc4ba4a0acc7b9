//! Cursor registry
//!
//! Maps query tokens to the cursors waiting on them so the reader task can
//! route each inbound frame. Once the connection is lost the registry stays
//! closed and refuses new registrations with the same reason.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tracing::trace;

use crate::cursor::shared::CursorShared;
use crate::error::{Error, Result};
use crate::protocol::{decode_batch, Frame};

#[derive(Default)]
struct RegistryInner {
    cursors: HashMap<u64, Weak<CursorShared>>,
    closed: Option<Error>,
}

#[derive(Default)]
pub(crate) struct CursorRegistry {
    inner: Mutex<RegistryInner>,
}

impl CursorRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RegistryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn register(&self, token: u64, cursor: &Arc<CursorShared>) -> Result<()> {
        let mut inner = self.lock();
        if let Some(reason) = &inner.closed {
            return Err(reason.clone());
        }
        inner.cursors.insert(token, Arc::downgrade(cursor));
        Ok(())
    }

    pub(crate) fn deregister(&self, token: u64) -> bool {
        self.lock().cursors.remove(&token).is_some()
    }

    fn lookup(&self, token: u64) -> Option<Arc<CursorShared>> {
        let mut inner = self.lock();
        let cursor = inner.cursors.get(&token)?.upgrade();
        if cursor.is_none() {
            inner.cursors.remove(&token);
        }
        cursor
    }

    /// Route one inbound frame to its cursor
    pub(crate) fn dispatch(&self, frame: Frame) {
        match self.lookup(frame.token) {
            Some(cursor) => cursor.on_batch(decode_batch(&frame)),
            None => trace!(token = frame.token, "dropping frame for unknown token"),
        }
    }

    /// Fail every registered cursor and refuse new ones.
    ///
    /// Returns the number of cursors failed, or `None` if the registry was
    /// already closed.
    pub(crate) fn fail_all(&self, err: Error) -> Option<usize> {
        let cursors: Vec<Arc<CursorShared>> = {
            let mut inner = self.lock();
            if inner.closed.is_some() {
                return None;
            }
            inner.closed = Some(err.clone());
            inner
                .cursors
                .drain()
                .filter_map(|(_, cursor)| cursor.upgrade())
                .collect()
        };

        for cursor in &cursors {
            cursor.fail(err.clone());
        }
        Some(cursors.len())
    }

    pub(crate) fn closed_reason(&self) -> Option<Error> {
        self.lock().closed.clone()
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().cursors.len()
    }
}

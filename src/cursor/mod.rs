//! Streaming cursors
//!
//! A [`Cursor`] is a pull-based handle over a server-produced row stream.
//! Rows are fetched in batches ahead of the consumer, bounded by the
//! [`PrefetchWindow`], with at most one request in flight at a time.
//!
//! # Example
//!
//! ```rust,no_run
//! use reql_cursor::Connection;
//! use serde_json::json;
//!
//! # async fn example() -> reql_cursor::Result<()> {
//! let conn = Connection::connect("localhost:28015".parse()?).await?;
//!
//! // r.db("test").table("users")
//! let mut cursor = conn.open_cursor(json!([15, [[14, ["test"]], "users"]]))?;
//!
//! while let Some(row) = cursor.next().await? {
//!     println!("{:?}", row.get_str("name"));
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Table scans and changefeeds use the same type. A changefeed simply never
//! reaches [`CursorState::Exhausted`]; check [`Cursor::mode`] to tell them
//! apart.

mod propagate;
mod scheduler;
pub(crate) mod shared;
mod state;
mod stream;

pub use scheduler::PrefetchWindow;
pub use state::{CursorMode, CursorState, CursorStats};
pub use stream::CursorStream;

use std::sync::Arc;

use crate::config::CursorOptions;
use crate::error::Result;
use crate::row::Row;

use shared::CursorShared;

/// A lazily fetched, non-restartable sequence of rows.
///
/// `next()` takes `&mut self`, so a cursor has exactly one consumer. Use
/// [`Cursor::handle`] to close or inspect it from another task while a
/// `next()` call is waiting.
pub struct Cursor {
    pub(crate) shared: Arc<CursorShared>,
    pub(crate) options: CursorOptions,
}

impl Cursor {
    pub(crate) fn new(shared: Arc<CursorShared>, options: CursorOptions) -> Self {
        Self { shared, options }
    }

    /// Get the next row.
    ///
    /// Returns `Ok(Some(row))` while rows remain, `Ok(None)` once the result
    /// set is exhausted (and on every call after that), and `Err` if the
    /// stream failed. Rows received before a failure are delivered before
    /// the error, and the same error is returned on every later call.
    /// Calling `next()` on a closed cursor returns
    /// [`Error::CursorClosed`](crate::Error::CursorClosed).
    pub async fn next(&mut self) -> Result<Option<Row>> {
        self.shared.next_row(self.options.fetch_timeout).await
    }

    /// Close the cursor.
    ///
    /// Idempotent and non-blocking. Queued rows are discarded and, if the
    /// server still holds the query open, a stop request is queued without
    /// waiting for its acknowledgement.
    pub fn close(&self) {
        self.shared.close();
    }

    /// Get a handle that can close or inspect this cursor from elsewhere
    pub fn handle(&self) -> CursorHandle {
        CursorHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// The query token
    pub fn token(&self) -> u64 {
        self.shared.token()
    }

    /// The current state
    pub fn state(&self) -> CursorState {
        self.shared.state()
    }

    /// Whether this cursor reads a finite result or a changefeed
    pub fn mode(&self) -> CursorMode {
        self.shared.mode()
    }

    /// Check if the cursor has reached a terminal state
    pub fn is_terminal(&self) -> bool {
        self.state().is_terminal()
    }

    /// Diagnostics snapshot
    pub fn stats(&self) -> CursorStats {
        self.shared.stats()
    }

    /// The options this cursor was opened with
    pub fn options(&self) -> &CursorOptions {
        &self.options
    }

    /// Drain the remaining rows into a Vec.
    ///
    /// Never returns for a changefeed unless it fails or is closed through
    /// a [`CursorHandle`].
    pub async fn collect_rows(mut self) -> Result<Vec<Row>> {
        let mut rows = Vec::new();
        while let Some(row) = self.next().await? {
            rows.push(row);
        }
        Ok(rows)
    }

    /// Adapt the cursor into a [`futures_core::Stream`]
    pub fn into_stream(self) -> CursorStream {
        CursorStream::new(self)
    }
}

impl std::fmt::Debug for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cursor")
            .field("token", &self.token())
            .field("state", &self.state())
            .finish()
    }
}

impl Drop for Cursor {
    fn drop(&mut self) {
        self.shared.close();
    }
}

/// A cloneable handle for closing and inspecting a [`Cursor`]
#[derive(Clone)]
pub struct CursorHandle {
    shared: Arc<CursorShared>,
}

impl CursorHandle {
    /// Close the cursor, waking any waiting `next()` call
    pub fn close(&self) {
        self.shared.close();
    }

    /// The query token
    pub fn token(&self) -> u64 {
        self.shared.token()
    }

    /// The current state
    pub fn state(&self) -> CursorState {
        self.shared.state()
    }

    /// Diagnostics snapshot
    pub fn stats(&self) -> CursorStats {
        self.shared.stats()
    }
}

impl std::fmt::Debug for CursorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CursorHandle")
            .field("token", &self.token())
            .finish()
    }
}

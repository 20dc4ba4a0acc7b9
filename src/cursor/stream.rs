//! `Stream` adapter over a cursor

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;

use crate::cursor::Cursor;
use crate::error::Result;
use crate::row::Row;

type NextRow = Pin<Box<dyn Future<Output = Result<Option<Row>>> + Send>>;

/// A [`Stream`] of rows backed by a [`Cursor`].
///
/// Yields `Ok(row)` for every row, then ends. If the cursor fails the error
/// is yielded once and the stream ends after it. Dropping the stream closes
/// the cursor.
pub struct CursorStream {
    cursor: Cursor,
    pending: Option<NextRow>,
    done: bool,
}

impl CursorStream {
    pub(crate) fn new(cursor: Cursor) -> Self {
        Self {
            cursor,
            pending: None,
            done: false,
        }
    }

    /// Borrow the underlying cursor for inspection
    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }
}

impl Stream for CursorStream {
    type Item = Result<Row>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.done {
            return Poll::Ready(None);
        }

        let cursor = &this.cursor;
        let future = this.pending.get_or_insert_with(|| {
            let shared = Arc::clone(&cursor.shared);
            let timeout = cursor.options.fetch_timeout;
            Box::pin(async move { shared.next_row(timeout).await })
        });

        match future.as_mut().poll(cx) {
            Poll::Ready(result) => {
                this.pending = None;
                match result {
                    Ok(Some(row)) => Poll::Ready(Some(Ok(row))),
                    Ok(None) => {
                        this.done = true;
                        Poll::Ready(None)
                    }
                    Err(err) => {
                        this.done = true;
                        Poll::Ready(Some(Err(err)))
                    }
                }
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

#![warn(missing_docs)]

//! # reql-cursor
//!
//! Streaming result cursors for JSON-framed document database drivers.
//!
//! A query result may be far larger than memory, or never end at all (a
//! changefeed). This crate turns the server's batch-by-batch replies into a
//! pull-based [`Cursor`] that fetches ahead of the consumer, keeps at most
//! one request in flight, and reports every way a query can end exactly
//! once.
//!
//! ## Features
//!
//! - **Bounded prefetch** - fetch ahead by rows or batches, never further
//! - **Multiplexed** - many cursors share one connection, routed by token
//! - **Ordered errors** - rows received before a failure are delivered first
//! - **Async/await** - built on Tokio, with a `Stream` adapter
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use reql_cursor::{Config, Connection};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> reql_cursor::Result<()> {
//!     let config: Config = "localhost:28015".parse()?;
//!     let conn = Connection::connect(config).await?;
//!
//!     // r.db("test").table("users")
//!     let mut cursor = conn.open_cursor(json!([15, [[14, ["test"]], "users"]]))?;
//!     while let Some(row) = cursor.next().await? {
//!         println!("{}: {:?}", row.get_i64("id").unwrap_or(0), row.get_str("name"));
//!     }
//!
//!     conn.close().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Prefetch
//!
//! ```rust,no_run
//! use reql_cursor::{Connection, CursorOptions, PrefetchWindow};
//! use serde_json::{json, Map};
//! use std::time::Duration;
//!
//! # async fn example(conn: Connection) -> reql_cursor::Result<()> {
//! let options = CursorOptions::new()
//!     .prefetch(PrefetchWindow::Rows(5000))
//!     .fetch_timeout(Duration::from_secs(30));
//!
//! let cursor = conn.open_cursor_with(json!([15, ["events"]]), Map::new(), options)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Errors
//!
//! Every [`Error`] belongs to an [`ErrorClass`]. A lost connection fails all
//! cursors on it; decode and server errors fail only the cursor they belong
//! to, and so does [`Error::FetchTimeout`] even though it is a transport
//! error. Server messages are passed through verbatim.

pub mod buffer;
pub mod config;
pub mod connection;
pub mod constants;
pub mod cursor;
pub mod error;
pub mod protocol;
pub mod row;
pub mod transport;

// Re-export commonly used types
pub use config::{Config, CursorOptions};
pub use connection::Connection;
pub use constants::{QueryType, ResponseType};
pub use cursor::{
    Cursor, CursorHandle, CursorMode, CursorState, CursorStats, CursorStream, PrefetchWindow,
};
pub use error::{Error, ErrorClass, Result, ServerErrorKind};
pub use protocol::{decode_batch, Batch, Continuation, FeedKind, Frame, FrameHeader, Query};
pub use row::Row;
pub use transport::{FrameRead, FrameReader, FrameWrite, FrameWriter};

// Re-export serde_json for callers building query terms
pub use serde_json;

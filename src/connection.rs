//! Connections
//!
//! A [`Connection`] multiplexes any number of cursors over one transport.
//! Two background tasks drive it: a reader that routes each inbound frame
//! to the cursor owning its token, and a writer that drains the outbound
//! queue so requests never interleave on the wire.
//!
//! # Example
//!
//! ```rust,no_run
//! use reql_cursor::{Connection, CursorOptions, PrefetchWindow};
//! use serde_json::{json, Map};
//!
//! # async fn example() -> reql_cursor::Result<()> {
//! let conn = Connection::connect("localhost:28015".parse()?).await?;
//!
//! let options = CursorOptions::new().prefetch(PrefetchWindow::Rows(2000));
//! let mut optargs = Map::new();
//! optargs.insert("db".to_string(), json!([14, ["test"]]));
//!
//! // r.table("events")
//! let cursor = conn.open_cursor_with(json!([15, ["events"]]), optargs, options)?;
//! let rows = cursor.collect_rows().await?;
//! println!("{} rows", rows.len());
//!
//! conn.close().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use serde_json::{Map, Value};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::config::{Config, CursorOptions};
use crate::constants::DEFAULT_MAX_FRAME_LEN;
use crate::cursor::shared::CursorShared;
use crate::cursor::{Cursor, PrefetchWindow};
use crate::error::{Error, Result};
use crate::protocol::{Frame, Query};
use crate::transport::{self, connect_tcp, CursorRegistry, FrameRead, FrameWrite};

/// Work for the writer task
pub(crate) enum Outgoing {
    Frame(Frame),
    Shutdown,
}

/// State reachable from cursors and the background tasks
pub(crate) struct ConnectionShared {
    id: u32,
    registry: CursorRegistry,
    outgoing: mpsc::UnboundedSender<Outgoing>,
}

impl ConnectionShared {
    /// Queue a frame for the writer task. Never blocks.
    pub(crate) fn send(&self, frame: Frame) -> Result<()> {
        if let Some(reason) = self.registry.closed_reason() {
            return Err(reason);
        }
        trace!(
            connection = self.id,
            token = frame.token,
            bytes = frame.payload.len(),
            "queueing frame"
        );
        self.outgoing
            .send(Outgoing::Frame(frame))
            .map_err(|_| Error::ConnectionClosed)
    }

    pub(crate) fn deregister(&self, token: u64) {
        self.registry.deregister(token);
    }

    /// Fail every open cursor with `err`. Only the first call has an effect.
    pub(crate) fn connection_lost(&self, err: Error) {
        let Some(count) = self.registry.fail_all(err.clone()) else {
            return;
        };
        match err {
            Error::ConnectionClosed => {
                debug!(connection = self.id, cursors = count, "connection closed")
            }
            _ => warn!(connection = self.id, cursors = count, error = %err, "connection lost"),
        }
    }
}

/// Connection ID counter
static CONNECTION_ID_COUNTER: AtomicU32 = AtomicU32::new(1);

/// A multiplexed connection carrying cursors
pub struct Connection {
    id: u32,
    shared: Arc<ConnectionShared>,
    options: CursorOptions,
    next_token: AtomicU64,
    closed: AtomicBool,
    reader: JoinHandle<()>,
    writer: Mutex<Option<JoinHandle<()>>>,
}

impl Connection {
    /// Connect over TCP.
    ///
    /// The stream must be usable for queries as soon as it is open; no
    /// handshake is performed here.
    pub async fn connect(config: Config) -> Result<Self> {
        config.validate()?;
        let stream = connect_tcp(&config).await?;
        let (reader, writer) = transport::split(stream, config.max_frame_len);
        Ok(Self::with_transport(reader, writer, config.cursor))
    }

    /// Run over an already established byte stream
    pub fn from_stream<S>(stream: S, options: CursorOptions) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (reader, writer) = transport::split(stream, DEFAULT_MAX_FRAME_LEN);
        Self::with_transport(reader, writer, options)
    }

    /// Run over explicit frame reader and writer halves.
    ///
    /// Must be called from within a tokio runtime.
    pub fn with_transport<R, W>(reader: R, writer: W, options: CursorOptions) -> Self
    where
        R: FrameRead + 'static,
        W: FrameWrite + 'static,
    {
        let id = CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        let shared = Arc::new(ConnectionShared {
            id,
            registry: CursorRegistry::new(),
            outgoing: tx,
        });

        let writer = tokio::spawn(write_loop(writer, rx, Arc::downgrade(&shared)));
        let reader = tokio::spawn(read_loop(reader, Arc::clone(&shared)));
        debug!(connection = id, "connection started");

        Self {
            id,
            shared,
            options,
            next_token: AtomicU64::new(1),
            closed: AtomicBool::new(false),
            reader,
            writer: Mutex::new(Some(writer)),
        }
    }

    /// Get the connection ID
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Check if the connection is closed or lost
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Relaxed) || self.shared.registry.closed_reason().is_some()
    }

    /// Number of cursors still waiting on the server
    pub fn open_cursors(&self) -> usize {
        self.shared.registry.len()
    }

    /// Default options for cursors opened with [`open_cursor`](Self::open_cursor)
    pub fn default_options(&self) -> &CursorOptions {
        &self.options
    }

    /// Start a query and return a cursor over its results.
    ///
    /// `term` is the already encoded query term. The start request is queued
    /// before this returns; rows arrive as the consumer calls `next()`.
    pub fn open_cursor(&self, term: Value) -> Result<Cursor> {
        self.open_query(Query::start(term), self.options)
    }

    /// Start a query with global optargs and explicit cursor options
    pub fn open_cursor_with(
        &self,
        term: Value,
        optargs: Map<String, Value>,
        options: CursorOptions,
    ) -> Result<Cursor> {
        self.open_query(Query::Start { term, optargs }, options)
    }

    /// Wait until the server has applied every outstanding noreply write
    pub async fn noreply_wait(&self) -> Result<()> {
        let options = CursorOptions {
            prefetch: PrefetchWindow::Rows(1),
            ..self.options
        };
        let mut cursor = self.open_query(Query::NoreplyWait, options)?;
        while cursor.next().await?.is_some() {}
        Ok(())
    }

    fn open_query(&self, query: Query, options: CursorOptions) -> Result<Cursor> {
        options.validate()?;
        if self.closed.load(Ordering::Relaxed) {
            return Err(Error::ConnectionClosed);
        }

        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        let frame = query.to_frame(token)?;

        // Register before sending so the reply always finds its cursor
        let cursor = CursorShared::new(token, Arc::downgrade(&self.shared), options.prefetch);
        self.shared.registry.register(token, &cursor)?;
        if let Err(err) = self.shared.send(frame) {
            self.shared.deregister(token);
            return Err(err);
        }

        debug!(
            connection = self.id,
            token,
            query = ?query.query_type(),
            "opened cursor"
        );
        Ok(Cursor::new(cursor, options))
    }

    /// Close the connection.
    ///
    /// Open cursors fail with [`Error::ConnectionClosed`] after delivering
    /// the rows they already buffered. Frames queued before the call are
    /// still written.
    pub async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::Relaxed) {
            return Ok(());
        }

        self.shared.connection_lost(Error::ConnectionClosed);
        let _ = self.shared.outgoing.send(Outgoing::Shutdown);

        let writer = self
            .writer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(writer) = writer {
            if let Err(err) = writer.await {
                if !err.is_cancelled() {
                    return Err(Error::Internal(format!("writer task failed: {}", err)));
                }
            }
        }

        self.reader.abort();
        debug!(connection = self.id, "connection shut down");
        Ok(())
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("open_cursors", &self.open_cursors())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        // No async cleanup here; the writer flushes and shuts down on its own
        if !self.closed.swap(true, Ordering::Relaxed) {
            self.shared.connection_lost(Error::ConnectionClosed);
            let _ = self.shared.outgoing.send(Outgoing::Shutdown);
        }
        self.reader.abort();
    }
}

async fn read_loop<R: FrameRead>(mut reader: R, shared: Arc<ConnectionShared>) {
    loop {
        match reader.read_frame().await {
            Ok(Some(frame)) => shared.registry.dispatch(frame),
            Ok(None) => {
                shared.connection_lost(Error::ConnectionLost(
                    "server closed the connection".to_string(),
                ));
                return;
            }
            Err(err) => {
                shared.connection_lost(err);
                return;
            }
        }
    }
}

async fn write_loop<W: FrameWrite>(
    mut writer: W,
    mut rx: mpsc::UnboundedReceiver<Outgoing>,
    shared: Weak<ConnectionShared>,
) {
    while let Some(message) = rx.recv().await {
        match message {
            Outgoing::Frame(frame) => {
                if let Err(err) = writer.write_frame(&frame).await {
                    if let Some(shared) = shared.upgrade() {
                        shared.connection_lost(err);
                    }
                    return;
                }
            }
            Outgoing::Shutdown => break,
        }
    }

    if let Err(err) = writer.shutdown().await {
        trace!(error = %err, "transport shutdown failed");
    }
}

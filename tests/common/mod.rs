//! Scripted in-memory server for cursor tests
//!
//! The server runs on the far side of a `tokio::io::duplex` pipe, records
//! every request it receives and answers through a handler closure.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use reql_cursor::transport::split;
use reql_cursor::{Connection, CursorOptions, Frame, FrameRead, FrameWrite, Query, QueryType};
use serde_json::{json, Value};

/// One scripted response
pub enum Reply {
    /// A well-formed response object
    Json(Value),
    /// Raw body bytes, sent as-is
    Raw(&'static [u8]),
    /// Drop the connection
    Hangup,
}

/// Every request the server has seen, in arrival order
#[derive(Default)]
pub struct RequestLog {
    requests: Mutex<Vec<(u64, QueryType)>>,
}

impl RequestLog {
    fn record(&self, token: u64, kind: QueryType) {
        self.requests.lock().unwrap().push((token, kind));
    }

    pub fn count(&self, kind: QueryType) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, k)| *k == kind)
            .count()
    }

    pub fn count_for(&self, token: u64, kind: QueryType) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(t, k)| *t == token && *k == kind)
            .count()
    }

    pub fn total(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Wait until at least `n` requests of `kind` have arrived
    pub async fn wait_for(&self, kind: QueryType, n: usize) {
        for _ in 0..2000 {
            if self.count(kind) >= n {
                return;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        panic!("expected {} {:?} requests, saw {}", n, kind, self.count(kind));
    }
}

/// Start a server answering with `handler` and connect to it
pub fn serve<H>(options: CursorOptions, mut handler: H) -> (Connection, Arc<RequestLog>)
where
    H: FnMut(u64, &Query) -> Vec<Reply> + Send + 'static,
{
    let (client, server) = tokio::io::duplex(64 * 1024);
    let log = Arc::new(RequestLog::default());
    let server_log = Arc::clone(&log);

    tokio::spawn(async move {
        let (mut reader, mut writer) = split(server, 1024 * 1024);
        while let Ok(Some(frame)) = reader.read_frame().await {
            let query = Query::from_frame(&frame).expect("client sent an invalid query");
            server_log.record(frame.token, query.query_type());

            for reply in handler(frame.token, &query) {
                let body = match reply {
                    Reply::Json(value) => serde_json::to_vec(&value).unwrap(),
                    Reply::Raw(bytes) => bytes.to_vec(),
                    Reply::Hangup => return,
                };
                if writer.write_frame(&Frame::new(frame.token, body)).await.is_err() {
                    return;
                }
            }
        }
    });

    (Connection::from_stream(client, options), log)
}

/// A table of `{"id": n}` documents served in fixed-size batches.
///
/// Every batch carrying rows is a partial response; once the rows run out
/// the server answers with an empty final sequence.
pub struct Table {
    rows: Vec<Value>,
    batch: usize,
    positions: HashMap<u64, usize>,
}

impl Table {
    pub fn new(rows: usize, batch: usize) -> Self {
        Self {
            rows: (0..rows).map(|id| json!({ "id": id })).collect(),
            batch,
            positions: HashMap::new(),
        }
    }

    pub fn respond(&mut self, token: u64, query: &Query) -> Vec<Reply> {
        match query {
            Query::Start { .. } | Query::Continue => {
                let position = self.positions.entry(token).or_insert(0);
                let end = (*position + self.batch).min(self.rows.len());
                let chunk = self.rows[*position..end].to_vec();
                *position = end;
                if chunk.is_empty() {
                    vec![Reply::Json(json!({ "t": 2, "r": [] }))]
                } else {
                    vec![Reply::Json(json!({ "t": 3, "r": chunk }))]
                }
            }
            Query::Stop => {
                self.positions.remove(&token);
                vec![Reply::Json(json!({ "t": 2, "r": [] }))]
            }
            Query::NoreplyWait => vec![Reply::Json(json!({ "t": 4 }))],
        }
    }
}

/// Serve a [`Table`] of `rows` documents in batches of `batch`
pub fn serve_table(
    rows: usize,
    batch: usize,
    options: CursorOptions,
) -> (Connection, Arc<RequestLog>) {
    let mut table = Table::new(rows, batch);
    serve(options, move |token, query| table.respond(token, query))
}

/// An encoded `r.table("users")` term
pub fn users_term() -> Value {
    json!([15, ["users"]])
}

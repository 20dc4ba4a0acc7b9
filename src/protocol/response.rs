//! Batch decoder
//!
//! Turns one response frame into an ordered list of rows plus a continuation
//! flag. Row order is preserved exactly as the server sent it.

use serde_json::{Map, Value};

use crate::constants::{response_note, ResponseType};
use crate::error::{Error, Result, ServerErrorKind};
use crate::protocol::Frame;
use crate::row::Row;

/// Kind of changefeed a response belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedKind {
    /// Feed over a table or selection
    Sequence,
    /// Feed over a single document
    Atom,
    /// Feed over an `order_by().limit()` query
    OrderByLimit,
    /// Several feeds merged together
    Unioned,
}

impl FeedKind {
    fn from_note(note: u64) -> Option<Self> {
        match note {
            response_note::SEQUENCE_FEED => Some(FeedKind::Sequence),
            response_note::ATOM_FEED => Some(FeedKind::Atom),
            response_note::ORDER_BY_LIMIT_FEED => Some(FeedKind::OrderByLimit),
            response_note::UNIONED_FEED => Some(FeedKind::Unioned),
            _ => None,
        }
    }
}

/// What the server said about the rest of the result set
#[derive(Debug, Clone)]
pub enum Continuation {
    /// More batches are available on request
    More,
    /// The result set is complete
    Done,
    /// The query failed
    Error(Error),
}

/// One decoded response
#[derive(Debug, Clone)]
pub struct Batch {
    /// Token of the query this batch belongs to
    pub token: u64,
    /// Response type as sent by the server
    pub response_type: ResponseType,
    /// Rows in arrival order
    pub rows: Vec<Row>,
    /// Continuation flag
    pub continuation: Continuation,
    /// Changefeed kind, if the server flagged one
    pub feed: Option<FeedKind>,
    /// Whether feed rows carry state documents
    pub includes_states: bool,
}

impl Batch {
    /// Check if this batch ends the result set successfully
    pub fn is_done(&self) -> bool {
        matches!(self.continuation, Continuation::Done)
    }

    /// Number of rows in the batch
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the batch carries no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn malformed(reason: impl Into<String>) -> Error {
    Error::MalformedResponse(reason.into())
}

/// Decode a response frame into a [`Batch`]
///
/// A malformed frame yields `Err`; a well-formed frame reporting a query
/// failure yields `Ok` with [`Continuation::Error`].
pub fn decode_batch(frame: &Frame) -> Result<Batch> {
    let body: Value =
        serde_json::from_slice(&frame.payload).map_err(|e| malformed(e.to_string()))?;
    let mut object = match body {
        Value::Object(object) => object,
        other => return Err(malformed(format!("expected an object, got {}", other))),
    };

    let code = object
        .get("t")
        .and_then(Value::as_u64)
        .ok_or_else(|| malformed("missing response type"))?;
    let response_type = ResponseType::try_from(code)?;

    let results = match object.remove("r") {
        Some(Value::Array(results)) => results,
        Some(_) => return Err(malformed("`r` is not an array")),
        None => Vec::new(),
    };

    let notes = read_notes(&object)?;
    let feed = notes.iter().find_map(|note| FeedKind::from_note(*note));
    let includes_states = notes.contains(&response_note::INCLUDES_STATES);

    let (rows, continuation) = match response_type {
        ResponseType::SuccessPartial => (into_rows(results), Continuation::More),
        ResponseType::SuccessSequence => (into_rows(results), Continuation::Done),
        ResponseType::SuccessAtom => {
            let atom = single(results)?;
            let rows = match atom {
                Value::Array(items) => into_rows(items),
                other => vec![Row::new(other)],
            };
            (rows, Continuation::Done)
        }
        ResponseType::ServerInfo => (vec![Row::new(single(results)?)], Continuation::Done),
        ResponseType::WaitComplete => (Vec::new(), Continuation::Done),
        ResponseType::ClientError | ResponseType::CompileError | ResponseType::RuntimeError => {
            let kind = match response_type {
                ResponseType::ClientError => ServerErrorKind::Client,
                ResponseType::CompileError => ServerErrorKind::Compile,
                _ => ServerErrorKind::Runtime,
            };
            let message = match results.into_iter().next() {
                Some(Value::String(message)) => message,
                Some(other) => other.to_string(),
                None => return Err(malformed("error response without a message")),
            };
            let error = Error::Server {
                kind,
                message,
                backtrace: object.remove("b"),
            };
            (Vec::new(), Continuation::Error(error))
        }
    };

    Ok(Batch {
        token: frame.token,
        response_type,
        rows,
        continuation,
        feed,
        includes_states,
    })
}

fn read_notes(object: &Map<String, Value>) -> Result<Vec<u64>> {
    match object.get("n") {
        None => Ok(Vec::new()),
        Some(Value::Array(notes)) => notes
            .iter()
            .map(|note| note.as_u64().ok_or_else(|| malformed("note is not an integer")))
            .collect(),
        Some(_) => Err(malformed("`n` is not an array")),
    }
}

fn single(results: Vec<Value>) -> Result<Value> {
    let mut results = results.into_iter();
    match (results.next(), results.next()) {
        (Some(value), None) => Ok(value),
        _ => Err(malformed("expected exactly one result")),
    }
}

fn into_rows(values: Vec<Value>) -> Vec<Row> {
    values.into_iter().map(Row::new).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn frame(body: Value) -> Frame {
        Frame::new(9, serde_json::to_vec(&body).unwrap())
    }

    #[test]
    fn test_partial_batch_keeps_order() {
        let batch = decode_batch(&frame(json!({"t": 3, "r": [{"id": 1}, {"id": 2}, {"id": 3}]})))
            .unwrap();
        assert_eq!(batch.token, 9);
        assert!(matches!(batch.continuation, Continuation::More));
        let ids: Vec<i64> = batch.rows.iter().filter_map(|r| r.get_i64("id")).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_sequence_is_done() {
        let batch = decode_batch(&frame(json!({"t": 2, "r": []}))).unwrap();
        assert!(batch.is_done());
        assert!(batch.is_empty());
    }

    #[test]
    fn test_atom_array_is_spread() {
        let batch = decode_batch(&frame(json!({"t": 1, "r": [[1, 2, 3]]}))).unwrap();
        assert!(batch.is_done());
        assert_eq!(batch.len(), 3);

        let batch = decode_batch(&frame(json!({"t": 1, "r": [{"count": 7}]}))).unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.rows[0].get_i64("count"), Some(7));
    }

    #[test]
    fn test_runtime_error_is_verbatim() {
        let batch = decode_batch(&frame(json!({
            "t": 18,
            "r": ["Table `test.nope` does not exist."],
            "b": [0, 1]
        })))
        .unwrap();
        match batch.continuation {
            Continuation::Error(Error::Server { kind, message, backtrace }) => {
                assert_eq!(kind, ServerErrorKind::Runtime);
                assert_eq!(message, "Table `test.nope` does not exist.");
                assert_eq!(backtrace, Some(json!([0, 1])));
            }
            other => panic!("expected server error, got {:?}", other),
        }
    }

    #[test]
    fn test_feed_notes() {
        let batch = decode_batch(&frame(json!({"t": 3, "r": [], "n": [1, 5]}))).unwrap();
        assert_eq!(batch.feed, Some(FeedKind::Sequence));
        assert!(batch.includes_states);
    }

    #[test]
    fn test_malformed_frames() {
        assert!(decode_batch(&Frame::new(1, &b"not json"[..])).unwrap_err().is_decode_error());
        assert!(decode_batch(&frame(json!([3]))).unwrap_err().is_decode_error());
        assert!(decode_batch(&frame(json!({"r": []}))).unwrap_err().is_decode_error());
        assert!(decode_batch(&frame(json!({"t": 3, "r": {}}))).unwrap_err().is_decode_error());
        assert!(matches!(
            decode_batch(&frame(json!({"t": 42, "r": []}))),
            Err(Error::UnknownResponseType(42))
        ));
    }
}

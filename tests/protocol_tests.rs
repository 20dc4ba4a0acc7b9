//! Integration tests for framing and batch decoding

use bytes::Bytes;
use reql_cursor::buffer::{ReadBuffer, WriteBuffer};
use reql_cursor::constants::FRAME_HEADER_SIZE;
use reql_cursor::{
    decode_batch, Continuation, Error, FeedKind, Frame, FrameHeader, Query, QueryType,
    ResponseType,
};
use serde_json::json;

fn response(token: u64, body: serde_json::Value) -> Frame {
    Frame::new(token, serde_json::to_vec(&body).unwrap())
}

#[test]
fn test_frame_header_layout() {
    let mut buf = WriteBuffer::new();
    FrameHeader::new(0x0102_0304_0506_0708, 9).write(&mut buf);

    assert_eq!(buf.len(), FRAME_HEADER_SIZE);
    assert_eq!(
        buf.as_slice(),
        &[0x08, 0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01, 0x09, 0x00, 0x00, 0x00]
    );
}

#[test]
fn test_frame_from_bytes() {
    let data = Bytes::from_static(&[
        0x05, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // Token: 5
        0x03, 0x00, 0x00, 0x00, // Length: 3
        b'[', b'2', b']',
    ]);

    let frame = Frame::from_bytes(data).unwrap();
    assert_eq!(frame.token, 5);
    assert_eq!(&frame.payload[..], b"[2]");
    assert_eq!(frame.total_size(), 15);
    assert_eq!(Query::from_frame(&frame).unwrap(), Query::Continue);
}

#[test]
fn test_frame_truncated_body() {
    let data = Bytes::from_static(&[
        0x05, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // Token: 5
        0x08, 0x00, 0x00, 0x00, // Length: 8
        b'[', b'2',
    ]);

    assert!(matches!(
        Frame::from_bytes(data),
        Err(Error::FrameTooShort { expected: 20, actual: 14 })
    ));
}

#[test]
fn test_start_query_wire_body() {
    let mut optargs = serde_json::Map::new();
    optargs.insert("db".to_string(), json!([14, ["test"]]));
    let query = Query::Start {
        term: json!([15, ["users"]]),
        optargs,
    };

    let frame = query.to_frame(7).unwrap();
    let encoded = frame.encode().unwrap();

    let mut buf = ReadBuffer::new(encoded);
    let header = FrameHeader::read(&mut buf).unwrap();
    assert_eq!(header.token, 7);
    assert_eq!(header.body_length(), buf.remaining());

    let body: serde_json::Value = serde_json::from_slice(&buf.read_remaining()).unwrap();
    assert_eq!(body, json!([1, [15, ["users"]], {"db": [14, ["test"]]}]));
}

#[test]
fn test_control_queries() {
    for (query, code) in [
        (Query::Continue, QueryType::Continue),
        (Query::Stop, QueryType::Stop),
        (Query::NoreplyWait, QueryType::NoreplyWait),
    ] {
        let frame = query.to_frame(1).unwrap();
        let body: serde_json::Value = serde_json::from_slice(&frame.payload).unwrap();
        assert_eq!(body, json!([code as u8]));
    }
}

#[test]
fn test_partial_then_sequence() {
    let partial = decode_batch(&response(3, json!({"t": 3, "r": [{"id": 1}, {"id": 2}]}))).unwrap();
    assert_eq!(partial.token, 3);
    assert_eq!(partial.response_type, ResponseType::SuccessPartial);
    assert!(matches!(partial.continuation, Continuation::More));
    assert_eq!(partial.rows[0].get_i64("id"), Some(1));
    assert_eq!(partial.rows[1].get_i64("id"), Some(2));

    let last = decode_batch(&response(3, json!({"t": 2, "r": [{"id": 3}]}))).unwrap();
    assert!(last.is_done());
    assert_eq!(last.len(), 1);
}

#[test]
fn test_feed_notes() {
    let batch = decode_batch(&response(1, json!({"t": 3, "r": [], "n": [3, 5]}))).unwrap();
    assert_eq!(batch.feed, Some(FeedKind::OrderByLimit));
    assert!(batch.includes_states);
    assert!(batch.is_empty());
}

#[test]
fn test_compile_error_message() {
    let batch = decode_batch(&response(
        2,
        json!({"t": 17, "r": ["Expected type TABLE but found DATUM."], "b": [0]}),
    ))
    .unwrap();
    match batch.continuation {
        Continuation::Error(err) => {
            assert!(err.is_server_error());
            assert_eq!(err.server_message(), Some("Expected type TABLE but found DATUM."));
        }
        other => panic!("expected an error continuation, got {:?}", other),
    }
}

#[test]
fn test_malformed_responses() {
    for body in [
        &b"garbage"[..],
        &b"[1, 2, 3]"[..],
        &b"{\"r\": []}"[..],
        &b"{\"t\": 3, \"r\": 7}"[..],
    ] {
        let err = decode_batch(&Frame::new(1, body)).unwrap_err();
        assert!(err.is_decode_error(), "{:?} gave {}", body, err);
    }

    assert!(matches!(
        decode_batch(&response(1, json!({"t": 42, "r": []}))),
        Err(Error::UnknownResponseType(42))
    ));
}

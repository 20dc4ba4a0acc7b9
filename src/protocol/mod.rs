//! Wire protocol: framing, outgoing queries and the response batch decoder
//!
//! Every message in either direction is a [`Frame`]: a 12-byte header
//! carrying the query token and body length, followed by a JSON body.

mod frame;
mod query;
mod response;

pub use frame::{Frame, FrameHeader};
pub use query::Query;
pub use response::{decode_batch, Batch, Continuation, FeedKind};

//! Outgoing query messages
//!
//! The query term itself is produced by a higher layer; this module only
//! wraps it into the START envelope and builds the control messages
//! (CONTINUE, STOP, NOREPLY_WAIT) that drive an open cursor.

use serde_json::{Map, Value};

use crate::constants::QueryType;
use crate::error::{Error, Result};
use crate::protocol::Frame;

/// A message sent from the client to the server
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    /// Start a new query with an encoded term and global optargs
    Start {
        /// Encoded query term
        term: Value,
        /// Global optional arguments (e.g. `db`)
        optargs: Map<String, Value>,
    },
    /// Ask for the next batch
    Continue,
    /// Stop an open query
    Stop,
    /// Wait for outstanding noreply writes
    NoreplyWait,
}

impl Query {
    /// Create a START query without optargs
    pub fn start(term: Value) -> Self {
        Query::Start {
            term,
            optargs: Map::new(),
        }
    }

    /// Get the query type
    pub fn query_type(&self) -> QueryType {
        match self {
            Query::Start { .. } => QueryType::Start,
            Query::Continue => QueryType::Continue,
            Query::Stop => QueryType::Stop,
            Query::NoreplyWait => QueryType::NoreplyWait,
        }
    }

    /// Build the JSON body of this query
    pub fn to_json(&self) -> Value {
        let code = Value::from(self.query_type() as u8);
        match self {
            Query::Start { term, optargs } if optargs.is_empty() => {
                Value::Array(vec![code, term.clone()])
            }
            Query::Start { term, optargs } => {
                Value::Array(vec![code, term.clone(), Value::Object(optargs.clone())])
            }
            _ => Value::Array(vec![code]),
        }
    }

    /// Build the frame carrying this query for `token`
    pub fn to_frame(&self, token: u64) -> Result<Frame> {
        let body = serde_json::to_vec(&self.to_json())
            .map_err(|e| Error::InvalidQuery(e.to_string()))?;
        Ok(Frame::new(token, body))
    }

    /// Parse a query back out of a frame body
    pub fn from_frame(frame: &Frame) -> Result<Self> {
        let body: Value = serde_json::from_slice(&frame.payload)
            .map_err(|e| Error::InvalidQuery(e.to_string()))?;
        let parts = body
            .as_array()
            .ok_or_else(|| Error::InvalidQuery("query body is not an array".to_string()))?;
        let code = parts
            .first()
            .and_then(Value::as_u64)
            .ok_or_else(|| Error::InvalidQuery("missing query type".to_string()))?;

        match QueryType::try_from(code)? {
            QueryType::Start => {
                let term = parts
                    .get(1)
                    .cloned()
                    .ok_or_else(|| Error::InvalidQuery("START without a term".to_string()))?;
                let optargs = match parts.get(2) {
                    Some(Value::Object(map)) => map.clone(),
                    Some(_) => {
                        return Err(Error::InvalidQuery("optargs must be an object".to_string()))
                    }
                    None => Map::new(),
                };
                Ok(Query::Start { term, optargs })
            }
            QueryType::Continue => Ok(Query::Continue),
            QueryType::Stop => Ok(Query::Stop),
            QueryType::NoreplyWait => Ok(Query::NoreplyWait),
        }
    }
}

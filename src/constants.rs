//! Wire protocol constants
//!
//! Query and response type codes used by the JSON framing protocol, plus
//! frame layout sizes and connection defaults.

// =============================================================================
// Frame Layout
// =============================================================================

/// Size of a frame header: 8-byte token plus 4-byte body length
pub const FRAME_HEADER_SIZE: usize = 12;

/// Default maximum accepted frame body length (64 MiB)
pub const DEFAULT_MAX_FRAME_LEN: usize = 64 * 1024 * 1024;

/// Default server port
pub const DEFAULT_PORT: u16 = 28015;

// =============================================================================
// Query Types
// =============================================================================

/// Query types sent by the client (first element of the query array)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum QueryType {
    /// Start a new query
    Start = 1,
    /// Ask for the next batch of an open query
    Continue = 2,
    /// Stop an open query
    Stop = 3,
    /// Wait for all outstanding noreply writes
    NoreplyWait = 4,
}

impl TryFrom<u64> for QueryType {
    type Error = crate::error::Error;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(QueryType::Start),
            2 => Ok(QueryType::Continue),
            3 => Ok(QueryType::Stop),
            4 => Ok(QueryType::NoreplyWait),
            _ => Err(crate::error::Error::InvalidQuery(format!(
                "unknown query type {}",
                value
            ))),
        }
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// Response types sent by the server (`t` field of the response object)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ResponseType {
    /// A single value
    SuccessAtom = 1,
    /// The final batch of a sequence
    SuccessSequence = 2,
    /// A batch with more to follow
    SuccessPartial = 3,
    /// Reply to a noreply wait
    WaitComplete = 4,
    /// Server information
    ServerInfo = 5,
    /// The client sent something the server could not understand
    ClientError = 16,
    /// The query failed to compile
    CompileError = 17,
    /// The query failed at runtime
    RuntimeError = 18,
}

impl TryFrom<u64> for ResponseType {
    type Error = crate::error::Error;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(ResponseType::SuccessAtom),
            2 => Ok(ResponseType::SuccessSequence),
            3 => Ok(ResponseType::SuccessPartial),
            4 => Ok(ResponseType::WaitComplete),
            5 => Ok(ResponseType::ServerInfo),
            16 => Ok(ResponseType::ClientError),
            17 => Ok(ResponseType::CompileError),
            18 => Ok(ResponseType::RuntimeError),
            _ => Err(crate::error::Error::UnknownResponseType(value)),
        }
    }
}

impl ResponseType {
    /// Check if this response type reports a failure
    pub fn is_error(self) -> bool {
        matches!(
            self,
            ResponseType::ClientError | ResponseType::CompileError | ResponseType::RuntimeError
        )
    }
}

// =============================================================================
// Response Notes
// =============================================================================

/// Notes attached to a response (`n` field)
#[allow(missing_docs)]
pub mod response_note {
    pub const SEQUENCE_FEED: u64 = 1;
    pub const ATOM_FEED: u64 = 2;
    pub const ORDER_BY_LIMIT_FEED: u64 = 3;
    pub const UNIONED_FEED: u64 = 4;
    pub const INCLUDES_STATES: u64 = 5;
}

//! Cursor lifecycle states and diagnostics

use std::fmt;

use crate::protocol::FeedKind;

/// Lifecycle state of a cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    /// Open, no continuation request in flight
    Active,
    /// Open, a continuation request is in flight
    Fetching,
    /// Every row has been delivered and the server has no more
    Exhausted,
    /// The stream failed; queued rows are still delivered before the error
    Errored,
    /// Closed by the caller
    Closed,
}

impl CursorState {
    /// Check if no further rows can ever be produced
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            CursorState::Exhausted | CursorState::Errored | CursorState::Closed
        )
    }
}

impl fmt::Display for CursorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CursorState::Active => "active",
            CursorState::Fetching => "fetching",
            CursorState::Exhausted => "exhausted",
            CursorState::Errored => "errored",
            CursorState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Whether the cursor is reading a finite result set or a changefeed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorMode {
    /// No response has arrived yet
    Unknown,
    /// A finite result set that ends in Exhausted
    Finite,
    /// A changefeed that only ends on close or error
    Changefeed(FeedKind),
}

impl CursorMode {
    /// Check if this is a changefeed
    pub fn is_changefeed(self) -> bool {
        matches!(self, CursorMode::Changefeed(_))
    }
}

/// Point-in-time diagnostics for a cursor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorStats {
    /// Query token
    pub token: u64,
    /// Current state
    pub state: CursorState,
    /// Current mode
    pub mode: CursorMode,
    /// Rows handed to the consumer so far
    pub rows_delivered: u64,
    /// Rows received but not yet delivered
    pub rows_buffered: usize,
    /// Responses received
    pub batches_received: u64,
    /// Continuation requests issued
    pub continuations_sent: u64,
    /// Whether a request is outstanding
    pub fetch_in_flight: bool,
    /// Queue length below which another batch is requested
    pub low_water_mark: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(!CursorState::Active.is_terminal());
        assert!(!CursorState::Fetching.is_terminal());
        assert!(CursorState::Exhausted.is_terminal());
        assert!(CursorState::Errored.is_terminal());
        assert!(CursorState::Closed.is_terminal());
        assert_eq!(CursorState::Fetching.to_string(), "fetching");
    }

    #[test]
    fn test_mode() {
        assert!(CursorMode::Changefeed(FeedKind::Atom).is_changefeed());
        assert!(!CursorMode::Finite.is_changefeed());
    }
}

//! Fetch scheduling
//!
//! Decides when the next continuation request goes out. At most one request
//! is ever outstanding per cursor, and a new one is only issued while the
//! queue sits below the low-water mark derived from the prefetch window.

/// How far ahead of the consumer a cursor may fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefetchWindow {
    /// Keep at least this many rows buffered
    Rows(usize),
    /// Keep at least this many batches buffered, sized by the largest
    /// batch seen so far
    Batches(usize),
}

impl PrefetchWindow {
    /// Check if the window is zero-sized
    pub fn is_empty(&self) -> bool {
        matches!(self, PrefetchWindow::Rows(0) | PrefetchWindow::Batches(0))
    }
}

impl Default for PrefetchWindow {
    fn default() -> Self {
        PrefetchWindow::Batches(2)
    }
}

/// Per-cursor fetch bookkeeping
#[derive(Debug, Clone)]
pub(crate) struct FetchScheduler {
    window: PrefetchWindow,
    largest_batch: usize,
    in_flight: bool,
    continuations: u64,
}

impl FetchScheduler {
    /// Create a scheduler whose initial query is already in flight
    pub(crate) fn new(window: PrefetchWindow) -> Self {
        Self {
            window,
            largest_batch: 0,
            in_flight: true,
            continuations: 0,
        }
    }

    pub(crate) fn low_water_mark(&self) -> usize {
        match self.window {
            PrefetchWindow::Rows(rows) => rows,
            PrefetchWindow::Batches(batches) => batches.saturating_mul(self.largest_batch.max(1)),
        }
    }

    /// Whether a continuation should be issued for a queue of `queued` rows
    pub(crate) fn should_fetch(&self, queued: usize) -> bool {
        !self.in_flight && queued < self.low_water_mark()
    }

    /// Record that a continuation request was issued
    pub(crate) fn begin(&mut self) {
        debug_assert!(!self.in_flight, "duplicate continuation request");
        self.in_flight = true;
        self.continuations += 1;
    }

    /// Record a response carrying `rows` rows
    pub(crate) fn complete(&mut self, rows: usize) {
        self.in_flight = false;
        self.largest_batch = self.largest_batch.max(rows);
    }

    /// Forget any outstanding request; the cursor has gone terminal
    pub(crate) fn cancel(&mut self) {
        self.in_flight = false;
    }

    pub(crate) fn in_flight(&self) -> bool {
        self.in_flight
    }

    pub(crate) fn continuations(&self) -> u64 {
        self.continuations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_request_blocks_fetch() {
        let scheduler = FetchScheduler::new(PrefetchWindow::Rows(10));
        assert!(scheduler.in_flight());
        assert!(!scheduler.should_fetch(0));
    }

    #[test]
    fn test_row_window() {
        let mut scheduler = FetchScheduler::new(PrefetchWindow::Rows(10));
        scheduler.complete(100);
        assert_eq!(scheduler.low_water_mark(), 10);
        assert!(!scheduler.should_fetch(10));
        assert!(scheduler.should_fetch(9));

        scheduler.begin();
        assert!(!scheduler.should_fetch(0));
        assert_eq!(scheduler.continuations(), 1);
    }

    #[test]
    fn test_batch_window_tracks_largest_batch() {
        let mut scheduler = FetchScheduler::new(PrefetchWindow::Batches(2));
        assert_eq!(scheduler.low_water_mark(), 2);

        scheduler.complete(1000);
        assert_eq!(scheduler.low_water_mark(), 2000);
        assert!(scheduler.should_fetch(1999));

        scheduler.begin();
        scheduler.complete(10);
        assert_eq!(scheduler.low_water_mark(), 2000);
    }

    #[test]
    fn test_cancel_clears_in_flight() {
        let mut scheduler = FetchScheduler::new(PrefetchWindow::default());
        scheduler.cancel();
        assert!(!scheduler.in_flight());
    }

    #[test]
    fn test_empty_window() {
        assert!(PrefetchWindow::Rows(0).is_empty());
        assert!(PrefetchWindow::Batches(0).is_empty());
        assert!(!PrefetchWindow::default().is_empty());
    }
}

//! Progress reporting.

/// Receives progress while a fetch runs.
pub trait ProgressObserver: Send + Sync {
    /// An item was completed. `total` is the entry count the server reported.
    fn advanced(&self, current: u64, total: u64);

    /// The fetch ended, successfully or not.
    fn finished(&self) {}
}

/// Discards progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn advanced(&self, _current: u64, _total: u64) {}
}

impl<F> ProgressObserver for F
where
    F: Fn(u64, u64) + Send + Sync,
{
    fn advanced(&self, current: u64, total: u64) {
        self(current, total)
    }
}

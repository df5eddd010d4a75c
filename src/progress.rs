//! Progress reporting and cancellation contract.
//!
//! The warp driver reports a monotonically non-decreasing fraction after each
//! completed destination row. Returning `false` from a report cancels the
//! warp cooperatively at the next row boundary.

/// Receives progress fractions and decides whether work continues.
pub trait ProgressReport {
    /// Report overall progress in `[0, 1]`. Return `false` to cancel.
    fn report(&mut self, fraction: f64, label: &str) -> bool;
}

impl<F> ProgressReport for F
where
    F: FnMut(f64, &str) -> bool,
{
    fn report(&mut self, fraction: f64, label: &str) -> bool {
        self(fraction, label)
    }
}

/// Progress sink that accepts every report and never cancels.
///
/// Installed by the driver when the caller supplies no progress sink.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProgress;

impl ProgressReport for NullProgress {
    fn report(&mut self, _fraction: f64, _label: &str) -> bool {
        true
    }
}

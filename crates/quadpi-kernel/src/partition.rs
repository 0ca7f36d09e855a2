//! Splitting the iteration range across workers

use quadpi_core::StepCount;
use std::ops::Range;

/// Balanced contiguous ranges covering `0..steps` exactly once, in order
///
/// At most `steps` ranges are produced, so none is empty. The first
/// `steps % workers` ranges are one iteration longer than the rest.
#[must_use]
pub fn partition(steps: StepCount, workers: usize) -> Vec<Range<u64>> {
    let n = steps.get();
    let workers = u64::try_from(workers.max(1)).unwrap_or(u64::MAX).min(n);
    let base = n / workers;
    let extra = n % workers;

    let mut ranges = Vec::with_capacity(usize::try_from(workers).unwrap_or_default());
    let mut start = 0;
    for worker in 0..workers {
        let len = base + u64::from(worker < extra);
        ranges.push(start..start + len);
        start += len;
    }
    ranges
}

/// Indices visited by worker `offset` of `stride` in a round-robin split
pub fn strided(steps: StepCount, offset: usize, stride: usize) -> impl Iterator<Item = u64> {
    let offset = u64::try_from(offset).unwrap_or(u64::MAX);
    (offset..steps.get()).step_by(stride.max(1))
}

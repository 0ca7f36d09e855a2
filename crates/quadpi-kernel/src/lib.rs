//! Midpoint-rule integrator for quadpi
//!
//! Approximates pi as the integral of `4 / (1 + x^2)` over [0, 1], either on
//! the calling thread or split across workers through the sum reduction in
//! [`reduce`].

use quadpi_core::{
    Config, DEFAULT_PRECISION, Discretization, QuadpiError, Reduction, StepCount, StepWidth,
};
use rayon::prelude::*;
use serde::Serialize;
use std::f64::consts::PI;
use std::fmt;
use std::ops::Range;
use std::thread;
use tracing::{debug, info, trace};

pub mod partition;
pub mod reduce;

use partition::{partition, strided};
use reduce::{AtomicSum, LockedSum, Sum, merge_sequential, merge_tree};

/// `f(x) = 4 / (1 + x^2)`
#[must_use]
#[inline]
pub fn integrand(x: f64) -> f64 {
    4.0 / (1.0 + x * x)
}

/// Midpoint of subinterval `i`, `(i + 0.5) * h`
#[must_use]
#[inline]
#[allow(clippy::cast_precision_loss)]
pub fn midpoint(i: u64, width: StepWidth) -> f64 {
    (i as f64 + 0.5) * width.get()
}

/// Fold the integrand over the midpoints of `range`
#[must_use]
pub fn partial_sum(grid: &Discretization, range: Range<u64>) -> Sum {
    let h = grid.width();
    range.fold(Sum::ZERO, |acc, i| acc.fold(integrand(midpoint(i, h))))
}

/// Fold the integrand over every `stride`-th midpoint starting at `offset`
#[must_use]
pub fn strided_sum(grid: &Discretization, offset: usize, stride: usize) -> Sum {
    let h = grid.width();
    strided(grid.steps(), offset, stride).fold(Sum::ZERO, |acc, i| {
        acc.fold(integrand(midpoint(i, h)))
    })
}

/// Approximate pi with the sequential midpoint rule
///
/// # Errors
///
/// Returns `QuadpiError::InvalidStepCount` if `steps` is zero or negative
pub fn approximate_pi(steps: i64) -> Result<f64, QuadpiError> {
    let steps = StepCount::try_from(steps)?;
    let config = Config::default().with_steps(steps);
    Ok(Integrator::new(&config).integrate()?.value)
}

/// One configured integration
#[derive(Debug)]
pub struct Integrator {
    grid: Discretization,
    workers: usize,
    reduction: Reduction,
}

/// Outcome of one integration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimate {
    pub steps: StepCount,
    pub width: StepWidth,
    /// Workers that received iterations
    pub workers: usize,
    pub reduction: Reduction,
    /// Reduced sum of integrand values, before scaling by the width
    pub sum: f64,
    /// `width * sum`
    pub value: f64,
}

/// Serializable summary of an [`Estimate`]
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub steps: StepCount,
    pub width: StepWidth,
    pub workers: usize,
    pub strategy: Reduction,
    pub pi: f64,
    pub abs_error: f64,
}

impl Integrator {
    #[must_use]
    pub fn new(config: &Config) -> Self {
        let grid = Discretization::new(config.steps);
        let workers = if config.reduction.is_parallel() {
            config.workers.effective(config.steps)
        } else {
            1
        };
        Self {
            grid,
            workers,
            reduction: config.reduction,
        }
    }

    #[must_use]
    pub const fn discretization(&self) -> &Discretization {
        &self.grid
    }

    /// Run the loop and scale the reduced sum by the step width
    ///
    /// # Errors
    ///
    /// Returns `QuadpiError::WorkerSpawn` if a parallel strategy cannot start
    /// its worker threads
    pub fn integrate(&self) -> Result<Estimate, QuadpiError> {
        let n = self.grid.steps().get();
        debug!(
            steps = n,
            workers = self.workers,
            reduction = %self.reduction,
            "starting integration"
        );

        let (sum, workers) = match self.reduction {
            Reduction::Sequential => (partial_sum(&self.grid, 0..n), 1),
            Reduction::Chunked => self.private_slots(merge_sequential)?,
            Reduction::Tree => self.private_slots(merge_tree)?,
            Reduction::Strided => self.strided_slots()?,
            Reduction::Atomic => self.atomic()?,
            Reduction::Critical => self.critical()?,
            Reduction::Rayon => self.rayon()?,
        };

        let estimate = Estimate::new(self.grid, workers, self.reduction, sum);
        info!(
            steps = n,
            workers,
            reduction = %self.reduction,
            pi = estimate.value,
            abs_error = estimate.abs_error(),
            "integration finished"
        );
        Ok(estimate)
    }

    fn ranges(&self) -> Vec<Range<u64>> {
        let ranges = partition(self.grid.steps(), self.workers);
        trace!(?ranges, "partition plan");
        ranges
    }

    fn private_slots(&self, merge: fn(&[Sum]) -> Sum) -> Result<(Sum, usize), QuadpiError> {
        let ranges = self.ranges();
        let slots = run_workers(ranges.len(), |worker| {
            let range = ranges[worker].clone();
            let subtotal = partial_sum(&self.grid, range.clone());
            debug!(
                worker,
                start = range.start,
                end = range.end,
                subtotal = subtotal.value(),
                "worker finished"
            );
            subtotal
        })?;
        Ok((merge(&slots), slots.len()))
    }

    fn strided_slots(&self) -> Result<(Sum, usize), QuadpiError> {
        let stride = self.workers;
        let slots = run_workers(stride, |worker| {
            let subtotal = strided_sum(&self.grid, worker, stride);
            debug!(worker, stride, subtotal = subtotal.value(), "worker finished");
            subtotal
        })?;
        Ok((merge_sequential(&slots), stride))
    }

    fn atomic(&self) -> Result<(Sum, usize), QuadpiError> {
        let ranges = self.ranges();
        let shared = AtomicSum::new();
        run_workers(ranges.len(), |worker| {
            let subtotal = partial_sum(&self.grid, ranges[worker].clone());
            debug!(worker, subtotal = subtotal.value(), "worker adding subtotal");
            shared.add(subtotal);
        })?;
        Ok((shared.into_inner(), ranges.len()))
    }

    fn critical(&self) -> Result<(Sum, usize), QuadpiError> {
        let ranges = self.ranges();
        let shared = LockedSum::new();
        run_workers(ranges.len(), |worker| {
            let subtotal = partial_sum(&self.grid, ranges[worker].clone());
            debug!(worker, subtotal = subtotal.value(), "worker adding subtotal");
            shared.add(subtotal);
        })?;
        Ok((shared.into_inner(), ranges.len()))
    }

    /// Fold/reduce on a pool sized to this run, not the global one
    fn rayon(&self) -> Result<(Sum, usize), QuadpiError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|worker| format!("quadpi-rayon-{worker}"))
            .build()
            .map_err(QuadpiError::worker_spawn)?;
        let h = self.grid.width();
        let n = self.grid.steps().get();
        let sum = pool.install(|| {
            (0..n)
                .into_par_iter()
                .fold(|| Sum::ZERO, |acc, i| acc.fold(integrand(midpoint(i, h))))
                .reduce(|| Sum::ZERO, Sum::combine)
        });
        Ok((sum, self.workers))
    }
}

/// Run `work(0..workers)` on scoped threads and collect results in worker order
///
/// Every started worker is joined before this returns, including when a later
/// spawn fails. A panicking worker re-raises its panic on the caller.
fn run_workers<T, F>(workers: usize, work: F) -> Result<Vec<T>, QuadpiError>
where
    T: Send,
    F: Fn(usize) -> T + Sync,
{
    let work = &work;
    thread::scope(|scope| -> Result<Vec<T>, QuadpiError> {
        let handles = (0..workers)
            .map(|worker| {
                thread::Builder::new()
                    .name(format!("quadpi-worker-{worker}"))
                    .spawn_scoped(scope, move || work(worker))
                    .map_err(QuadpiError::worker_spawn)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(handles
            .into_iter()
            .map(|handle| {
                handle
                    .join()
                    .unwrap_or_else(|payload| std::panic::resume_unwind(payload))
            })
            .collect())
    })
}

impl Estimate {
    #[must_use]
    pub fn new(grid: Discretization, workers: usize, reduction: Reduction, sum: Sum) -> Self {
        let width = grid.width();
        Self {
            steps: grid.steps(),
            width,
            workers,
            reduction,
            sum: sum.value(),
            value: width.get() * sum.value(),
        }
    }

    #[must_use]
    pub fn abs_error(&self) -> f64 {
        (self.value - PI).abs()
    }

    /// `pi: <value>` with `precision` fractional digits
    #[must_use]
    pub fn render(&self, precision: u16) -> String {
        let precision = usize::from(precision);
        format!("pi: {:.precision$}", self.value)
    }

    #[must_use]
    pub fn report(&self) -> Report {
        Report {
            steps: self.steps,
            width: self.width,
            workers: self.workers,
            strategy: self.reduction,
            pi: self.value,
            abs_error: self.abs_error(),
        }
    }
}

impl fmt::Display for Estimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(DEFAULT_PRECISION))
    }
}

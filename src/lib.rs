//! quadpi
//!
//! Midpoint-rule approximation of pi. The data model lives in `quadpi-core`,
//! the integrator and its reduction strategies in `quadpi-kernel`; this crate
//! re-exports both.

pub use quadpi_core::{
    Config, DEFAULT_PRECISION, DEFAULT_STEPS, Discretization, MAX_WORKERS, OutputFormat, OutputOptions,
    QuadpiError, Reduction, StepCount, StepWidth, WorkerCount,
};
pub use quadpi_kernel::{
    Estimate, Integrator, Report, approximate_pi, integrand, midpoint, partial_sum, partition,
    reduce, strided_sum,
};

//! Core data model for quadpi
//!
//! Discretization parameters, worker and reduction settings, and the error
//! taxonomy shared by the kernel and the CLI.

use serde::Serialize;
use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;

/// Step count used by the reference scenario
pub const DEFAULT_STEPS: u64 = 100_000;

/// Fractional digits printed by default
pub const DEFAULT_PRECISION: u16 = 6;

/// Upper bound on `--workers`; each worker is one OS thread
pub const MAX_WORKERS: usize = 1024;

/// Number of subintervals of [0, 1]. Always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct StepCount(u64);

impl StepCount {
    /// Create a step count
    ///
    /// # Errors
    ///
    /// Returns `QuadpiError::InvalidStepCount` if `steps` is zero
    pub fn new(steps: u64) -> Result<Self, QuadpiError> {
        if steps == 0 {
            return Err(QuadpiError::invalid_step_count(steps));
        }
        Ok(Self(steps))
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl Default for StepCount {
    fn default() -> Self {
        Self(DEFAULT_STEPS)
    }
}

impl TryFrom<i64> for StepCount {
    type Error = QuadpiError;

    fn try_from(steps: i64) -> Result<Self, Self::Error> {
        u64::try_from(steps)
            .map_err(|_| QuadpiError::invalid_step_count(steps))
            .and_then(Self::new)
    }
}

impl FromStr for StepCount {
    type Err = QuadpiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map_err(|_| QuadpiError::invalid_step_count(s))
            .and_then(Self::new)
    }
}

impl fmt::Display for StepCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Width of one subinterval, `1.0 / N`
///
/// Only obtainable from a [`StepCount`], so it can never disagree with it.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct StepWidth(f64);

impl StepWidth {
    #[must_use]
    pub const fn get(self) -> f64 {
        self.0
    }
}

impl From<StepCount> for StepWidth {
    #[allow(clippy::cast_precision_loss)]
    fn from(steps: StepCount) -> Self {
        Self(1.0 / steps.get() as f64)
    }
}

/// Step count and step width, fixed before any summation starts
///
/// Workers share it by reference; nothing mutates it once built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Discretization {
    steps: StepCount,
    width: StepWidth,
}

impl Discretization {
    #[must_use]
    pub fn new(steps: StepCount) -> Self {
        Self {
            steps,
            width: StepWidth::from(steps),
        }
    }

    #[must_use]
    pub const fn steps(&self) -> StepCount {
        self.steps
    }

    #[must_use]
    pub const fn width(&self) -> StepWidth {
        self.width
    }
}

/// Number of concurrent workers. Always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct WorkerCount(NonZeroUsize);

impl WorkerCount {
    /// Create a worker count
    ///
    /// # Errors
    ///
    /// Returns `QuadpiError::InvalidWorkerCount` if `workers` is zero or
    /// above [`MAX_WORKERS`]
    pub fn new(workers: usize) -> Result<Self, QuadpiError> {
        NonZeroUsize::new(workers)
            .filter(|w| w.get() <= MAX_WORKERS)
            .map(Self)
            .ok_or_else(|| QuadpiError::invalid_worker_count(workers))
    }

    /// One worker per available hardware thread, capped at [`MAX_WORKERS`]
    #[must_use]
    pub fn available() -> Self {
        let available = std::thread::available_parallelism().unwrap_or(NonZeroUsize::MIN);
        Self(NonZeroUsize::new(available.get().min(MAX_WORKERS)).unwrap_or(NonZeroUsize::MIN))
    }

    #[must_use]
    pub const fn get(self) -> usize {
        self.0.get()
    }

    /// Workers that actually receive iterations for `steps`
    #[must_use]
    pub fn effective(self, steps: StepCount) -> usize {
        usize::try_from(steps.get()).map_or(self.get(), |n| self.get().min(n))
    }
}

impl Default for WorkerCount {
    fn default() -> Self {
        Self::available()
    }
}

impl FromStr for WorkerCount {
    type Err = QuadpiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<usize>()
            .map_err(|_| QuadpiError::invalid_worker_count(s))
            .and_then(Self::new)
    }
}

impl fmt::Display for WorkerCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How per-iteration terms are combined into the final sum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Reduction {
    /// Single loop on the calling thread
    #[default]
    Sequential,
    /// Contiguous ranges, private slots, merged in range order
    Chunked,
    /// Worker w takes w, w+W, w+2W, ...; private slots, merged in worker order
    Strided,
    /// Contiguous ranges, private slots, pairwise tree merge
    Tree,
    /// Contiguous ranges added into one shared accumulator with CAS
    Atomic,
    /// Contiguous ranges added into one mutex-guarded accumulator
    Critical,
    /// Work-stealing fold/reduce on the rayon pool
    Rayon,
}

impl Reduction {
    pub const ALL: [Self; 7] = [
        Self::Sequential,
        Self::Chunked,
        Self::Strided,
        Self::Tree,
        Self::Atomic,
        Self::Critical,
        Self::Rayon,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::Chunked => "chunked",
            Self::Strided => "strided",
            Self::Tree => "tree",
            Self::Atomic => "atomic",
            Self::Critical => "critical",
            Self::Rayon => "rayon",
        }
    }

    #[must_use]
    pub const fn is_parallel(self) -> bool {
        !matches!(self, Self::Sequential)
    }
}

impl FromStr for Reduction {
    type Err = QuadpiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|r| r.name() == wanted)
            .ok_or_else(|| QuadpiError::UnknownReduction {
                name: s.to_string(),
            })
    }
}

impl fmt::Display for Reduction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Output format of the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// `pi: <decimal>`
    #[default]
    Text,
    /// One JSON run report
    Json,
}

impl FromStr for OutputFormat {
    type Err = QuadpiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(QuadpiError::UnknownFormat {
                name: s.to_string(),
            }),
        }
    }
}

/// Everything one run needs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Config {
    pub steps: StepCount,
    pub workers: WorkerCount,
    pub reduction: Reduction,
    pub output: OutputOptions,
}

/// Rendering options for the final estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputOptions {
    pub precision: u16,
    pub format: OutputFormat,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            precision: DEFAULT_PRECISION,
            format: OutputFormat::Text,
        }
    }
}

impl Config {
    #[must_use]
    pub const fn with_steps(mut self, steps: StepCount) -> Self {
        self.steps = steps;
        self
    }

    #[must_use]
    pub const fn with_workers(mut self, workers: WorkerCount) -> Self {
        self.workers = workers;
        self
    }

    #[must_use]
    pub const fn with_reduction(mut self, reduction: Reduction) -> Self {
        self.reduction = reduction;
        self
    }

    #[must_use]
    pub const fn with_precision(mut self, precision: u16) -> Self {
        self.output.precision = precision;
        self
    }

    #[must_use]
    pub const fn with_format(mut self, format: OutputFormat) -> Self {
        self.output.format = format;
        self
    }
}

/// Error types for configuration and precondition checks
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum QuadpiError {
    #[error("quadpi: ERR_INVALID_STEP_COUNT: step count must be a positive integer, got '{value}'")]
    InvalidStepCount { value: String },

    #[error(
        "quadpi: ERR_INVALID_WORKER_COUNT: worker count must be an integer in 1..={max}, got '{value}'",
        max = MAX_WORKERS
    )]
    InvalidWorkerCount { value: String },

    #[error("quadpi: ERR_WORKER_SPAWN: could not start worker thread: {reason}")]
    WorkerSpawn { reason: String },

    #[error("quadpi: ERR_UNKNOWN_REDUCTION: '{name}' is not one of {choices}", choices = reduction_names())]
    UnknownReduction { name: String },

    #[error("quadpi: ERR_UNKNOWN_FORMAT: '{name}' is not one of text, json")]
    UnknownFormat { name: String },
}

impl QuadpiError {
    #[must_use]
    pub fn invalid_step_count(value: impl fmt::Display) -> Self {
        Self::InvalidStepCount {
            value: value.to_string(),
        }
    }

    #[must_use]
    pub fn invalid_worker_count(value: impl fmt::Display) -> Self {
        Self::InvalidWorkerCount {
            value: value.to_string(),
        }
    }

    #[must_use]
    pub fn worker_spawn(reason: impl fmt::Display) -> Self {
        Self::WorkerSpawn {
            reason: reason.to_string(),
        }
    }

    /// Short machine-readable code, e.g. `ERR_INVALID_STEP_COUNT`
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidStepCount { .. } => "ERR_INVALID_STEP_COUNT",
            Self::InvalidWorkerCount { .. } => "ERR_INVALID_WORKER_COUNT",
            Self::UnknownReduction { .. } => "ERR_UNKNOWN_REDUCTION",
            Self::UnknownFormat { .. } => "ERR_UNKNOWN_FORMAT",
            Self::WorkerSpawn { .. } => "ERR_WORKER_SPAWN",
        }
    }
}

fn reduction_names() -> String {
    Reduction::ALL.map(Reduction::name).join(", ")
}

//! The sum reduction declared by the integration loop
//!
//! `Sum` is the only value carried across iterations. The loop index and the
//! midpoint are private to each iteration, and the discretization is shared
//! read-only, so any executor may split the range, fold each piece into its own
//! `Sum`, and combine the pieces with `Sum::combine`.
//!
//! Floating-point addition is not associative. Different partitions or merge
//! orders agree to within rounding, not bit for bit.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Running total of integrand values
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Sum(f64);

impl Sum {
    /// Identity of the reduction
    pub const ZERO: Self = Self(0.0);

    #[must_use]
    pub const fn new(value: f64) -> Self {
        Self(value)
    }

    /// Add one term
    #[must_use]
    #[inline]
    pub fn fold(self, term: f64) -> Self {
        Self(self.0 + term)
    }

    /// Merge two partial totals
    #[must_use]
    #[inline]
    pub fn combine(self, other: Self) -> Self {
        Self(self.0 + other.0)
    }

    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }
}

/// Combine private slots left to right
#[must_use]
pub fn merge_sequential(slots: &[Sum]) -> Sum {
    slots.iter().copied().fold(Sum::ZERO, Sum::combine)
}

/// Combine private slots pairwise, halving the list at each level
#[must_use]
pub fn merge_tree(slots: &[Sum]) -> Sum {
    match slots {
        [] => Sum::ZERO,
        [single] => *single,
        _ => {
            let (left, right) = slots.split_at(slots.len() / 2);
            merge_tree(left).combine(merge_tree(right))
        }
    }
}

/// Shared accumulator updated with a compare-and-swap loop
///
/// The f64 is stored as its bit pattern in an `AtomicU64`.
#[derive(Debug, Default)]
pub struct AtomicSum(AtomicU64);

impl AtomicSum {
    #[must_use]
    pub fn new() -> Self {
        Self(AtomicU64::new(Sum::ZERO.value().to_bits()))
    }

    pub fn add(&self, subtotal: Sum) {
        let mut current = self.0.load(Ordering::Acquire);
        loop {
            let next = (f64::from_bits(current) + subtotal.value()).to_bits();
            match self
                .0
                .compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return,
                Err(actual) => current = actual,
            }
        }
    }

    #[must_use]
    pub fn into_inner(self) -> Sum {
        Sum(f64::from_bits(self.0.into_inner()))
    }
}

/// Shared accumulator guarded by a mutex
#[derive(Debug, Default)]
pub struct LockedSum(Mutex<Sum>);

impl LockedSum {
    #[must_use]
    pub fn new() -> Self {
        Self(Mutex::new(Sum::ZERO))
    }

    pub fn add(&self, subtotal: Sum) {
        // A poisoned lock still holds a consistent f64.
        let mut total = self
            .0
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *total = total.combine(subtotal);
    }

    #[must_use]
    pub fn into_inner(self) -> Sum {
        self.0
            .into_inner()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

//! Integration tests for the parallel reduction contract

use proptest::prelude::*;
use quadpi::reduce::{Sum, merge_sequential, merge_tree};
use quadpi::{
    Config, Discretization, Integrator, Reduction, StepCount, WorkerCount, partial_sum, partition,
};

fn run(steps: u64, workers: usize, reduction: Reduction) -> f64 {
    let config = Config::default()
        .with_steps(StepCount::new(steps).unwrap())
        .with_workers(WorkerCount::new(workers).unwrap())
        .with_reduction(reduction);
    Integrator::new(&config).integrate().unwrap().value
}

#[test]
fn test_strategies_agree_across_worker_counts() {
    let expected = run(100_000, 1, Reduction::Sequential);
    for workers in [1, 2, 3, 8, 64] {
        for reduction in Reduction::ALL {
            let value = run(100_000, workers, reduction);
            assert!(
                (value - expected).abs() < 1e-9,
                "{reduction} with {workers} workers gave {value}"
            );
        }
    }
}

#[test]
fn test_boundary_single_step_everywhere() {
    for reduction in Reduction::ALL {
        assert_eq!(run(1, 5, reduction), 3.2, "{reduction}");
    }
}

#[test]
fn test_shuffled_merge_order() {
    let grid = Discretization::new(StepCount::new(30_001).unwrap());
    let mut slots: Vec<Sum> = partition::partition(grid.steps(), 9)
        .into_iter()
        .map(|range| partial_sum(&grid, range))
        .collect();
    let in_order = merge_sequential(&slots).value();

    // Interleave: evens then odds
    let mut shuffled: Vec<Sum> = slots.iter().step_by(2).copied().collect();
    shuffled.extend(slots.iter().skip(1).step_by(2).copied());
    slots.reverse();

    assert!((merge_sequential(&shuffled).value() - in_order).abs() < 1e-7);
    assert!((merge_tree(&slots).value() - in_order).abs() < 1e-7);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_parallel_matches_sequential(
        steps in 1u64..50_000,
        workers in 1usize..16,
    ) {
        let expected = run(steps, 1, Reduction::Sequential);
        for reduction in [Reduction::Chunked, Reduction::Strided, Reduction::Atomic, Reduction::Rayon] {
            let value = run(steps, workers, reduction);
            prop_assert!((value - expected).abs() < 1e-9, "{} gave {}", reduction, value);
        }
    }
}

//! Integration tests for configuration, validation and rendering

use quadpi::{
    Config, DEFAULT_STEPS, Integrator, OutputFormat, QuadpiError, Reduction, StepCount,
    WorkerCount, approximate_pi,
};

#[test]
fn test_default_config_reproduces_reference_output() {
    let estimate = Integrator::new(&Config::default()).integrate().unwrap();

    assert_eq!(estimate.steps.get(), DEFAULT_STEPS);
    assert_eq!(estimate.render(6), "pi: 3.141593");
}

#[test]
fn test_text_inputs_build_a_config() {
    let config = Config::default()
        .with_steps("2500".parse().unwrap())
        .with_workers("3".parse().unwrap())
        .with_reduction("critical".parse().unwrap())
        .with_format("json".parse().unwrap());

    let estimate = Integrator::new(&config).integrate().unwrap();
    assert_eq!(estimate.steps.get(), 2500);
    assert_eq!(estimate.workers, 3);
    assert_eq!(estimate.reduction, Reduction::Critical);
    assert_eq!(config.output.format, OutputFormat::Json);
}

#[test]
fn test_invalid_step_count_is_rejected_before_computing() {
    for input in ["0", "-1", "abc", "3.5"] {
        match input.parse::<StepCount>() {
            Err(QuadpiError::InvalidStepCount { value }) => assert_eq!(value, input),
            other => panic!("Expected InvalidStepCount for {input}, got {other:?}"),
        }
    }
    assert!(matches!(
        approximate_pi(0),
        Err(QuadpiError::InvalidStepCount { .. })
    ));
}

#[test]
fn test_invalid_worker_count() {
    match WorkerCount::new(0) {
        Err(error) => assert_eq!(error.code(), "ERR_INVALID_WORKER_COUNT"),
        Ok(_) => panic!("Expected InvalidWorkerCount"),
    }
}

#[test]
fn test_report_serializes_strategy_by_name() {
    let config = Config::default()
        .with_steps(StepCount::new(64).unwrap())
        .with_workers(WorkerCount::new(4).unwrap())
        .with_reduction(Reduction::Strided);
    let report = Integrator::new(&config).integrate().unwrap().report();

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["strategy"], "strided");
    assert_eq!(json["steps"], 64);
    assert_eq!(json["workers"], 4);
    assert_eq!(json["width"], 1.0 / 64.0);
}

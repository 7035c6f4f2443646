//! End-to-end search scenarios.
//!
//! These tests drive the full register → synthesize → execute → report loop
//! through the public `TestMachine` API.

use rand::Rng;
use testmachine_core::{
    ConfigurationError, FailureKind, RunStatus, SearchConfig, StepKind, TestMachine, Transform,
    TypeTag, Value,
};

fn floats() -> TypeTag {
    TypeTag::float("floats")
}

fn ints() -> TypeTag {
    TypeTag::integer("ints")
}

fn associative_add(args: &[Value]) -> Result<bool, String> {
    let x = args[0].as_float().ok_or("expected float")?;
    let y = args[1].as_float().ok_or("expected float")?;
    let z = args[2].as_float().ok_or("expected float")?;
    Ok(x + (y + z) == (x + y) + z)
}

fn float_machine(config: SearchConfig) -> TestMachine {
    let mut machine = TestMachine::with_config(config);
    machine
        .add_generator(floats(), |rng| Value::Float(rng.gen::<f64>()))
        .unwrap();
    machine
        .add_operation(
            Transform::compute("add", vec![floats(), floats()], vec![floats()], |args| {
                let a = args[0].as_float().ok_or("expected float")?;
                let b = args[1].as_float().ok_or("expected float")?;
                Ok(vec![Value::Float(a + b)])
            })
            .with_notation("{0} + {1}"),
        )
        .unwrap();
    machine
        .add_operation(Transform::rearrange("swap", vec![floats(), floats()], vec![1, 0]))
        .unwrap();
    machine
        .add_check(vec![floats(), floats(), floats()], associative_add, "associative_add")
        .unwrap();
    machine
}

// =============================================================================
// Counterexample discovery
// =============================================================================

#[test]
fn test_float_addition_is_not_associative() {
    let config = SearchConfig::default().with_seed(0).with_max_trials(1000);
    let mut machine = float_machine(config);
    let result = machine.run().unwrap();

    assert_eq!(result.status, RunStatus::Found);
    assert_eq!(result.seed, 0);
    let failure = result.failure.expect("a counterexample");

    match &failure.kind {
        FailureKind::CheckFailed { check, observed } => {
            assert_eq!(check, "associative_add");
            assert_eq!(observed.len(), 3);
            let values: Vec<Value> = observed.iter().map(|b| b.value.clone()).collect();
            assert_eq!(associative_add(&values), Ok(false));
        }
        other => panic!("expected a check failure, got {:?}", other),
    }

    // The program is cut right after the failing check
    let last = failure.trace.last().unwrap();
    assert_eq!(last.kind, StepKind::Check);
    assert_eq!(last.passed, Some(false));
    assert_eq!(failure.program.len(), failure.trace.len());
    assert!(result.trials <= 1000);
}

#[test]
fn test_operation_error_is_reported_as_crash() {
    let mut machine = TestMachine::with_config(SearchConfig::default().with_seed(7).with_max_trials(500));
    machine
        .add_generator(ints(), |rng| Value::Integer(rng.gen_range(i64::MAX / 2..=i64::MAX)))
        .unwrap();
    machine
        .add_operation(Transform::compute("add", vec![ints(), ints()], vec![ints()], |args| {
            let a = args[0].as_integer().ok_or("expected integer")?;
            let b = args[1].as_integer().ok_or("expected integer")?;
            a.checked_add(b)
                .map(|sum| vec![Value::Integer(sum)])
                .ok_or_else(|| "integer overflow".to_string())
        }))
        .unwrap();

    let result = machine.run().unwrap();
    let failure = result.failure.expect("overflow is unavoidable");
    match failure.kind {
        FailureKind::OperationError { operation, message, observed } => {
            assert_eq!(operation, "add");
            assert_eq!(message, "integer overflow");
            assert_eq!(observed.len(), 2);
        }
        other => panic!("expected an operation error, got {:?}", other),
    }
}

// =============================================================================
// Exhaustion and skipping
// =============================================================================

#[test]
fn test_empty_catalog_exhausts_with_skips() {
    let mut machine = TestMachine::with_config(SearchConfig::default().with_seed(0).with_max_trials(10));
    let result = machine.run().unwrap();

    assert_eq!(result.status, RunStatus::Exhausted);
    assert_eq!(result.trials, 10);
    assert_eq!(result.stats.skipped, 10);
    assert_eq!(result.stats.passed, 0);
    assert!(result.failure.is_none());
}

#[test]
fn test_consumer_without_generator_is_never_selected() {
    let mut machine = TestMachine::with_config(SearchConfig::default().with_seed(3).with_max_trials(20));
    machine
        .add_operation(Transform::compute("add", vec![floats(), floats()], vec![floats()], |_| {
            Err("must never run".to_string())
        }))
        .unwrap();

    let result = machine.run().unwrap();
    assert_eq!(result.status, RunStatus::Exhausted);
    assert_eq!(result.stats.skipped, 20);
    assert_eq!(result.trials, 20);
}

#[test]
fn test_exhausted_trial_count_matches_budget() {
    let mut machine = TestMachine::with_config(SearchConfig::quick().with_seed(11).with_max_trials(37));
    machine
        .add_generator(ints(), |rng| Value::Integer(rng.gen_range(-100..100)))
        .unwrap();
    machine
        .add_check(vec![ints()], |args| Ok(args[0].as_integer().is_some()), "is_integer")
        .unwrap();

    let result = machine.run().unwrap();
    assert_eq!(result.status, RunStatus::Exhausted);
    assert_eq!(result.trials, 37);
    assert_eq!(result.stats.passed + result.stats.skipped, 37);
}

// =============================================================================
// Determinism and typing
// =============================================================================

#[test]
fn test_same_seed_same_counterexample() {
    let config = SearchConfig::default().with_seed(1234).with_max_trials(1000);
    let first = float_machine(config.clone()).run().unwrap();
    let second = float_machine(config).run().unwrap();

    assert_eq!(first.trials, second.trials);
    assert_eq!(first.stats, second.stats);
    let (a, b) = (first.failure.unwrap(), second.failure.unwrap());
    assert_eq!(a.trial, b.trial);
    assert_eq!(a.program.digest(), b.program.digest());
    assert_eq!(a.trace, b.trace);
}

#[test]
fn test_replay_regenerates_failure() {
    let machine_config = SearchConfig::default().with_seed(99).with_max_trials(1000);
    let mut machine = float_machine(machine_config);
    let driver = machine.driver().unwrap();
    let result = machine.run().unwrap();
    let failure = result.failure.unwrap();

    match driver.replay(&failure) {
        testmachine_core::TrialOutcome::Fail(again) => {
            assert_eq!(again.program, failure.program);
            assert_eq!(again.kind, failure.kind);
        }
        other => panic!("replay diverged: {:?}", other),
    }
}

#[test]
fn test_mixed_tags_never_mismatch() {
    let mut machine = TestMachine::with_config(SearchConfig::default().with_seed(5).with_max_trials(200));
    machine
        .add_generator(floats(), |rng| Value::Float(rng.gen::<f64>()))
        .unwrap();
    machine
        .add_generator(ints(), |rng| Value::Integer(rng.gen_range(0..1000)))
        .unwrap();
    machine
        .add_operation(Transform::compute("scale", vec![floats(), ints()], vec![floats()], |args| {
            let f = args[0].as_float().ok_or("expected float first")?;
            let i = args[1].as_integer().ok_or("expected integer second")?;
            Ok(vec![Value::Float(f * i as f64)])
        }))
        .unwrap();
    machine
        .add_operation(Transform::compute("truncate", vec![floats()], vec![ints()], |args| {
            let f = args[0].as_float().ok_or("expected float")?;
            Ok(vec![Value::Integer(f as i64)])
        }))
        .unwrap();
    machine
        .add_check(vec![ints(), floats()], |args| {
            Ok(args[0].as_integer().is_some() && args[1].as_float().is_some())
        }, "typed")
        .unwrap();

    let result = machine.run().unwrap();
    assert_eq!(result.status, RunStatus::Exhausted, "{:?}", result.failure);
}

#[test]
fn test_incompatible_registration_is_fatal() {
    let mut machine = TestMachine::new();
    machine.add_generator(floats(), |_| Value::Float(0.0)).unwrap();
    let err = machine
        .add_generator(TypeTag::integer("floats"), |_| Value::Integer(0))
        .unwrap_err();
    assert!(matches!(err, ConfigurationError::IncompatibleTag { .. }));
}

#[test]
fn test_parallel_search_finds_counterexample() {
    let config = SearchConfig::default()
        .with_seed(0)
        .with_max_trials(1000)
        .with_workers(4);
    let result = float_machine(config).run().unwrap();
    assert!(result.found());
    assert!(result.failure.unwrap().kind.is_check_failure());
}

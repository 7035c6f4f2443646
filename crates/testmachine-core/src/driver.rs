//! Search Driver: runs trials until a falsifying program turns up or the
//! budget runs out.
//!
//! ```text
//! Idle ──run()──▶ Running ──Fail──▶ Found
//!                   │  ▲
//!                   │  └── Pass / Skipped (trials < budget)
//!                   └──── trials == budget ──▶ Exhausted
//! ```
//!
//! Every trial seeds its own RNG from `(run seed, trial index)`. A failing
//! trial can therefore be replayed on its own, and parallel workers never
//! share a random stream.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::catalog::OperationCatalog;
use crate::config::SearchConfig;
use crate::error::ConfigurationError;
use crate::executor::{ExecutedStep, ExecutionStatus, Executor};
use crate::operation::panic_message;
use crate::outcome::{Failure, FailureKind, RunResult, RunStatus, TrialOutcome, TrialStats};
use crate::program::Program;
use crate::reporter::Reporter;
use crate::synthesizer::{ProgramSynthesizer, Synthesis};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Idle,
    Running,
    Found,
    Exhausted,
}

impl fmt::Display for DriverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DriverState::Idle => "idle",
            DriverState::Running => "running",
            DriverState::Found => "found",
            DriverState::Exhausted => "exhausted",
        };
        f.write_str(name)
    }
}

/// Seed of trial `trial` within a run seeded by `run_seed` (splitmix64).
pub fn trial_seed(run_seed: u64, trial: u64) -> u64 {
    let mut z = run_seed.wrapping_add(trial.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Synthesis + execution of single trials. Borrowed by every worker.
struct TrialRunner<'a> {
    catalog: &'a OperationCatalog,
    config: &'a SearchConfig,
}

impl<'a> TrialRunner<'a> {
    fn run(&self, trial: u64, seed: u64) -> TrialOutcome {
        let mut rng = StdRng::seed_from_u64(seed);
        let synthesizer = ProgramSynthesizer::new(self.catalog, self.config);
        let executor = Executor::new(self.catalog);

        let failure = |program: Program, trace: Vec<ExecutedStep>, kind: FailureKind| {
            TrialOutcome::Fail(Box::new(Failure {
                trial,
                trial_seed: seed,
                program,
                trace,
                kind,
            }))
        };

        match synthesizer.synthesize(&mut rng) {
            Synthesis::Skipped(reason) => TrialOutcome::Skipped(reason),

            Synthesis::Crashed { program, error } => {
                // The steps before the crash may already falsify a check
                let execution = executor.execute(&program);
                if let ExecutionStatus::Falsified { at, kind } = execution.status {
                    return failure(program.truncated(at + 1), execution.trace, kind);
                }
                let kind = FailureKind::OperationError {
                    operation: error.operation,
                    message: error.message,
                    observed: Vec::new(),
                };
                failure(program, execution.trace, kind)
            }

            Synthesis::Program(program) => {
                let execution = executor.execute(&program);
                match execution.status {
                    ExecutionStatus::Completed => TrialOutcome::Pass,
                    ExecutionStatus::Falsified { at, kind } => {
                        failure(program.truncated(at + 1), execution.trace, kind)
                    }
                    ExecutionStatus::Aborted { reason, .. } => TrialOutcome::Skipped(reason),
                }
            }
        }
    }
}

pub struct SearchDriver {
    catalog: Arc<OperationCatalog>,
    config: SearchConfig,
    state: DriverState,
    reporter: Option<Box<dyn Reporter>>,
}

impl SearchDriver {
    pub fn new(catalog: Arc<OperationCatalog>, config: SearchConfig) -> Result<Self, ConfigurationError> {
        config.validate()?;
        Ok(Self {
            catalog,
            config,
            state: DriverState::Idle,
            reporter: None,
        })
    }

    pub fn with_reporter(mut self, reporter: Box<dyn Reporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn catalog(&self) -> &OperationCatalog {
        &self.catalog
    }

    /// Run one trial in isolation.
    pub fn run_trial(&self, trial: u64, seed: u64) -> TrialOutcome {
        self.runner().run(trial, seed)
    }

    /// Regenerate and re-execute a reported failure.
    pub fn replay(&self, failure: &Failure) -> TrialOutcome {
        self.run_trial(failure.trial, failure.trial_seed)
    }

    /// Search until Found or Exhausted. Blocks until a terminal state.
    pub fn run(&mut self) -> Result<RunResult, ConfigurationError> {
        if self.state != DriverState::Idle {
            return Err(ConfigurationError::NotIdle(self.state.to_string()));
        }
        self.state = DriverState::Running;

        let seed = self.config.random_seed.unwrap_or_else(rand::random);
        let started_at = chrono::Utc::now();
        let start = Instant::now();
        info!(
            seed,
            max_trials = self.config.max_trials,
            max_steps = self.config.max_steps,
            workers = self.config.workers,
            operations = self.catalog.len(),
            "search started"
        );

        let (trials, stats, failure) = if self.config.workers > 1 {
            self.search_parallel(seed)
        } else {
            self.search_sequential(seed)
        };

        let status = if failure.is_some() {
            RunStatus::Found
        } else {
            RunStatus::Exhausted
        };
        self.state = match status {
            RunStatus::Found => DriverState::Found,
            RunStatus::Exhausted => DriverState::Exhausted,
        };

        let mut result = RunResult {
            run_id: uuid::Uuid::new_v4().to_string(),
            status,
            trials,
            seed,
            stats,
            failure,
            report: None,
            started_at,
            elapsed_ms: start.elapsed().as_millis() as u64,
        };

        match &result.failure {
            Some(failure) => info!(
                trial = failure.trial,
                culprit = failure.kind.culprit(),
                kind = failure.kind.label(),
                steps = failure.program.len(),
                "counterexample found"
            ),
            None => info!(trials, "no counterexample found within budget"),
        }

        if let Some(reporter) = &self.reporter {
            match reporter.report(&result) {
                Ok(text) => result.report = Some(text),
                Err(e) => warn!(error = %e, "reporter failed; search result unaffected"),
            }
        }

        Ok(result)
    }

    fn runner(&self) -> TrialRunner<'_> {
        TrialRunner {
            catalog: &self.catalog,
            config: &self.config,
        }
    }

    fn search_sequential(&self, seed: u64) -> (u64, TrialStats, Option<Failure>) {
        let runner = self.runner();
        let mut stats = TrialStats::default();
        let mut trials = 0u64;

        while trials < self.config.max_trials {
            let trial = trials;
            let outcome = runner.run(trial, trial_seed(seed, trial));
            trials += 1;

            match outcome {
                TrialOutcome::Pass => stats.passed += 1,
                TrialOutcome::Skipped(reason) => {
                    debug!(trial, %reason, "trial skipped");
                    stats.skipped += 1;
                }
                TrialOutcome::Fail(failure) => {
                    stats.failed += 1;
                    return (trials, stats, Some(*failure));
                }
            }
        }

        (trials, stats, None)
    }

    fn search_parallel(&self, seed: u64) -> (u64, TrialStats, Option<Failure>) {
        let workers = self.config.workers as u64;
        let max_trials = self.config.max_trials;
        let stop = AtomicBool::new(false);
        let found: Mutex<Option<Failure>> = Mutex::new(None);

        let per_worker: Vec<std::thread::Result<(u64, TrialStats)>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|worker| {
                    let runner = self.runner();
                    let stop = &stop;
                    let found = &found;
                    scope.spawn(move || {
                        let mut stats = TrialStats::default();
                        let mut trials = 0u64;
                        let mut trial = worker;
                        while trial < max_trials && !stop.load(Ordering::Acquire) {
                            let outcome = runner.run(trial, trial_seed(seed, trial));
                            trials += 1;
                            match outcome {
                                TrialOutcome::Pass => stats.passed += 1,
                                TrialOutcome::Skipped(reason) => {
                                    debug!(worker, trial, %reason, "trial skipped");
                                    stats.skipped += 1;
                                }
                                TrialOutcome::Fail(failure) => {
                                    stats.failed += 1;
                                    let mut guard = found.lock().unwrap_or_else(|e| e.into_inner());
                                    let earlier = guard.as_ref().is_some_and(|f| f.trial < failure.trial);
                                    if !earlier {
                                        *guard = Some(*failure);
                                    }
                                    stop.store(true, Ordering::Release);
                                    break;
                                }
                            }
                            trial += workers;
                        }
                        (trials, stats)
                    })
                })
                .collect();

            handles.into_iter().map(|handle| handle.join()).collect()
        });

        let (trials, stats) = merge_workers(per_worker);
        let failure = found.into_inner().unwrap_or_else(|e| e.into_inner());
        (trials, stats, failure)
    }
}

/// Sum per-worker trial counts. A worker that panicked is logged and its
/// trials are left out.
fn merge_workers(joined: Vec<std::thread::Result<(u64, TrialStats)>>) -> (u64, TrialStats) {
    let mut stats = TrialStats::default();
    let mut trials = 0;
    for (worker, result) in joined.into_iter().enumerate() {
        match result {
            Ok((count, worker_stats)) => {
                trials += count;
                stats.passed += worker_stats.passed;
                stats.skipped += worker_stats.skipped;
                stats.failed += worker_stats.failed;
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!(worker, %message, "search worker panicked, its trials are not counted");
            }
        }
    }
    (trials, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReportError;
    use crate::operation::{Check, Generator};
    use crate::tag::TypeTag;
    use crate::value::Value;
    use rand::Rng;

    fn ints() -> TypeTag {
        TypeTag::integer("ints")
    }

    fn catalog(limit: i64) -> Arc<OperationCatalog> {
        let mut catalog = OperationCatalog::new();
        catalog
            .register(Generator::new("digit", ints(), |rng| {
                Value::Integer(rng.gen_range(0..10))
            }))
            .unwrap();
        catalog
            .register(Check::new("below", vec![ints()], move |args| {
                Ok(args[0].as_integer().unwrap_or(0) < limit)
            }))
            .unwrap();
        Arc::new(catalog)
    }

    #[test]
    fn test_trial_seeds_differ() {
        assert_ne!(trial_seed(0, 0), trial_seed(0, 1));
        assert_ne!(trial_seed(0, 0), trial_seed(1, 0));
        assert_eq!(trial_seed(7, 3), trial_seed(7, 3));
    }

    #[test]
    fn test_found_and_replay() {
        let config = SearchConfig::default().with_seed(1).with_max_trials(200);
        let mut driver = SearchDriver::new(catalog(9), config).unwrap();
        assert_eq!(driver.state(), DriverState::Idle);

        let result = driver.run().unwrap();
        assert_eq!(driver.state(), DriverState::Found);
        assert_eq!(result.status, RunStatus::Found);
        let failure = result.failure.as_ref().unwrap();
        assert_eq!(failure.kind.culprit(), "below");
        assert_eq!(failure.kind.observed()[0].value, Value::Integer(9));
        assert_eq!(result.trials, failure.trial + 1);

        match driver.replay(failure) {
            TrialOutcome::Fail(again) => assert_eq!(again.program, failure.program),
            other => panic!("replay should fail again, got {:?}", other),
        }
    }

    #[test]
    fn test_exhausted_counts_every_trial() {
        let config = SearchConfig::default().with_seed(2).with_max_trials(25);
        let mut driver = SearchDriver::new(catalog(100), config).unwrap();
        let result = driver.run().unwrap();
        assert_eq!(result.status, RunStatus::Exhausted);
        assert_eq!(result.trials, 25);
        assert_eq!(result.stats.passed, 25);
        assert_eq!(driver.state(), DriverState::Exhausted);
    }

    #[test]
    fn test_run_twice_is_rejected() {
        let config = SearchConfig::default().with_seed(2).with_max_trials(1);
        let mut driver = SearchDriver::new(catalog(100), config).unwrap();
        driver.run().unwrap();
        assert!(matches!(driver.run(), Err(ConfigurationError::NotIdle(_))));
    }

    #[test]
    fn test_parallel_exhausted_counts_every_trial() {
        let config = SearchConfig::default()
            .with_seed(3)
            .with_max_trials(40)
            .with_workers(3);
        let mut driver = SearchDriver::new(catalog(100), config).unwrap();
        let result = driver.run().unwrap();
        assert_eq!(result.status, RunStatus::Exhausted);
        assert_eq!(result.trials, 40);
    }

    #[test]
    fn test_merge_workers_skips_panicked_worker() {
        let ok = TrialStats {
            passed: 3,
            skipped: 1,
            failed: 0,
        };
        let died: Box<dyn std::any::Any + Send> = Box::new("worker died");
        let joined = vec![Ok((4, ok.clone())), Err(died), Ok((4, ok))];
        let (trials, stats) = merge_workers(joined);
        assert_eq!(trials, 8);
        assert_eq!(stats.passed, 6);
        assert_eq!(stats.skipped, 2);
    }

    #[test]
    fn test_parallel_found() {
        let config = SearchConfig::default()
            .with_seed(4)
            .with_max_trials(500)
            .with_workers(4);
        let mut driver = SearchDriver::new(catalog(9), config).unwrap();
        let result = driver.run().unwrap();
        assert!(result.found());
        let failure = result.failure.unwrap();
        assert!(matches!(driver.replay(&failure), TrialOutcome::Fail(_)));
    }

    #[test]
    fn test_reporter_failure_does_not_change_result() {
        let reporter = |_: &RunResult| -> Result<String, ReportError> {
            Err(ReportError::Render("sink closed".to_string()))
        };
        let config = SearchConfig::default().with_seed(1).with_max_trials(200);
        let mut driver = SearchDriver::new(catalog(9), config)
            .unwrap()
            .with_reporter(Box::new(reporter));
        let result = driver.run().unwrap();
        assert!(result.found());
        assert!(result.report.is_none());
    }

    #[test]
    fn test_reporter_text_is_attached() {
        let reporter = |result: &RunResult| -> Result<String, ReportError> { Ok(result.summary()) };
        let config = SearchConfig::default().with_seed(5).with_max_trials(3);
        let mut driver = SearchDriver::new(catalog(100), config)
            .unwrap()
            .with_reporter(Box::new(reporter));
        let result = driver.run().unwrap();
        assert!(result.report.unwrap().contains("EXHAUSTED"));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = SearchConfig::default().with_max_steps(0);
        assert!(SearchDriver::new(catalog(9), config).is_err());
    }
}

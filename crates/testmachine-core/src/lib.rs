//! TestMachine Core: randomized counterexample search over stack programs
//!
//! Generators, transforms and checks are registered against typed stacks.
//! The engine synthesizes short random programs from them, runs each one on
//! a fresh stack machine, and stops at the first program that makes a check
//! fail or an operation raise.
//!
//! ```text
//! register ─▶ OperationCatalog
//!                  │
//!   SearchDriver ──┼─▶ ProgramSynthesizer ─▶ Program ─▶ Executor ─▶ TrialOutcome
//!        ▲         │                                                    │
//!        └─────────┴──────────── Pass / Skipped ◀───────────────────────┤
//!                                                   Fail ─▶ Reporter ◀──┘
//! ```
//!
//! # Example
//!
//! ```
//! use rand::Rng;
//! use testmachine_core::{SearchConfig, TestMachine, TypeTag, Value};
//!
//! let floats = TypeTag::float("floats");
//! let mut machine = TestMachine::with_config(SearchConfig::default().with_seed(0).with_max_trials(1000));
//! machine.add_generator(floats.clone(), |rng| Value::Float(rng.gen::<f64>())).unwrap();
//! machine
//!     .add_check(vec![floats.clone(), floats.clone(), floats], |args| {
//!         let (x, y, z) = (
//!             args[0].as_float().unwrap_or(0.0),
//!             args[1].as_float().unwrap_or(0.0),
//!             args[2].as_float().unwrap_or(0.0),
//!         );
//!         Ok(x + (y + z) == (x + y) + z)
//!     }, "associative_add")
//!     .unwrap();
//!
//! let result = machine.run().unwrap();
//! assert!(result.found());
//! ```

pub mod catalog;
pub mod config;
pub mod driver;
pub mod error;
pub mod executor;
pub mod machine;
pub mod operation;
pub mod outcome;
pub mod program;
pub mod reporter;
pub mod stack;
pub mod synthesizer;
pub mod tag;
pub mod value;

pub use catalog::{OperationCatalog, OperationId};
pub use config::SearchConfig;
pub use driver::{trial_seed, DriverState, SearchDriver};
pub use error::{ConfigurationError, EngineError, OperationError, ReportError, StackUnderflow};
pub use executor::{ExecutedStep, Execution, ExecutionStatus, Executor, StepKind};
pub use machine::TestMachine;
pub use operation::{Check, Effect, Generator, Operation, OperationKind, Transform};
pub use outcome::{Failure, FailureKind, RunResult, RunStatus, TrialOutcome, TrialStats};
pub use program::{Program, Step};
pub use reporter::Reporter;
pub use stack::{Binding, StackMachine, Var};
pub use synthesizer::{ProgramSynthesizer, StepStream, Synthesis};
pub use tag::{TypeTag, ValueKind};
pub use value::Value;

/// Engine version
pub const TESTMACHINE_VERSION: &str = env!("CARGO_PKG_VERSION");
